//! PWM 上限表
//!
//! 每个关节的 PWM 上限 = min(电压等级全局上限, 关节类别基础上限)。
//! 基础上限为标称值 × 1.5 安全系数，拇指使用独立的类别表。

use crate::joint::{JOINT_COUNT, JointCategory, JointId};

/// 基础上限的安全系数
pub const PWM_LIMIT_SAFETY_FACTOR: f64 = 1.5;

/// 非拇指关节基础上限
pub const PWM_LIMIT_ROLL: f64 = 250.0 * PWM_LIMIT_SAFETY_FACTOR;
pub const PWM_LIMIT_NEAR: f64 = 450.0 * PWM_LIMIT_SAFETY_FACTOR;
pub const PWM_LIMIT_MIDDLE: f64 = 300.0 * PWM_LIMIT_SAFETY_FACTOR;
pub const PWM_LIMIT_FAR: f64 = 190.0 * PWM_LIMIT_SAFETY_FACTOR;

/// 拇指关节基础上限
pub const PWM_LIMIT_THUMB_ROLL: f64 = 350.0 * PWM_LIMIT_SAFETY_FACTOR;
pub const PWM_LIMIT_THUMB_NEAR: f64 = 270.0 * PWM_LIMIT_SAFETY_FACTOR;
pub const PWM_LIMIT_THUMB_MIDDLE: f64 = 180.0 * PWM_LIMIT_SAFETY_FACTOR;
pub const PWM_LIMIT_THUMB_FAR: f64 = 180.0 * PWM_LIMIT_SAFETY_FACTOR;

/// 电压等级全局上限
///
/// 只有 12 V 有硬件出处，8 V / 24 V 两档是沿用的经验值。
pub const PWM_LIMIT_GLOBAL_8V: f64 = 800.0;
pub const PWM_LIMIT_GLOBAL_24V: f64 = 500.0;
pub const PWM_LIMIT_GLOBAL_12V: f64 = 1200.0;

/// 供电电压等级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VoltageClass {
    /// 8 V 供电
    V8,
    /// 12 V 供电
    V12,
    /// 24 V 供电
    V24,
}

impl VoltageClass {
    /// 标称电压（伏）
    pub fn volts(self) -> f64 {
        match self {
            VoltageClass::V8 => 8.0,
            VoltageClass::V12 => 12.0,
            VoltageClass::V24 => 24.0,
        }
    }

    /// 全局 PWM 上限
    pub fn global_ceiling(self) -> f64 {
        match self {
            VoltageClass::V8 => PWM_LIMIT_GLOBAL_8V,
            VoltageClass::V12 => PWM_LIMIT_GLOBAL_12V,
            VoltageClass::V24 => PWM_LIMIT_GLOBAL_24V,
        }
    }

    /// 力矩 → PWM 换算系数
    ///
    /// 所有电压等级都按 12 V 满量程换算，电压差异只体现在全局上限上。
    pub fn torque_to_pwm(self) -> f64 {
        PWM_LIMIT_GLOBAL_12V
    }
}

/// 灵巧手硬件版本
///
/// 由手部信息帧中硬件版本号的高字节（Byte 1）决定，每次连接只捕获一次。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HandRevision {
    /// 第一代（8 V）
    V1,
    /// 第二代（24 V）
    V2,
    /// 第三代（12 V）
    V3,
    /// 第四代（12 V），也是未知版本号的回退值
    V4,
}

impl HandRevision {
    /// 从硬件版本高字节解析
    ///
    /// 1 / 2 到 8 V / 24 V 的映射没有硬件文档对照，实测只见过 12 V 的手。
    pub fn from_version_byte(byte: u8) -> Self {
        match byte {
            1 => HandRevision::V1,
            2 => HandRevision::V2,
            3 => HandRevision::V3,
            _ => HandRevision::V4,
        }
    }

    /// 电压等级
    pub fn voltage_class(self) -> VoltageClass {
        match self {
            HandRevision::V1 => VoltageClass::V8,
            HandRevision::V2 => VoltageClass::V24,
            HandRevision::V3 | HandRevision::V4 => VoltageClass::V12,
        }
    }
}

/// 关节类别的基础上限（未经电压钳位）
pub fn base_ceiling(category: JointCategory, thumb: bool) -> f64 {
    match (thumb, category) {
        (false, JointCategory::Roll) => PWM_LIMIT_ROLL,
        (false, JointCategory::Near) => PWM_LIMIT_NEAR,
        (false, JointCategory::Middle) => PWM_LIMIT_MIDDLE,
        (false, JointCategory::Far) => PWM_LIMIT_FAR,
        (true, JointCategory::Roll) => PWM_LIMIT_THUMB_ROLL,
        (true, JointCategory::Near) => PWM_LIMIT_THUMB_NEAR,
        (true, JointCategory::Middle) => PWM_LIMIT_THUMB_MIDDLE,
        (true, JointCategory::Far) => PWM_LIMIT_THUMB_FAR,
    }
}

/// 单个关节在指定硬件版本下的有效 PWM 上限
pub fn ceiling_for(joint: JointId, revision: HandRevision) -> f64 {
    let base = base_ceiling(joint.category(), joint.finger().is_thumb());
    base.min(revision.voltage_class().global_ceiling())
}

/// 某个硬件版本下的完整上限表
///
/// 在收到手部信息帧时一次性生成，之后不再变化。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitTable {
    revision: HandRevision,
    ceilings: [f64; JOINT_COUNT],
}

impl LimitTable {
    /// 为指定硬件版本生成上限表
    pub fn for_revision(revision: HandRevision) -> Self {
        let mut ceilings = [0.0; JOINT_COUNT];
        for joint in JointId::all() {
            ceilings[joint.index()] = ceiling_for(joint, revision);
        }
        Self { revision, ceilings }
    }

    pub fn revision(&self) -> HandRevision {
        self.revision
    }

    pub fn voltage_class(&self) -> VoltageClass {
        self.revision.voltage_class()
    }

    /// 力矩 → PWM 换算系数
    pub fn scale_constant(&self) -> f64 {
        self.voltage_class().torque_to_pwm()
    }

    /// 单个关节的上限
    pub fn ceiling(&self, joint: JointId) -> f64 {
        self.ceilings[joint.index()]
    }

    /// 全部关节的上限，按关节序号排列
    pub fn ceilings(&self) -> &[f64; JOINT_COUNT] {
        &self.ceilings
    }
}
