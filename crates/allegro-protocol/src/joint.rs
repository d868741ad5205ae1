//! 关节与手指分组标识
//!
//! 灵巧手共 4 根手指 × 4 个关节 = 16 个关节。关节序号按
//! "手指优先、关节次之" 排列：`JointId = finger * 4 + joint`。

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 手指数量
pub const FINGER_COUNT: usize = 4;

/// 每根手指的关节数量
pub const JOINTS_PER_FINGER: usize = 4;

/// 关节总数
pub const JOINT_COUNT: usize = FINGER_COUNT * JOINTS_PER_FINGER;

/// 手指分组（一根手指对应一帧位置反馈 / 一帧力矩指令）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum FingerGroup {
    /// 食指
    Index = 0,
    /// 中指
    Middle = 1,
    /// 无名指 / 小指
    Pinky = 2,
    /// 拇指
    Thumb = 3,
}

impl FingerGroup {
    /// 全部手指，按分组序号排列
    pub const ALL: [FingerGroup; FINGER_COUNT] = [
        FingerGroup::Index,
        FingerGroup::Middle,
        FingerGroup::Pinky,
        FingerGroup::Thumb,
    ];

    /// 分组序号 [0, 4)
    pub fn index(self) -> usize {
        self as usize
    }

    /// 是否为拇指（拇指使用独立的 PWM 上限表）
    pub fn is_thumb(self) -> bool {
        self == FingerGroup::Thumb
    }

    /// 该手指的 4 个关节
    pub fn joints(self) -> [JointId; JOINTS_PER_FINGER] {
        let base = (self as u8) * JOINTS_PER_FINGER as u8;
        [
            JointId(base),
            JointId(base + 1),
            JointId(base + 2),
            JointId(base + 3),
        ]
    }
}

/// 关节类别（决定基础 PWM 上限）
///
/// 手指内关节序号 0 → Roll，1 → Near，2 → Middle，3 → Far。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointCategory {
    /// 侧摆关节
    Roll,
    /// 近端关节
    Near,
    /// 中间关节
    Middle,
    /// 远端关节
    Far,
}

/// 关节标识 [0, 16)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointId(u8);

impl JointId {
    /// 从扁平序号创建，超出 [0, 16) 返回 `None`
    pub fn new(index: usize) -> Option<Self> {
        (index < JOINT_COUNT).then_some(Self(index as u8))
    }

    /// 从 (手指, 手指内关节序号) 创建
    pub fn from_parts(finger: FingerGroup, joint: usize) -> Option<Self> {
        (joint < JOINTS_PER_FINGER)
            .then(|| Self((finger as u8) * JOINTS_PER_FINGER as u8 + joint as u8))
    }

    /// 全部关节，按序号排列
    pub fn all() -> impl Iterator<Item = JointId> {
        (0..JOINT_COUNT as u8).map(JointId)
    }

    /// 扁平序号
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// 所属手指
    pub fn finger(self) -> FingerGroup {
        match self.0 as usize / JOINTS_PER_FINGER {
            0 => FingerGroup::Index,
            1 => FingerGroup::Middle,
            2 => FingerGroup::Pinky,
            _ => FingerGroup::Thumb,
        }
    }

    /// 手指内关节序号 [0, 4)
    pub fn joint_in_finger(self) -> usize {
        self.0 as usize % JOINTS_PER_FINGER
    }

    /// 关节类别
    pub fn category(self) -> JointCategory {
        match self.joint_in_finger() {
            0 => JointCategory::Roll,
            1 => JointCategory::Near,
            2 => JointCategory::Middle,
            _ => JointCategory::Far,
        }
    }
}
