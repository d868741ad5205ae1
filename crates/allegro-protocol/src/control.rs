//! 控制帧结构体定义
//!
//! 主机发往灵巧手的指令帧：伺服开关、上报周期、每根手指的 PWM 力矩，
//! 以及手部信息 / 序列号的远程请求。

use crate::ids::{
    ID_CMD_SET_PERIOD, ID_CMD_SET_TORQUE_BASE, ID_CMD_SYSTEM_OFF, ID_CMD_SYSTEM_ON,
    ID_RTR_HAND_INFO, ID_RTR_SERIAL,
};
use crate::joint::{FingerGroup, JOINTS_PER_FINGER};
use crate::{AllegroFrame, i16_to_bytes_le};

/// 伺服（系统）开关指令 (0x40 / 0x41)，无数据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoCommand {
    pub on: bool,
}

impl ServoCommand {
    pub fn on() -> Self {
        Self { on: true }
    }

    pub fn off() -> Self {
        Self { on: false }
    }

    /// 转换为 CAN 帧
    pub fn to_frame(self) -> AllegroFrame {
        let id = if self.on {
            ID_CMD_SYSTEM_ON
        } else {
            ID_CMD_SYSTEM_OFF
        };
        AllegroFrame::new_standard(id as u16, &[])
    }
}

/// 上报周期设置指令 (0x81)
///
/// 三个小端 i16，单位毫秒：关节位置、IMU、温度。0 表示不上报；
/// 全部为 0 即停止上报（断开前使用）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetPeriodCommand {
    pub position_ms: i16,
    pub imu_ms: i16,
    pub temperature_ms: i16,
}

impl SetPeriodCommand {
    pub fn new(position_ms: i16, imu_ms: i16, temperature_ms: i16) -> Self {
        Self {
            position_ms,
            imu_ms,
            temperature_ms,
        }
    }

    /// 停止全部上报
    pub fn stop() -> Self {
        Self::default()
    }

    /// 转换为 CAN 帧
    pub fn to_frame(self) -> AllegroFrame {
        let mut data = [0u8; 6];
        data[0..2].copy_from_slice(&i16_to_bytes_le(self.position_ms));
        data[2..4].copy_from_slice(&i16_to_bytes_le(self.imu_ms));
        data[4..6].copy_from_slice(&i16_to_bytes_le(self.temperature_ms));
        AllegroFrame::new_standard(ID_CMD_SET_PERIOD as u16, &data)
    }
}

/// 单根手指的 PWM 力矩指令 (0x60~0x63)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TorqueCommand {
    pub group: FingerGroup,
    pub pwm: [i16; JOINTS_PER_FINGER],
}

impl TorqueCommand {
    pub fn new(group: FingerGroup, pwm: [i16; JOINTS_PER_FINGER]) -> Self {
        Self { group, pwm }
    }

    /// 转换为 CAN 帧
    pub fn to_frame(self) -> AllegroFrame {
        let mut data = [0u8; 8];
        for (i, value) in self.pwm.iter().enumerate() {
            data[i * 2..i * 2 + 2].copy_from_slice(&i16_to_bytes_le(*value));
        }
        let id = ID_CMD_SET_TORQUE_BASE + self.group as u32;
        AllegroFrame::new_standard(id as u16, &data)
    }
}

/// 远程请求类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoRequest {
    /// 手部信息（硬件 / 固件版本、左右手、温度、状态）
    HandInfo,
    /// 序列号
    Serial,
}

impl InfoRequest {
    /// 转换为 RTR 帧
    pub fn to_frame(self) -> AllegroFrame {
        let id = match self {
            InfoRequest::HandInfo => ID_RTR_HAND_INFO,
            InfoRequest::Serial => ID_RTR_SERIAL,
        };
        AllegroFrame::new_remote(id as u16)
    }
}
