//! 反馈帧结构体定义
//!
//! 帧解码器：把 `(CAN ID, 长度, 数据)` 解释为带类型的事件 [`DecodedEvent`]。
//! 解码是纯函数，对所有 ID 都有定义：未知 ID 得到 `Diagnostic` 事件而不是错误，
//! 只有数据长度不足时才返回 [`ProtocolError::InvalidLength`]。

use crate::ids::{
    GROUP_SELECTOR_MASK, ID_RTR_FINGER_POSE_BASE, ID_RTR_HAND_INFO, ID_RTR_IMU_DATA,
    ID_RTR_SERIAL, ID_RTR_TEMPERATURE_BASE,
};
use crate::joint::{FINGER_COUNT, FingerGroup, JOINTS_PER_FINGER};
use crate::limits::HandRevision;
use crate::{AllegroFrame, ProtocolError, bytes_to_i16_le, bytes_to_i32_le};
use bilge::prelude::*;

/// 编码器满量程对应的角度（度）
pub const POSITION_RANGE_DEG: f64 = 333.3;

/// 编码器满量程计数
pub const POSITION_TICKS_PER_RANGE: f64 = 65536.0;

/// 序列号显示前缀中的手部代数
pub const SERIAL_HAND_GENERATION: u8 = 4;

/// 原始编码器计数 → 弧度
pub fn ticks_to_radians(raw: i16) -> f64 {
    raw as f64 * (POSITION_RANGE_DEG / POSITION_TICKS_PER_RANGE) * (std::f64::consts::PI / 180.0)
}

/// 弧度 → 原始编码器计数（未取整，用于校验与仿真）
pub fn radians_to_ticks(rad: f64) -> f64 {
    rad / (std::f64::consts::PI / 180.0) / (POSITION_RANGE_DEG / POSITION_TICKS_PER_RANGE)
}

// ============================================================================
// 位域结构定义（使用 bilge）
// ============================================================================

/// 手部状态位域（手部信息帧 Byte 6）
///
/// - Bit 0: 伺服状态（1：ON）
/// - Bit 1: 高温故障
/// - Bit 2: 内部通信故障
/// - Bit 3-7: 保留
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq)]
pub struct HandStatus {
    pub servo_on: bool,               // Bit 0
    pub high_temperature_fault: bool, // Bit 1
    pub internal_comm_fault: bool,    // Bit 2
    pub reserved: u5,                 // Bit 3-7
}

/// 左右手
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandSide {
    Right,
    Left,
}

impl From<u8> for HandSide {
    fn from(value: u8) -> Self {
        match value {
            0 => HandSide::Right,
            _ => HandSide::Left,
        }
    }
}

impl std::fmt::Display for HandSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandSide::Right => write!(f, "right"),
            HandSide::Left => write!(f, "left"),
        }
    }
}

// ============================================================================
// 反馈帧结构体
// ============================================================================

/// 手部信息 (0x80)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HardwareInfo {
    pub hardware_version: u16, // Byte 0-1（小端）
    pub firmware_version: u16, // Byte 2-3（小端）
    pub hand_side: HandSide,   // Byte 4
    pub temperature_c: u8,     // Byte 5
    pub status_raw: u8,        // Byte 6
    pub status: HandStatus,    // Byte 6 (位域)
}

impl HardwareInfo {
    /// 最小数据长度
    pub const LEN: usize = 7;

    fn parse(data: &[u8]) -> Self {
        Self {
            hardware_version: u16::from_le_bytes([data[0], data[1]]),
            firmware_version: u16::from_le_bytes([data[2], data[3]]),
            hand_side: HandSide::from(data[4]),
            temperature_c: data[5],
            status_raw: data[6],
            status: HandStatus::from(u8::new(data[6])),
        }
    }

    /// 硬件版本（由硬件版本号高字节决定）
    pub fn revision(&self) -> HandRevision {
        HandRevision::from_version_byte((self.hardware_version >> 8) as u8)
    }
}

/// 序列号 (0x88)
///
/// 8 字节原始 ASCII，仅用于显示。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialNumber {
    pub bytes: [u8; 8],
}

impl SerialNumber {
    pub const LEN: usize = 8;

    /// 转为可显示字符串，不可打印字节替换为 `?`
    pub fn to_ascii_lossy(&self) -> String {
        self.bytes
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
            .collect()
    }
}

impl std::fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SAH0{}0 {}", SERIAL_HAND_GENERATION, self.to_ascii_lossy())
    }
}

/// 手指关节位置反馈 (0x20~0x23)
///
/// 4 个小端 i16 原始计数，对应该手指的 4 个关节。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerPosition {
    pub group: FingerGroup,
    pub raw: [i16; JOINTS_PER_FINGER],
}

impl FingerPosition {
    pub const LEN: usize = 8;

    fn parse(group: FingerGroup, data: &[u8]) -> Self {
        Self {
            group,
            raw: [
                bytes_to_i16_le([data[0], data[1]]),
                bytes_to_i16_le([data[2], data[3]]),
                bytes_to_i16_le([data[4], data[5]]),
                bytes_to_i16_le([data[6], data[7]]),
            ],
        }
    }

    /// 关节角度（弧度）
    pub fn radians(&self) -> [f64; JOINTS_PER_FINGER] {
        self.raw.map(ticks_to_radians)
    }
}

/// IMU 姿态 (0x30)
///
/// 每个分量两字节，高字节在前。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImuOrientation {
    pub roll: i16,
    pub pitch: i16,
    pub yaw: i16,
}

impl ImuOrientation {
    pub const LEN: usize = 6;

    fn parse(data: &[u8]) -> Self {
        Self {
            roll: i16::from_be_bytes([data[0], data[1]]),
            pitch: i16::from_be_bytes([data[2], data[3]]),
            yaw: i16::from_be_bytes([data[4], data[5]]),
        }
    }
}

/// 温度反馈 (0x38~0x3B)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Temperature {
    pub sensor: u8,
    pub celsius: i32, // Byte 0-3（小端）
}

impl Temperature {
    pub const LEN: usize = 4;
}

/// 未识别的帧，原样保留以便记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostic {
    pub id: u32,
    pub len: u8,
    pub data: [u8; 8],
}

impl Diagnostic {
    pub fn data_slice(&self) -> &[u8] {
        &self.data[..(self.len as usize).min(8)]
    }
}

/// 解码结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodedEvent {
    HardwareInfo(HardwareInfo),
    SerialNumber(SerialNumber),
    JointPosition(FingerPosition),
    ImuOrientation(ImuOrientation),
    Temperature(Temperature),
    Diagnostic(Diagnostic),
}

fn require(id: u32, data: &[u8], expected: usize) -> Result<(), ProtocolError> {
    if data.len() < expected {
        return Err(ProtocolError::InvalidLength {
            id,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

fn diagnostic(id: u32, payload: &[u8]) -> DecodedEvent {
    let mut data = [0u8; 8];
    let len = payload.len().min(8);
    data[..len].copy_from_slice(&payload[..len]);
    DecodedEvent::Diagnostic(Diagnostic {
        id,
        len: len as u8,
        data,
    })
}

/// 解码一帧原始数据
///
/// # 错误
/// - `ProtocolError::InvalidLength`: 数据短于该帧类型要求的长度（不补零）
pub fn decode_raw(id: u32, payload: &[u8]) -> Result<DecodedEvent, ProtocolError> {
    let selector = (id & GROUP_SELECTOR_MASK) as usize;

    match id {
        ID_RTR_HAND_INFO => {
            require(id, payload, HardwareInfo::LEN)?;
            Ok(DecodedEvent::HardwareInfo(HardwareInfo::parse(payload)))
        },
        ID_RTR_SERIAL => {
            require(id, payload, SerialNumber::LEN)?;
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&payload[..SerialNumber::LEN]);
            Ok(DecodedEvent::SerialNumber(SerialNumber { bytes }))
        },
        _ if id & !GROUP_SELECTOR_MASK == ID_RTR_FINGER_POSE_BASE => {
            // 分组选择位只有 0..3 对应真实手指
            let Ok(group) = FingerGroup::try_from(selector as u8) else {
                return Ok(diagnostic(id, payload));
            };
            require(id, payload, FingerPosition::LEN)?;
            Ok(DecodedEvent::JointPosition(FingerPosition::parse(group, payload)))
        },
        ID_RTR_IMU_DATA => {
            require(id, payload, ImuOrientation::LEN)?;
            Ok(DecodedEvent::ImuOrientation(ImuOrientation::parse(payload)))
        },
        _ if id & !GROUP_SELECTOR_MASK == ID_RTR_TEMPERATURE_BASE => {
            if selector >= FINGER_COUNT {
                return Ok(diagnostic(id, payload));
            }
            require(id, payload, Temperature::LEN)?;
            Ok(DecodedEvent::Temperature(Temperature {
                sensor: selector as u8,
                celsius: bytes_to_i32_le([payload[0], payload[1], payload[2], payload[3]]),
            }))
        },
        _ => Ok(diagnostic(id, payload)),
    }
}

/// 解码一个 CAN 帧
///
/// 收到的远程请求帧（RTR）不携带数据，一律视为诊断信息。
pub fn decode(frame: &AllegroFrame) -> Result<DecodedEvent, ProtocolError> {
    if frame.is_remote {
        return Ok(diagnostic(frame.id, &[]));
    }
    decode_raw(frame.id, frame.data_slice())
}

impl TryFrom<AllegroFrame> for DecodedEvent {
    type Error = ProtocolError;

    fn try_from(frame: AllegroFrame) -> Result<Self, Self::Error> {
        decode(&frame)
    }
}
