//! # Allegro Protocol
//!
//! Allegro 灵巧手 CAN 总线协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `ids`: CAN ID 常量定义
//! - `joint`: 关节 / 手指分组标识
//! - `limits`: 硬件版本、电压等级与 PWM 上限表
//! - `feedback`: 反馈帧解析（帧解码器）
//! - `control`: 控制帧构建
//!
//! ## 字节序
//!
//! 与机械臂协议不同，灵巧手协议的多字节整数全部使用 Intel（LSB）低位在前（小端字节序）。

pub mod control;
pub mod feedback;
pub mod ids;
pub mod joint;
pub mod limits;

// 重新导出常用类型
pub use control::*;
pub use feedback::*;
pub use ids::*;
pub use joint::*;
pub use limits::*;

/// CAN 2.0 标准帧的统一抽象
///
/// `AllegroFrame` 是协议层和硬件层之间的中间抽象：协议层只负责
/// 解析（[`decode`]）与构建（`*Command::to_frame()`），不关心底层是
/// SocketCAN 还是其它 CAN 后端。
///
/// ```text
/// Protocol Layer (allegro-protocol)
///     ↓ decode() 解析 / to_frame() 构建
/// AllegroFrame (此类型)
///     ↓ 转换逻辑在 CAN 层实现
/// CAN Layer (allegro-can)
///     ↓ SocketCAN / Mock 适配器
/// Hardware
/// ```
///
/// # 转换示例
///
/// ```rust
/// use allegro_protocol::AllegroFrame;
///
/// let frame = AllegroFrame::new_standard(0x20, &[1, 2, 3, 4]);
/// assert_eq!(frame.id(), 0x20);
/// assert_eq!(frame.data_slice(), &[1, 2, 3, 4]);
///
/// // 远程请求帧（RTR），没有数据
/// let request = AllegroFrame::new_remote(0x80);
/// assert!(request.is_remote);
/// assert_eq!(request.len, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllegroFrame {
    /// CAN ID（11-bit 标准帧）
    pub id: u32,

    /// 帧数据（固定 8 字节，未使用部分为 0）
    pub data: [u8; 8],

    /// 有效数据长度 (0-8)
    pub len: u8,

    /// 是否为远程请求帧（RTR）
    pub is_remote: bool,
}

impl AllegroFrame {
    /// 创建标准数据帧
    pub fn new_standard(id: u16, data: &[u8]) -> Self {
        let mut fixed_data = [0u8; 8];
        let len = data.len().min(8);
        fixed_data[..len].copy_from_slice(&data[..len]);

        Self {
            id: id as u32,
            data: fixed_data,
            len: len as u8,
            is_remote: false,
        }
    }

    /// 创建远程请求帧（RTR，长度为 0）
    pub fn new_remote(id: u16) -> Self {
        Self {
            id: id as u32,
            data: [0u8; 8],
            len: 0,
            is_remote: true,
        }
    }

    /// 获取数据切片（只包含有效数据）
    pub fn data_slice(&self) -> &[u8] {
        &self.data[..(self.len as usize).min(8)]
    }

    /// 获取 CAN ID
    pub fn id(&self) -> u32 {
        self.id
    }

    /// 获取完整数据（8字节固定数组）
    pub fn data(&self) -> &[u8; 8] {
        &self.data
    }
}

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid frame length for CAN ID 0x{id:X}: expected at least {expected}, got {actual}")]
    InvalidLength {
        id: u32,
        expected: usize,
        actual: usize,
    },
}

/// 小端字节序转 i16
pub fn bytes_to_i16_le(bytes: [u8; 2]) -> i16 {
    i16::from_le_bytes(bytes)
}

/// 小端字节序转 i32
pub fn bytes_to_i32_le(bytes: [u8; 4]) -> i32 {
    i32::from_le_bytes(bytes)
}

/// i16 转小端字节序
pub fn i16_to_bytes_le(value: i16) -> [u8; 2] {
    value.to_le_bytes()
}
