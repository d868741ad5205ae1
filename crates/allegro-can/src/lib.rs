//! # Allegro CAN Adapter Layer
//!
//! CAN 硬件抽象层，分两层 trait：
//!
//! - [`CanAdapter`]: 原始帧收发（SocketCAN / Mock 各自实现）
//! - [`HandTransport`]: 灵巧手传输原语（清空、设置周期、伺服开关、读帧、写力矩……）
//!
//! [`CanTransport`] 把任意 `CanAdapter` 包装成 `HandTransport`，
//! 驱动层只依赖 `HandTransport`。

use allegro_protocol::{FingerGroup, InfoRequest, JOINTS_PER_FINGER, SetPeriodCommand};
use thiserror::Error;

// 重新导出 allegro-protocol 中的 AllegroFrame
pub use allegro_protocol::AllegroFrame;

#[cfg(target_os = "linux")]
pub mod socketcan;

#[cfg(target_os = "linux")]
pub use socketcan::SocketCanAdapter;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCanAdapter, MockCanHandle};

mod transport;

pub use transport::CanTransport;

/// CAN 适配层统一错误类型
#[derive(Error, Debug)]
pub enum CanError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device Error: {0}")]
    Device(#[from] CanDeviceError),
    #[error("Buffer overflow")]
    BufferOverflow,
    #[error("Bus off")]
    BusOff,
    #[error("Channel closed")]
    Closed,
}

/// 设备/后端错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanDeviceErrorKind {
    Unknown,
    NotFound,
    NotUp,
    AccessDenied,
    InvalidFrame,
    Backend,
}

/// 结构化设备错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct CanDeviceError {
    pub kind: CanDeviceErrorKind,
    pub message: String,
}

impl CanDeviceError {
    pub fn new(kind: CanDeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            CanDeviceErrorKind::NotFound
                | CanDeviceErrorKind::NotUp
                | CanDeviceErrorKind::AccessDenied
        )
    }
}

impl From<String> for CanDeviceError {
    fn from(message: String) -> Self {
        Self::new(CanDeviceErrorKind::Unknown, message)
    }
}

impl From<&str> for CanDeviceError {
    fn from(message: &str) -> Self {
        Self::new(CanDeviceErrorKind::Unknown, message)
    }
}

/// 原始 CAN 帧收发
pub trait CanAdapter {
    /// 发送帧（Fire-and-Forget）
    fn send(&mut self, frame: AllegroFrame) -> Result<(), CanError>;

    /// 非阻塞接收：接收队列为空时返回 `Ok(None)`，不是错误
    fn try_receive(&mut self) -> Result<Option<AllegroFrame>, CanError>;

    /// 丢弃接收队列中已有的全部帧，返回丢弃数量
    fn flush_receive(&mut self) -> Result<usize, CanError> {
        let mut dropped = 0;
        while self.try_receive()?.is_some() {
            dropped += 1;
        }
        Ok(dropped)
    }

    /// 关闭通道
    fn close(&mut self) -> Result<(), CanError> {
        Ok(())
    }
}

/// 灵巧手传输原语
///
/// 打开通道由具体实现的构造函数负责（如 [`SocketCanAdapter::new`]）。
pub trait HandTransport {
    /// 清空接收缓冲
    fn flush(&mut self) -> Result<(), CanError>;

    /// 设置上报周期（全 0 表示停止上报）
    fn set_period(&mut self, period: SetPeriodCommand) -> Result<(), CanError>;

    /// 伺服上电
    fn servo_on(&mut self) -> Result<(), CanError>;

    /// 伺服断电
    fn servo_off(&mut self) -> Result<(), CanError>;

    /// 发送手部信息 / 序列号远程请求
    fn request_info(&mut self, request: InfoRequest) -> Result<(), CanError>;

    /// 非阻塞读帧，没有待处理帧时返回 `Ok(None)`
    fn read_frame(&mut self) -> Result<Option<AllegroFrame>, CanError>;

    /// 写一根手指的 4 个 PWM 值
    fn write_torque(
        &mut self,
        group: FingerGroup,
        pwm: [i16; JOINTS_PER_FINGER],
    ) -> Result<(), CanError>;

    /// 关闭通道
    fn close(&mut self) -> Result<(), CanError>;
}
