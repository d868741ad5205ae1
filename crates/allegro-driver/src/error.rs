//! 驱动层错误类型定义

use allegro_can::CanError;
use allegro_protocol::ProtocolError;
use thiserror::Error;

/// 驱动层错误类型
///
/// 每个传输层调用的失败在返回调用方之前都会被归入下列某一类。
#[derive(Error, Debug)]
pub enum DriverError {
    /// 配置无效（如 CAN 通道名为空），启动时致命，不重试
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// 打开 CAN 通道失败，启动时致命，不重试
    #[error("Failed to open CAN channel: {0}")]
    TransportOpen(#[source] CanError),

    /// 运行期传输错误
    #[error("CAN transport error: {0}")]
    Transport(#[from] CanError),

    /// 帧格式错误
    ///
    /// 不会从 `poll_cycle` 返回：该帧被丢弃、记入 `PollReport::dropped` 并打日志，
    /// 本变体只用于分类（`is_transient`）和日志格式。
    #[error("Malformed frame: {0}")]
    MalformedFrame(#[from] ProtocolError),

    /// 尚未收齐 4 根手指的位置帧（预热期，下个周期重试）
    #[error("Hand not ready: waiting for all finger groups to report")]
    NotReady,

    /// 急停已触发
    #[error("Emergency stop engaged")]
    Stopped,
}

impl DriverError {
    /// 启动期致命错误，不应重试
    pub fn is_fatal(&self) -> bool {
        matches!(self, DriverError::InvalidConfig(_) | DriverError::TransportOpen(_))
    }

    /// 预期中的暂态，下个周期重试即可
    pub fn is_transient(&self) -> bool {
        matches!(self, DriverError::NotReady | DriverError::MalformedFrame(_))
    }
}
