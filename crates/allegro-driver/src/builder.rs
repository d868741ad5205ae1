//! Builder 模式实现
//!
//! 提供链式构造 `AllegroHand` 实例的便捷方式。

use crate::config::{CommPeriod, HandConfig};
use crate::error::DriverError;
use crate::estop::EmergencyStop;
use crate::hand::AllegroHand;
use allegro_can::{CanError, HandTransport};
#[cfg(target_os = "linux")]
use allegro_can::{CanTransport, SocketCanAdapter};
use tracing::debug;

/// AllegroHand Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use allegro_driver::{AllegroHandBuilder, CommPeriod, EmergencyStop};
///
/// let estop = EmergencyStop::new();
/// let hand = AllegroHandBuilder::new()
///     .channel("can0")
///     .comm_period(CommPeriod { position_ms: 3, imu_ms: 0, temperature_ms: 0 })
///     .emergency_stop(estop.clone())
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct AllegroHandBuilder {
    config: HandConfig,
    /// 外部提供的急停标志（不提供则新建）
    estop: Option<EmergencyStop>,
}

impl AllegroHandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置 CAN 通道名（如 "can0"）
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.config.can_channel = channel.into();
        self
    }

    /// 设置上报周期
    pub fn comm_period(mut self, period: CommPeriod) -> Self {
        self.config.period = period;
        self
    }

    /// 整体替换配置
    pub fn config(mut self, config: HandConfig) -> Self {
        self.config = config;
        self
    }

    /// 共享外部急停标志
    pub fn emergency_stop(mut self, estop: EmergencyStop) -> Self {
        self.estop = Some(estop);
        self
    }

    /// 用给定的打开函数构建驱动并执行启动序列
    ///
    /// 通道名和周期在打开通道之前校验。
    ///
    /// # 错误
    /// - `DriverError::InvalidConfig`: 通道名为空 / 周期超出范围
    /// - `DriverError::TransportOpen`: 打开通道失败
    /// - `DriverError::Transport`: 启动序列中发送失败
    pub fn build_with<T, F>(self, open: F) -> Result<AllegroHand<T>, DriverError>
    where
        T: HandTransport,
        F: FnOnce(&str) -> Result<T, CanError>,
    {
        let channel = self.config.validated_channel()?;
        let period = self.config.period.to_command()?;

        debug!("Opening CAN channel '{}'", channel);
        let transport = open(channel).map_err(DriverError::TransportOpen)?;

        let mut hand = AllegroHand::new(transport, self.estop.unwrap_or_default());
        hand.startup(period)?;
        Ok(hand)
    }

    /// 通过 SocketCAN 构建驱动
    #[cfg(target_os = "linux")]
    pub fn build(self) -> Result<AllegroHand<CanTransport<SocketCanAdapter>>, DriverError> {
        self.build_with(|channel| SocketCanAdapter::new(channel).map(CanTransport::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use allegro_can::{CanDeviceError, CanDeviceErrorKind, CanTransport, MockCanAdapter};

    #[test]
    fn test_empty_channel_fails_before_open() {
        let mut opened = false;
        let result = AllegroHandBuilder::new().channel(" \t ").build_with(|_| {
            opened = true;
            let (adapter, _handle) = MockCanAdapter::new();
            Ok(CanTransport::new(adapter))
        });
        assert!(matches!(result, Err(DriverError::InvalidConfig(_))));
        assert!(!opened);
    }

    #[test]
    fn test_channel_is_right_trimmed() {
        let (adapter, handle) = MockCanAdapter::new();
        let mut seen = String::new();
        let hand = AllegroHandBuilder::new()
            .channel("can1  \n")
            .build_with(|channel| {
                seen = channel.to_string();
                Ok(CanTransport::new(adapter))
            })
            .unwrap();
        assert_eq!(seen, "can1");
        assert_eq!(handle.sent().len(), 5);
        drop(hand);
    }

    #[test]
    fn test_open_failure_is_fatal() {
        let result = AllegroHandBuilder::new().build_with(|_| {
            Err::<CanTransport<MockCanAdapter>, _>(CanError::Device(CanDeviceError::new(
                CanDeviceErrorKind::NotFound,
                "no such device",
            )))
        });
        let err = result.unwrap_err();
        assert!(matches!(err, DriverError::TransportOpen(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_config_period_reaches_wire() {
        let (adapter, handle) = MockCanAdapter::new();
        let config = HandConfig::from_toml_str(
            "can_channel = \"vcan0\"\n[period]\nposition_ms = 5\nimu_ms = 10\n",
        )
        .unwrap();
        let _hand = AllegroHandBuilder::new()
            .config(config)
            .build_with(|_| Ok(CanTransport::new(adapter)))
            .unwrap();

        let period = handle.sent().into_iter().find(|f| f.id == 0x81).unwrap();
        assert_eq!(period.data_slice(), &[5, 0, 10, 0, 0, 0]);
    }

    #[test]
    fn test_shared_emergency_stop() {
        let (adapter, _handle) = MockCanAdapter::new();
        let estop = EmergencyStop::new();
        let hand = AllegroHandBuilder::new()
            .emergency_stop(estop.clone())
            .build_with(|_| Ok(CanTransport::new(adapter)))
            .unwrap();

        estop.trigger();
        assert!(hand.emergency_stop().is_engaged());
    }
}
