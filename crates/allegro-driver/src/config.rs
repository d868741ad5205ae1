//! 驱动配置
//!
//! 可从 TOML 加载：
//!
//! ```toml
//! can_channel = "can0"
//!
//! [period]
//! position_ms = 3
//! imu_ms = 0
//! temperature_ms = 0
//! ```

use crate::error::DriverError;
use allegro_protocol::SetPeriodCommand;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 默认 CAN 通道
pub const DEFAULT_CAN_CHANNEL: &str = "can0";

/// 默认位置上报周期（毫秒）
pub const DEFAULT_POSITION_PERIOD_MS: u16 = 3;

/// 上报周期（毫秒），0 表示不上报
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommPeriod {
    pub position_ms: u16,
    pub imu_ms: u16,
    pub temperature_ms: u16,
}

impl Default for CommPeriod {
    fn default() -> Self {
        Self {
            position_ms: DEFAULT_POSITION_PERIOD_MS,
            imu_ms: 0,
            temperature_ms: 0,
        }
    }
}

impl CommPeriod {
    /// 转为设置周期指令
    ///
    /// 线上格式为有符号 16 位，超过 `i16::MAX` 的周期视为配置错误。
    pub fn to_command(self) -> Result<SetPeriodCommand, DriverError> {
        let field = |name: &str, value: u16| {
            i16::try_from(value).map_err(|_| {
                DriverError::InvalidConfig(format!(
                    "period.{} = {} exceeds {} ms",
                    name,
                    value,
                    i16::MAX
                ))
            })
        };
        Ok(SetPeriodCommand::new(
            field("position_ms", self.position_ms)?,
            field("imu_ms", self.imu_ms)?,
            field("temperature_ms", self.temperature_ms)?,
        ))
    }
}

/// 灵巧手驱动配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandConfig {
    /// CAN 通道名（如 "can0"）
    pub can_channel: String,
    /// 上报周期
    pub period: CommPeriod,
}

impl Default for HandConfig {
    fn default() -> Self {
        Self {
            can_channel: DEFAULT_CAN_CHANNEL.to_string(),
            period: CommPeriod::default(),
        }
    }
}

impl HandConfig {
    /// 从 TOML 字符串解析
    pub fn from_toml_str(content: &str) -> Result<Self, DriverError> {
        toml::from_str(content).map_err(|e| DriverError::InvalidConfig(e.to_string()))
    }

    /// 从 TOML 文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DriverError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            DriverError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, DriverError> {
        toml::to_string(self).map_err(|e| DriverError::InvalidConfig(e.to_string()))
    }

    /// 校验后的通道名（去掉末尾空白）
    ///
    /// # 错误
    /// - `DriverError::InvalidConfig`: 通道名为空或全是空白
    pub fn validated_channel(&self) -> Result<&str, DriverError> {
        validate_channel(&self.can_channel)
    }
}

/// 去掉末尾空白，空串视为配置错误
pub fn validate_channel(channel: &str) -> Result<&str, DriverError> {
    let trimmed = channel.trim_end();
    if trimmed.is_empty() {
        return Err(DriverError::InvalidConfig(
            "CAN channel name is empty".to_string(),
        ));
    }
    Ok(trimmed)
}
