//! 命令定义和实现

pub mod config;
pub mod info;
pub mod monitor;

pub use config::ConfigCommand;
pub use info::InfoCommand;
pub use monitor::MonitorCommand;

#[cfg(target_os = "linux")]
use allegro_can::{CanTransport, SocketCanAdapter};
#[cfg(target_os = "linux")]
use allegro_driver::{AllegroHand, AllegroHandBuilder, EmergencyStop};
use allegro_driver::HandConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// 合并配置：配置文件（可选）+ 命令行覆盖
pub fn resolve_config(path: Option<&Path>, channel: Option<&str>) -> Result<HandConfig> {
    let mut config = match path {
        Some(path) => HandConfig::load(path)
            .with_context(|| format!("加载配置文件失败: {}", path.display()))?,
        None => HandConfig::default(),
    };
    if let Some(channel) = channel {
        config.can_channel = channel.to_string();
    }
    Ok(config)
}

/// SocketCAN 上的灵巧手驱动
#[cfg(target_os = "linux")]
pub type Hand = AllegroHand<CanTransport<SocketCanAdapter>>;

/// 连接灵巧手，Ctrl-C 触发急停
#[cfg(target_os = "linux")]
pub fn connect(config: HandConfig) -> Result<Hand> {
    let estop = EmergencyStop::new();
    let handler_estop = estop.clone();
    ctrlc::set_handler(move || {
        eprintln!("\n🛑 收到中断信号，触发急停...");
        handler_estop.trigger();
    })
    .context("注册 Ctrl-C 处理函数失败")?;

    println!("🔌 连接到 {} ...", config.can_channel.trim_end());
    let hand = AllegroHandBuilder::new()
        .config(config)
        .emergency_stop(estop)
        .build()?;
    Ok(hand)
}
