//! # Allegro CLI
//!
//! Command-line bench tool for Allegro robotic hands.
//!
//! ```bash
//! # 读取手部信息与序列号
//! allegro-cli --channel can0 info
//!
//! # 以 3 ms 周期驱动轮询 / 指令循环（零力矩），打印关节角度
//! allegro-cli --config hand.toml monitor --period-ms 3
//!
//! # 输出默认配置
//! allegro-cli config > hand.toml
//! ```
//!
//! Ctrl-C 触发急停，控制循环在下一个周期退出并关闭通道。

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{ConfigCommand, InfoCommand, MonitorCommand};

/// Allegro CLI - 灵巧手命令行工具
#[derive(Parser, Debug)]
#[command(name = "allegro-cli")]
#[command(about = "Command-line bench tool for Allegro robotic hands", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML 配置文件
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// CAN 通道（覆盖配置文件）
    #[arg(long, global = true)]
    channel: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 读取手部信息与序列号
    Info {
        #[command(flatten)]
        args: InfoCommand,
    },

    /// 运行控制循环并打印关节角度
    Monitor {
        #[command(flatten)]
        args: MonitorCommand,
    },

    /// 输出生效配置（TOML）
    Config {
        #[command(flatten)]
        args: ConfigCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("allegro_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = commands::resolve_config(cli.config.as_deref(), cli.channel.as_deref())?;

    match cli.command {
        #[cfg(target_os = "linux")]
        Commands::Info { args } => args.execute(config),
        #[cfg(target_os = "linux")]
        Commands::Monitor { args } => args.execute(config),
        #[cfg(not(target_os = "linux"))]
        Commands::Info { .. } | Commands::Monitor { .. } => {
            anyhow::bail!("SocketCAN is only available on Linux")
        },
        Commands::Config { args } => args.execute(&config),
    }
}
