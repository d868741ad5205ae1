//! 监控命令
//!
//! 固定周期驱动轮询 / 指令循环（零力矩），按指定频率打印关节角度。
//! Ctrl-C 触发急停后退出。

use allegro_driver::HandConfig;
use anyhow::{Context, Result};
use clap::Args;
use std::time::Duration;

/// 监控命令参数
#[derive(Args, Debug)]
pub struct MonitorCommand {
    /// 控制周期（毫秒）
    #[arg(long, default_value_t = 3)]
    pub period_ms: u64,

    /// 关节位置上报周期（毫秒，覆盖配置）
    #[arg(long)]
    pub position_period_ms: Option<u16>,

    /// 打印频率（Hz）
    #[arg(short, long, default_value_t = 10)]
    pub frequency: u32,

    /// 运行时长（秒），不指定则运行到 Ctrl-C
    #[arg(long)]
    pub duration_s: Option<f64>,
}

impl MonitorCommand {
    /// 每隔多少个控制周期打印一次
    fn print_every(&self) -> u64 {
        let period_ms = self.period_ms.max(1);
        let print_ms = 1000 / u64::from(self.frequency.max(1));
        (print_ms / period_ms).max(1)
    }

    /// 运行时长，负数 / NaN / 无穷大报错
    fn run_duration(&self) -> Result<Option<Duration>> {
        self.duration_s
            .map(|s| {
                Duration::try_from_secs_f64(s)
                    .with_context(|| format!("Invalid --duration-s value: {}", s))
            })
            .transpose()
    }

    #[cfg(target_os = "linux")]
    pub fn execute(&self, mut config: HandConfig) -> Result<()> {
        use allegro_driver::{DriverError, JOINT_COUNT};
        use std::time::Instant;
        use tracing::{info, warn};

        if let Some(position_ms) = self.position_period_ms {
            config.period.position_ms = position_ms;
        }

        let run_for = self.run_duration()?;
        let mut hand = super::connect(config)?;
        let period = Duration::from_millis(self.period_ms.max(1));
        let stop_at = match run_for {
            Some(d) => Some(
                Instant::now()
                    .checked_add(d)
                    .context("--duration-s is too large")?,
            ),
            None => None,
        };
        let torque = [0.0; JOINT_COUNT];
        let print_every = self.print_every();

        println!("▶️  控制循环启动（{:?} 周期），Ctrl-C 退出", period);
        let mut next = Instant::now();
        let mut tick: u64 = 0;
        let mut not_ready: u64 = 0;

        loop {
            if stop_at.is_some_and(|t| Instant::now() >= t) {
                break;
            }

            match hand.poll_cycle() {
                Ok(report) if report.dropped > 0 => {
                    warn!("Dropped {} malformed frames", report.dropped)
                },
                Ok(_) => {},
                Err(DriverError::Stopped) => break,
                Err(e) => return Err(e.into()),
            }

            match hand.command_cycle(&torque) {
                Ok(()) => hand.reset_readiness(),
                Err(DriverError::NotReady) => not_ready += 1,
                Err(DriverError::Stopped) => break,
                Err(e) => return Err(e.into()),
            }

            if tick % print_every == 0 {
                let degrees: Vec<String> = hand
                    .positions()
                    .iter()
                    .map(|rad| format!("{:7.2}", rad.to_degrees()))
                    .collect();
                println!("[{:>8}] {}", tick, degrees.join(" "));
            }
            tick += 1;

            next += period;
            let now = Instant::now();
            if next > now {
                spin_sleep::sleep(next - now);
            } else {
                next = now;
            }
        }

        info!("Control loop finished: {} ticks, {} not ready", tick, not_ready);
        if hand.emergency_stop().is_engaged() {
            println!("🛑 急停已触发");
        }
        hand.shutdown()?;
        println!("✅ 已断开");
        Ok(())
    }
}
