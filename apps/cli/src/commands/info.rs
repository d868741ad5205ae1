//! 手部信息命令
//!
//! 连接后轮询，直到收到手部信息帧与序列号帧（或超时）。

use allegro_driver::HandConfig;
use anyhow::Result;
use clap::Args;

/// 手部信息命令参数
#[derive(Args, Debug)]
pub struct InfoCommand {
    /// 等待应答的超时时间（毫秒）
    #[arg(long, default_value_t = 500)]
    pub timeout_ms: u64,
}

impl InfoCommand {
    #[cfg(target_os = "linux")]
    pub fn execute(&self, config: HandConfig) -> Result<()> {
        use allegro_driver::DriverError;
        use std::time::{Duration, Instant};

        let mut hand = super::connect(config)?;
        let deadline = Instant::now() + Duration::from_millis(self.timeout_ms);

        while hand.hardware_info().is_none() || hand.serial_number().is_none() {
            if Instant::now() >= deadline {
                break;
            }
            match hand.poll_cycle() {
                Ok(_) => {},
                Err(DriverError::Stopped) => break,
                Err(e) => return Err(e.into()),
            }
            spin_sleep::sleep(Duration::from_millis(1));
        }

        match hand.hardware_info() {
            Some(hw) => {
                println!("硬件版本:   0x{:04X} ({:?})", hw.hardware_version, hw.revision());
                println!("固件版本:   0x{:04X}", hw.firmware_version);
                println!("左右手:     {}", hw.hand_side);
                println!("温度:       {} °C", hw.temperature_c);
                println!(
                    "状态:       servo_on={}, high_temp_fault={}, comm_fault={}",
                    hw.status.servo_on(),
                    hw.status.high_temperature_fault(),
                    hw.status.internal_comm_fault()
                );
            },
            None => println!("⚠️  未收到手部信息（{} ms 超时）", self.timeout_ms),
        }
        if let Some(limits) = hand.limits() {
            println!(
                "PWM 上限:   {} V, scale={}, ceilings={:?}",
                limits.voltage_class().volts(),
                limits.scale_constant(),
                limits.ceilings()
            );
        }
        match hand.serial_number() {
            Some(serial) => println!("序列号:     {}", serial),
            None => println!("⚠️  未收到序列号"),
        }

        hand.shutdown()?;
        Ok(())
    }
}
