//! 配置输出命令
//!
//! 打印合并命令行覆盖后的生效配置，可直接重定向为配置文件。

use allegro_driver::HandConfig;
use anyhow::Result;
use clap::Args;

/// 配置命令参数
#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// 只校验，不输出
    #[arg(long)]
    pub check: bool,
}

impl ConfigCommand {
    pub fn execute(&self, config: &HandConfig) -> Result<()> {
        let channel = config.validated_channel()?;
        config.period.to_command()?;

        if self.check {
            println!("✅ 配置有效（通道 {}）", channel);
        } else {
            print!("{}", config.to_toml_string()?);
        }
        Ok(())
    }
}
