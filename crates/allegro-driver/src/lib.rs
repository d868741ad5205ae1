//! # Allegro Driver
//!
//! 灵巧手控制循环驱动：
//! - 关节状态存储（位置 + 就绪掩码 + 一次性捕获的硬件上限）
//! - 力矩 → PWM 转换（按关节上限对称钳位，向零截断）
//! - 轮询 / 指令周期门面，急停标志
//! - Builder 与 TOML 配置
//!
//! 驱动本身单线程、非阻塞，由外部调度器按固定周期驱动；
//! 急停标志是唯一跨线程共享的状态。

mod builder;
pub mod config;
pub mod converter;
mod error;
pub mod estop;
mod hand;
pub mod state;

pub use builder::AllegroHandBuilder;
pub use config::{CommPeriod, HandConfig};
pub use converter::convert;
pub use error::DriverError;
pub use estop::EmergencyStop;
pub use hand::{AllegroHand, PollReport, SHUTDOWN_SETTLE, STARTUP_SETTLE};
pub use state::{ApplyOutcome, Calibration, JointStateStore, ReadinessMask};

// 重新导出下层类型，调用方通常只需依赖本 crate
pub use allegro_can::{CanError, HandTransport};
pub use allegro_protocol::{FingerGroup, HandRevision, JOINT_COUNT, JointId, LimitTable};
