//! 灵巧手驱动门面
//!
//! 外部调度器按固定周期依次调用 [`AllegroHand::poll_cycle`] 和
//! [`AllegroHand::command_cycle`]。驱动内部不开线程，也不阻塞：
//! 读帧是非阻塞的，队列暂时为空不是错误。
//!
//! 急停的两种周期行为不对称：
//! - 轮询周期在访问传输层之前直接返回 `Stopped`
//! - 指令周期照常计算并发送 PWM，之后再返回 `Stopped`
//!   （停止力矩输出需要主动写出指令，而不是什么都不写）

use crate::converter::{convert, finger_pwm};
use crate::error::DriverError;
use crate::estop::EmergencyStop;
use crate::state::JointStateStore;
use allegro_can::HandTransport;
use allegro_protocol::{
    FingerGroup, HardwareInfo, InfoRequest, JOINT_COUNT, LimitTable, SerialNumber,
    SetPeriodCommand, decode,
};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// 启动序列中每一步之后的等待时间
pub const STARTUP_SETTLE: Duration = Duration::from_micros(100);

/// 停止上报后、关闭通道前的等待时间
pub const SHUTDOWN_SETTLE: Duration = Duration::from_millis(10);

/// 一次轮询周期的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    /// 成功解码并应用的帧数
    pub applied: usize,
    /// 因格式错误被丢弃的帧数
    pub dropped: usize,
}

/// 灵巧手驱动
///
/// 通过 [`AllegroHandBuilder`](crate::AllegroHandBuilder) 创建。
/// Drop 时自动停止上报并关闭通道。
///
/// # 示例
///
/// ```no_run
/// use allegro_driver::{AllegroHandBuilder, DriverError};
///
/// let mut hand = AllegroHandBuilder::new().channel("can0").build()?;
/// let torque = [0.0; 16];
/// loop {
///     hand.poll_cycle()?;
///     match hand.command_cycle(&torque) {
///         Ok(()) | Err(DriverError::NotReady) => {},
///         Err(e) => return Err(e),
///     }
///     hand.reset_readiness();
///     std::thread::sleep(std::time::Duration::from_millis(3));
/// }
/// # Ok::<(), DriverError>(())
/// ```
#[derive(Debug)]
pub struct AllegroHand<T: HandTransport> {
    transport: T,
    store: JointStateStore,
    /// 期望力矩（整体覆盖，不支持部分更新）
    desired_torque: [f64; JOINT_COUNT],
    /// 最近一次发出的 PWM
    last_pwm: [i16; JOINT_COUNT],
    estop: EmergencyStop,
    closed: bool,
}

impl<T: HandTransport> AllegroHand<T> {
    pub(crate) fn new(transport: T, estop: EmergencyStop) -> Self {
        Self {
            transport,
            store: JointStateStore::new(),
            desired_torque: [0.0; JOINT_COUNT],
            last_pwm: [0; JOINT_COUNT],
            estop,
            closed: false,
        }
    }

    /// 启动序列：清空 → 伺服断电 → 请求手部信息 → 请求序列号 → 设置周期 → 伺服上电
    pub(crate) fn startup(&mut self, period: SetPeriodCommand) -> Result<(), DriverError> {
        self.transport.flush()?;
        spin_sleep::sleep(STARTUP_SETTLE);
        self.transport.servo_off()?;
        spin_sleep::sleep(STARTUP_SETTLE);
        self.transport.request_info(InfoRequest::HandInfo)?;
        spin_sleep::sleep(STARTUP_SETTLE);
        self.transport.request_info(InfoRequest::Serial)?;
        spin_sleep::sleep(STARTUP_SETTLE);
        self.transport.set_period(period)?;
        spin_sleep::sleep(STARTUP_SETTLE);
        self.transport.servo_on()?;
        spin_sleep::sleep(STARTUP_SETTLE);

        info!(
            "Hand started: position={} ms, imu={} ms, temperature={} ms",
            period.position_ms, period.imu_ms, period.temperature_ms
        );
        Ok(())
    }

    /// 轮询周期：取出全部待处理帧并写入状态存储
    ///
    /// # 错误
    /// - `DriverError::Stopped`: 急停已触发（不访问传输层）
    /// - `DriverError::Transport`: 读帧失败（此前已读到的帧仍然生效）
    pub fn poll_cycle(&mut self) -> Result<PollReport, DriverError> {
        if self.estop.is_engaged() {
            return Err(DriverError::Stopped);
        }

        let mut report = PollReport::default();
        while let Some(frame) = self.transport.read_frame()? {
            match decode(&frame) {
                Ok(event) => {
                    self.store.apply_event(&event);
                    report.applied += 1;
                },
                Err(e) => {
                    let err = DriverError::from(e);
                    warn!("Dropping frame 0x{:03X}: {}", frame.id, err);
                    report.dropped += 1;
                },
            }
        }

        trace!(
            "Poll cycle: applied={}, dropped={}, ready={}",
            report.applied,
            report.dropped,
            self.store.is_ready()
        );
        Ok(report)
    }

    /// 设置期望力矩（16 个值整体覆盖）
    pub fn set_torque(&mut self, desired: &[f64; JOINT_COUNT]) {
        self.desired_torque = *desired;
    }

    /// 指令周期：设置期望力矩后立即转换并发送
    ///
    /// # 错误
    /// - `DriverError::NotReady`: 尚未收齐 4 根手指的位置帧（不发送）
    /// - `DriverError::Stopped`: 急停已触发（PWM 已发送）
    /// - `DriverError::Transport`: 写帧失败（4 根手指都会尝试发送）
    pub fn command_cycle(&mut self, desired: &[f64; JOINT_COUNT]) -> Result<(), DriverError> {
        self.set_torque(desired);
        self.write_cycle()
    }

    /// 按当前期望力矩转换并发送 4 个力矩帧
    pub fn write_cycle(&mut self) -> Result<(), DriverError> {
        if !self.store.is_ready() {
            if self.estop.is_engaged() {
                return Err(DriverError::Stopped);
            }
            return Err(DriverError::NotReady);
        }

        if self.store.limits().is_none() {
            debug!("Hand info not received yet, sending zero PWM");
        }
        let pwm = convert(&self.desired_torque, self.store.limits());

        let mut write_error = None;
        for group in FingerGroup::ALL {
            if let Err(e) = self.transport.write_torque(group, finger_pwm(&pwm, group)) {
                warn!("Failed to write torque for {:?}: {}", group, e);
                write_error.get_or_insert(e);
            }
        }
        self.last_pwm = pwm;

        if self.estop.is_engaged() {
            error!("Emergency stop engaged during command cycle");
            return Err(DriverError::Stopped);
        }
        match write_error {
            Some(e) => Err(DriverError::Transport(e)),
            None => Ok(()),
        }
    }

    /// 4 根手指是否全部就绪
    pub fn is_ready(&self) -> bool {
        self.store.is_ready()
    }

    /// 清空就绪掩码（位置保留）
    pub fn reset_readiness(&mut self) {
        self.store.reset_readiness();
    }

    /// 最近一次已知的关节位置（弧度）
    pub fn positions(&self) -> [f64; JOINT_COUNT] {
        self.store.positions()
    }

    pub fn desired_torque(&self) -> &[f64; JOINT_COUNT] {
        &self.desired_torque
    }

    pub fn last_pwm(&self) -> &[i16; JOINT_COUNT] {
        &self.last_pwm
    }

    pub fn limits(&self) -> Option<&LimitTable> {
        self.store.limits()
    }

    pub fn hardware_info(&self) -> Option<&HardwareInfo> {
        self.store.hardware_info()
    }

    pub fn serial_number(&self) -> Option<&SerialNumber> {
        self.store.serial_number()
    }

    pub fn state(&self) -> &JointStateStore {
        &self.store
    }

    /// 急停句柄（与驱动共享同一个标志）
    pub fn emergency_stop(&self) -> EmergencyStop {
        self.estop.clone()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 停止上报并关闭通道（幂等）
    pub fn shutdown(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let stop_result = self.transport.set_period(SetPeriodCommand::stop());
        spin_sleep::sleep(SHUTDOWN_SETTLE);
        let close_result = self.transport.close();

        stop_result?;
        close_result?;
        info!("Hand connection closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<T: HandTransport> Drop for AllegroHand<T> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("[Auto-Drop] Failed to shut down hand cleanly: {}", e);
        }
    }
}
