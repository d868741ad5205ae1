//! 关节状态存储
//!
//! 保存最近一次解码得到的 16 个关节位置、4 根手指的就绪掩码，
//! 以及首次收到手部信息帧时一次性捕获的硬件参数（上限表）。
//!
//! 存储只在控制循环线程内使用，不需要任何同步。

use allegro_protocol::{
    DecodedEvent, FINGER_COUNT, FingerGroup, HandRevision, HardwareInfo, JOINT_COUNT, LimitTable,
    SerialNumber,
};
use tracing::{debug, info, trace, warn};

/// 就绪掩码：每根手指一位
///
/// 自上次清空以来，某根手指的位置帧被解码过，对应位才会置位。
/// 存储不会自动清空，需要"只看本周期数据"语义的调用方自行调用 [`clear`](Self::clear)。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadinessMask([bool; FINGER_COUNT]);

impl ReadinessMask {
    pub fn new() -> Self {
        Self::default()
    }

    /// 置位（按位或语义，重复置位无副作用）
    ///
    /// 返回该位此前是否未置位。
    pub fn mark(&mut self, group: FingerGroup) -> bool {
        let was_set = self.0[group.index()];
        self.0[group.index()] = true;
        !was_set
    }

    pub fn is_set(&self, group: FingerGroup) -> bool {
        self.0[group.index()]
    }

    /// 4 根手指是否全部就绪
    pub fn is_complete(&self) -> bool {
        self.0.iter().all(|&set| set)
    }

    pub fn clear(&mut self) {
        self.0 = [false; FINGER_COUNT];
    }

    /// 已置位数量
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&set| set).count()
    }

    /// 位表示（Bit N = 第 N 根手指），仅用于日志
    pub fn bits(&self) -> u8 {
        self.0
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &set)| if set { acc | (1 << i) } else { acc })
    }
}

/// 硬件参数捕获状态
///
/// `Uninitialized` → `Calibrated` 只发生一次，之后在整个连接期间保持不变。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Calibration {
    #[default]
    Uninitialized,
    Calibrated(LimitTable),
}

impl Calibration {
    pub fn limits(&self) -> Option<&LimitTable> {
        match self {
            Calibration::Uninitialized => None,
            Calibration::Calibrated(table) => Some(table),
        }
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self, Calibration::Calibrated(_))
    }
}

/// [`JointStateStore::apply_event`] 的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// 首个手部信息帧，上限表已生成
    Calibrated(HandRevision),
    /// 后续手部信息帧，只更新显示字段
    HardwareInfoUpdated,
    /// 某根手指的 4 个关节位置已更新
    PositionUpdated(FingerGroup),
    /// 仅用于诊断，无状态变化
    Diagnostic,
}

/// 关节状态存储
#[derive(Debug, Clone, Default)]
pub struct JointStateStore {
    /// 关节位置（弧度），按关节序号排列
    positions: [f64; JOINT_COUNT],
    readiness: ReadinessMask,
    calibration: Calibration,
    /// 最近一次手部信息（显示用）
    hardware_info: Option<HardwareInfo>,
    /// 最近一次序列号（显示用）
    serial_number: Option<SerialNumber>,
}

impl JointStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 应用一个解码事件
    pub fn apply_event(&mut self, event: &DecodedEvent) -> ApplyOutcome {
        match event {
            DecodedEvent::HardwareInfo(hw) => self.apply_hardware_info(hw),
            DecodedEvent::SerialNumber(serial) => {
                info!("Serial number: {}", serial);
                self.serial_number = Some(*serial);
                ApplyOutcome::Diagnostic
            },
            DecodedEvent::JointPosition(position) => {
                let group = position.group;
                let base = group.index() * allegro_protocol::JOINTS_PER_FINGER;
                let radians = position.radians();
                self.positions[base..base + radians.len()].copy_from_slice(&radians);

                if self.readiness.mark(group) {
                    trace!(
                        "Finger {:?} ready, mask={:04b}",
                        group,
                        self.readiness.bits()
                    );
                }
                ApplyOutcome::PositionUpdated(group)
            },
            DecodedEvent::ImuOrientation(imu) => {
                info!(
                    "IMU orientation: roll={}, pitch={}, yaw={}",
                    imu.roll, imu.pitch, imu.yaw
                );
                ApplyOutcome::Diagnostic
            },
            DecodedEvent::Temperature(temp) => {
                info!("Temperature sensor {}: {} °C", temp.sensor, temp.celsius);
                ApplyOutcome::Diagnostic
            },
            DecodedEvent::Diagnostic(diag) => {
                warn!(
                    "Unknown CAN frame: ID=0x{:X}, len={}, data={}",
                    diag.id,
                    diag.len,
                    hex::encode(diag.data_slice())
                );
                ApplyOutcome::Diagnostic
            },
        }
    }

    fn apply_hardware_info(&mut self, hw: &HardwareInfo) -> ApplyOutcome {
        let revision = hw.revision();
        info!(
            "Hand info: hw=0x{:04X}, fw=0x{:04X}, side={}, temp={} °C, servo_on={}, \
             high_temp_fault={}, comm_fault={}",
            hw.hardware_version,
            hw.firmware_version,
            hw.hand_side,
            hw.temperature_c,
            hw.status.servo_on(),
            hw.status.high_temperature_fault(),
            hw.status.internal_comm_fault()
        );
        self.hardware_info = Some(*hw);

        match self.calibration {
            Calibration::Uninitialized => {
                let table = LimitTable::for_revision(revision);
                debug!(
                    "Calibrated for {:?}: {} V class, scale={}, ceilings={:?}",
                    revision,
                    table.voltage_class().volts(),
                    table.scale_constant(),
                    table.ceilings()
                );
                self.calibration = Calibration::Calibrated(table);
                ApplyOutcome::Calibrated(revision)
            },
            Calibration::Calibrated(table) => {
                if table.revision() != revision {
                    warn!(
                        "Hand info reports {:?} but limits are calibrated for {:?}; keeping existing limits",
                        revision,
                        table.revision()
                    );
                }
                ApplyOutcome::HardwareInfoUpdated
            },
        }
    }

    /// 4 根手指是否全部就绪
    pub fn is_ready(&self) -> bool {
        self.readiness.is_complete()
    }

    /// 清空就绪掩码，保留已存储的位置
    pub fn reset_readiness(&mut self) {
        self.readiness.clear();
    }

    pub fn readiness(&self) -> ReadinessMask {
        self.readiness
    }

    /// 最近一次已知的 16 个关节位置（未就绪时同样返回，可能是旧值）
    pub fn positions(&self) -> [f64; JOINT_COUNT] {
        self.positions
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// 上限表（尚未收到手部信息帧时为 `None`）
    pub fn limits(&self) -> Option<&LimitTable> {
        self.calibration.limits()
    }

    pub fn hardware_info(&self) -> Option<&HardwareInfo> {
        self.hardware_info.as_ref()
    }

    pub fn serial_number(&self) -> Option<&SerialNumber> {
        self.serial_number.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use allegro_protocol::{Diagnostic, FingerPosition, decode_raw, ticks_to_radians};

    fn position_event(group: FingerGroup, raw: [i16; 4]) -> DecodedEvent {
        DecodedEvent::JointPosition(FingerPosition { group, raw })
    }

    fn hand_info_event(version_byte: u8) -> DecodedEvent {
        decode_raw(0x80, &[0x00, version_byte, 0x10, 0x00, 0x00, 30, 0x01]).unwrap()
    }

    #[test]
    fn test_readiness_mask_bits() {
        let mut mask = ReadinessMask::new();
        assert_eq!(mask.bits(), 0);
        assert!(mask.mark(FingerGroup::Middle));
        assert!(!mask.mark(FingerGroup::Middle));
        assert!(mask.mark(FingerGroup::Thumb));
        assert_eq!(mask.bits(), 0b1010);
        assert_eq!(mask.count(), 2);
        assert!(mask.is_set(FingerGroup::Thumb));
        assert!(!mask.is_set(FingerGroup::Index));

        mask.clear();
        assert_eq!(mask, ReadinessMask::new());
    }

    #[test]
    fn test_ready_after_fourth_group() {
        let mut store = JointStateStore::new();
        for (i, group) in FingerGroup::ALL.iter().enumerate() {
            assert!(!store.is_ready(), "ready too early at group {}", i);
            store.apply_event(&position_event(*group, [0; 4]));
        }
        assert!(store.is_ready());
    }

    #[test]
    fn test_reset_readiness_keeps_positions() {
        let mut store = JointStateStore::new();
        for group in FingerGroup::ALL {
            store.apply_event(&position_event(group, [6554, 0, -6554, 100]));
        }
        let before = store.positions();

        store.reset_readiness();
        assert!(!store.is_ready());
        assert_eq!(store.readiness().count(), 0);
        assert_eq!(store.positions(), before);
    }

    #[test]
    fn test_position_written_to_group_slots() {
        let mut store = JointStateStore::new();
        let outcome = store.apply_event(&position_event(FingerGroup::Pinky, [1, 2, 3, 4]));
        assert_eq!(outcome, ApplyOutcome::PositionUpdated(FingerGroup::Pinky));

        let positions = store.positions();
        assert_eq!(&positions[0..8], &[0.0; 8]);
        assert_eq!(positions[8], ticks_to_radians(1));
        assert_eq!(positions[11], ticks_to_radians(4));
        assert_eq!(&positions[12..16], &[0.0; 4]);
    }

    #[test]
    fn test_repeated_position_is_idempotent() {
        let mut store = JointStateStore::new();
        let event = position_event(FingerGroup::Index, [10, 20, 30, 40]);
        store.apply_event(&event);
        let once = (store.positions(), store.readiness());
        store.apply_event(&event);
        assert_eq!((store.positions(), store.readiness()), once);
    }

    #[test]
    fn test_first_hand_info_calibrates_12v() {
        let mut store = JointStateStore::new();
        assert!(store.limits().is_none());

        let outcome = store.apply_event(&hand_info_event(4));
        assert_eq!(outcome, ApplyOutcome::Calibrated(HandRevision::V4));

        let limits = store.limits().unwrap();
        assert_eq!(limits.voltage_class().global_ceiling(), 1200.0);
        assert_eq!(limits.ceilings()[0], 375.0);
        assert!(store.hardware_info().is_some());
    }

    #[test]
    fn test_later_hand_info_keeps_limits() {
        let mut store = JointStateStore::new();
        store.apply_event(&hand_info_event(1));
        let calibrated = *store.limits().unwrap();

        let outcome = store.apply_event(&hand_info_event(4));
        assert_eq!(outcome, ApplyOutcome::HardwareInfoUpdated);
        assert_eq!(store.limits(), Some(&calibrated));
        assert_eq!(store.limits().unwrap().revision(), HandRevision::V1);
        // 显示字段跟随最新一帧
        assert_eq!(store.hardware_info().unwrap().revision(), HandRevision::V4);
    }

    #[test]
    fn test_diagnostic_events_do_not_mutate() {
        let mut store = JointStateStore::new();
        let events = [
            decode_raw(0x30, &[0, 1, 0, 2, 0, 3]).unwrap(),
            decode_raw(0x39, &[25, 0, 0, 0]).unwrap(),
            DecodedEvent::Diagnostic(Diagnostic {
                id: 0x123,
                len: 2,
                data: [0xAB, 0xCD, 0, 0, 0, 0, 0, 0],
            }),
        ];
        for event in &events {
            assert_eq!(store.apply_event(event), ApplyOutcome::Diagnostic);
        }
        assert_eq!(store.positions(), [0.0; JOINT_COUNT]);
        assert_eq!(store.readiness().count(), 0);
        assert!(!store.calibration().is_calibrated());
    }

    #[test]
    fn test_serial_number_kept_for_display() {
        let mut store = JointStateStore::new();
        store.apply_event(&decode_raw(0x88, b"R123B456").unwrap());
        assert_eq!(store.serial_number().unwrap().to_ascii_lossy(), "R123B456");
    }
}
