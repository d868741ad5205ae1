//! 驱动门面集成测试
//!
//! 通过 Mock CAN 适配器驱动完整的轮询 / 指令周期。

use allegro_can::{AllegroFrame, CanTransport, MockCanAdapter, MockCanHandle};
use allegro_driver::*;
use allegro_protocol::{ID_CMD_SET_TORQUE_BASE, ID_RTR_FINGER_POSE_BASE, ID_RTR_HAND_INFO};

type MockHand = AllegroHand<CanTransport<MockCanAdapter>>;

/// 建立连接并清掉启动序列发出的帧
fn connected_hand() -> (MockHand, MockCanHandle) {
    let (adapter, handle) = MockCanAdapter::new();
    let hand = AllegroHandBuilder::new()
        .channel("can0")
        .build_with(|_| Ok(CanTransport::new(adapter)))
        .unwrap();
    handle.take_sent();
    (hand, handle)
}

fn hand_info_frame(version_byte: u8) -> AllegroFrame {
    AllegroFrame::new_standard(
        ID_RTR_HAND_INFO as u16,
        &[
            0x00,         // Byte 0: 硬件版本低字节
            version_byte, // Byte 1: 硬件版本高字节
            0x10,         // Byte 2-3: 固件版本
            0x00,
            0x00, // Byte 4: 右手
            35,   // Byte 5: 温度
            0x01, // Byte 6: 伺服 ON
        ],
    )
}

fn position_frame(group: u8, raw: [i16; 4]) -> AllegroFrame {
    let mut data = [0u8; 8];
    for (i, value) in raw.iter().enumerate() {
        data[i * 2..i * 2 + 2].copy_from_slice(&value.to_le_bytes());
    }
    AllegroFrame::new_standard((ID_RTR_FINGER_POSE_BASE + group as u32) as u16, &data)
}

fn push_all_positions(handle: &MockCanHandle) {
    for group in 0..4 {
        handle.push_rx(position_frame(group, [0; 4]));
    }
}

fn torque_payload(frame: &AllegroFrame) -> [i16; 4] {
    let d = frame.data;
    [
        i16::from_le_bytes([d[0], d[1]]),
        i16::from_le_bytes([d[2], d[3]]),
        i16::from_le_bytes([d[4], d[5]]),
        i16::from_le_bytes([d[6], d[7]]),
    ]
}

#[test]
fn test_hand_info_calibrates_12v_limits() {
    let (mut hand, handle) = connected_hand();
    assert!(hand.limits().is_none());

    handle.push_rx(hand_info_frame(4));
    hand.poll_cycle().unwrap();

    let limits = hand.limits().unwrap();
    assert_eq!(limits.voltage_class().global_ceiling(), 1200.0);
    assert_eq!(limits.scale_constant(), 1200.0);
    assert_eq!(limits.ceiling(JointId::new(0).unwrap()), 375.0);
    assert_eq!(hand.hardware_info().unwrap().temperature_c, 35);
}

#[test]
fn test_position_tick_decodes_to_radians() {
    let (mut hand, handle) = connected_hand();
    handle.push_rx(position_frame(0, [6554, 0, 0, 0]));
    hand.poll_cycle().unwrap();

    let expected = 6554.0 * (333.3 / 65536.0) * (std::f64::consts::PI / 180.0);
    let actual = hand.positions()[0];
    assert!((actual - expected).abs() < 1e-12);
    assert!((actual - 0.5814).abs() < 1e-3);
}

#[test]
fn test_ready_only_after_all_four_groups() {
    let (mut hand, handle) = connected_hand();
    for group in 0..4u8 {
        assert!(!hand.is_ready());
        handle.push_rx(position_frame(group, [0; 4]));
        hand.poll_cycle().unwrap();
    }
    assert!(hand.is_ready());

    hand.reset_readiness();
    assert!(!hand.is_ready());
}

#[test]
fn test_poll_drains_all_pending_frames() {
    let (mut hand, handle) = connected_hand();
    handle.push_rx(hand_info_frame(3));
    push_all_positions(&handle);
    handle.push_rx(AllegroFrame::new_standard(0x123, &[0xDE, 0xAD]));

    let report = hand.poll_cycle().unwrap();
    assert_eq!(report, PollReport { applied: 6, dropped: 0 });
    assert_eq!(handle.pending_rx(), 0);

    // 队列为空不是错误
    assert_eq!(hand.poll_cycle().unwrap(), PollReport::default());
}

#[test]
fn test_malformed_frame_dropped_and_processing_continues() {
    let (mut hand, handle) = connected_hand();
    handle.push_rx(AllegroFrame::new_standard(0x21, &[1, 2, 3]));
    handle.push_rx(position_frame(2, [100, 0, 0, 0]));

    let report = hand.poll_cycle().unwrap();
    assert_eq!(report, PollReport { applied: 1, dropped: 1 });
    assert!(hand.positions()[8] > 0.0);
    assert!(hand.positions()[4] == 0.0);
}

#[test]
fn test_saturated_torque_clamps_to_ceiling() {
    let (mut hand, handle) = connected_hand();
    handle.push_rx(hand_info_frame(4));
    push_all_positions(&handle);
    hand.poll_cycle().unwrap();

    // 0.75 * 1200 = 900 PWM，roll 关节上限 375
    let mut torque = [0.0; JOINT_COUNT];
    torque[0] = 0.75;
    torque[12] = -0.75;
    hand.command_cycle(&torque).unwrap();

    let sent = handle.take_sent();
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[0].id, ID_CMD_SET_TORQUE_BASE);
    assert_eq!(torque_payload(&sent[0]), [375, 0, 0, 0]);
    // 拇指 roll 上限 525
    assert_eq!(torque_payload(&sent[3]), [-525, 0, 0, 0]);
    assert_eq!(hand.last_pwm()[0], 375);
}

#[test]
fn test_command_emits_one_frame_per_finger() {
    let (mut hand, handle) = connected_hand();
    handle.push_rx(hand_info_frame(4));
    push_all_positions(&handle);
    hand.poll_cycle().unwrap();

    let torque: [f64; JOINT_COUNT] = std::array::from_fn(|j| j as f64 / 1200.0);
    hand.command_cycle(&torque).unwrap();

    let sent = handle.take_sent();
    let ids: Vec<u32> = sent.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![0x60, 0x61, 0x62, 0x63]);
    // 1200 * j/1200 在浮点下可能略小于 j，向零截断
    for (finger, frame) in sent.iter().enumerate() {
        for (k, pwm) in torque_payload(frame).iter().enumerate() {
            let j = (finger * 4 + k) as i16;
            assert!(*pwm == j || *pwm == j - 1, "joint {} got {}", j, pwm);
        }
    }
}

#[test]
fn test_not_ready_skips_emission() {
    let (mut hand, handle) = connected_hand();
    handle.push_rx(hand_info_frame(4));
    handle.push_rx(position_frame(0, [0; 4]));
    hand.poll_cycle().unwrap();

    let err = hand.command_cycle(&[0.1; JOINT_COUNT]).unwrap_err();
    assert!(matches!(err, DriverError::NotReady));
    assert!(err.is_transient());
    assert!(handle.sent().is_empty());
    // 期望力矩仍然整体覆盖
    assert_eq!(hand.desired_torque(), &[0.1; JOINT_COUNT]);
}

#[test]
fn test_poll_with_estop_touches_no_transport() {
    let (mut hand, handle) = connected_hand();
    push_all_positions(&handle);
    let calls_before = handle.receive_calls();

    hand.emergency_stop().trigger();
    let err = hand.poll_cycle().unwrap_err();

    assert!(matches!(err, DriverError::Stopped));
    assert_eq!(handle.receive_calls(), calls_before);
    assert_eq!(handle.pending_rx(), 4);
    assert!(handle.sent().is_empty());
    assert!(!hand.is_ready());
}

#[test]
fn test_command_with_estop_still_writes_all_fingers() {
    let (mut hand, handle) = connected_hand();
    handle.push_rx(hand_info_frame(4));
    push_all_positions(&handle);
    hand.poll_cycle().unwrap();

    let estop = hand.emergency_stop();
    estop.trigger();
    let err = hand.command_cycle(&[0.0; JOINT_COUNT]).unwrap_err();

    assert!(matches!(err, DriverError::Stopped));
    let ids: Vec<u32> = handle.take_sent().iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![0x60, 0x61, 0x62, 0x63]);

    // 解除后恢复正常
    estop.clear();
    hand.command_cycle(&[0.0; JOINT_COUNT]).unwrap();
    hand.poll_cycle().unwrap();
}

#[test]
fn test_estop_before_ready_reports_stopped() {
    let (mut hand, handle) = connected_hand();
    hand.emergency_stop().trigger();

    let err = hand.command_cycle(&[0.0; JOINT_COUNT]).unwrap_err();
    assert!(matches!(err, DriverError::Stopped));
    assert!(handle.sent().is_empty());
}

#[test]
fn test_external_estop_handle_is_shared() {
    let (adapter, _handle) = MockCanAdapter::new();
    let estop = EmergencyStop::new();
    let mut hand = AllegroHandBuilder::new()
        .emergency_stop(estop.clone())
        .build_with(|_| Ok(CanTransport::new(adapter)))
        .unwrap();

    std::thread::spawn(move || estop.trigger()).join().unwrap();
    assert!(matches!(hand.poll_cycle(), Err(DriverError::Stopped)));
}

#[test]
fn test_later_hand_info_does_not_change_limits() {
    let (mut hand, handle) = connected_hand();
    handle.push_rx(hand_info_frame(2));
    hand.poll_cycle().unwrap();
    handle.push_rx(hand_info_frame(4));
    hand.poll_cycle().unwrap();

    assert_eq!(hand.limits().unwrap().revision(), HandRevision::V2);
    assert_eq!(hand.limits().unwrap().voltage_class().global_ceiling(), 500.0);
}

#[test]
fn test_shutdown_stops_streaming_and_closes() {
    let (mut hand, handle) = connected_hand();
    hand.shutdown().unwrap();

    let sent = handle.take_sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].id, 0x81);
    assert_eq!(sent[0].data_slice(), &[0; 6]);
    assert!(handle.is_closed());

    // 关闭后的周期调用返回传输错误
    assert!(matches!(
        hand.poll_cycle(),
        Err(DriverError::Transport(CanError::Closed))
    ));
}
