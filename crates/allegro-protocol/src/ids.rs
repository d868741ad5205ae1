//! CAN ID 常量定义和枚举
//!
//! 定义所有协议帧的 CAN ID 常量。

// ============================================================================
// 控制帧 ID 常量（主机 -> 灵巧手）
// ============================================================================

/// 系统上电（伺服使能）
pub const ID_CMD_SYSTEM_ON: u32 = 0x40;

/// 系统断电（伺服失能）
pub const ID_CMD_SYSTEM_OFF: u32 = 0x41;

/// 力矩（PWM）设置指令基址（0x60~0x63，每根手指一帧）
pub const ID_CMD_SET_TORQUE_BASE: u32 = 0x60;

/// 上报周期设置指令
pub const ID_CMD_SET_PERIOD: u32 = 0x81;

// ============================================================================
// 反馈帧 ID 常量（灵巧手 -> 主机）
// ============================================================================

/// 手部信息（RTR 请求与应答共用）
pub const ID_RTR_HAND_INFO: u32 = 0x80;

/// 序列号（RTR 请求与应答共用）
pub const ID_RTR_SERIAL: u32 = 0x88;

/// 手指关节位置反馈基址（0x20~0x23 有效，低 3 位为手指分组）
pub const ID_RTR_FINGER_POSE_BASE: u32 = 0x20;

/// IMU 姿态反馈
pub const ID_RTR_IMU_DATA: u32 = 0x30;

/// 温度反馈基址（0x38~0x3B 有效，低 3 位为传感器序号）
pub const ID_RTR_TEMPERATURE_BASE: u32 = 0x38;

/// 分组选择位掩码（ID 低 3 位）
pub const GROUP_SELECTOR_MASK: u32 = 0x07;
