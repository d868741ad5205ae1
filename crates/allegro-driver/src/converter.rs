//! 力矩 → PWM 转换
//!
//! `pwm = trunc(clamp(torque * scale, -ceiling, +ceiling))`
//!
//! 全程在 f64 中计算，钳位之后再截断为整数，中间值不会溢出 32 位。
//! 截断方向为向零（与硬件参考实现逐位一致），不做任何舍入。

use allegro_protocol::{FingerGroup, JOINT_COUNT, JOINTS_PER_FINGER, LimitTable};

/// 单个关节的转换
///
/// NaN 输入得到 0。
pub fn convert_joint(torque: f64, scale: f64, ceiling: f64) -> i16 {
    let raw = torque * scale;
    // `as` 对 f64 → i16 是向零截断；ceiling 不超过 1200，不会饱和
    raw.clamp(-ceiling, ceiling) as i16
}

/// 转换全部 16 个关节
///
/// 尚未捕获硬件参数（`limits` 为 `None`）时输出全 0。
pub fn convert(desired: &[f64; JOINT_COUNT], limits: Option<&LimitTable>) -> [i16; JOINT_COUNT] {
    let Some(limits) = limits else {
        return [0; JOINT_COUNT];
    };

    let scale = limits.scale_constant();
    let ceilings = limits.ceilings();
    let mut pwm = [0i16; JOINT_COUNT];
    for (j, out) in pwm.iter_mut().enumerate() {
        *out = convert_joint(desired[j], scale, ceilings[j]);
    }
    pwm
}

/// 取出某根手指的 4 个 PWM 值（一个力矩帧）
pub fn finger_pwm(pwm: &[i16; JOINT_COUNT], group: FingerGroup) -> [i16; JOINTS_PER_FINGER] {
    let base = group.index() * JOINTS_PER_FINGER;
    [pwm[base], pwm[base + 1], pwm[base + 2], pwm[base + 3]]
}
