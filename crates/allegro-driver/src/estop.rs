//! 急停标志
//!
//! 由驱动外部（信号处理函数、监控线程等）触发，控制循环在每个周期原子读取。
//! 标志归属于具体的 [`AllegroHand`](crate::AllegroHand) 实例，不使用全局静态变量，
//! 多只手互不影响。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 急停标志（可跨线程共享的句柄）
///
/// 克隆得到的是同一个标志的另一个句柄。
///
/// # 示例
///
/// ```rust
/// use allegro_driver::EmergencyStop;
///
/// let estop = EmergencyStop::new();
/// let remote = estop.clone();
///
/// // 例如在 Ctrl-C 处理函数中
/// remote.trigger();
/// assert!(estop.is_engaged());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EmergencyStop {
    inner: Arc<AtomicBool>,
}

impl EmergencyStop {
    /// 创建未触发的急停标志
    pub fn new() -> Self {
        Self::default()
    }

    /// 触发急停
    pub fn trigger(&self) {
        self.inner.store(true, Ordering::Release);
    }

    /// 解除急停
    pub fn clear(&self) {
        self.inner.store(false, Ordering::Release);
    }

    /// 急停是否已触发
    pub fn is_engaged(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }
}
