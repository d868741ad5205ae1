//! 内存 Mock CAN 适配器
//!
//! 无硬件依赖，用于上层（驱动层、CLI）测试。适配器本身交给被测代码，
//! 测试代码保留 [`MockCanHandle`] 注入接收帧并检查已发送帧。

use crate::{AllegroFrame, CanAdapter, CanError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Default)]
struct MockState {
    /// 待接收队列（`None` 表示在该位置注入一次 Bus Off 错误）
    rx: VecDeque<Option<AllegroFrame>>,
    /// 已发送帧
    sent: Vec<AllegroFrame>,
    /// `try_receive` 调用次数
    receive_calls: usize,
    /// 发送是否失败
    fail_send: bool,
    closed: bool,
}

/// Mock CAN 适配器
#[derive(Debug)]
pub struct MockCanAdapter {
    state: Arc<Mutex<MockState>>,
}

/// 测试侧句柄
#[derive(Debug, Clone)]
pub struct MockCanHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockCanAdapter {
    /// 创建适配器及其测试句柄
    pub fn new() -> (Self, MockCanHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: state.clone(),
            },
            MockCanHandle { state },
        )
    }
}

impl CanAdapter for MockCanAdapter {
    fn send(&mut self, frame: AllegroFrame) -> Result<(), CanError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(CanError::Closed);
        }
        if state.fail_send {
            return Err(CanError::BusOff);
        }
        state.sent.push(frame);
        Ok(())
    }

    fn try_receive(&mut self) -> Result<Option<AllegroFrame>, CanError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(CanError::Closed);
        }
        state.receive_calls += 1;
        match state.rx.pop_front() {
            Some(Some(frame)) => Ok(Some(frame)),
            Some(None) => Err(CanError::BusOff),
            None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<(), CanError> {
        self.state.lock().closed = true;
        Ok(())
    }
}

impl MockCanHandle {
    /// 注入一帧待接收数据
    pub fn push_rx(&self, frame: AllegroFrame) {
        self.state.lock().rx.push_back(Some(frame));
    }

    /// 在接收队列当前位置注入一次 Bus Off
    pub fn push_rx_error(&self) {
        self.state.lock().rx.push_back(None);
    }

    /// 待接收帧数量
    pub fn pending_rx(&self) -> usize {
        self.state.lock().rx.len()
    }

    /// 取出并清空已发送帧
    pub fn take_sent(&self) -> Vec<AllegroFrame> {
        std::mem::take(&mut self.state.lock().sent)
    }

    /// 已发送帧快照
    pub fn sent(&self) -> Vec<AllegroFrame> {
        self.state.lock().sent.clone()
    }

    /// `try_receive` 调用次数
    pub fn receive_calls(&self) -> usize {
        self.state.lock().receive_calls
    }

    /// 设置发送失败
    pub fn set_send_failure(&self, fail: bool) {
        self.state.lock().fail_send = fail;
    }

    /// 适配器是否已关闭
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_roundtrip() {
        let (mut adapter, handle) = MockCanAdapter::new();
        adapter.send(AllegroFrame::new_standard(0x40, &[])).unwrap();
        assert_eq!(handle.sent().len(), 1);

        handle.push_rx(AllegroFrame::new_standard(0x20, &[0; 8]));
        assert_eq!(adapter.try_receive().unwrap().unwrap().id, 0x20);
        assert!(adapter.try_receive().unwrap().is_none());
        assert_eq!(handle.receive_calls(), 2);
    }

    #[test]
    fn test_mock_injected_errors() {
        let (mut adapter, handle) = MockCanAdapter::new();
        handle.push_rx_error();
        assert!(matches!(adapter.try_receive(), Err(CanError::BusOff)));

        handle.set_send_failure(true);
        assert!(adapter.send(AllegroFrame::new_standard(0x40, &[])).is_err());
    }

    #[test]
    fn test_mock_closed() {
        let (mut adapter, handle) = MockCanAdapter::new();
        adapter.close().unwrap();
        assert!(handle.is_closed());
        assert!(matches!(adapter.try_receive(), Err(CanError::Closed)));
    }
}
