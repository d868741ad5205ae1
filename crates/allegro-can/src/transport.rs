//! 基于原始 CAN 适配器的灵巧手传输实现

use crate::{AllegroFrame, CanAdapter, CanError, HandTransport};
use allegro_protocol::{
    FingerGroup, InfoRequest, JOINTS_PER_FINGER, ServoCommand, SetPeriodCommand, TorqueCommand,
};
use tracing::{debug, trace};

/// 把任意 [`CanAdapter`] 包装成 [`HandTransport`]
///
/// 每个原语对应一帧协议指令；关闭后所有操作返回 `CanError::Closed`。
///
/// ```rust,ignore
/// use allegro_can::{CanTransport, SocketCanAdapter};
///
/// let adapter = SocketCanAdapter::new("can0")?;
/// let mut transport = CanTransport::new(adapter);
/// transport.servo_on()?;
/// ```
#[derive(Debug)]
pub struct CanTransport<A: CanAdapter> {
    adapter: A,
    closed: bool,
}

impl<A: CanAdapter> CanTransport<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            closed: false,
        }
    }

    /// 底层适配器
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn send(&mut self, frame: AllegroFrame) -> Result<(), CanError> {
        if self.closed {
            return Err(CanError::Closed);
        }
        trace!("TX: ID=0x{:X}, len={}", frame.id, frame.len);
        self.adapter.send(frame)
    }
}

impl<A: CanAdapter> HandTransport for CanTransport<A> {
    fn flush(&mut self) -> Result<(), CanError> {
        if self.closed {
            return Err(CanError::Closed);
        }
        let dropped = self.adapter.flush_receive()?;
        debug!("Flushed {} pending CAN frames", dropped);
        Ok(())
    }

    fn set_period(&mut self, period: SetPeriodCommand) -> Result<(), CanError> {
        self.send(period.to_frame())
    }

    fn servo_on(&mut self) -> Result<(), CanError> {
        self.send(ServoCommand::on().to_frame())
    }

    fn servo_off(&mut self) -> Result<(), CanError> {
        self.send(ServoCommand::off().to_frame())
    }

    fn request_info(&mut self, request: InfoRequest) -> Result<(), CanError> {
        self.send(request.to_frame())
    }

    fn read_frame(&mut self) -> Result<Option<AllegroFrame>, CanError> {
        if self.closed {
            return Err(CanError::Closed);
        }
        self.adapter.try_receive()
    }

    fn write_torque(
        &mut self,
        group: FingerGroup,
        pwm: [i16; JOINTS_PER_FINGER],
    ) -> Result<(), CanError> {
        self.send(TorqueCommand::new(group, pwm).to_frame())
    }

    fn close(&mut self) -> Result<(), CanError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.adapter.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockCanAdapter;

    #[test]
    fn test_primitives_emit_protocol_frames() {
        let (adapter, handle) = MockCanAdapter::new();
        let mut transport = CanTransport::new(adapter);

        transport.servo_off().unwrap();
        transport.request_info(InfoRequest::HandInfo).unwrap();
        transport.request_info(InfoRequest::Serial).unwrap();
        transport.set_period(SetPeriodCommand::new(3, 0, 0)).unwrap();
        transport.servo_on().unwrap();
        transport.write_torque(FingerGroup::Middle, [1, 2, 3, 4]).unwrap();

        let ids: Vec<u32> = handle.sent().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![0x41, 0x80, 0x88, 0x81, 0x40, 0x61]);
    }

    #[test]
    fn test_flush_discards_pending() {
        let (adapter, handle) = MockCanAdapter::new();
        handle.push_rx(AllegroFrame::new_standard(0x20, &[0; 8]));
        let mut transport = CanTransport::new(adapter);

        transport.flush().unwrap();
        assert_eq!(handle.pending_rx(), 0);
        assert!(transport.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_closed_transport_rejects_operations() {
        let (adapter, handle) = MockCanAdapter::new();
        let mut transport = CanTransport::new(adapter);

        transport.close().unwrap();
        transport.close().unwrap(); // 幂等
        assert!(handle.is_closed());
        assert!(transport.is_closed());
        assert!(matches!(transport.servo_on(), Err(CanError::Closed)));
        assert!(matches!(transport.read_frame(), Err(CanError::Closed)));
        assert!(handle.sent().is_empty());
    }
}
