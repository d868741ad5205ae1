//! SocketCAN CAN 适配器实现
//!
//! Linux 平台下基于内核 SocketCAN 的适配器。
//!
//! ## 特性
//!
//! - 非阻塞接收：队列为空时立即返回，控制循环从不挂起
//! - 支持远程请求帧（RTR）发送
//! - 自动过滤错误帧（Bus Off / 缓冲区溢出上报为错误）
//!
//! ## 限制
//!
//! - **仅限 Linux 平台**
//! - **接口配置**：波特率等由系统工具（`ip link`）完成，不在应用层设置

use crate::{AllegroFrame, CanAdapter, CanDeviceError, CanDeviceErrorKind, CanError};
use socketcan::{
    CanError as SocketCanError, CanErrorFrame, CanFrame, CanSocket, EmbeddedFrame, Frame, Socket,
    StandardId,
};
use std::io::ErrorKind;
use std::os::unix::io::AsRawFd;
use tracing::{error, trace, warn};

mod interface_check;

pub use interface_check::check_interface_status;

/// SocketCAN 适配器
///
/// # 示例
///
/// ```no_run
/// use allegro_can::{AllegroFrame, CanAdapter, SocketCanAdapter};
///
/// let mut adapter = SocketCanAdapter::new("can0").unwrap();
/// adapter.send(AllegroFrame::new_standard(0x40, &[])).unwrap();
/// while let Some(frame) = adapter.try_receive().unwrap() {
///     println!("0x{:X}", frame.id);
/// }
/// ```
#[derive(Debug)]
pub struct SocketCanAdapter {
    socket: CanSocket,
    interface: String,
}

impl SocketCanAdapter {
    /// 打开 CAN 接口（对应 openChannel）
    ///
    /// 打开前检查接口存在且为 UP 状态，否则返回带修复提示的错误。
    ///
    /// # 错误
    /// - `CanError::Device`: 接口不存在 / 未启动 / 无法打开
    /// - `CanError::Io`: 系统调用失败
    pub fn new(interface: impl Into<String>) -> Result<Self, CanError> {
        let interface = interface.into();

        if !check_interface_status(&interface)? {
            return Err(CanError::Device(CanDeviceError::new(
                CanDeviceErrorKind::NotUp,
                format!(
                    "CAN interface '{}' exists but is not UP. Please start it first:\n  sudo ip link set up {}",
                    interface, interface
                ),
            )));
        }

        let socket = CanSocket::open(&interface).map_err(|e| {
            let kind = if e.kind() == ErrorKind::PermissionDenied {
                CanDeviceErrorKind::AccessDenied
            } else {
                CanDeviceErrorKind::Backend
            };
            CanError::Device(CanDeviceError::new(
                kind,
                format!("Failed to open CAN interface '{}': {}", interface, e),
            ))
        })?;

        // 禁用 Loopback，避免自己发出的 RTR 请求回环成诊断帧
        let loopback_enabled: libc::c_int = 0;
        let loopback_result = unsafe {
            libc::setsockopt(
                socket.as_raw_fd(),
                libc::SOL_CAN_RAW,
                libc::CAN_RAW_LOOPBACK,
                &loopback_enabled as *const _ as *const libc::c_void,
                std::mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if loopback_result < 0 {
            warn!(
                "Failed to disable CAN_RAW_LOOPBACK on '{}': {}",
                interface,
                std::io::Error::last_os_error()
            );
        }

        socket.set_nonblocking(true).map_err(CanError::Io)?;

        trace!("SocketCAN interface '{}' opened (non-blocking)", interface);
        Ok(Self { socket, interface })
    }

    /// 获取接口名称
    pub fn interface(&self) -> &str {
        &self.interface
    }

    fn to_can_frame(frame: &AllegroFrame) -> Result<CanFrame, CanError> {
        let id = StandardId::new(frame.id as u16).ok_or_else(|| {
            CanError::Device(CanDeviceError::new(
                CanDeviceErrorKind::InvalidFrame,
                format!("Invalid standard ID: 0x{:X}", frame.id),
            ))
        })?;

        let can_frame = if frame.is_remote {
            CanFrame::new_remote(id, frame.len as usize)
        } else {
            CanFrame::new(id, frame.data_slice())
        };

        can_frame.ok_or_else(|| {
            CanError::Device(CanDeviceError::new(
                CanDeviceErrorKind::InvalidFrame,
                format!("Failed to create frame with ID 0x{:X}", frame.id),
            ))
        })
    }

    /// 错误帧分类：致命错误返回 `Err`，其它记录后忽略
    fn classify_error_frame(can_frame: CanFrame) -> Result<(), CanError> {
        let Ok(error_frame) = CanErrorFrame::try_from(can_frame) else {
            warn!("Received CAN error frame but failed to parse, ignoring");
            return Ok(());
        };

        match SocketCanError::from(error_frame) {
            SocketCanError::BusOff => {
                error!("CAN Bus Off error detected");
                Err(CanError::BusOff)
            },
            SocketCanError::ControllerProblem(problem) => {
                let problem_str = format!("{}", problem);
                if problem_str.to_lowercase().contains("overflow") {
                    error!("CAN Buffer Overflow detected: {}", problem);
                    Err(CanError::BufferOverflow)
                } else {
                    warn!("CAN Controller Problem: {}, ignoring", problem);
                    Ok(())
                }
            },
            other => {
                warn!("CAN Error Frame received: {}, ignoring", other);
                Ok(())
            },
        }
    }
}

impl CanAdapter for SocketCanAdapter {
    fn send(&mut self, frame: AllegroFrame) -> Result<(), CanError> {
        let can_frame = Self::to_can_frame(&frame)?;

        self.socket.write_frame(&can_frame).map_err(|e| {
            if e.kind() == ErrorKind::WouldBlock {
                CanError::BufferOverflow
            } else {
                CanError::Io(e)
            }
        })?;

        trace!("Sent CAN frame: ID=0x{:X}, len={}", frame.id, frame.len);
        Ok(())
    }

    /// 非阻塞接收
    ///
    /// 错误帧被过滤（Bus Off / 溢出除外），继续读取下一帧。
    fn try_receive(&mut self) -> Result<Option<AllegroFrame>, CanError> {
        loop {
            let can_frame = match self.socket.read_frame() {
                Ok(frame) => frame,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(None),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(CanError::Io(e)),
            };

            if can_frame.is_error_frame() {
                Self::classify_error_frame(can_frame)?;
                continue;
            }

            let frame = AllegroFrame {
                id: can_frame.raw_id(),
                data: {
                    let mut data = [0u8; 8];
                    let frame_data = can_frame.data();
                    let len = frame_data.len().min(8);
                    data[..len].copy_from_slice(&frame_data[..len]);
                    data
                },
                len: can_frame.dlc().min(8) as u8,
                is_remote: can_frame.is_remote_frame(),
            };

            trace!("Received CAN frame: ID=0x{:X}, len={}", frame.id, frame.len);
            return Ok(Some(frame));
        }
    }

    fn close(&mut self) -> Result<(), CanError> {
        // socket 在 Drop 时关闭
        trace!("SocketCAN interface '{}' closing", self.interface);
        Ok(())
    }
}

impl Drop for SocketCanAdapter {
    fn drop(&mut self) {
        trace!("[Auto-Drop] SocketCAN interface '{}' closed", self.interface);
    }
}
