//! SocketCAN CAN 适配器实现
//!
//! Linux 平台下基于内核 SocketCAN 子系统的适配器。
//!
//! ## 限制
//!
//! - **仅限 Linux 平台**
//! - **接口配置**：波特率等由系统工具（`ip link`）完成，不在应用层设置
//! - **权限要求**：可能需要 `dialout` 组权限或 `sudo`

use crate::{CanAdapter, CanDeviceError, CanDeviceErrorKind, CanError};
use rmd_protocol::CanFrame as RmdFrame;
use socketcan::{
    BlockingCan, CanError as SocketCanError, CanErrorFrame, CanFrame, CanSocket, EmbeddedFrame,
    ExtendedId, Frame, Socket, StandardId,
};
use std::convert::TryFrom;
use std::io::ErrorKind;
use std::time::Duration;
use tracing::{error, trace, warn};

/// 默认读超时
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(2);

/// SocketCAN 适配器
///
/// # 示例
///
/// ```no_run
/// use rmd_can::{CanAdapter, CanFrame, SocketCanAdapter};
///
/// let mut adapter = SocketCanAdapter::new("can0").unwrap();
/// adapter.send(CanFrame::new_standard(0x141, &[0x9C, 0, 0, 0, 0, 0, 0, 0])).unwrap();
/// let reply = adapter.receive().unwrap();
/// ```
#[derive(Debug)]
pub struct SocketCanAdapter {
    socket: CanSocket,
    /// 接口名称（如 "can0"）
    interface: String,
    /// 阻塞接收时的读超时
    read_timeout: Duration,
    /// socket 当前是否处于非阻塞模式
    nonblocking: bool,
}

impl SocketCanAdapter {
    /// 打开 CAN 接口
    ///
    /// # 错误
    /// - `CanError::Device`: 接口不存在或无法打开
    /// - `CanError::Io`: 设置读超时失败
    pub fn new(interface: impl Into<String>) -> Result<Self, CanError> {
        let interface = interface.into();

        let socket = CanSocket::open(&interface).map_err(|e| {
            let kind = match e.kind() {
                ErrorKind::NotFound => CanDeviceErrorKind::NotFound,
                ErrorKind::PermissionDenied => CanDeviceErrorKind::AccessDenied,
                _ => CanDeviceErrorKind::Backend,
            };
            CanError::Device(CanDeviceError::new(
                kind,
                format!("Failed to open CAN interface '{}': {}", interface, e),
            ))
        })?;

        socket.set_read_timeout(DEFAULT_READ_TIMEOUT).map_err(CanError::Io)?;
        trace!("SocketCAN interface '{}' opened", interface);

        Ok(Self {
            socket,
            interface,
            read_timeout: DEFAULT_READ_TIMEOUT,
            nonblocking: false,
        })
    }

    /// 获取接口名称
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// 获取读超时时间
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// 设置阻塞接收的读超时
    ///
    /// 零超时在 SocketCAN 上表示无限阻塞，这里改为 1µs。
    pub fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), CanError> {
        let timeout = timeout.max(Duration::from_micros(1));
        self.socket.set_read_timeout(timeout).map_err(CanError::Io)?;
        self.read_timeout = timeout;
        Ok(())
    }

    fn set_nonblocking(&mut self, nonblocking: bool) -> Result<(), CanError> {
        if self.nonblocking != nonblocking {
            self.socket.set_nonblocking(nonblocking).map_err(CanError::Io)?;
            self.nonblocking = nonblocking;
        }
        Ok(())
    }

    /// 读取下一帧数据帧，过滤错误帧
    fn read_data_frame(&mut self) -> Result<RmdFrame, CanError> {
        loop {
            let can_frame = match self.socket.read_frame() {
                Ok(frame) => frame,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(CanError::Timeout);
                },
                Err(e) => return Err(CanError::Io(e)),
            };

            if can_frame.is_error_frame() {
                match CanErrorFrame::try_from(can_frame) {
                    Ok(error_frame) => match SocketCanError::from(error_frame) {
                        SocketCanError::BusOff => {
                            error!("CAN Bus Off error detected");
                            return Err(CanError::BusOff);
                        },
                        other => warn!("CAN Error Frame received: {}, ignoring", other),
                    },
                    Err(_) => warn!("Received CAN error frame but failed to parse, ignoring"),
                }
                continue;
            }

            return Ok(Self::convert_frame(&can_frame));
        }
    }

    fn convert_frame(can_frame: &CanFrame) -> RmdFrame {
        let mut data = [0u8; 8];
        let frame_data = can_frame.data();
        let len = frame_data.len().min(8);
        data[..len].copy_from_slice(&frame_data[..len]);

        let id = if can_frame.is_extended() {
            can_frame.raw_id() & 0x1FFF_FFFF
        } else {
            can_frame.raw_id() & 0x7FF
        };

        RmdFrame {
            id,
            data,
            len: len as u8,
            is_extended: can_frame.is_extended(),
        }
    }
}

impl CanAdapter for SocketCanAdapter {
    fn send(&mut self, frame: RmdFrame) -> Result<(), CanError> {
        let payload = frame.data_slice();
        let can_frame: Option<CanFrame> = if frame.is_extended {
            ExtendedId::new(frame.id).and_then(|id| CanFrame::new(id, payload))
        } else {
            u16::try_from(frame.id)
                .ok()
                .and_then(StandardId::new)
                .and_then(|id| CanFrame::new(id, payload))
        };
        let can_frame = can_frame.ok_or_else(|| {
            CanError::Device(CanDeviceError::new(
                CanDeviceErrorKind::InvalidFrame,
                format!("Failed to create CAN frame with ID 0x{:X}", frame.id),
            ))
        })?;

        self.socket.transmit(&can_frame).map_err(|e| {
            CanError::Io(std::io::Error::other(format!(
                "SocketCAN transmit error: {}",
                e
            )))
        })?;

        trace!("Sent CAN frame: ID=0x{:X}, len={}", frame.id, frame.len);
        Ok(())
    }

    /// 阻塞接收，直到收到数据帧或读超时
    fn receive(&mut self) -> Result<RmdFrame, CanError> {
        self.set_nonblocking(false)?;
        let frame = self.read_data_frame()?;
        trace!("Received CAN frame: ID=0x{:X}, len={}", frame.id, frame.len);
        Ok(frame)
    }

    fn set_receive_timeout(&mut self, timeout: Duration) {
        if let Err(e) = self.set_read_timeout(timeout) {
            warn!("Failed to set receive timeout: {}", e);
        }
    }

    fn receive_timeout(&mut self, timeout: Duration) -> Result<RmdFrame, CanError> {
        if timeout.is_zero() {
            return self.try_receive()?.ok_or(CanError::Timeout);
        }

        let old_timeout = self.read_timeout;
        self.set_read_timeout(timeout)?;
        let result = self.receive();
        let _ = self.set_read_timeout(old_timeout);
        result
    }

    /// 非阻塞接收
    fn try_receive(&mut self) -> Result<Option<RmdFrame>, CanError> {
        self.set_nonblocking(true)?;
        match self.read_data_frame() {
            Ok(frame) => Ok(Some(frame)),
            Err(CanError::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
