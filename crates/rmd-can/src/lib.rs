//! # RMD CAN Adapter Layer
//!
//! CAN 硬件抽象层，提供统一的 CAN 接口抽象，以及按设备 ID 分发入站帧的路由器。

use std::time::Duration;
use thiserror::Error;

// 重新导出 rmd-protocol 中的 CanFrame
pub use rmd_protocol::CanFrame;

pub mod router;

pub use router::{CanRouter, FrameCallback, MAX_FRAMES_PER_POLL, RouteItem, RxThread};

#[cfg(target_os = "linux")]
pub mod socketcan;

#[cfg(target_os = "linux")]
pub use socketcan::SocketCanAdapter;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCanAdapter, MockCanHandle};

/// CAN 适配层统一错误类型
#[derive(Error, Debug)]
pub enum CanError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device Error: {0}")]
    Device(#[from] CanDeviceError),
    #[error("Read timeout")]
    Timeout,
    #[error("Bus off")]
    BusOff,
}

/// 设备/后端错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanDeviceErrorKind {
    NotFound,
    AccessDenied,
    InvalidFrame,
    Backend,
}

/// 结构化设备错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct CanDeviceError {
    pub kind: CanDeviceErrorKind,
    pub message: String,
}

impl CanDeviceError {
    pub fn new(kind: CanDeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// CAN 适配器
///
/// `send` 把一帧提交到总线；`receive` 阻塞到收到一帧或读超时（返回 `CanError::Timeout`）。
pub trait CanAdapter {
    fn send(&mut self, frame: CanFrame) -> Result<(), CanError>;
    fn receive(&mut self) -> Result<CanFrame, CanError>;
    fn set_receive_timeout(&mut self, _timeout: Duration) {}
    fn receive_timeout(&mut self, timeout: Duration) -> Result<CanFrame, CanError> {
        self.set_receive_timeout(timeout);
        self.receive()
    }
    fn try_receive(&mut self) -> Result<Option<CanFrame>, CanError> {
        match self.receive_timeout(Duration::ZERO) {
            Ok(frame) => Ok(Some(frame)),
            Err(CanError::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<A: CanAdapter + ?Sized> CanAdapter for Box<A> {
    fn send(&mut self, frame: CanFrame) -> Result<(), CanError> {
        (**self).send(frame)
    }
    fn receive(&mut self) -> Result<CanFrame, CanError> {
        (**self).receive()
    }
    fn set_receive_timeout(&mut self, timeout: Duration) {
        (**self).set_receive_timeout(timeout)
    }
    fn receive_timeout(&mut self, timeout: Duration) -> Result<CanFrame, CanError> {
        (**self).receive_timeout(timeout)
    }
    fn try_receive(&mut self) -> Result<Option<CanFrame>, CanError> {
        (**self).try_receive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_error_display() {
        assert_eq!(format!("{}", CanError::Timeout), "Read timeout");
        assert_eq!(format!("{}", CanError::BusOff), "Bus off");

        let err = CanError::Device(CanDeviceError::new(
            CanDeviceErrorKind::NotFound,
            "can9 missing",
        ));
        let msg = format!("{}", err);
        assert!(msg.contains("NotFound") && msg.contains("can9 missing"));
    }

    /// 只实现 `receive` 的适配器也能通过默认实现做非阻塞接收
    struct AlwaysTimeout;

    impl CanAdapter for AlwaysTimeout {
        fn send(&mut self, _frame: CanFrame) -> Result<(), CanError> {
            Ok(())
        }
        fn receive(&mut self) -> Result<CanFrame, CanError> {
            Err(CanError::Timeout)
        }
    }

    #[test]
    fn test_default_try_receive_maps_timeout_to_none() {
        let mut adapter = AlwaysTimeout;
        assert!(adapter.try_receive().unwrap().is_none());

        let mut boxed: Box<dyn CanAdapter> = Box::new(AlwaysTimeout);
        assert!(boxed.try_receive().unwrap().is_none());
    }
}
