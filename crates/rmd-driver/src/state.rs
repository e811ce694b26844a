//! 反馈状态与入站帧处理
//!
//! 快照存放在 `ArcSwap` 中：读取无锁，写入由路由器回调（或直接调用
//! `handle_frame`）以 read-copy-update 方式整体替换。

use arc_swap::ArcSwap;
use rmd_can::FrameCallback;
use rmd_protocol::{CanFrame, DrcFeedback, DrcResponse, WriteCommand};
use tracing::{debug, warn};

/// 单台电机的共享状态
pub struct DrcContext {
    device_id: u32,
    feedback: ArcSwap<DrcFeedback>,
}

impl DrcContext {
    pub fn new(device_id: u32) -> Self {
        Self {
            device_id,
            feedback: ArcSwap::from_pointee(DrcFeedback::default()),
        }
    }

    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    /// 当前快照的副本
    pub fn feedback(&self) -> DrcFeedback {
        **self.feedback.load()
    }

    /// 当前已接收帧计数
    pub fn message_number(&self) -> u32 {
        self.feedback.load().message_number
    }

    /// 处理一帧入站数据
    ///
    /// 计数器对每一帧都先加一（包括随后被丢弃的帧），然后才校验 ID 和长度。
    /// 只接受本设备 ID 的标准帧；校验通过且命令字节可识别时，把应答合并进快照。
    pub fn handle_frame(&self, frame: &CanFrame) {
        let response = if frame.is_extended || frame.id != self.device_id {
            warn!(
                "Dropping frame with ID 0x{:X} (extended: {}, device 0x{:X})",
                frame.id, frame.is_extended, self.device_id
            );
            None
        } else {
            match DrcResponse::from_frame(frame) {
                Ok(Some(response)) => {
                    debug!("Device 0x{:X}: {:?}", self.device_id, response);
                    Some(response)
                },
                Ok(None) => {
                    match WriteCommand::try_from(frame.data[0]) {
                        Ok(command) => debug!(
                            "Device 0x{:X}: {:?} echo not decoded",
                            self.device_id, command
                        ),
                        Err(_) => debug!(
                            "Device 0x{:X}: ignoring opcode 0x{:02X}",
                            self.device_id, frame.data[0]
                        ),
                    }
                    None
                },
                Err(e) => {
                    warn!("Dropping frame from 0x{:X}: {}", frame.id, e);
                    None
                },
            }
        };

        self.feedback.rcu(|current| {
            let mut next = **current;
            next.message_number = next.message_number.wrapping_add(1);
            if let Some(response) = &response {
                next.apply(response);
            }
            next
        });
    }
}

impl FrameCallback for DrcContext {
    fn on_frame_received(&self, frame: &CanFrame) {
        self.handle_frame(frame);
    }
}
