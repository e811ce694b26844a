//! Mock CAN 适配器
//!
//! 用于测试的模拟 CAN 总线：记录所有发送的帧，入站帧由测试注入，
//! 或由应答函数根据发送内容自动生成（模拟电机回显）。

use crate::{CanAdapter, CanError, CanFrame};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

type Responder = Box<dyn Fn(&CanFrame) -> Vec<CanFrame> + Send>;

#[derive(Default)]
struct MockState {
    /// 发送记录（从驱动发往电机）
    sent: Vec<CanFrame>,
    /// 接收队列（从电机发往驱动）
    inbound: VecDeque<CanFrame>,
    /// 第 N 次发送失败（从 1 开始计数）
    fail_on_send: Option<usize>,
    /// 发送尝试次数（包括失败的）
    send_attempts: usize,
    responder: Option<Responder>,
}

/// 模拟 CAN 适配器
pub struct MockCanAdapter {
    state: Arc<Mutex<MockState>>,
    receive_timeout: Duration,
}

/// 测试侧句柄，可在适配器交给路由器之后继续观察和注入
#[derive(Clone)]
pub struct MockCanHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockCanAdapter {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            receive_timeout: Duration::ZERO,
        }
    }

    pub fn handle(&self) -> MockCanHandle {
        MockCanHandle {
            state: self.state.clone(),
        }
    }
}

impl Default for MockCanAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl CanAdapter for MockCanAdapter {
    fn send(&mut self, frame: CanFrame) -> Result<(), CanError> {
        let mut state = self.state.lock();
        state.send_attempts += 1;

        if state.fail_on_send == Some(state.send_attempts) {
            return Err(CanError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock send failure",
            )));
        }

        state.sent.push(frame);
        let replies = match &state.responder {
            Some(responder) => responder(&frame),
            None => Vec::new(),
        };
        state.inbound.extend(replies);
        Ok(())
    }

    fn receive(&mut self) -> Result<CanFrame, CanError> {
        if let Some(frame) = self.state.lock().inbound.pop_front() {
            return Ok(frame);
        }
        if !self.receive_timeout.is_zero() {
            std::thread::sleep(self.receive_timeout);
            if let Some(frame) = self.state.lock().inbound.pop_front() {
                return Ok(frame);
            }
        }
        Err(CanError::Timeout)
    }

    fn set_receive_timeout(&mut self, timeout: Duration) {
        self.receive_timeout = timeout;
    }
}

impl MockCanHandle {
    /// 已成功发送的帧（按发送顺序）
    pub fn sent_frames(&self) -> Vec<CanFrame> {
        self.state.lock().sent.clone()
    }

    /// 已成功发送帧的负载
    pub fn sent_payloads(&self) -> Vec<[u8; 8]> {
        self.state.lock().sent.iter().map(|f| f.data).collect()
    }

    pub fn clear_sent(&self) {
        self.state.lock().sent.clear();
    }

    /// 注入一帧入站数据
    pub fn inject(&self, frame: CanFrame) {
        self.state.lock().inbound.push_back(frame);
    }

    /// 尚未被读取的入站帧数量
    pub fn pending_inbound(&self) -> usize {
        self.state.lock().inbound.len()
    }

    /// 让第 `n` 次发送（从 1 开始，包括已发生的）返回 IO 错误
    pub fn fail_on_send(&self, n: usize) {
        self.state.lock().fail_on_send = Some(n);
    }

    /// 设置应答函数：每次成功发送后，其返回的帧被放入入站队列
    pub fn set_responder<F>(&self, responder: F)
    where
        F: Fn(&CanFrame) -> Vec<CanFrame> + Send + 'static,
    {
        self.state.lock().responder = Some(Box::new(responder));
    }

    pub fn clear_responder(&self) {
        self.state.lock().responder = None;
    }
}
