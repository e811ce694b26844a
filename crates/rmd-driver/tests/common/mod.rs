//! 测试公共设施
//!
//! - `StepClock`: 每次读取前进固定步长的时钟，超时行为与机器快慢无关
//! - `setup`: 带自动应答的 Mock 总线 + 已完成上电复位的 `Drc`

#![allow(dead_code)]

use rmd_can::{CanFrame, CanRouter, MockCanAdapter, MockCanHandle};
use rmd_driver::{Drc, DrcBuilder, SteadyClock};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub const DEVICE_ID: u32 = 0x141;

pub struct StepClock {
    now_us: AtomicU64,
    step_us: u64,
}

impl StepClock {
    pub fn new(step: Duration) -> Arc<Self> {
        Arc::new(Self {
            now_us: AtomicU64::new(0),
            step_us: step.as_micros() as u64,
        })
    }

    /// 直接拨快时钟
    pub fn advance(&self, by: Duration) {
        self.now_us.fetch_add(by.as_micros() as u64, Ordering::SeqCst);
    }

    /// 已被读取的次数（步长非零时）
    pub fn reads(&self) -> u64 {
        self.now_us.load(Ordering::SeqCst) / self.step_us.max(1)
    }
}

impl SteadyClock for StepClock {
    fn uptime(&self) -> Duration {
        Duration::from_micros(self.now_us.fetch_add(self.step_us, Ordering::SeqCst))
    }
}

/// 模拟电机：原样回显收到的命令
pub fn echo(frame: &CanFrame) -> Vec<CanFrame> {
    vec![*frame]
}

/// 模拟电机：对任何命令都回一帧状态 2（温度、电流、速度、编码器）
pub fn status_2_reply(
    temperature: i8,
    current: i16,
    speed: i16,
    encoder: i16,
) -> impl Fn(&CanFrame) -> Vec<CanFrame> + Send + 'static {
    move |frame: &CanFrame| {
        let mut data = [0x9C, temperature as u8, 0, 0, 0, 0, 0, 0];
        data[2..4].copy_from_slice(&current.to_le_bytes());
        data[4..6].copy_from_slice(&speed.to_le_bytes());
        data[6..8].copy_from_slice(&encoder.to_le_bytes());
        vec![CanFrame::new_standard(frame.id as u16, &data)]
    }
}

pub struct Harness {
    pub router: Arc<CanRouter>,
    pub handle: MockCanHandle,
    pub clock: Arc<StepClock>,
    pub drc: Drc,
}

/// 构建一个已上电复位的驱动；复位帧已从发送记录中清除
pub fn setup(gear_ratio: f64) -> Harness {
    let adapter = MockCanAdapter::new();
    let handle = adapter.handle();
    handle.set_responder(echo);

    let router = CanRouter::new(adapter);
    let clock = StepClock::new(Duration::from_millis(1));
    let drc = DrcBuilder::new(router.clone())
        .device_id(DEVICE_ID)
        .gear_ratio(gear_ratio)
        .clock(clock.clone())
        .build()
        .expect("power-cycle against echoing mock should succeed");
    handle.clear_sent();

    Harness {
        router,
        handle,
        clock,
        drc,
    }
}
