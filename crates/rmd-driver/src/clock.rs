//! 单调时钟与超时令牌
//!
//! 等待应答的循环只依赖 [`SteadyClock`]，测试中可以注入步进时钟，
//! 让超时行为完全可复现。

use std::time::{Duration, Instant};

/// 单调时钟
pub trait SteadyClock: Send + Sync {
    /// 自某个固定起点以来经过的时间（单调不减）
    fn uptime(&self) -> Duration;
}

/// 基于 `std::time::Instant` 的系统单调时钟
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SteadyClock for MonotonicClock {
    fn uptime(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// 超时已到
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed {
    /// 从创建令牌到检测到超时实际经过的时间
    pub waited: Duration,
}

/// 超时令牌
///
/// 创建时记录截止时刻；在截止时刻当次或之后的第一次 `check()` 返回 `Err(Elapsed)`。
pub struct Timeout<'a> {
    clock: &'a dyn SteadyClock,
    start: Duration,
    deadline: Duration,
}

impl<'a> Timeout<'a> {
    pub fn new(clock: &'a dyn SteadyClock, duration: Duration) -> Self {
        let start = clock.uptime();
        Self {
            clock,
            start,
            deadline: start.saturating_add(duration),
        }
    }

    /// 检查是否超时
    pub fn check(&self) -> Result<(), Elapsed> {
        let now = self.clock.uptime();
        if now >= self.deadline {
            Err(Elapsed {
                waited: now.saturating_sub(self.start),
            })
        } else {
            Ok(())
        }
    }
}
