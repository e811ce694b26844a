//! Builder 模式实现
//!
//! 提供链式构造 `Drc` 实例的便捷方式。

use crate::clock::{MonotonicClock, SteadyClock};
use crate::config::DrcConfig;
use crate::drc::Drc;
use crate::error::DriverError;
use rmd_can::CanRouter;
use std::sync::Arc;
use std::time::Duration;

/// Drc Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use rmd_can::{CanRouter, SocketCanAdapter};
/// use rmd_driver::DrcBuilder;
/// use std::time::Duration;
///
/// let router = CanRouter::new(SocketCanAdapter::new("can0").unwrap());
///
/// // 同一个路由器上挂两台电机
/// let shoulder = DrcBuilder::new(router.clone())
///     .device_id(0x141)
///     .gear_ratio(6.0)
///     .build()
///     .unwrap();
/// let elbow = DrcBuilder::new(router)
///     .device_id(0x142)
///     .max_response_time(Duration::from_millis(20))
///     .build()
///     .unwrap();
/// ```
pub struct DrcBuilder {
    router: Arc<CanRouter>,
    config: DrcConfig,
    clock: Option<Arc<dyn SteadyClock>>,
}

impl DrcBuilder {
    /// 创建新的 Builder（默认配置）
    pub fn new(router: Arc<CanRouter>) -> Self {
        Self {
            router,
            config: DrcConfig::default(),
            clock: None,
        }
    }

    /// 整体替换配置
    pub fn config(mut self, config: DrcConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置设备 ID
    pub fn device_id(mut self, device_id: u32) -> Self {
        self.config.device_id = device_id;
        self
    }

    /// 设置减速比
    pub fn gear_ratio(mut self, gear_ratio: f64) -> Self {
        self.config.gear_ratio = gear_ratio;
        self
    }

    /// 设置最大响应时间
    pub fn max_response_time(mut self, max_response_time: Duration) -> Self {
        self.config.max_response_time = max_response_time;
        self
    }

    /// 设置轮询间隔（零表示忙等）
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.config.poll_interval = poll_interval;
        self
    }

    /// 注入时钟（测试用，默认 `MonotonicClock`）
    pub fn clock(mut self, clock: Arc<dyn SteadyClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// 构建 `Drc` 实例（会对电机做一次上电复位）
    ///
    /// # 错误
    /// - `DriverError::InvalidConfig`: 配置无效
    /// - `DriverError::Can` / `DriverError::Timeout`: 复位命令失败
    pub fn build(self) -> Result<Drc, DriverError> {
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        Drc::new(self.router, clock, self.config)
    }
}
