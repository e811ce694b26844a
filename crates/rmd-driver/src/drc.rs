//! DRC 驱动门面
//!
//! 每条命令都走同一个"发送并等待"流程：
//!
//! 1. 记下当前的已接收帧计数
//! 2. 发送命令帧（发送失败立即返回，不等待）
//! 3. 轮询总线，直到计数变化（成功）或超过最大响应时间（超时）
//!
//! # 已知限制
//!
//! 计数器只说明"有帧到达"，不区分是否是本次命令的应答。上一条命令迟到的
//! 应答，或其它与本设备同 ID 的帧，都会让本次等待提前成功。

use crate::clock::{SteadyClock, Timeout};
use crate::config::DrcConfig;
use crate::error::DriverError;
use crate::state::DrcContext;
use rmd_can::{CanRouter, RouteItem};
use rmd_protocol::{
    CanFrame, DrcFeedback, FeedbackRequest, PositionCommand, ReadCommand, SystemCommand,
    SystemControl, VelocityCommand,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 单台 RMD 电机（DRC 协议）的驱动
///
/// # 示例
///
/// ```no_run
/// use rmd_can::{CanRouter, SocketCanAdapter};
/// use rmd_driver::DrcBuilder;
///
/// let router = CanRouter::new(SocketCanAdapter::new("can0").unwrap());
/// let mut drc = DrcBuilder::new(router)
///     .device_id(0x141)
///     .gear_ratio(6.0)
///     .build()
///     .unwrap();
///
/// drc.velocity_control(10.0).unwrap();
/// println!("speed: {} rpm", drc.feedback().speed_rpm());
/// ```
pub struct Drc {
    router: Arc<CanRouter>,
    clock: Arc<dyn SteadyClock>,
    ctx: Arc<DrcContext>,
    config: DrcConfig,
    /// 持有期间路由器把本设备的帧交给 `ctx`
    _route: RouteItem,
}

impl Drc {
    /// 创建驱动并对电机做一次上电复位（先 Off 再 Running）
    ///
    /// # 错误
    /// - `DriverError::InvalidConfig`: 配置校验失败
    /// - 复位过程中任一命令失败（发送错误或超时）原样返回，此时回调已注销
    pub fn new(
        router: Arc<CanRouter>,
        clock: Arc<dyn SteadyClock>,
        config: DrcConfig,
    ) -> Result<Self, DriverError> {
        config.validate()?;

        let ctx = Arc::new(DrcContext::new(config.device_id));
        let route = router.add_message_callback(config.device_id, ctx.clone());
        info!(
            "Registered DRC device 0x{:X} (gear ratio {})",
            config.device_id, config.gear_ratio
        );

        let drc = Self {
            router,
            clock,
            ctx,
            config,
            _route: route,
        };

        drc.system_control(SystemCommand::Off)?;
        drc.system_control(SystemCommand::Running)?;
        info!("DRC device 0x{:X} power-cycled", drc.config.device_id);

        Ok(drc)
    }

    /// 发送一帧并等待任意一帧应答到达
    fn send_and_wait(&self, frame: CanFrame) -> Result<(), DriverError> {
        let start_number = self.ctx.message_number();
        self.router.send(frame)?;

        // 响应时间从发送完成开始计算
        let timeout = Timeout::new(self.clock.as_ref(), self.config.max_response_time);

        loop {
            if self.ctx.message_number() != start_number {
                return Ok(());
            }

            // 调用方线程自己取帧；有后台 RX 线程时这里通常取不到
            self.router.poll()?;
            if self.ctx.message_number() != start_number {
                return Ok(());
            }

            if let Err(elapsed) = timeout.check() {
                warn!(
                    "No response from device 0x{:X} to opcode 0x{:02X} within {:?}",
                    self.config.device_id, frame.data[0], elapsed.waited
                );
                return Err(DriverError::Timeout {
                    device_id: self.config.device_id,
                    waited: elapsed.waited,
                });
            }

            if self.config.poll_interval.is_zero() {
                std::hint::spin_loop();
            } else {
                spin_sleep::sleep(self.config.poll_interval);
            }
        }
    }

    /// 请求一种反馈
    pub fn feedback_request(&self, request: ReadCommand) -> Result<(), DriverError> {
        debug!("Device 0x{:X}: feedback request {:?}", self.config.device_id, request);
        self.send_and_wait(FeedbackRequest(request).to_frame(self.config.device_id))
    }

    /// 速度闭环控制（输出轴 rpm）
    ///
    /// # 错误
    /// - `DriverError::Protocol`: 换算后的速度超出 32 位范围（此时不发送任何帧）
    pub fn velocity_control(&self, rpm: f64) -> Result<(), DriverError> {
        let command = VelocityCommand::new(rpm, self.config.gear_ratio)?;
        debug!(
            "Device 0x{:X}: velocity {} rpm (raw {})",
            self.config.device_id, rpm, command.speed_raw
        );
        self.send_and_wait(command.to_frame(self.config.device_id))
    }

    /// 位置闭环控制（输出轴角度，速度上限为输出轴 rpm）
    ///
    /// # 错误
    /// - `DriverError::Protocol`: 角度或速度上限超出线上格式范围（此时不发送任何帧）
    pub fn position_control(&self, angle_deg: f64, max_rpm: f64) -> Result<(), DriverError> {
        let command = PositionCommand::new(angle_deg, max_rpm, self.config.gear_ratio)?;
        debug!(
            "Device 0x{:X}: position {}° at {} rpm (raw angle {}, raw speed {})",
            self.config.device_id, angle_deg, max_rpm, command.angle_raw, command.speed_raw
        );
        self.send_and_wait(command.to_frame(self.config.device_id))
    }

    /// 系统控制命令
    pub fn system_control(&self, command: SystemCommand) -> Result<(), DriverError> {
        debug!("Device 0x{:X}: system command {:?}", self.config.device_id, command);
        self.send_and_wait(SystemControl(command).to_frame(self.config.device_id))
    }

    /// 关闭电机输出（0x80）
    pub fn power_off(&self) -> Result<(), DriverError> {
        self.system_control(SystemCommand::Off)
    }

    /// 停止电机（0x81）
    pub fn stop(&self) -> Result<(), DriverError> {
        self.system_control(SystemCommand::Stop)
    }

    /// 恢复运行（0x88）
    pub fn run(&self) -> Result<(), DriverError> {
        self.system_control(SystemCommand::Running)
    }

    /// 清除错误标志（0x9B）
    pub fn clear_error(&self) -> Result<(), DriverError> {
        self.system_control(SystemCommand::ClearErrorFlag)
    }

    /// 当前反馈快照
    pub fn feedback(&self) -> DrcFeedback {
        self.ctx.feedback()
    }

    /// 入站帧处理入口（与路由器回调相同）
    pub fn handle_frame(&self, frame: &CanFrame) {
        self.ctx.handle_frame(frame);
    }

    pub fn device_id(&self) -> u32 {
        self.config.device_id
    }

    pub fn gear_ratio(&self) -> f64 {
        self.config.gear_ratio
    }

    pub fn max_response_time(&self) -> Duration {
        self.config.max_response_time
    }

    pub fn config(&self) -> &DrcConfig {
        &self.config
    }
}
