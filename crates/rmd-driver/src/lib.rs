//! # RMD Driver Layer
//!
//! RMD 智能舵机（DRC 协议）驱动层：命令发送、应答等待与反馈状态同步。
//!
//! ## 模块
//!
//! - `drc`: 驱动门面（`Drc`），每条命令发送后阻塞等待应答或超时
//! - `state`: 反馈快照（`ArcSwap`）与入站帧处理
//! - `builder`: 链式构造
//! - `config`: 驱动配置（可选 TOML）
//! - `clock`: 单调时钟与超时令牌
//! - `adapters`: 电机 / 舵机 / 传感器窄接口
//! - `error`: 错误类型
//!
//! ## 快速开始
//!
//! ```no_run
//! use rmd_can::{CanRouter, SocketCanAdapter};
//! use rmd_driver::{DrcBuilder, ReadCommand};
//!
//! let router = CanRouter::new(SocketCanAdapter::new("can0").unwrap());
//! let drc = DrcBuilder::new(router).gear_ratio(6.0).build().unwrap();
//!
//! drc.feedback_request(ReadCommand::Status2).unwrap();
//! let fb = drc.feedback();
//! println!("{:.1} °C, {:.2} A", fb.temperature_celsius(), fb.current_amps());
//! ```

pub mod adapters;
mod builder;
pub mod clock;
pub mod config;
mod drc;
pub mod error;
pub mod state;

pub use adapters::{
    AngularVelocitySensor, DrcAngularVelocitySensor, DrcMotor, DrcRotationSensor, DrcServo,
    DrcTemperatureSensor, Motor, RotationSensor, Servo, TemperatureSensor, make_angular_velocity_sensor,
    make_motor, make_rotation_sensor, make_servo, make_temperature_sensor,
};
pub use builder::DrcBuilder;
pub use clock::{Elapsed, MonotonicClock, SteadyClock, Timeout};
pub use config::{DEFAULT_MAX_RESPONSE_TIME, DrcConfig};
pub use drc::Drc;
pub use error::DriverError;
pub use state::DrcContext;

// 重新导出协议层常用类型
pub use rmd_protocol::{DrcFeedback, ErrorState, ReadCommand, SystemCommand};
