//! 通用能力接口适配
//!
//! 把 `Drc` 包装成窄接口（电机、舵机、各类传感器），上层代码只依赖需要的能力。
//! 包装器借用 `&Drc`，每次调用都会走一次完整的发送并等待流程。

use crate::drc::Drc;
use crate::error::DriverError;
use rmd_protocol::ReadCommand;

/// 速度型电机：`power` 取值 [-1, 1]
pub trait Motor {
    fn power(&mut self, power: f32) -> Result<(), DriverError>;
}

/// 位置型舵机：目标角度（度）
pub trait Servo {
    fn position(&mut self, angle_deg: f64) -> Result<(), DriverError>;
}

/// 角度传感器（度）
pub trait RotationSensor {
    fn read(&mut self) -> Result<f64, DriverError>;
}

/// 温度传感器（°C）
pub trait TemperatureSensor {
    fn read(&mut self) -> Result<f64, DriverError>;
}

/// 角速度传感器（rpm）
pub trait AngularVelocitySensor {
    fn read(&mut self) -> Result<f64, DriverError>;
}

/// `power * max_speed_rpm` 作为速度指令
pub struct DrcMotor<'a> {
    drc: &'a Drc,
    max_speed_rpm: f64,
}

impl Motor for DrcMotor<'_> {
    fn power(&mut self, power: f32) -> Result<(), DriverError> {
        let power = f64::from(power.clamp(-1.0, 1.0));
        self.drc.velocity_control(power * self.max_speed_rpm)
    }
}

/// 以固定速度上限做位置控制
pub struct DrcServo<'a> {
    drc: &'a Drc,
    max_speed_rpm: f64,
}

impl Servo for DrcServo<'_> {
    fn position(&mut self, angle_deg: f64) -> Result<(), DriverError> {
        self.drc.position_control(angle_deg, self.max_speed_rpm)
    }
}

pub struct DrcRotationSensor<'a> {
    drc: &'a Drc,
}

impl RotationSensor for DrcRotationSensor<'_> {
    fn read(&mut self) -> Result<f64, DriverError> {
        self.drc.feedback_request(ReadCommand::MultiTurnsAngle)?;
        Ok(self.drc.feedback().angle_degrees())
    }
}

pub struct DrcTemperatureSensor<'a> {
    drc: &'a Drc,
}

impl TemperatureSensor for DrcTemperatureSensor<'_> {
    fn read(&mut self) -> Result<f64, DriverError> {
        self.drc.feedback_request(ReadCommand::Status2)?;
        Ok(self.drc.feedback().temperature_celsius())
    }
}

pub struct DrcAngularVelocitySensor<'a> {
    drc: &'a Drc,
}

impl AngularVelocitySensor for DrcAngularVelocitySensor<'_> {
    fn read(&mut self) -> Result<f64, DriverError> {
        self.drc.feedback_request(ReadCommand::Status2)?;
        Ok(self.drc.feedback().speed_rpm())
    }
}

pub fn make_motor(drc: &Drc, max_speed_rpm: f64) -> DrcMotor<'_> {
    DrcMotor { drc, max_speed_rpm }
}

pub fn make_servo(drc: &Drc, max_speed_rpm: f64) -> DrcServo<'_> {
    DrcServo { drc, max_speed_rpm }
}

pub fn make_rotation_sensor(drc: &Drc) -> DrcRotationSensor<'_> {
    DrcRotationSensor { drc }
}

pub fn make_temperature_sensor(drc: &Drc) -> DrcTemperatureSensor<'_> {
    DrcTemperatureSensor { drc }
}

pub fn make_angular_velocity_sensor(drc: &Drc) -> DrcAngularVelocitySensor<'_> {
    DrcAngularVelocitySensor { drc }
}
