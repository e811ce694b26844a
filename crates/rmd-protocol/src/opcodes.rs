//! 命令字节常量定义和命令族枚举
//!
//! DRC 协议的每一帧都以命令字节（Byte 0）开头，应答帧回显同一个命令字节。
//! 常量用于 `match` 分发，枚举用于对外的类型安全 API。

use num_enum::{IntoPrimitive, TryFromPrimitive};

// ============================================================================
// 反馈请求
// ============================================================================

/// 读取多圈角度
pub const OP_MULTI_TURNS_ANGLE: u8 = 0x92;

/// 读取状态 1 + 错误标志
pub const OP_STATUS_1_AND_ERROR_FLAGS: u8 = 0x9A;

/// 读取状态 2
pub const OP_STATUS_2: u8 = 0x9C;

// ============================================================================
// 运动控制
// ============================================================================

/// 速度闭环控制
pub const OP_SPEED: u8 = 0xA2;

/// 位置闭环控制 2（带速度上限）
pub const OP_POSITION_2: u8 = 0xA4;

// ============================================================================
// 参数写入（本驱动不解码其应答）
// ============================================================================

pub const OP_PID_TO_RAM: u8 = 0x31;
pub const OP_PID_TO_ROM: u8 = 0x32;
pub const OP_ACCELERATION_TO_RAM: u8 = 0x34;
pub const OP_ENCODER_OFFSET: u8 = 0x91;
pub const OP_CURRENT_POSITION_TO_ROM_AS_ZERO: u8 = 0x19;

// ============================================================================
// 系统控制
// ============================================================================

/// 清除错误标志
pub const OP_CLEAR_ERROR_FLAG: u8 = 0x9B;

/// 电机关闭
pub const OP_MOTOR_OFF: u8 = 0x80;

/// 电机停止
pub const OP_MOTOR_STOP: u8 = 0x81;

/// 电机运行
pub const OP_MOTOR_RUNNING: u8 = 0x88;

/// 反馈请求命令
///
/// 每种请求只刷新反馈快照中的一部分字段：
///
/// | 请求 | 刷新字段 |
/// |---|---|
/// | `MultiTurnsAngle` | `raw_multi_turn_angle` |
/// | `Status1AndErrorFlags` | `raw_motor_temperature`, `raw_volts`, `raw_error_state` |
/// | `Status2` | `raw_motor_temperature`, `raw_current`, `raw_speed`, `encoder` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ReadCommand {
    MultiTurnsAngle = OP_MULTI_TURNS_ANGLE,
    Status1AndErrorFlags = OP_STATUS_1_AND_ERROR_FLAGS,
    Status2 = OP_STATUS_2,
}

/// 运动控制命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ActuateCommand {
    Speed = OP_SPEED,
    Position2 = OP_POSITION_2,
}

/// 参数写入命令
///
/// 仅定义命令字节；本驱动不构建这些帧，也不解码它们的应答。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum WriteCommand {
    PidToRam = OP_PID_TO_RAM,
    PidToRom = OP_PID_TO_ROM,
    AccelerationDataToRam = OP_ACCELERATION_TO_RAM,
    EncoderOffset = OP_ENCODER_OFFSET,
    CurrentPositionToRomAsMotorZero = OP_CURRENT_POSITION_TO_ROM_AS_ZERO,
}

/// 系统控制命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SystemCommand {
    ClearErrorFlag = OP_CLEAR_ERROR_FLAG,
    Off = OP_MOTOR_OFF,
    Stop = OP_MOTOR_STOP,
    Running = OP_MOTOR_RUNNING,
}
