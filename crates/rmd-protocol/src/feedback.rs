//! 应答帧解析与反馈快照
//!
//! DRC 电机对每条命令都会回一帧，Byte 0 回显命令字节。
//! 按 Byte 0 分发到三种应答布局，解析结果再合并进 [`DrcFeedback`]。

use crate::constants::{
    CELSIUS_PER_LSB, CURRENT_RANGE_AMPS, DEG_PER_LSB, DPS_PER_RPM, FEEDBACK_DPS_PER_LSB, FRAME_LEN,
    RAW_CURRENT_RANGE, VOLTS_PER_LSB,
};
use crate::opcodes::{
    OP_MULTI_TURNS_ANGLE, OP_POSITION_2, OP_SPEED, OP_STATUS_1_AND_ERROR_FLAGS, OP_STATUS_2,
};
use crate::{CanFrame, ProtocolError, bytes_to_i16_le, bytes_to_i56_le};
use bilge::prelude::*;

// ============================================================================
// 错误状态位域（状态 1 应答 Byte 7）
// ============================================================================

/// 错误状态位域
///
/// - Bit 0-2: 未使用
/// - Bit 3: 保护触发标志（过压与过温共用此位）
/// - Bit 4-7: 未使用
///
/// 过压和过温是否真的共用一个位尚未对照数据手册确认，
/// 在确认之前两个访问器读取同一个位。
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default)]
pub struct ErrorState {
    pub low_bits: u3,
    pub protection_tripped: bool, // Bit 3
    pub high_bits: u4,
}

// ============================================================================
// 应答解析
// ============================================================================

/// 已识别的应答
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrcResponse {
    /// 状态 2 布局（0x9C，以及回显的 0xA2 / 0xA4）
    ///
    /// | Byte | 内容 |
    /// |---|---|
    /// | 1 | 温度，i8 |
    /// | 2-3 | 转矩电流，i16 小端 |
    /// | 4-5 | 速度，i16 小端，1 °/s/LSB |
    /// | 6-7 | 编码器位置，i16 小端 |
    Status2 {
        temperature: i8,
        current: i16,
        speed: i16,
        encoder: i16,
    },

    /// 状态 1 + 错误标志（0x9A）
    ///
    /// | Byte | 内容 |
    /// |---|---|
    /// | 1 | 温度，i8 |
    /// | 3-4 | 电压，i16 小端，0.1 V/LSB |
    /// | 7 | 错误状态位 |
    Status1AndErrorFlags {
        temperature: i8,
        volts: i16,
        error_state: u8,
    },

    /// 多圈角度（0x92），Byte 1-7 为 56 位有符号小端整数，0.01 °/LSB
    MultiTurnsAngle { angle: i64 },
}

impl DrcResponse {
    /// 按 Byte 0 解析负载
    ///
    /// 未识别的命令字节返回 `None`（不是错误，调用方应忽略该帧）。
    pub fn parse(data: &[u8; FRAME_LEN]) -> Option<Self> {
        match data[0] {
            OP_STATUS_2 | OP_SPEED | OP_POSITION_2 => Some(DrcResponse::Status2 {
                temperature: data[1] as i8,
                current: bytes_to_i16_le([data[2], data[3]]),
                speed: bytes_to_i16_le([data[4], data[5]]),
                encoder: bytes_to_i16_le([data[6], data[7]]),
            }),
            OP_STATUS_1_AND_ERROR_FLAGS => Some(DrcResponse::Status1AndErrorFlags {
                temperature: data[1] as i8,
                volts: bytes_to_i16_le([data[3], data[4]]),
                error_state: data[7],
            }),
            OP_MULTI_TURNS_ANGLE => {
                let mut angle_bytes = [0u8; 7];
                angle_bytes.copy_from_slice(&data[1..8]);
                Some(DrcResponse::MultiTurnsAngle {
                    angle: bytes_to_i56_le(angle_bytes),
                })
            },
            _ => None,
        }
    }

    /// 从 CAN 帧解析（先验证长度）
    ///
    /// # 错误
    /// - `ProtocolError::InvalidLength`: 帧长度不是 8
    pub fn from_frame(frame: &CanFrame) -> Result<Option<Self>, ProtocolError> {
        if frame.len as usize != FRAME_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: FRAME_LEN,
                actual: frame.len as usize,
            });
        }
        Ok(Self::parse(&frame.data))
    }
}

// ============================================================================
// 反馈快照
// ============================================================================

/// 电机最近一次上报的遥测数据
///
/// 快照是"合并"而不是"替换"：每种应答只刷新自己携带的字段，其余字段保持原值。
/// 所有物理量都是电机侧的值（未除以减速比）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DrcFeedback {
    /// 已接收帧计数（含校验失败的帧），仅用作"有应答到达"的信号
    pub message_number: u32,
    /// 多圈角度（0.01 °/LSB）
    pub raw_multi_turn_angle: i64,
    /// 转矩电流（±2048 对应 ±33 A）
    pub raw_current: i16,
    /// 速度（1 °/s/LSB）
    pub raw_speed: i16,
    /// 电压（0.1 V/LSB）
    pub raw_volts: i16,
    /// 编码器原始值
    pub encoder: i16,
    /// 温度（1 °C/LSB）
    pub raw_motor_temperature: i8,
    /// 错误状态位
    pub raw_error_state: u8,
}

impl DrcFeedback {
    /// 把一条应答合并进快照
    pub fn apply(&mut self, response: &DrcResponse) {
        match *response {
            DrcResponse::Status2 {
                temperature,
                current,
                speed,
                encoder,
            } => {
                self.raw_motor_temperature = temperature;
                self.raw_current = current;
                self.raw_speed = speed;
                self.encoder = encoder;
            },
            DrcResponse::Status1AndErrorFlags {
                temperature,
                volts,
                error_state,
            } => {
                self.raw_motor_temperature = temperature;
                self.raw_volts = volts;
                self.raw_error_state = error_state;
            },
            DrcResponse::MultiTurnsAngle { angle } => {
                self.raw_multi_turn_angle = angle;
            },
        }
    }

    /// 转矩电流（A）
    pub fn current_amps(&self) -> f64 {
        self.raw_current as f64 * CURRENT_RANGE_AMPS / RAW_CURRENT_RANGE
    }

    /// 转速（rpm）
    pub fn speed_rpm(&self) -> f64 {
        self.raw_speed as f64 * FEEDBACK_DPS_PER_LSB / DPS_PER_RPM
    }

    /// 母线电压（V）
    pub fn volts(&self) -> f64 {
        self.raw_volts as f64 * VOLTS_PER_LSB
    }

    /// 电机温度（°C）
    pub fn temperature_celsius(&self) -> f64 {
        self.raw_motor_temperature as f64 * CELSIUS_PER_LSB
    }

    /// 多圈角度（度）
    pub fn angle_degrees(&self) -> f64 {
        self.raw_multi_turn_angle as f64 * DEG_PER_LSB
    }

    /// 错误状态位域视图
    pub fn error_state(&self) -> ErrorState {
        ErrorState::from(u8::new(self.raw_error_state))
    }

    /// 是否触发过压保护
    ///
    /// 需要先发送 `Status1AndErrorFlags` 反馈请求才会刷新。
    pub fn over_voltage_protection_tripped(&self) -> bool {
        self.error_state().protection_tripped()
    }

    /// 是否触发过温保护
    ///
    /// 需要先发送 `Status1AndErrorFlags` 反馈请求才会刷新。
    pub fn over_temperature_protection_tripped(&self) -> bool {
        self.error_state().protection_tripped()
    }
}
