//! # RMD Protocol
//!
//! RMD 智能舵机（DRC 驱动器）CAN 总线协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `opcodes`: 命令字节（Byte 0）常量与命令族枚举
//! - `constants`: 定点数比例尺等协议常量
//! - `command`: 命令帧构建（物理量 -> 8 字节负载）
//! - `feedback`: 应答帧解析与反馈快照
//!
//! ## 字节序
//!
//! DRC 协议的多字节字段全部使用 Intel (LSB) 低位在前（小端字节序）。
//! 本模块提供了字节序转换工具函数。

pub mod command;
pub mod constants;
pub mod feedback;
pub mod opcodes;

// 重新导出常用类型
pub use command::*;
pub use constants::*;
pub use feedback::*;
pub use opcodes::*;

/// CAN 2.0 标准帧的统一抽象
///
/// `CanFrame` 是协议层和硬件层之间的中间抽象：
///
/// ```text
/// Protocol Layer (rmd-protocol)
///     ↓ DrcResponse::parse() 解析 / to_frame() 构建
/// CanFrame (此类型)
///     ↓ 转换逻辑在 CAN 层实现
/// CAN Layer (rmd-can)
///     ↓ SocketCAN / Mock 适配器
/// Hardware
/// ```
///
/// - **Copy trait**：零成本复制
/// - **固定 8 字节**：DRC 协议所有帧都是 8 字节，避免堆分配
///
/// # 转换示例
///
/// ```rust
/// use rmd_protocol::CanFrame;
///
/// let frame = CanFrame::new_standard(0x141, &[0x9C, 0, 0, 0, 0, 0, 0, 0]);
/// assert_eq!(frame.id(), 0x141);
/// assert_eq!(frame.data_slice().len(), 8);
///
/// let short = CanFrame::new_standard(0x141, &[1, 2, 3, 4]);
/// assert_eq!(short.data_slice(), &[1, 2, 3, 4]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CanFrame {
    /// CAN ID（标准帧或扩展帧）
    pub id: u32,

    /// 帧数据（固定 8 字节，未使用部分为 0）
    pub data: [u8; 8],

    /// 有效数据长度 (0-8)
    pub len: u8,

    /// 是否为扩展帧（29-bit ID）
    pub is_extended: bool,
}

impl CanFrame {
    /// 创建标准帧
    pub fn new_standard(id: u16, data: &[u8]) -> Self {
        Self::new(id as u32, data, false)
    }

    /// 创建扩展帧
    pub fn new_extended(id: u32, data: &[u8]) -> Self {
        Self::new(id, data, true)
    }

    fn new(id: u32, data: &[u8], is_extended: bool) -> Self {
        let mut fixed_data = [0u8; 8];
        let len = data.len().min(8);
        fixed_data[..len].copy_from_slice(&data[..len]);

        Self {
            id,
            data: fixed_data,
            len: len as u8,
            is_extended,
        }
    }

    /// 获取数据切片（只包含有效数据）
    pub fn data_slice(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// 获取 CAN ID
    pub fn id(&self) -> u32 {
        self.id
    }

    /// 获取完整数据（8字节固定数组）
    pub fn data(&self) -> &[u8; 8] {
        &self.data
    }
}

use thiserror::Error;

/// 协议编解码错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// 物理量转换为定点数后超出字段范围（在发送任何帧之前报告）
    #[error("Value out of bounds for field {field}: {value}")]
    OutOfBounds { field: &'static str, value: f64 },
}

/// 小端字节序转 i16
pub fn bytes_to_i16_le(bytes: [u8; 2]) -> i16 {
    i16::from_le_bytes(bytes)
}

/// 小端字节序转 i32
pub fn bytes_to_i32_le(bytes: [u8; 4]) -> i32 {
    i32::from_le_bytes(bytes)
}

/// 7 字节小端有符号整数（56 位）转 i64
///
/// 多圈角度是协议中唯一超过 32 位的字段，没有原生的 7 字节加载，
/// 需要逐字节拼接后从 bit 55 做符号扩展。
pub fn bytes_to_i56_le(bytes: [u8; 7]) -> i64 {
    let mut raw: u64 = 0;
    for (i, byte) in bytes.iter().enumerate() {
        raw |= (*byte as u64) << (8 * i);
    }
    // 左移到最高位再算术右移，完成符号扩展
    ((raw << 8) as i64) >> 8
}

/// i16 转小端字节序
pub fn i16_to_bytes_le(value: i16) -> [u8; 2] {
    value.to_le_bytes()
}

/// i32 转小端字节序
pub fn i32_to_bytes_le(value: i32) -> [u8; 4] {
    value.to_le_bytes()
}
