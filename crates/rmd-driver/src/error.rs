//! 驱动层错误类型定义

use rmd_can::CanError;
use rmd_protocol::ProtocolError;
use std::time::Duration;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 在最大响应时间内没有收到应答
    #[error("No response from device 0x{device_id:X} within {waited:?}")]
    Timeout { device_id: u32, waited: Duration },

    /// CAN 驱动错误
    #[error("CAN driver error: {0}")]
    Can(#[from] CanError),

    /// 协议错误（命令参数超出线上格式范围）
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 无效配置
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// 配置文件解析失败
    #[error("Config error: {0}")]
    Config(String),
}

impl DriverError {
    /// 是否是超时错误（可重试）
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout { .. })
    }
}
