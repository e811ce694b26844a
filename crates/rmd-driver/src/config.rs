//! 驱动配置

use crate::error::DriverError;
use rmd_protocol::DEFAULT_DEVICE_ID;
use std::time::Duration;

/// 标准帧 ID 上限（11 位）
const MAX_STANDARD_ID: u32 = 0x7FF;

/// 默认最大响应时间
pub const DEFAULT_MAX_RESPONSE_TIME: Duration = Duration::from_millis(10);

/// DRC 驱动配置
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DrcConfig {
    /// 电机的 CAN ID（命令与应答共用）
    pub device_id: u32,
    /// 减速比（输出轴 -> 电机轴）
    pub gear_ratio: f64,
    /// 每次命令等待应答的最长时间
    pub max_response_time: Duration,
    /// 等待应答时两次轮询之间的休眠，为零时忙等
    pub poll_interval: Duration,
}

impl Default for DrcConfig {
    fn default() -> Self {
        Self {
            device_id: DEFAULT_DEVICE_ID,
            gear_ratio: 1.0,
            max_response_time: DEFAULT_MAX_RESPONSE_TIME,
            poll_interval: Duration::ZERO,
        }
    }
}

impl DrcConfig {
    /// 校验配置
    ///
    /// # 错误
    /// - `DriverError::InvalidConfig`: 减速比非有限值或为零；设备 ID 不是 11 位标准帧 ID
    pub fn validate(&self) -> Result<(), DriverError> {
        if !self.gear_ratio.is_finite() || self.gear_ratio == 0.0 {
            return Err(DriverError::InvalidConfig(format!(
                "gear ratio must be finite and non-zero, got {}",
                self.gear_ratio
            )));
        }
        if self.device_id > MAX_STANDARD_ID {
            return Err(DriverError::InvalidConfig(format!(
                "device id 0x{:X} is not an 11-bit standard CAN id",
                self.device_id
            )));
        }
        Ok(())
    }

    /// 从 TOML 文本解析 `[drc]` 表
    ///
    /// ```toml
    /// [drc]
    /// device_id = 0x141
    /// gear_ratio = 6.0
    /// max_response_time_ms = 10
    /// poll_interval_us = 0
    /// ```
    ///
    /// 缺省字段取默认值。解析后会做一次 `validate()`。
    #[cfg(feature = "serde")]
    pub fn from_toml_str(text: &str) -> Result<Self, DriverError> {
        let file: file::ConfigFile =
            toml::from_str(text).map_err(|e| DriverError::Config(e.to_string()))?;
        let config = file.drc.into_config();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "serde")]
mod file {
    use super::DrcConfig;
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Debug, Deserialize)]
    pub(super) struct ConfigFile {
        #[serde(default)]
        pub(super) drc: DrcSection,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    pub(super) struct DrcSection {
        device_id: Option<u32>,
        gear_ratio: Option<f64>,
        max_response_time_ms: Option<u64>,
        poll_interval_us: Option<u64>,
    }

    impl DrcSection {
        pub(super) fn into_config(self) -> DrcConfig {
            let defaults = DrcConfig::default();
            DrcConfig {
                device_id: self.device_id.unwrap_or(defaults.device_id),
                gear_ratio: self.gear_ratio.unwrap_or(defaults.gear_ratio),
                max_response_time: self
                    .max_response_time_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.max_response_time),
                poll_interval: self
                    .poll_interval_us
                    .map(Duration::from_micros)
                    .unwrap_or(defaults.poll_interval),
            }
        }
    }
}
