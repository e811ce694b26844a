//! 连接参数
//!
//! 所有子命令共享的全局参数：接口、设备 ID、减速比、超时，或者一个 TOML 配置文件。
//! 命令行参数优先于配置文件。

use anyhow::{Context, Result};
use clap::Args;
use rmd_driver::{Drc, DrcConfig};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// CAN 接口（如 can0、vcan0）
    #[arg(short, long, global = true, default_value = "can0")]
    pub interface: String,

    /// 设备 ID（十进制或 0x 前缀十六进制，默认 0x141）
    #[arg(short, long, global = true, value_parser = parse_device_id)]
    pub device_id: Option<u32>,

    /// 减速比（默认 1.0）
    #[arg(short, long, global = true)]
    pub gear_ratio: Option<f64>,

    /// 每条命令的最大响应时间（毫秒，默认 10）
    #[arg(short = 't', long, global = true)]
    pub timeout_ms: Option<u64>,

    /// TOML 配置文件（`[drc]` 表）
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// 解析十进制或 `0x` 前缀的十六进制设备 ID
pub fn parse_device_id(text: &str) -> Result<u32, String> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("invalid device id '{}': {}", text, e))
}

impl ConnectionArgs {
    /// 合并配置文件与命令行参数
    pub fn resolve_config(&self) -> Result<DrcConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
                DrcConfig::from_toml_str(&text)
                    .with_context(|| format!("解析配置文件失败: {}", path.display()))?
            },
            None => DrcConfig::default(),
        };

        if let Some(device_id) = self.device_id {
            config.device_id = device_id;
        }
        if let Some(gear_ratio) = self.gear_ratio {
            config.gear_ratio = gear_ratio;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.max_response_time = Duration::from_millis(timeout_ms);
        }

        config.validate()?;
        Ok(config)
    }

    /// 打开 CAN 接口并完成电机上电复位
    #[cfg(target_os = "linux")]
    pub fn connect(&self) -> Result<Drc> {
        use rmd_can::{CanRouter, SocketCanAdapter};
        use rmd_driver::DrcBuilder;

        let config = self.resolve_config()?;
        info!(
            "Connecting to device 0x{:X} on {}",
            config.device_id, self.interface
        );

        let adapter = SocketCanAdapter::new(&self.interface)
            .with_context(|| format!("打开 CAN 接口失败: {}", self.interface))?;
        let router = CanRouter::new(adapter);
        let drc = DrcBuilder::new(router)
            .config(config)
            .build()
            .context("电机上电复位失败")?;
        Ok(drc)
    }

    #[cfg(not(target_os = "linux"))]
    pub fn connect(&self) -> Result<Drc> {
        let config = self.resolve_config()?;
        info!("Device 0x{:X} requested on {}", config.device_id, self.interface);
        anyhow::bail!("SocketCAN is only available on Linux")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn base_args() -> ConnectionArgs {
        ConnectionArgs {
            interface: "vcan0".to_string(),
            device_id: None,
            gear_ratio: None,
            timeout_ms: None,
            config: None,
        }
    }

    #[test]
    fn test_parse_device_id() {
        assert_eq!(parse_device_id("0x141"), Ok(0x141));
        assert_eq!(parse_device_id("0X142"), Ok(0x142));
        assert_eq!(parse_device_id("321"), Ok(321));
        assert!(parse_device_id("0xZZ").is_err());
        assert!(parse_device_id("").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = base_args().resolve_config().unwrap();
        assert_eq!(config, DrcConfig::default());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[drc]\ndevice_id = 0x143\ngear_ratio = 6.0\nmax_response_time_ms = 50"
        )
        .unwrap();

        let mut args = base_args();
        args.config = Some(file.path().to_path_buf());
        args.gear_ratio = Some(9.0);

        let config = args.resolve_config().unwrap();
        assert_eq!(config.device_id, 0x143);
        assert_eq!(config.gear_ratio, 9.0);
        assert_eq!(config.max_response_time, Duration::from_millis(50));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let mut args = base_args();
        args.gear_ratio = Some(0.0);
        assert!(args.resolve_config().is_err());

        let mut args = base_args();
        args.device_id = Some(0x900);
        assert!(args.resolve_config().is_err());
    }
}
