//! 位置闭环命令

use anyhow::Result;
use clap::Args;
use rmd_driver::Drc;

/// 位置命令参数
#[derive(Args, Debug)]
pub struct PositionCommand {
    /// 输出轴目标角度（度）
    #[arg(allow_negative_numbers = true)]
    pub angle: f64,

    /// 输出轴速度上限（rpm）
    #[arg(short = 's', long, default_value_t = 10.0)]
    pub max_speed: f64,
}

impl PositionCommand {
    pub fn execute(&self, drc: &Drc) -> Result<()> {
        drc.position_control(self.angle, self.max_speed)?;
        println!(
            "position {:.2}° at up to {:.2} rpm accepted by 0x{:X}",
            self.angle,
            self.max_speed,
            drc.device_id()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_command_creation() {
        let cmd = PositionCommand {
            angle: -45.0,
            max_speed: 5.0,
        };
        assert_eq!(cmd.angle, -45.0);
        assert_eq!(cmd.max_speed, 5.0);
    }
}
