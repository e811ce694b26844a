//! 速度闭环命令

use anyhow::Result;
use clap::Args;
use rmd_driver::Drc;

/// 速度命令参数
#[derive(Args, Debug)]
pub struct VelocityCommand {
    /// 输出轴转速（rpm，负值反转）
    #[arg(allow_negative_numbers = true)]
    pub rpm: f64,
}

impl VelocityCommand {
    pub fn execute(&self, drc: &Drc) -> Result<()> {
        drc.velocity_control(self.rpm)?;

        let fb = drc.feedback();
        println!(
            "velocity {:.2} rpm -> speed {:.2} rpm, current {:.2} A, {:.0} °C",
            self.rpm,
            fb.speed_rpm() / drc.gear_ratio(),
            fb.current_amps(),
            fb.temperature_celsius()
        );
        Ok(())
    }
}
