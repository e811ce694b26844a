//! 状态查询命令
//!
//! 依次请求多圈角度、状态 1（电压、错误位）和状态 2（电流、速度、编码器），打印合并后的快照。

use anyhow::Result;
use clap::Args;
use rmd_driver::{Drc, DrcFeedback, ReadCommand};

/// 状态查询参数
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// 只打印原始值
    #[arg(long)]
    pub raw: bool,
}

impl StatusCommand {
    pub fn execute(&self, drc: &Drc) -> Result<()> {
        query_all(drc)?;
        let fb = drc.feedback();

        if self.raw {
            println!("{:#?}", fb);
        } else {
            print!("{}", format_feedback(&fb, drc.gear_ratio()));
        }
        Ok(())
    }
}

/// 请求全部三种反馈
pub fn query_all(drc: &Drc) -> Result<()> {
    drc.feedback_request(ReadCommand::MultiTurnsAngle)?;
    drc.feedback_request(ReadCommand::Status1AndErrorFlags)?;
    drc.feedback_request(ReadCommand::Status2)?;
    Ok(())
}

/// 以输出轴为单位格式化快照
pub fn format_feedback(fb: &DrcFeedback, gear_ratio: f64) -> String {
    let flag = |tripped: bool| if tripped { "TRIPPED" } else { "ok" };
    format!(
        "angle:        {:.2}°\n\
         speed:        {:.2} rpm\n\
         current:      {:.2} A\n\
         voltage:      {:.1} V\n\
         temperature:  {:.0} °C\n\
         encoder:      {}\n\
         over-voltage: {}\n\
         over-temp:    {}\n",
        fb.angle_degrees() / gear_ratio,
        fb.speed_rpm() / gear_ratio,
        fb.current_amps(),
        fb.volts(),
        fb.temperature_celsius(),
        fb.encoder,
        flag(fb.over_voltage_protection_tripped()),
        flag(fb.over_temperature_protection_tripped()),
    )
}
