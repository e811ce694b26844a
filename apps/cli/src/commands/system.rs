//! 系统控制命令

use anyhow::Result;
use clap::Subcommand;
use rmd_driver::{Drc, SystemCommand};

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemAction {
    /// 关闭电机输出（0x80）
    Off,
    /// 停止电机（0x81）
    Stop,
    /// 恢复运行（0x88）
    Run,
    /// 清除错误标志（0x9B）
    ClearError,
}

impl SystemAction {
    pub fn command(self) -> SystemCommand {
        match self {
            SystemAction::Off => SystemCommand::Off,
            SystemAction::Stop => SystemCommand::Stop,
            SystemAction::Run => SystemCommand::Running,
            SystemAction::ClearError => SystemCommand::ClearErrorFlag,
        }
    }

    pub fn execute(self, drc: &Drc) -> Result<()> {
        drc.system_control(self.command())?;
        println!("{:?} acknowledged by 0x{:X}", self.command(), drc.device_id());
        Ok(())
    }
}
