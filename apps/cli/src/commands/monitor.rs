//! 监控命令：按固定频率轮询状态

use crate::commands::status::{format_feedback, query_all};
use anyhow::Result;
use clap::Args;
use rmd_driver::Drc;
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Args, Debug)]
pub struct MonitorCommand {
    /// 更新频率（Hz）
    #[arg(short, long, default_value_t = 10)]
    pub frequency: u32,

    /// 采样次数（0 表示一直运行）
    #[arg(short = 'n', long, default_value_t = 0)]
    pub count: u64,
}

impl MonitorCommand {
    pub fn execute(&self, drc: &Drc) -> Result<()> {
        let period = Duration::from_secs(1) / self.frequency.max(1);
        let mut sample = 0u64;

        while self.count == 0 || sample < self.count {
            let started = Instant::now();
            match query_all(drc) {
                Ok(()) => {
                    println!("--- sample {} ---", sample);
                    print!("{}", format_feedback(&drc.feedback(), drc.gear_ratio()));
                },
                // 单次超时不终止监控
                Err(e) => warn!("Sample {} failed: {}", sample, e),
            }
            sample += 1;

            if let Some(remaining) = period.checked_sub(started.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }
}
