//! # RMD CLI
//!
//! RMD 智能舵机命令行工具（SocketCAN）。
//!
//! ```bash
//! # 速度闭环：输出轴 10 rpm（减速比 6）
//! rmd-cli --interface can0 --gear-ratio 6 velocity 10
//!
//! # 位置闭环：-90°，速度上限 5 rpm
//! rmd-cli -d 0x142 position -- -90 --max-speed 5
//!
//! # 查询状态 / 关闭输出
//! rmd-cli status
//! rmd-cli system off
//!
//! # 使用配置文件
//! rmd-cli --config motor.toml monitor --frequency 20
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod connection;

use commands::{MonitorCommand, PositionCommand, StatusCommand, SystemAction, VelocityCommand};
use connection::ConnectionArgs;

/// RMD CLI - 智能舵机命令行工具
#[derive(Parser, Debug)]
#[command(name = "rmd-cli")]
#[command(about = "Command-line interface for RMD smart servos", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 速度闭环控制
    Velocity {
        #[command(flatten)]
        args: VelocityCommand,
    },

    /// 位置闭环控制
    Position {
        #[command(flatten)]
        args: PositionCommand,
    },

    /// 查询状态
    Status {
        #[command(flatten)]
        args: StatusCommand,
    },

    /// 系统控制
    #[command(subcommand)]
    System(SystemAction),

    /// 监控电机状态
    Monitor {
        #[command(flatten)]
        args: MonitorCommand,
    },

    /// 打印合并后的配置（不连接设备）
    Config,
}

fn main() -> Result<()> {
    // 初始化日志
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rmd_cli=info,rmd_driver=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    if let Commands::Config = cli.command {
        let config = cli.connection.resolve_config()?;
        println!("interface:         {}", cli.connection.interface);
        println!("device id:         0x{:X}", config.device_id);
        println!("gear ratio:        {}", config.gear_ratio);
        println!("max response time: {:?}", config.max_response_time);
        println!("poll interval:     {:?}", config.poll_interval);
        return Ok(());
    }

    let drc = cli.connection.connect()?;

    match cli.command {
        Commands::Velocity { args } => args.execute(&drc),
        Commands::Position { args } => args.execute(&drc),
        Commands::Status { args } => args.execute(&drc),
        Commands::System(action) => action.execute(&drc),
        Commands::Monitor { args } => args.execute(&drc),
        Commands::Config => Ok(()),
    }
}
