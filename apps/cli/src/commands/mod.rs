//! 命令定义和实现

pub mod monitor;
pub mod position;
pub mod status;
pub mod system;
pub mod velocity;

pub use monitor::MonitorCommand;
pub use position::PositionCommand;
pub use status::StatusCommand;
pub use system::SystemAction;
pub use velocity::VelocityCommand;
