//! 协议常量定义
//!
//! 集中定义所有定点数比例尺，避免在代码中散落"魔法数"。

/// DRC 帧负载固定长度
pub const FRAME_LEN: usize = 8;

/// 1 rpm 对应的 °/s
pub const DPS_PER_RPM: f64 = 6.0;

/// 速度闭环命令（0xA2）的速度 LSB：0.01 °/s
pub const DPS_PER_LSB_SPEED: f64 = 0.01;

/// 位置闭环命令（0xA4）的速度上限 LSB：1 °/s
pub const DPS_PER_LSB_ANGLE: f64 = 1.0;

/// 位置 / 多圈角度 LSB：0.01 °
pub const DEG_PER_LSB: f64 = 0.01;

/// 状态 2 应答中的速度 LSB：1 °/s
pub const FEEDBACK_DPS_PER_LSB: f64 = 1.0;

/// 电流原始值量程（±2048 对应 ±33 A）
pub const RAW_CURRENT_RANGE: f64 = 2048.0;

/// 电流物理量程（A）
pub const CURRENT_RANGE_AMPS: f64 = 33.0;

/// 电压 LSB：0.1 V
pub const VOLTS_PER_LSB: f64 = 0.1;

/// 温度 LSB：1 °C
pub const CELSIUS_PER_LSB: f64 = 1.0;

/// 错误状态字节中保护触发标志所在的位
///
/// 过压和过温两个标志读取同一个位，未经数据手册确认前不拆分。
pub const PROTECTION_TRIPPED_BIT: u8 = 3;

/// 默认设备 ID（DRC 电机 ID 从 0x141 开始）
pub const DEFAULT_DEVICE_ID: u32 = 0x141;
