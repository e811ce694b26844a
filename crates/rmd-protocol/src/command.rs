//! 命令帧结构体定义
//!
//! 把物理量（rpm、度）转换为 DRC 定点数，并打包成固定 8 字节负载。
//! 所有越界检查都在构建阶段完成，越界时不会产生任何帧。

use crate::constants::{DEG_PER_LSB, DPS_PER_LSB_ANGLE, DPS_PER_LSB_SPEED, DPS_PER_RPM, FRAME_LEN};
use crate::opcodes::{ActuateCommand, OP_POSITION_2, OP_SPEED, ReadCommand, SystemCommand};
use crate::{CanFrame, ProtocolError, bytes_to_i32_le, i32_to_bytes_le};

/// 四舍五入后检查是否落在 i32 范围内
fn bounds_check_i32(field: &'static str, value: f64) -> Result<i32, ProtocolError> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
        return Err(ProtocolError::OutOfBounds { field, value });
    }
    Ok(rounded as i32)
}

/// rpm 转换为 DRC 速度定点数
///
/// 公式：`rpm * gear_ratio * 6 / dps_per_lsb`
///
/// # 参数
/// - `rpm`: 输出轴转速（rpm）
/// - `gear_ratio`: 减速比
/// - `dps_per_lsb`: 目标字段的 LSB（°/s）
pub fn rpm_to_drc_speed(rpm: f64, gear_ratio: f64, dps_per_lsb: f64) -> Result<i32, ProtocolError> {
    let dps = rpm * gear_ratio * DPS_PER_RPM / dps_per_lsb;
    bounds_check_i32("speed", dps)
}

/// 度转换为 DRC 角度定点数（0.01°/LSB）
///
/// 公式：`(angle * gear_ratio) / 0.01`
pub fn degrees_to_drc_angle(angle_deg: f64, gear_ratio: f64) -> Result<i32, ProtocolError> {
    bounds_check_i32("angle", (angle_deg * gear_ratio) / DEG_PER_LSB)
}

/// 根据设备 ID 构建帧：11 位以内使用标准帧，否则使用扩展帧
pub fn frame_for(device_id: u32, payload: [u8; FRAME_LEN]) -> CanFrame {
    if device_id <= 0x7FF {
        CanFrame::new_standard(device_id as u16, &payload)
    } else {
        CanFrame::new_extended(device_id, &payload)
    }
}

/// 只有命令字节、其余 7 字节为 0 的负载
fn opcode_only(opcode: u8) -> [u8; FRAME_LEN] {
    let mut data = [0u8; FRAME_LEN];
    data[0] = opcode;
    data
}

// ============================================================================
// 速度闭环控制（0xA2）
// ============================================================================

/// 速度闭环控制指令
///
/// 负载布局：
///
/// | Byte | 内容 |
/// |---|---|
/// | 0 | `0xA2` |
/// | 1-3 | 保留（0） |
/// | 4-7 | 速度，i32 小端，0.01 °/s/LSB（电机侧） |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VelocityCommand {
    /// 电机侧速度原始值（0.01 °/s/LSB）
    pub speed_raw: i32,
}

impl VelocityCommand {
    /// 从输出轴转速创建指令
    ///
    /// # 错误
    /// - `ProtocolError::OutOfBounds`: 换算后的定点数超出 i32 范围
    pub fn new(rpm: f64, gear_ratio: f64) -> Result<Self, ProtocolError> {
        Ok(Self {
            speed_raw: rpm_to_drc_speed(rpm, gear_ratio, DPS_PER_LSB_SPEED)?,
        })
    }

    /// 直接从原始值创建
    pub fn from_raw(speed_raw: i32) -> Self {
        Self { speed_raw }
    }

    /// 还原输出轴转速（rpm），`new` 的逆变换
    pub fn rpm(&self, gear_ratio: f64) -> f64 {
        self.speed_raw as f64 * DPS_PER_LSB_SPEED / DPS_PER_RPM / gear_ratio
    }

    /// 从负载解析（命令字节不是 0xA2 时返回 `None`）
    pub fn from_payload(payload: &[u8; FRAME_LEN]) -> Option<Self> {
        if payload[0] != OP_SPEED {
            return None;
        }
        Some(Self {
            speed_raw: bytes_to_i32_le([payload[4], payload[5], payload[6], payload[7]]),
        })
    }

    /// 转换为 8 字节负载
    pub fn to_payload(self) -> [u8; FRAME_LEN] {
        let mut data = opcode_only(ActuateCommand::Speed.into());
        // Byte 1-3: 保留，已初始化为 0
        data[4..8].copy_from_slice(&i32_to_bytes_le(self.speed_raw));
        data
    }

    /// 转换为 CAN 帧
    pub fn to_frame(self, device_id: u32) -> CanFrame {
        frame_for(device_id, self.to_payload())
    }
}

// ============================================================================
// 位置闭环控制 2（0xA4）
// ============================================================================

/// 位置闭环控制指令（带速度上限）
///
/// 负载布局：
///
/// | Byte | 内容 |
/// |---|---|
/// | 0 | `0xA4` |
/// | 1 | 保留（0） |
/// | 2-3 | 速度上限，u16 小端，1 °/s/LSB（电机侧） |
/// | 4-7 | 目标角度，i32 小端，0.01 °/LSB（电机侧） |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionCommand {
    /// 速度上限原始值（1 °/s/LSB）
    pub speed_raw: u16,
    /// 目标角度原始值（0.01 °/LSB）
    pub angle_raw: i32,
}

impl PositionCommand {
    /// 从输出轴角度和速度上限创建指令
    ///
    /// # 错误
    /// - `ProtocolError::OutOfBounds`: 角度超出 i32，或速度上限超出 16 位无符号范围
    pub fn new(angle_deg: f64, max_rpm: f64, gear_ratio: f64) -> Result<Self, ProtocolError> {
        let angle_raw = degrees_to_drc_angle(angle_deg, gear_ratio)?;
        let speed = rpm_to_drc_speed(max_rpm, gear_ratio, DPS_PER_LSB_ANGLE)?;
        let speed_raw = u16::try_from(speed).map_err(|_| ProtocolError::OutOfBounds {
            field: "speed",
            value: speed as f64,
        })?;

        Ok(Self {
            speed_raw,
            angle_raw,
        })
    }

    /// 还原输出轴目标角度（度）
    pub fn angle_degrees(&self, gear_ratio: f64) -> f64 {
        self.angle_raw as f64 * DEG_PER_LSB / gear_ratio
    }

    /// 从负载解析（命令字节不是 0xA4 时返回 `None`）
    pub fn from_payload(payload: &[u8; FRAME_LEN]) -> Option<Self> {
        if payload[0] != OP_POSITION_2 {
            return None;
        }
        Some(Self {
            speed_raw: u16::from_le_bytes([payload[2], payload[3]]),
            angle_raw: bytes_to_i32_le([payload[4], payload[5], payload[6], payload[7]]),
        })
    }

    /// 转换为 8 字节负载
    pub fn to_payload(self) -> [u8; FRAME_LEN] {
        let mut data = opcode_only(ActuateCommand::Position2.into());
        data[2..4].copy_from_slice(&self.speed_raw.to_le_bytes());
        data[4..8].copy_from_slice(&i32_to_bytes_le(self.angle_raw));
        data
    }

    /// 转换为 CAN 帧
    pub fn to_frame(self, device_id: u32) -> CanFrame {
        frame_for(device_id, self.to_payload())
    }
}

// ============================================================================
// 反馈请求 / 系统控制（无参数）
// ============================================================================

/// 反馈请求指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackRequest(pub ReadCommand);

impl FeedbackRequest {
    pub fn to_payload(self) -> [u8; FRAME_LEN] {
        opcode_only(self.0.into())
    }

    pub fn to_frame(self, device_id: u32) -> CanFrame {
        frame_for(device_id, self.to_payload())
    }
}

/// 系统控制指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemControl(pub SystemCommand);

impl SystemControl {
    pub fn to_payload(self) -> [u8; FRAME_LEN] {
        opcode_only(self.0.into())
    }

    pub fn to_frame(self, device_id: u32) -> CanFrame {
        frame_for(device_id, self.to_payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEAR_RATIO: f64 = 6.0;

    // ========================================================================
    // 速度闭环
    // ========================================================================

    #[test]
    fn test_velocity_zero_rpm() {
        let cmd = VelocityCommand::new(0.0, GEAR_RATIO).unwrap();
        assert_eq!(cmd.to_payload(), [0xA2, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_velocity_payloads() {
        // 10 rpm * 6 * 6 / 0.01 = 36000 = 0x8CA0
        let cmd = VelocityCommand::new(10.0, GEAR_RATIO).unwrap();
        assert_eq!(cmd.to_payload(), [0xA2, 0, 0, 0, 0xA0, 0x8C, 0x00, 0x00]);

        // 123 rpm -> 442800 = 0x06C1B0
        let cmd = VelocityCommand::new(123.0, GEAR_RATIO).unwrap();
        assert_eq!(cmd.to_payload(), [0xA2, 0, 0, 0, 0xB0, 0xC1, 0x06, 0x00]);

        // 1024 rpm -> 3686400 = 0x384000
        let cmd = VelocityCommand::new(1024.0, GEAR_RATIO).unwrap();
        assert_eq!(cmd.to_payload(), [0xA2, 0, 0, 0, 0x00, 0x40, 0x38, 0x00]);
    }

    #[test]
    fn test_velocity_negative() {
        let cmd = VelocityCommand::new(-10.0, GEAR_RATIO).unwrap();
        assert_eq!(cmd.speed_raw, -36000);
        let payload = cmd.to_payload();
        assert_eq!(
            i32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]),
            -36000
        );
    }

    #[test]
    fn test_velocity_overflow() {
        // 1e6 rpm * 36 / 0.01 = 3.6e9 > i32::MAX
        let err = VelocityCommand::new(1.0e6, GEAR_RATIO).unwrap_err();
        assert!(matches!(err, ProtocolError::OutOfBounds { field: "speed", .. }));

        assert!(VelocityCommand::new(f64::NAN, GEAR_RATIO).is_err());
        assert!(VelocityCommand::new(f64::INFINITY, GEAR_RATIO).is_err());
    }

    #[test]
    fn test_velocity_from_payload() {
        let payload = VelocityCommand::new(10.0, GEAR_RATIO).unwrap().to_payload();
        let decoded = VelocityCommand::from_payload(&payload).unwrap();
        assert_eq!(decoded.speed_raw, 36000);
        assert!((decoded.rpm(GEAR_RATIO) - 10.0).abs() < 1e-9);

        assert!(VelocityCommand::from_payload(&[0x9C, 0, 0, 0, 0, 0, 0, 0]).is_none());
    }

    // ========================================================================
    // 位置闭环
    // ========================================================================

    #[test]
    fn test_position_payloads() {
        let cases: [(f64, [u8; 8]); 6] = [
            (0.0, [0xA4, 0x00, 0x68, 0x01, 0x00, 0x00, 0x00, 0x00]),
            (45.0, [0xA4, 0x00, 0x68, 0x01, 0x78, 0x69, 0x00, 0x00]),
            (90.0, [0xA4, 0x00, 0x68, 0x01, 0xF0, 0xD2, 0x00, 0x00]),
            (12.0, [0xA4, 0x00, 0x68, 0x01, 0x20, 0x1C, 0x00, 0x00]),
            (-15.0, [0xA4, 0x00, 0x68, 0x01, 0xD8, 0xDC, 0xFF, 0xFF]),
            (-680.0, [0xA4, 0x00, 0x68, 0x01, 0x40, 0xC6, 0xF9, 0xFF]),
        ];

        for (angle, expected) in cases {
            let cmd = PositionCommand::new(angle, 10.0, GEAR_RATIO).unwrap();
            assert_eq!(cmd.to_payload(), expected, "angle = {}", angle);
        }
    }

    #[test]
    fn test_position_formula() {
        // (45 * 6) / 0.01 = 27000
        let cmd = PositionCommand::new(45.0, 10.0, GEAR_RATIO).unwrap();
        assert_eq!(cmd.angle_raw, 27000);
        assert_eq!(cmd.speed_raw, 360);
        assert!((cmd.angle_degrees(GEAR_RATIO) - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_position_angle_overflow() {
        let err = PositionCommand::new(1.0e9, 10.0, GEAR_RATIO).unwrap_err();
        assert!(matches!(err, ProtocolError::OutOfBounds { field: "angle", .. }));
    }

    #[test]
    fn test_position_speed_overflow() {
        // 10000 rpm * 36 = 360000 °/s > u16::MAX
        let err = PositionCommand::new(0.0, 10_000.0, GEAR_RATIO).unwrap_err();
        assert!(matches!(err, ProtocolError::OutOfBounds { field: "speed", .. }));

        // 负的速度上限无法放进无符号字段
        assert!(PositionCommand::new(0.0, -1.0, GEAR_RATIO).is_err());
    }

    #[test]
    fn test_position_from_payload() {
        let cmd = PositionCommand::new(-15.0, 10.0, GEAR_RATIO).unwrap();
        assert_eq!(PositionCommand::from_payload(&cmd.to_payload()), Some(cmd));
    }

    // ========================================================================
    // 无参数指令
    // ========================================================================

    #[test]
    fn test_feedback_request_payloads() {
        assert_eq!(
            FeedbackRequest(ReadCommand::MultiTurnsAngle).to_payload(),
            [0x92, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(
            FeedbackRequest(ReadCommand::Status1AndErrorFlags).to_payload(),
            [0x9A, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(
            FeedbackRequest(ReadCommand::Status2).to_payload(),
            [0x9C, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_system_control_frame() {
        let frame = SystemControl(SystemCommand::Running).to_frame(0x140);
        assert_eq!(frame.id, 0x140);
        assert_eq!(frame.len, 8);
        assert!(!frame.is_extended);
        assert_eq!(frame.data, [0x88, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_frame_for_extended_id() {
        let frame = frame_for(0x1_0000, [0x80, 0, 0, 0, 0, 0, 0, 0]);
        assert!(frame.is_extended);
        assert_eq!(frame.id, 0x1_0000);
    }
}
