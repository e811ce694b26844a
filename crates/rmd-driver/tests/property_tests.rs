//! 驱动层属性测试
//!
//! 使用 proptest 验证：驱动发出的负载与协议层编码一致，越界时不发送。

mod common;

use common::setup;
use proptest::prelude::*;
use rmd_driver::DriverError;
use rmd_protocol::{PositionCommand, VelocityCommand};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// 速度命令负载与编码器输出一致，且解码后误差不超过半个 LSB
    #[test]
    fn velocity_payload_matches_codec(rpm in -5_000.0..5_000.0f64, gear in 1.0..50.0f64) {
        let h = setup(gear);
        h.drc.velocity_control(rpm).unwrap();

        let payloads = h.handle.sent_payloads();
        prop_assert_eq!(payloads.len(), 1);
        prop_assert_eq!(payloads[0], VelocityCommand::new(rpm, gear).unwrap().to_payload());

        let decoded = VelocityCommand::from_payload(&payloads[0]).unwrap();
        let lsb_rpm = 0.01 / (6.0 * gear);
        prop_assert!((decoded.rpm(gear) - rpm).abs() <= lsb_rpm / 2.0 + 1e-9);
    }

    /// 位置命令负载与编码器输出一致
    #[test]
    fn position_payload_matches_codec(angle in -10_000.0..10_000.0f64, rpm in 0.0..100.0f64) {
        let h = setup(6.0);
        h.drc.position_control(angle, rpm).unwrap();

        let payloads = h.handle.sent_payloads();
        prop_assert_eq!(payloads.len(), 1);
        prop_assert_eq!(payloads[0], PositionCommand::new(angle, rpm, 6.0).unwrap().to_payload());
    }

    /// 超出 i32 范围的速度被拒绝，且不发送任何帧
    #[test]
    fn oversized_velocity_is_rejected(rpm in 1e9..1e15f64, negative in any::<bool>()) {
        let h = setup(1.0);
        let rpm = if negative { -rpm } else { rpm };

        let result = h.drc.velocity_control(rpm);
        prop_assert!(matches!(result, Err(DriverError::Protocol(_))));
        prop_assert!(h.handle.sent_frames().is_empty());
    }
}
