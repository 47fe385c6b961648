//! Property tests for decoding and calibration

mod common;

use aerosense_core::{
    calibration::{CalibrationKind, CalibrationModel},
    frame::{count_to_celsius, count_to_pa, decode, FrameStatus},
    gyro_bias::{ConvergenceOutcome, GyroBiasEstimator},
    SensorError,
};
use proptest::prelude::*;

use common::frame;

proptest! {
    #[test]
    fn decode_is_pure(bytes in prop::array::uniform4(any::<u8>())) {
        prop_assert_eq!(decode(&bytes), decode(&bytes));
    }

    #[test]
    fn short_input_always_rejected(bytes in prop::collection::vec(any::<u8>(), 0..4)) {
        prop_assert_eq!(
            decode(&bytes),
            Err(SensorError::ShortFrame { expected: 4, available: bytes.len() })
        );
    }

    #[test]
    fn trailing_bytes_ignored(
        head in prop::array::uniform4(any::<u8>()),
        tail in prop::collection::vec(any::<u8>(), 0..8),
    ) {
        let mut long = head.to_vec();
        long.extend_from_slice(&tail);
        prop_assert_eq!(decode(&long), decode(&head));
    }

    #[test]
    fn fields_round_trip(status in 0u8..4, dp in 0u16..=16383, t in 0u16..=2047) {
        let reading = decode(&frame(status, dp, t)).unwrap();
        prop_assert_eq!(reading.status, FrameStatus::from_bits(status));
        prop_assert_eq!(reading.dp_raw, dp);
        prop_assert_eq!(reading.t_raw, t);
        prop_assert_eq!(reading.diff_press_pa, count_to_pa(dp));
        prop_assert_eq!(reading.temperature_c, count_to_celsius(t));
    }

    #[test]
    fn decoded_ranges_bounded(bytes in prop::array::uniform4(any::<u8>())) {
        let reading = decode(&bytes).unwrap();
        prop_assert!(reading.dp_raw <= 16383);
        prop_assert!(reading.t_raw <= 2047);
        prop_assert!(reading.temperature_c >= -50.0 && reading.temperature_c <= 150.01);
        // ±1 psi over the 10%..90% window; the raw extremes read ±1.25 psi
        prop_assert!(reading.diff_press_pa.abs() <= 1.25 * 6894.757 + 1.0);
    }

    #[test]
    fn pressure_decreases_with_count(a in 0u16..16383) {
        prop_assert!(count_to_pa(a + 1) < count_to_pa(a));
    }

    #[test]
    fn wrong_length_never_replaces_matrix(len in 0usize..20) {
        prop_assume!(len != 9);
        let mut model = CalibrationModel::new();
        let before = model.clone();
        let values = vec![2.0f32; len];

        let result = model.set(CalibrationKind::Strapdown, &values);
        prop_assert_eq!(
            result,
            Err(SensorError::InvalidCalibrationShape {
                kind: CalibrationKind::Strapdown,
                expected: 9,
                actual: len,
            })
        );
        prop_assert_eq!(model, before);
    }

    #[test]
    fn still_gyro_converges_to_its_offset(
        x in -0.5f32..0.5,
        y in -0.5f32..0.5,
        z in -0.5f32..0.5,
    ) {
        let mut est = GyroBiasEstimator::default();
        let offset = [x, y, z];
        for _ in 0..1000 {
            est.update(&offset, 0.01);
        }

        prop_assert!(est.is_converged());
        prop_assert_eq!(est.outcome(), Some(ConvergenceOutcome::Agreement));
        for i in 0..3 {
            prop_assert!((est.bias()[i] - offset[i]).abs() < 1e-5);
        }
    }
}
