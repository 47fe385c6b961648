//! Constants for Aerosense Core
//!
//! Every numeric value the acquisition pipeline depends on is defined here,
//! with units in the name and the datasheet or tuning source next to it.
//!
//! ## Organization
//!
//! - **Airspeed**: transducer transfer function and wire format
//! - **Imu**: gyro bias convergence tuning and accelerometer calibration
//! - **Time**: unit conversions
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Tuning constants are defaults; runtime values come from `config`
//! 3. Wire-format masks must stay bit-exact

/// Differential pressure transducer transfer function and frame layout.
pub mod airspeed;

/// Gyro bias convergence and accelerometer calibration defaults.
pub mod imu;

/// Time unit conversions.
pub mod time;

pub use airspeed::{FRAME_LEN, PSI_TO_PA, PRESSURE_MIN_PSI, PRESSURE_MAX_PSI};
pub use imu::{
    GYRO_FAST_WEIGHT, GYRO_SLOW_WEIGHT, GYRO_AGREEMENT_CUTOFF_RPS,
    GYRO_AGREEMENT_BOUND_S, GYRO_TIMEOUT_S, STANDARD_GRAVITY_MPS2,
};
pub use time::MS_PER_SECOND;
