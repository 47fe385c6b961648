//! Inertial Sensor Tuning
//!
//! Defaults for the startup gyro bias estimator and the six-position
//! accelerometer calibration. The bias estimator constants were tuned
//! together; changing one usually means re-tuning the others.

// ===== GYRO BIAS CONVERGENCE =====

/// Blend weight of a new sample into the fast filter (~0.1 s at 100 Hz).
pub const GYRO_FAST_WEIGHT: f32 = 0.05;

/// Blend weight of a new sample into the slow filter (~1 s at 100 Hz).
///
/// The slow filter is blended from the freshly updated fast value, not from
/// its own previous value.
pub const GYRO_SLOW_WEIGHT: f32 = 0.005;

/// Largest per-axis fast/slow disagreement still counted as stationary (rad/s).
pub const GYRO_AGREEMENT_CUTOFF_RPS: f32 = 0.005;

/// Continuous agreement needed to accept the bias (s).
pub const GYRO_AGREEMENT_BOUND_S: f32 = 4.1;

/// Give up waiting for agreement and accept the best estimate (s).
pub const GYRO_TIMEOUT_S: f32 = 15.0;

/// Interval between progress diagnostics while converging (s).
pub const GYRO_PROGRESS_INTERVAL_S: f32 = 1.0;

// ===== ACCELEROMETER CALIBRATION =====

/// Standard gravity (m/s²).
pub const STANDARD_GRAVITY_MPS2: f32 = 9.80665;

/// Consecutive samples averaged per orientation.
pub const ACCEL_SAMPLES_PER_FACE: u32 = 100;

/// Dominant axis must carry at least this fraction of gravity.
pub const ACCEL_FACE_MIN_FRACTION: f32 = 0.8;

/// Allowed deviation of |a| from gravity while collecting, as a fraction of g.
pub const ACCEL_NORM_TOLERANCE_FRACTION: f32 = 0.2;

// ===== DEVICE CONFIGURATION =====

/// Sample rate divider: output rate = 1000 / (1 + SRD) Hz.
pub const IMU_SAMPLE_RATE_DIVIDER: u8 = 9;

/// Accelerometer full-scale range (g).
pub const IMU_ACCEL_RANGE_G: u8 = 4;

/// Gyro full-scale range (deg/s).
pub const IMU_GYRO_RANGE_DPS: u16 = 500;

/// Digital low-pass filter bandwidth (Hz).
pub const IMU_DLPF_BANDWIDTH_HZ: u16 = 41;
