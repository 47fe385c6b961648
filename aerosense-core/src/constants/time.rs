//! Time-Related Constants

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

/// Milliseconds per second, as a float for delta conversion.
pub const MS_PER_SECOND_F32: f32 = 1000.0;

/// Default scheduler tick interval (milliseconds).
///
/// 100 Hz, matching the IMU output rate with SRD = 9.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 10;

/// Default airspeed read divider (every Nth tick).
///
/// 25 Hz airspeed at a 100 Hz tick.
pub const DEFAULT_AIRSPEED_DIVIDER: u32 = 4;
