//! Acquisition configuration
//!
//! Plain data, built once at startup (presets or deserialized from the
//! flight computer's config file) and handed to the cycle.
//!
//! ```rust
//! use aerosense_core::config::{CycleConfig, ImuConfig};
//!
//! let config = CycleConfig {
//!     imu: ImuConfig::aura3(),
//!     ..CycleConfig::default()
//! };
//! assert_eq!(config.imu.pin_or_address, 0x68);
//! ```

use crate::constants::{
    airspeed::{DEFAULT_ADDRESS, DEFAULT_BUS_RATE_HZ},
    imu::{
        ACCEL_FACE_MIN_FRACTION, ACCEL_NORM_TOLERANCE_FRACTION, ACCEL_SAMPLES_PER_FACE,
        GYRO_AGREEMENT_BOUND_S, GYRO_AGREEMENT_CUTOFF_RPS, GYRO_FAST_WEIGHT,
        GYRO_PROGRESS_INTERVAL_S, GYRO_SLOW_WEIGHT, GYRO_TIMEOUT_S, IMU_ACCEL_RANGE_G,
        IMU_DLPF_BANDWIDTH_HZ, IMU_GYRO_RANGE_DPS, IMU_SAMPLE_RATE_DIVIDER,
        STANDARD_GRAVITY_MPS2,
    },
    time::DEFAULT_AIRSPEED_DIVIDER,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bus the IMU is wired to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ImuInterface {
    /// SPI; `pin_or_address` is the chip-select pin
    Spi,
    /// I2C; `pin_or_address` is the device address
    I2c,
}

/// IMU device configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImuConfig {
    /// Bus type
    pub interface: ImuInterface,
    /// Chip-select pin (SPI) or address (I2C)
    pub pin_or_address: u8,
    /// Output rate = 1000 / (1 + divider) Hz
    pub sample_rate_divider: u8,
    /// Accelerometer full scale (g)
    pub accel_range_g: u8,
    /// Gyro full scale (deg/s)
    pub gyro_range_dps: u16,
    /// Digital low-pass bandwidth (Hz)
    pub dlpf_bandwidth_hz: u16,
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self::aura3()
    }
}

impl ImuConfig {
    /// Goldy3 board: MPU-9250 on SPI chip select 24
    pub fn goldy3() -> Self {
        Self {
            interface: ImuInterface::Spi,
            pin_or_address: 24,
            ..Self::common()
        }
    }

    /// Aura3 board: MPU-9250 on I2C address 0x68
    pub fn aura3() -> Self {
        Self {
            interface: ImuInterface::I2c,
            pin_or_address: 0x68,
            ..Self::common()
        }
    }

    fn common() -> Self {
        Self {
            interface: ImuInterface::I2c,
            pin_or_address: 0x68,
            sample_rate_divider: IMU_SAMPLE_RATE_DIVIDER,
            accel_range_g: IMU_ACCEL_RANGE_G,
            gyro_range_dps: IMU_GYRO_RANGE_DPS,
            dlpf_bandwidth_hz: IMU_DLPF_BANDWIDTH_HZ,
        }
    }

    /// Output data rate (Hz)
    pub fn output_rate_hz(&self) -> f32 {
        1000.0 / (1.0 + self.sample_rate_divider as f32)
    }
}

/// Airspeed transducer bus configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AirspeedConfig {
    /// I2C address
    pub address: u8,
    /// Bus clock (Hz)
    pub bus_rate_hz: u32,
}

impl Default for AirspeedConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            bus_rate_hz: DEFAULT_BUS_RATE_HZ,
        }
    }
}

/// Gyro startup bias estimator tuning
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GyroBiasConfig {
    /// Weight of a new sample in the fast filter
    pub fast_weight: f32,
    /// Weight of a new sample in the slow filter
    pub slow_weight: f32,
    /// Max per-axis fast/slow disagreement counted as still (rad/s)
    pub cutoff_rps: f32,
    /// Agreement time needed to accept the estimate (s)
    pub agreement_bound_s: f32,
    /// Time after which the current estimate is accepted regardless (s)
    pub timeout_s: f32,
    /// Interval between progress diagnostics (s)
    pub progress_interval_s: f32,
}

impl Default for GyroBiasConfig {
    fn default() -> Self {
        Self {
            fast_weight: GYRO_FAST_WEIGHT,
            slow_weight: GYRO_SLOW_WEIGHT,
            cutoff_rps: GYRO_AGREEMENT_CUTOFF_RPS,
            agreement_bound_s: GYRO_AGREEMENT_BOUND_S,
            timeout_s: GYRO_TIMEOUT_S,
            progress_interval_s: GYRO_PROGRESS_INTERVAL_S,
        }
    }
}

/// Six-position accelerometer calibration tuning
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccelCalibrationConfig {
    /// Consecutive samples averaged per orientation
    pub samples_per_face: u32,
    /// Local gravity (m/s²)
    pub gravity_mps2: f32,
    /// Dominant axis must carry at least this fraction of gravity
    pub face_min_fraction: f32,
    /// Allowed |a| deviation from gravity, as a fraction of gravity
    pub norm_tolerance_fraction: f32,
}

impl Default for AccelCalibrationConfig {
    fn default() -> Self {
        Self {
            samples_per_face: ACCEL_SAMPLES_PER_FACE,
            gravity_mps2: STANDARD_GRAVITY_MPS2,
            face_min_fraction: ACCEL_FACE_MIN_FRACTION,
            norm_tolerance_fraction: ACCEL_NORM_TOLERANCE_FRACTION,
        }
    }
}

/// Everything the acquisition cycle needs
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CycleConfig {
    /// IMU device
    pub imu: ImuConfig,
    /// Airspeed transducer
    pub airspeed: AirspeedConfig,
    /// Gyro bias estimator
    pub gyro_bias: GyroBiasConfig,
    /// Accelerometer calibration procedure
    pub accel_cal: AccelCalibrationConfig,
    /// Read airspeed every Nth tick (0 disables airspeed)
    pub airspeed_divider: u32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            imu: ImuConfig::default(),
            airspeed: AirspeedConfig::default(),
            gyro_bias: GyroBiasConfig::default(),
            accel_cal: AccelCalibrationConfig::default(),
            airspeed_divider: DEFAULT_AIRSPEED_DIVIDER,
        }
    }
}
