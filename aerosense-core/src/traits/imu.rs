//! Motion sensor abstraction

use crate::{calibration::matrix::Vector3, config::ImuConfig};

/// One raw sample in sensor axes and SI units
///
/// "Raw" means before strapdown rotation and affine correction; the driver
/// has already applied its range scaling.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawImuSample {
    /// Specific force (m/s²)
    pub accel: Vector3,
    /// Angular rate (rad/s)
    pub gyro: Vector3,
    /// Magnetic field (µT)
    pub mag: Vector3,
    /// Die temperature (°C)
    pub temp_c: f32,
}

/// 9-axis IMU driver
pub trait ImuSource {
    /// Driver-specific failure
    type Error: core::fmt::Debug;

    /// Start the device and apply range, filter, and rate settings
    ///
    /// Called once at setup and again on re-setup. A failure leaves the IMU
    /// unusable until the next successful call.
    fn begin(&mut self, config: &ImuConfig) -> Result<(), Self::Error>;

    /// Latest motion sample, `WouldBlock` if none is ready
    fn read_motion(&mut self) -> nb::Result<RawImuSample, Self::Error>;
}
