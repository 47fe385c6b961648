//! Sensor acquisition core for Aerosense
//!
//! Turns raw bus frames from the airspeed transducer and raw samples from the
//! 9-axis IMU into calibrated physical quantities, and publishes them to the
//! property tree read by navigation and control.
//!
//! Key constraints:
//! - Single-threaded, one pass per scheduler tick
//! - No allocation in the decode/calibrate hot path
//! - Nothing in here is fatal: bad frames are skipped, bad calibration is
//!   rejected, a sensor that fails to start is marked degraded
//!
//! ```no_run
//! use aerosense_core::frame::decode;
//!
//! match decode(&[0x20, 0x00, 0x64, 0x00]) {
//!     Ok(reading) => { let _pa = reading.diff_press_pa; }
//!     Err(e) => { let _ = e; } // short frame, skip this tick
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
mod logging;

pub mod accel_cal;
pub mod airspeed;
pub mod calibration;
pub mod config;
pub mod constants;
pub mod cycle;
pub mod errors;
pub mod frame;
pub mod gyro_bias;
pub mod imu;
pub mod request;
pub mod store;
pub mod time;
pub mod traits;

// Public API
pub use accel_cal::{AccelCalOutcome, AccelCalibration};
pub use airspeed::AirspeedSensor;
pub use calibration::{CalibrationKind, CalibrationModel};
pub use config::CycleConfig;
pub use cycle::{SensorUpdateCycle, SetupReport, TickReport};
pub use errors::{SensorError, SensorResult};
pub use frame::{decode, FrameStatus, PressureReading};
pub use gyro_bias::{BiasState, GyroBiasEstimator};
pub use imu::{ImuManager, ImuOutput};
pub use request::CalibrationRequest;
pub use store::{MemoryStore, PropertyStore};
pub use traits::{ImuSource, RawImuSample, RegisterBus, TimeSource};

/// Crate version, as set in Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
