//! Error Types for Sensor Acquisition
//!
//! ## Design Philosophy
//!
//! Sensing on the flight computer degrades, it never stops the loop:
//!
//! 1. **Small Size**: Errors are `Copy` and carry only numbers or
//!    `&'static str`, so they can be returned from the hot path and logged
//!    without allocation.
//!
//! 2. **Nothing Fatal**: Every variant describes a condition the caller
//!    recovers from by skipping a tick, keeping the previous value, or
//!    marking a sensor degraded.
//!
//! ## Error Categories
//!
//! ### Bus / Frame
//! - `ShortFrame`: fewer bytes arrived than the frame needs. Skip publication
//!   for this tick, do not retry.
//! - `BusError`: the transaction itself failed.
//!
//! ### Configuration
//! - `InvalidCalibrationShape`: a calibration array of the wrong length. The
//!   previously stored matrix stays in effect.
//! - `StoreTypeMismatch`: a property exists but holds the wrong kind of value.
//!
//! ### Startup
//! - `SensorInitFailure`: device did not configure. The owner marks the
//!   sensor degraded and only retries on the next explicit setup call.
//!
//! ## Handling Strategy
//!
//! ```rust
//! use aerosense_core::{decode, SensorError};
//!
//! match decode(&[0x20, 0x00]) {
//!     Ok(_reading) => {
//!         // publish
//!     }
//!     Err(SensorError::ShortFrame { .. }) => {
//!         // nothing this tick
//!     }
//!     Err(_) => {}
//! }
//! ```

use thiserror_no_std::Error;

use crate::calibration::CalibrationKind;

/// Result type for sensor operations
pub type SensorResult<T> = Result<T, SensorError>;

/// Sensor acquisition errors - kept small for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SensorError {
    /// Bus returned fewer bytes than a full frame
    #[error("Short frame: expected {expected} bytes, {available} available")]
    ShortFrame {
        /// Bytes a complete frame needs
        expected: usize,
        /// Bytes the bus actually delivered
        available: usize,
    },

    /// Calibration array has the wrong number of elements
    #[error("Invalid {kind} calibration: expected {expected} elements, got {actual}")]
    InvalidCalibrationShape {
        /// Which matrix was being set
        kind: CalibrationKind,
        /// Required element count (9 or 16)
        expected: usize,
        /// Element count supplied
        actual: usize,
    },

    /// Device failed to initialize or configure
    #[error("Sensor init failed: {reason}")]
    SensorInitFailure {
        /// Which device and step failed
        reason: &'static str,
    },

    /// Bus transaction failed outright
    #[error("Bus error: {reason}")]
    BusError {
        /// Which transaction failed
        reason: &'static str,
    },

    /// Property exists but holds an unexpected value type
    #[error("Property {path} has unexpected type")]
    StoreTypeMismatch {
        /// Offending property
        path: &'static str,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ShortFrame { expected, available } =>
                defmt::write!(fmt, "Short frame: {} of {} bytes", available, expected),
            Self::InvalidCalibrationShape { kind, expected, actual } =>
                defmt::write!(fmt, "Bad {} calibration: {} != {}", kind.name(), actual, expected),
            Self::SensorInitFailure { reason } =>
                defmt::write!(fmt, "Init failed: {}", reason),
            Self::BusError { reason } =>
                defmt::write!(fmt, "Bus error: {}", reason),
            Self::StoreTypeMismatch { path } =>
                defmt::write!(fmt, "Type mismatch at {}", path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "std")]
    #[test]
    fn messages_name_the_matrix() {
        let err = SensorError::InvalidCalibrationShape {
            kind: CalibrationKind::Strapdown,
            expected: 9,
            actual: 10,
        };
        let msg = std::format!("{}", err);
        assert!(msg.contains("strapdown"));
        assert!(msg.contains("10"));
    }
}
