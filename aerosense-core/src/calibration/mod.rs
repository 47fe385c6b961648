//! IMU Calibration Model
//!
//! ## Overview
//!
//! Three operator-supplied corrections turn raw IMU samples into body-frame
//! physical values:
//!
//! - **Strapdown** (3×3): rotation from the sensor's mounting orientation to
//!   the vehicle body frame.
//! - **Accel affine** (4×4): per-axis scale, cross-axis coupling and offset
//!   for the accelerometer, in homogeneous coordinates.
//! - **Mag affine** (4×4): hard/soft iron correction for the magnetometer.
//!
//! ## Transform
//!
//! ```text
//! accel = A · [a; 1]
//! gyro  = S · g
//! mag   = M · [S · m; 1]
//! ```
//!
//! The magnetometer is rotated into the body frame first and the affine
//! correction applied after, because the mag calibration is fitted in body
//! coordinates. Coefficients are used exactly as supplied; an ill-conditioned
//! matrix is the operator's to fix, not ours.
//!
//! ## Storage
//!
//! Matrices are persisted as flattened row-major arrays under
//! `config/imu/calibration/` (9, 16 and 16 elements). A wrong-length array
//! is rejected and the previous matrix stays in effect.

pub mod matrix;

use core::fmt;

use crate::{
    errors::{SensorError, SensorResult},
    store::{paths, PropertyStore},
};

use matrix::{homogeneous, truncate, Matrix3, Matrix4, Vector3};

/// Which correction matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CalibrationKind {
    /// 3×3 sensor-to-body rotation
    Strapdown,
    /// 4×4 accelerometer affine correction
    AccelAffine,
    /// 4×4 magnetometer affine correction
    MagAffine,
}

impl CalibrationKind {
    /// All kinds, in load order
    pub const ALL: [CalibrationKind; 3] = [Self::Strapdown, Self::AccelAffine, Self::MagAffine];

    /// Flattened element count
    pub fn element_count(&self) -> usize {
        match self {
            Self::Strapdown => Matrix3::LEN,
            Self::AccelAffine | Self::MagAffine => Matrix4::LEN,
        }
    }

    /// Property name, as used in the calibration node
    pub fn name(&self) -> &'static str {
        match self {
            Self::Strapdown => "strapdown",
            Self::AccelAffine => "accel_affine",
            Self::MagAffine => "mag_affine",
        }
    }

    /// Full property path of the persisted array
    pub fn path(&self) -> &'static str {
        match self {
            Self::Strapdown => paths::calibration::STRAPDOWN,
            Self::AccelAffine => paths::calibration::ACCEL_AFFINE,
            Self::MagAffine => paths::calibration::MAG_AFFINE,
        }
    }
}

impl fmt::Display for CalibrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One IMU sample after calibration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibratedSample {
    /// Body-frame acceleration (m/s²)
    pub accel: Vector3,
    /// Body-frame angular rate (rad/s), bias not yet removed
    pub gyro: Vector3,
    /// Body-frame magnetic field after affine correction
    pub mag: Vector3,
    /// Magnetometer rotated to body frame, before affine correction
    pub mag_body: Vector3,
}

/// Current correction matrices for one IMU installation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalibrationModel {
    strapdown: Matrix3,
    accel_affine: Matrix4,
    mag_affine: Matrix4,
}

impl CalibrationModel {
    /// Identity for every matrix
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one matrix from a flattened row-major array
    ///
    /// Fails with `InvalidCalibrationShape` when the length is not 9
    /// (strapdown) or 16 (affine); the stored matrix is left unchanged.
    pub fn set(&mut self, kind: CalibrationKind, values: &[f32]) -> SensorResult<()> {
        let shape_error = || rejected_shape(kind, values.len());

        match kind {
            CalibrationKind::Strapdown => {
                self.strapdown = Matrix3::from_row_major(values).ok_or_else(shape_error)?;
            }
            CalibrationKind::AccelAffine => {
                self.accel_affine = Matrix4::from_row_major(values).ok_or_else(shape_error)?;
            }
            CalibrationKind::MagAffine => {
                self.mag_affine = Matrix4::from_row_major(values).ok_or_else(shape_error)?;
            }
        }

        self.log_matrix(kind);
        Ok(())
    }

    /// Flattened row-major copy of one matrix
    pub fn get(&self, kind: CalibrationKind) -> heapless::Vec<f32, 16> {
        match kind {
            CalibrationKind::Strapdown => self.strapdown.iter_row_major().collect(),
            CalibrationKind::AccelAffine => self.accel_affine.iter_row_major().collect(),
            CalibrationKind::MagAffine => self.mag_affine.iter_row_major().collect(),
        }
    }

    /// Strapdown rotation
    pub fn strapdown(&self) -> &Matrix3 {
        &self.strapdown
    }

    /// Accelerometer affine correction
    pub fn accel_affine(&self) -> &Matrix4 {
        &self.accel_affine
    }

    /// Magnetometer affine correction
    pub fn mag_affine(&self) -> &Matrix4 {
        &self.mag_affine
    }

    /// Calibrate one raw sample
    ///
    /// Returns `(accel, gyro, mag)` in body frame. See the module docs for
    /// the transform order.
    pub fn apply(
        &self,
        raw_accel: &Vector3,
        raw_gyro: &Vector3,
        raw_mag: &Vector3,
    ) -> (Vector3, Vector3, Vector3) {
        let sample = self.calibrate(raw_accel, raw_gyro, raw_mag);
        (sample.accel, sample.gyro, sample.mag)
    }

    /// Calibrate one raw sample, keeping the rotated-only magnetometer too
    pub fn calibrate(
        &self,
        raw_accel: &Vector3,
        raw_gyro: &Vector3,
        raw_mag: &Vector3,
    ) -> CalibratedSample {
        let accel = truncate(&self.accel_affine.mul_vec(&homogeneous(raw_accel)));
        let gyro = self.strapdown.mul_vec(raw_gyro);
        let mag_body = self.strapdown.mul_vec(raw_mag);
        let mag = truncate(&self.mag_affine.mul_vec(&homogeneous(&mag_body)));

        CalibratedSample { accel, gyro, mag, mag_body }
    }

    /// Write identity matrices to the store
    pub fn write_defaults<S: PropertyStore + ?Sized>(store: &mut S) {
        Self::new().persist(store);
    }

    /// Write all three matrices to the store
    pub fn persist<S: PropertyStore + ?Sized>(&self, store: &mut S) {
        for kind in CalibrationKind::ALL {
            self.persist_kind(store, kind);
        }
    }

    /// Write one matrix to the store
    pub fn persist_kind<S: PropertyStore + ?Sized>(&self, store: &mut S, kind: CalibrationKind) {
        let values: heapless::Vec<f64, 16> = self.get(kind).iter().map(|v| *v as f64).collect();
        store.set_array(kind.path(), &values);
    }

    /// Load every matrix from the store
    ///
    /// Each kind loads independently; the first failure is returned after
    /// the remaining kinds have been tried.
    pub fn load_from_store<S: PropertyStore + ?Sized>(&mut self, store: &S) -> SensorResult<()> {
        let mut first_error = None;

        for kind in CalibrationKind::ALL {
            if let Err(e) = self.load_kind(store, kind) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn load_kind<S: PropertyStore + ?Sized>(
        &mut self,
        store: &S,
        kind: CalibrationKind,
    ) -> SensorResult<()> {
        let values = match store.get(kind.path()) {
            None => &[][..],
            Some(_) => match store.get_array(kind.path()) {
                Some(values) => values,
                None => {
                    log_warn!("IMU {} calibration at {} is not an array", kind, kind.path());
                    return Err(SensorError::StoreTypeMismatch { path: kind.path() });
                }
            },
        };

        // Longer than any matrix: report the real length without buffering it
        if values.len() > kind.element_count() {
            return Err(rejected_shape(kind, values.len()));
        }

        let narrowed: heapless::Vec<f32, 16> = values.iter().map(|v| *v as f32).collect();
        self.set(kind, &narrowed)
    }

    #[allow(unused_variables)]
    fn log_matrix(&self, kind: CalibrationKind) {
        match kind {
            CalibrationKind::Strapdown => {
                log_info!("IMU strapdown calibration matrix:");
                for row in self.strapdown.rows() {
                    log_info!("  {:.4} {:.4} {:.4}", row[0], row[1], row[2]);
                }
            }
            CalibrationKind::AccelAffine | CalibrationKind::MagAffine => {
                let m = if kind == CalibrationKind::AccelAffine {
                    &self.accel_affine
                } else {
                    &self.mag_affine
                };
                log_info!("IMU {} matrix:", kind);
                for row in m.rows() {
                    log_info!("  {:.4} {:.4} {:.4} {:.4}", row[0], row[1], row[2], row[3]);
                }
            }
        }
    }
}

/// Shape error for `kind`, with its warn diagnostic
fn rejected_shape(kind: CalibrationKind, actual: usize) -> SensorError {
    let expected = kind.element_count();
    log_warn!("IMU {} calibration rejected: {} values, expected {}", kind, actual, expected);
    SensorError::InvalidCalibrationShape { kind, expected, actual }
}
