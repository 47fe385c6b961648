//! Six-Position Accelerometer Calibration
//!
//! ## Procedure
//!
//! Started on request, then fed one raw accelerometer sample per tick. The
//! operator sets the vehicle down on each of its six faces in any order:
//!
//! ```text
//! face   dominant axis   reads
//! ──────────────────────────────
//!  0        +x            +g
//!  1        -x            -g
//!  2        +y            +g
//!  3        -y            -g
//!  4        +z            +g
//!  5        -z            -g
//! ```
//!
//! A sample counts toward a face when one axis carries most of gravity and
//! the vector magnitude is close to g (so the vehicle is resting, not being
//! moved). A face is recorded after enough consecutive samples in the same
//! orientation; moving to another face restarts the count.
//!
//! ## Fit
//!
//! With `pos`/`neg` the averaged readings on the dominant axis:
//!
//! ```text
//! scale  = 2g / (pos - neg)
//! offset = -scale · (pos + neg) / 2
//! ```
//!
//! giving a diagonal affine matrix with offsets in the last column. Cross-axis
//! terms are left at zero.

use crate::{
    calibration::matrix::{norm, Matrix4, Vector3},
    config::AccelCalibrationConfig,
};

/// Procedure state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelCalState {
    /// Not requested
    Idle,
    /// Waiting for faces
    Collecting,
    /// Fit produced a matrix
    Finished,
    /// Fit rejected the data
    Failed,
}

/// Result of a completed procedure
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AccelCalOutcome {
    /// New accelerometer affine matrix
    Finished(Matrix4),
    /// Faces recorded but inconsistent (axis `0..3` had pos <= neg)
    Failed {
        /// Offending axis
        axis: usize,
    },
}

/// One-shot six-position accelerometer calibration
#[derive(Debug, Clone)]
pub struct AccelCalibration {
    config: AccelCalibrationConfig,
    state: AccelCalState,
    faces: [Option<Vector3>; 6],
    current_face: Option<usize>,
    sum: Vector3,
    count: u32,
}

impl Default for AccelCalibration {
    fn default() -> Self {
        Self::new(AccelCalibrationConfig::default())
    }
}

impl AccelCalibration {
    /// Idle procedure
    pub fn new(config: AccelCalibrationConfig) -> Self {
        Self {
            config,
            state: AccelCalState::Idle,
            faces: [None; 6],
            current_face: None,
            sum: [0.0; 3],
            count: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> AccelCalState {
        self.state
    }

    /// True while collecting faces
    pub fn is_active(&self) -> bool {
        self.state == AccelCalState::Collecting
    }

    /// Number of faces recorded so far
    pub fn faces_recorded(&self) -> usize {
        self.faces.iter().filter(|f| f.is_some()).count()
    }

    /// Start (or restart) collecting
    pub fn begin(&mut self) {
        log_info!("Accelerometer calibration: place vehicle on each of its six faces");
        self.faces = [None; 6];
        self.current_face = None;
        self.sum = [0.0; 3];
        self.count = 0;
        self.state = AccelCalState::Collecting;
    }

    /// Feed one raw accelerometer sample (m/s²)
    ///
    /// Returns the outcome on the sample that completes the procedure, `None`
    /// otherwise. Does nothing unless collecting.
    pub fn update(&mut self, raw_accel: &Vector3) -> Option<AccelCalOutcome> {
        if !self.is_active() {
            return None;
        }

        let Some(face) = self.classify(raw_accel) else {
            self.restart_face(None);
            return None;
        };

        if self.current_face != Some(face) {
            self.restart_face(Some(face));
        }

        for (s, a) in self.sum.iter_mut().zip(raw_accel.iter()) {
            *s += a;
        }
        self.count += 1;

        if self.count >= self.config.samples_per_face {
            let n = self.count as f32;
            let avg = [self.sum[0] / n, self.sum[1] / n, self.sum[2] / n];
            if self.faces[face].is_none() {
                log_info!("Accelerometer calibration: face {} recorded", face);
            }
            self.faces[face] = Some(avg);
            self.restart_face(None);
        }

        if self.faces.iter().all(Option::is_some) {
            return Some(self.fit());
        }
        None
    }

    /// Face index for a resting sample, `None` if moving or ambiguous
    fn classify(&self, a: &Vector3) -> Option<usize> {
        let g = self.config.gravity_mps2;
        if libm::fabsf(norm(a) - g) > self.config.norm_tolerance_fraction * g {
            return None;
        }

        let (axis, value) = a
            .iter()
            .copied()
            .enumerate()
            .max_by(|x, y| libm::fabsf(x.1).total_cmp(&libm::fabsf(y.1)))?;

        if libm::fabsf(value) < self.config.face_min_fraction * g {
            return None;
        }
        Some(axis * 2 + usize::from(value < 0.0))
    }

    fn restart_face(&mut self, face: Option<usize>) {
        self.current_face = face;
        self.sum = [0.0; 3];
        self.count = 0;
    }

    fn fit(&mut self) -> AccelCalOutcome {
        let g = self.config.gravity_mps2;
        let mut rows = [[0.0f32; 4]; 4];
        rows[3][3] = 1.0;

        for axis in 0..3 {
            let (Some(pos), Some(neg)) = (self.faces[axis * 2], self.faces[axis * 2 + 1]) else {
                self.state = AccelCalState::Failed;
                return AccelCalOutcome::Failed { axis };
            };
            let (pos, neg) = (pos[axis], neg[axis]);
            if pos <= neg {
                log_warn!(
                    "Accelerometer calibration failed: axis {} pos {} <= neg {}",
                    axis,
                    pos,
                    neg
                );
                self.state = AccelCalState::Failed;
                return AccelCalOutcome::Failed { axis };
            }

            let scale = 2.0 * g / (pos - neg);
            rows[axis][axis] = scale;
            rows[axis][3] = -scale * (pos + neg) / 2.0;
        }

        self.state = AccelCalState::Finished;
        log_info!("Accelerometer calibration finished");
        AccelCalOutcome::Finished(Matrix4::from_rows(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::matrix::{homogeneous, truncate};

    const G: f32 = 9.80665;

    fn quick() -> AccelCalibration {
        AccelCalibration::new(AccelCalibrationConfig {
            samples_per_face: 5,
            ..AccelCalibrationConfig::default()
        })
    }

    /// Sensor with per-axis scale and offset error
    fn sensed(true_accel: Vector3) -> Vector3 {
        [
            true_accel[0] * 1.02 + 0.3,
            true_accel[1] * 0.97 - 0.2,
            true_accel[2] * 1.01 + 0.1,
        ]
    }

    fn faces() -> [Vector3; 6] {
        [
            [G, 0.0, 0.0],
            [-G, 0.0, 0.0],
            [0.0, G, 0.0],
            [0.0, -G, 0.0],
            [0.0, 0.0, G],
            [0.0, 0.0, -G],
        ]
    }

    #[test]
    fn idle_until_begun() {
        let mut cal = quick();
        assert_eq!(cal.update(&[0.0, 0.0, G]), None);
        assert_eq!(cal.state(), AccelCalState::Idle);
        assert_eq!(cal.faces_recorded(), 0);
    }

    #[test]
    fn recovers_scale_and_offset() {
        let mut cal = quick();
        cal.begin();

        let mut outcome = None;
        for face in faces() {
            for _ in 0..5 {
                outcome = cal.update(&sensed(face));
            }
        }

        let Some(AccelCalOutcome::Finished(affine)) = outcome else {
            panic!("expected a fitted matrix, got {:?}", outcome);
        };
        assert_eq!(cal.state(), AccelCalState::Finished);

        for face in faces() {
            let corrected = truncate(&affine.mul_vec(&homogeneous(&sensed(face))));
            for i in 0..3 {
                assert!((corrected[i] - face[i]).abs() < 1e-3, "{:?} -> {:?}", face, corrected);
            }
        }
    }

    #[test]
    fn motion_restarts_face() {
        let mut cal = quick();
        cal.begin();

        for _ in 0..4 {
            cal.update(&[0.0, 0.0, G]);
        }
        // Being carried: magnitude far from g
        cal.update(&[0.0, 0.0, 2.0 * G]);
        cal.update(&[0.0, 0.0, G]);
        assert_eq!(cal.faces_recorded(), 0);

        for _ in 0..4 {
            cal.update(&[0.0, 0.0, G]);
        }
        assert_eq!(cal.faces_recorded(), 1);
    }

    #[test]
    fn tilted_samples_ignored() {
        let cal = quick();
        let tilted = [G * 0.7, 0.0, G * 0.714];
        assert_eq!(cal.classify(&tilted), None);
        assert_eq!(cal.classify(&[0.0, -G, 0.0]), Some(3));
    }

    #[test]
    fn inverted_axis_fails() {
        let mut cal = quick();
        cal.begin();
        cal.faces = [
            Some([-G, 0.0, 0.0]),
            Some([G, 0.0, 0.0]),
            Some([0.0, G, 0.0]),
            Some([0.0, -G, 0.0]),
            Some([0.0, 0.0, G]),
            Some([0.0, 0.0, -G]),
        ];
        assert_eq!(cal.fit(), AccelCalOutcome::Failed { axis: 0 });
        assert_eq!(cal.state(), AccelCalState::Failed);
    }
}
