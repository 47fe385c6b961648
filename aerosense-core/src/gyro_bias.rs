//! Gyro Startup Bias Convergence
//!
//! ## Overview
//!
//! A MEMS gyro reads a small constant rate at rest. Navigation must not trust
//! the gyro until that bias is known, and the vehicle may be vibrating or
//! being carried while it powers up.
//!
//! The estimator runs two exponential filters over the calibrated gyro:
//!
//! ```text
//! fast ← (1 - wf)·fast + wf·sample          wf = 0.05   (~0.1 s)
//! slow ← (1 - ws)·fast + ws·sample          ws = 0.005  (~1 s)
//! ```
//!
//! `slow` is blended from the *updated* `fast`, not from its own previous
//! value. The cutoff and time bounds were tuned against this exact
//! recurrence.
//!
//! When the two agree on every axis within the cutoff the vehicle is taken to
//! be still. Sustained agreement for 4.1 s accepts `slow` as the bias. If
//! 15 s pass without that, the current `slow` is accepted anyway and
//! convergence is reported as a timeout: best-effort sensing, never a hard
//! failure.
//!
//! ## State Machine
//!
//! ```text
//!   Uninitialized ──first sample──▶ Converging ──agreement / timeout──▶ Converged
//!         ▲                                                                 │
//!         └───────────────────────────── reset() ───────────────────────────┘
//! ```
//!
//! While converging the bias is *not* removed from the output; every sample
//! after the converging one has it subtracted.

use crate::{
    calibration::matrix::{blend, max_abs, sub, Vector3},
    config::GyroBiasConfig,
};

/// Estimator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BiasState {
    /// No sample since power-up or reset
    Uninitialized,
    /// Filters running, bias not yet trusted
    Converging,
    /// Bias accepted and applied
    Converged,
}

impl BiasState {
    /// Numeric form published as `gyros_calibrated` (0, 1, 2)
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Uninitialized => 0,
            Self::Converging => 1,
            Self::Converged => 2,
        }
    }
}

/// How convergence was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConvergenceOutcome {
    /// Filters agreed for the full agreement bound
    Agreement,
    /// Gave up waiting and accepted the best estimate
    Timeout,
}

/// Startup gyro bias estimator
#[derive(Debug, Clone)]
pub struct GyroBiasEstimator {
    config: GyroBiasConfig,
    state: BiasState,
    fast: Vector3,
    slow: Vector3,
    bias: Vector3,
    total_timer: f32,
    good_timer: f32,
    progress_timer: f32,
    outcome: Option<ConvergenceOutcome>,
}

impl Default for GyroBiasEstimator {
    fn default() -> Self {
        Self::new(GyroBiasConfig::default())
    }
}

impl GyroBiasEstimator {
    /// New estimator in `Uninitialized`
    pub fn new(config: GyroBiasConfig) -> Self {
        Self {
            config,
            state: BiasState::Uninitialized,
            fast: [0.0; 3],
            slow: [0.0; 3],
            bias: [0.0; 3],
            total_timer: 0.0,
            good_timer: 0.0,
            progress_timer: 0.0,
            outcome: None,
        }
    }

    /// Current state
    pub fn state(&self) -> BiasState {
        self.state
    }

    /// Current bias estimate (tracks `slow` while converging)
    pub fn bias(&self) -> Vector3 {
        self.bias
    }

    /// Fast filter value
    pub fn fast(&self) -> Vector3 {
        self.fast
    }

    /// Slow filter value
    pub fn slow(&self) -> Vector3 {
        self.slow
    }

    /// Seconds since the first sample
    pub fn total_time(&self) -> f32 {
        self.total_timer
    }

    /// Seconds of uninterrupted agreement
    pub fn agreement_time(&self) -> f32 {
        self.good_timer
    }

    /// Set once converged
    pub fn outcome(&self) -> Option<ConvergenceOutcome> {
        self.outcome
    }

    /// True once the bias is being applied
    pub fn is_converged(&self) -> bool {
        self.state == BiasState::Converged
    }

    /// Forget everything and wait for a new first sample
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    /// Feed one calibrated gyro sample taken `dt` seconds after the previous one
    ///
    /// Samples are ignored once converged. A sample with a NaN or infinite
    /// component counts as motion and is not blended into the filters.
    pub fn update(&mut self, sample: &Vector3, dt: f32) -> BiasState {
        let finite = sample.iter().all(|v| v.is_finite());
        match self.state {
            BiasState::Converged => return self.state,
            BiasState::Uninitialized if !finite => return self.state,
            BiasState::Uninitialized => self.seed(sample),
            BiasState::Converging => {}
        }

        let cfg = &self.config;
        if finite {
            self.fast = blend(1.0 - cfg.fast_weight, &self.fast, cfg.fast_weight, sample);
            self.slow = blend(1.0 - cfg.slow_weight, &self.fast, cfg.slow_weight, sample);
            self.bias = self.slow;
        }

        self.total_timer += dt;
        let disagreement = max_abs(&sub(&self.slow, &self.fast));
        if !finite || disagreement.is_nan() || disagreement > cfg.cutoff_rps {
            self.good_timer = 0.0;
        } else {
            self.good_timer += dt;
        }

        self.report_progress(dt);

        if self.good_timer > self.config.agreement_bound_s {
            self.finish(ConvergenceOutcome::Agreement);
        } else if self.total_timer > self.config.timeout_s {
            self.finish(ConvergenceOutcome::Timeout);
        }

        self.state
    }

    /// Remove the bias from a calibrated sample, once converged
    ///
    /// While not converged the sample is returned unchanged.
    pub fn correct(&self, gyro: &Vector3) -> Vector3 {
        if self.is_converged() {
            sub(gyro, &self.bias)
        } else {
            *gyro
        }
    }

    fn seed(&mut self, sample: &Vector3) {
        log_info!("Initialize gyro calibration");
        self.fast = *sample;
        self.slow = *sample;
        self.total_timer = 0.0;
        self.good_timer = 0.0;
        self.progress_timer = 0.0;
        self.state = BiasState::Converging;
    }

    fn report_progress(&mut self, dt: f32) {
        self.progress_timer += dt;
        if self.progress_timer >= self.config.progress_interval_s {
            self.progress_timer = 0.0;
            if self.good_timer < self.config.progress_interval_s {
                log_debug!("gyro init: x (moving, {:.1}s)", self.total_timer);
            } else {
                log_debug!("gyro init: * (still for {:.1}s)", self.good_timer);
            }
        }
    }

    fn finish(&mut self, outcome: ConvergenceOutcome) {
        self.bias = self.slow;
        self.state = BiasState::Converged;
        self.outcome = Some(outcome);

        log_info!(
            "Average gyro startup bias: {:.4} {:.4} {:.4}",
            self.bias[0], self.bias[1], self.bias[2]
        );
        match outcome {
            ConvergenceOutcome::Agreement => log_info!("gyro init: success."),
            ConvergenceOutcome::Timeout => {
                log_warn!("gyro init: too much motion, using best average guess.")
            }
        }
    }
}
