//! IMU Manager
//!
//! ## Overview
//!
//! Owns everything between the IMU driver and the `sensors/imu/` properties:
//!
//! ```text
//!  request ──▶ RequestChannel ──┬─ calibrate-gyros  ──▶ GyroBiasEstimator::reset
//!                               └─ calibrate-accels ──▶ AccelCalibration::begin
//!
//!  ImuSource ──▶ RawImuSample ──▶ CalibrationModel ──▶ GyroBiasEstimator ──▶ publish
//!                     │                                                        ▲
//!                     └──────────▶ AccelCalibration ──▶ new accel_affine ──────┘
//! ```
//!
//! The manager never fails a tick. A driver that will not start marks the
//! manager degraded and [`ImuManager::update`] returns without touching the
//! device until [`ImuManager::setup`] succeeds.

use crate::{
    accel_cal::{AccelCalOutcome, AccelCalibration},
    calibration::{CalibratedSample, CalibrationKind, CalibrationModel},
    config::{AccelCalibrationConfig, GyroBiasConfig, ImuConfig, ImuInterface},
    errors::{SensorError, SensorResult},
    gyro_bias::{BiasState, GyroBiasEstimator},
    request::{CalibrationRequest, RequestChannel},
    store::{paths, PropertyStore},
    time::{to_seconds, Timestamp},
    traits::{ImuSource, RawImuSample},
};

/// Everything produced for one IMU sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuOutput {
    /// Tick time (ms)
    pub timestamp_ms: Timestamp,
    /// Sample as read from the driver
    pub raw: RawImuSample,
    /// Calibrated sample; `gyro` has the bias removed on ticks after convergence
    pub calibrated: CalibratedSample,
    /// Gyro bias estimator state after this sample
    pub bias_state: BiasState,
}

/// IMU calibration, bias estimation, and publication
#[derive(Debug, Clone)]
pub struct ImuManager {
    config: ImuConfig,
    calibration: CalibrationModel,
    gyro_bias: GyroBiasEstimator,
    accel_cal: AccelCalibration,
    requests: RequestChannel,
    degraded: bool,
}

impl ImuManager {
    /// Manager with identity calibration; not usable until [`setup`](Self::setup)
    pub fn new(
        config: ImuConfig,
        gyro_bias: GyroBiasConfig,
        accel_cal: AccelCalibrationConfig,
    ) -> Self {
        Self {
            config,
            calibration: CalibrationModel::new(),
            gyro_bias: GyroBiasEstimator::new(gyro_bias),
            accel_cal: AccelCalibration::new(accel_cal),
            requests: RequestChannel::new(paths::imu::REQUEST),
            degraded: true,
        }
    }

    /// Start the driver
    pub fn setup<I: ImuSource + ?Sized>(&mut self, source: &mut I) -> SensorResult<()> {
        match source.begin(&self.config) {
            Ok(()) => {
                match self.config.interface {
                    ImuInterface::Spi => {
                        log_info!("MPU-9250 @ SPI pin: {}", self.config.pin_or_address)
                    }
                    ImuInterface::I2c => {
                        log_info!("MPU-9250 @ I2C addr: 0x{:02x}", self.config.pin_or_address)
                    }
                }
                log_info!(
                    "MPU-9250: SRD {} ({} Hz), ±{} g, ±{} dps, DLPF {} Hz",
                    self.config.sample_rate_divider,
                    self.config.output_rate_hz(),
                    self.config.accel_range_g,
                    self.config.gyro_range_dps,
                    self.config.dlpf_bandwidth_hz
                );
                self.degraded = false;
                Ok(())
            }
            Err(_e) => {
                log_warn!("MPU-9250 init failed: {:?}", _e);
                self.degraded = true;
                Err(SensorError::SensorInitFailure {
                    reason: "imu begin failed",
                })
            }
        }
    }

    /// True until a successful [`setup`](Self::setup)
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Device configuration
    pub fn config(&self) -> &ImuConfig {
        &self.config
    }

    /// Current calibration
    pub fn calibration(&self) -> &CalibrationModel {
        &self.calibration
    }

    /// Calibration, for loading or replacing matrices between ticks
    pub fn calibration_mut(&mut self) -> &mut CalibrationModel {
        &mut self.calibration
    }

    /// Gyro bias estimator
    pub fn gyro_bias(&self) -> &GyroBiasEstimator {
        &self.gyro_bias
    }

    /// Accelerometer calibration procedure
    pub fn accel_calibration(&self) -> &AccelCalibration {
        &self.accel_cal
    }

    /// Load all calibration matrices from the store
    ///
    /// Matrices that fail to load keep their previous value.
    pub fn load_calibration<S: PropertyStore + ?Sized>(&mut self, store: &S) -> SensorResult<()> {
        self.calibration.load_from_store(store)
    }

    /// Act on a calibration request
    pub fn handle_request(&mut self, request: CalibrationRequest) {
        match request {
            CalibrationRequest::CalibrateAccels => self.accel_cal.begin(),
            CalibrationRequest::CalibrateGyros => self.gyro_bias.reset(),
        }
    }

    /// Run one IMU tick
    ///
    /// `dt` is the time since the previous tick in seconds. Returns the
    /// sample produced this tick, `Ok(None)` when degraded or no sample was
    /// ready. A driver read failure is returned as `BusError` and nothing is
    /// published.
    pub fn update<I, S>(
        &mut self,
        source: &mut I,
        store: &mut S,
        now: Timestamp,
        dt: f32,
    ) -> SensorResult<Option<ImuOutput>>
    where
        I: ImuSource + ?Sized,
        S: PropertyStore + ?Sized,
    {
        if self.degraded {
            return Ok(None);
        }

        if let Some(request) = self.requests.poll(store) {
            self.handle_request(request);
        }

        let raw = match source.read_motion() {
            Ok(sample) => sample,
            Err(nb::Error::WouldBlock) => return Ok(None),
            Err(nb::Error::Other(_e)) => {
                log_debug!("MPU-9250 read failed: {:?}", _e);
                return Err(SensorError::BusError {
                    reason: "imu read failed",
                });
            }
        };

        let mut calibrated = self.calibration.calibrate(&raw.accel, &raw.gyro, &raw.mag);
        // The converging sample itself is published uncorrected
        let bias_state = if self.gyro_bias.is_converged() {
            calibrated.gyro = self.gyro_bias.correct(&calibrated.gyro);
            BiasState::Converged
        } else {
            self.gyro_bias.update(&calibrated.gyro, dt)
        };

        let output = ImuOutput {
            timestamp_ms: now,
            raw,
            calibrated,
            bias_state,
        };

        if !store.is_sim_enabled() {
            publish(store, &output);
        }

        if let Some(outcome) = self.accel_cal.update(&raw.accel) {
            self.install_accel_calibration(store, outcome)?;
        }

        Ok(Some(output))
    }

    fn install_accel_calibration<S: PropertyStore + ?Sized>(
        &mut self,
        store: &mut S,
        outcome: AccelCalOutcome,
    ) -> SensorResult<()> {
        match outcome {
            AccelCalOutcome::Finished(affine) => {
                let values: heapless::Vec<f32, 16> = affine.iter_row_major().collect();
                self.calibration.set(CalibrationKind::AccelAffine, &values)?;
                self.calibration.persist_kind(store, CalibrationKind::AccelAffine);
            }
            AccelCalOutcome::Failed { axis: _axis } => {
                log_warn!("Accelerometer calibration discarded (axis {})", _axis);
            }
        }
        Ok(())
    }
}

/// Write one sample to `sensors/imu/`
pub fn publish<S: PropertyStore + ?Sized>(store: &mut S, output: &ImuOutput) {
    use paths::imu;

    let raw = &output.raw;
    let cal = &output.calibrated;

    store.set_u64(imu::MILLIS, output.timestamp_ms);
    store.set_f64(imu::TIMESTAMP, to_seconds(output.timestamp_ms));

    let triples: [(&[&str; 3], &[f32; 3]); 5] = [
        (&[imu::AX_RAW, imu::AY_RAW, imu::AZ_RAW], &raw.accel),
        (&[imu::HX_RAW, imu::HY_RAW, imu::HZ_RAW], &cal.mag_body),
        (&[imu::AX_MPS2, imu::AY_MPS2, imu::AZ_MPS2], &cal.accel),
        (&[imu::P_RPS, imu::Q_RPS, imu::R_RPS], &cal.gyro),
        (&[imu::HX, imu::HY, imu::HZ], &cal.mag),
    ];
    for (names, values) in triples {
        for (path, value) in names.iter().zip(values.iter()) {
            store.set_f64(path, *value as f64);
        }
    }

    store.set_f64(imu::TEMP_C, raw.temp_c as f64);
    store.set_u64(imu::GYROS_CALIBRATED, output.bias_state.as_u8() as u64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    /// Driver returning the same sample forever
    struct StillImu {
        sample: RawImuSample,
        begin_ok: bool,
        reads: usize,
    }

    impl StillImu {
        fn new(sample: RawImuSample) -> Self {
            Self { sample, begin_ok: true, reads: 0 }
        }
    }

    impl ImuSource for StillImu {
        type Error = ();

        fn begin(&mut self, _config: &ImuConfig) -> Result<(), ()> {
            if self.begin_ok {
                Ok(())
            } else {
                Err(())
            }
        }

        fn read_motion(&mut self) -> nb::Result<RawImuSample, ()> {
            self.reads += 1;
            Ok(self.sample)
        }
    }

    fn level() -> RawImuSample {
        RawImuSample {
            accel: [0.0, 0.0, -9.80665],
            gyro: [0.01, -0.02, 0.005],
            mag: [20.0, 0.0, 40.0],
            temp_c: 31.0,
        }
    }

    fn manager() -> ImuManager {
        ImuManager::new(
            ImuConfig::default(),
            GyroBiasConfig::default(),
            AccelCalibrationConfig::default(),
        )
    }

    #[test]
    fn degraded_until_setup() {
        let mut imu = StillImu::new(level());
        imu.begin_ok = false;
        let mut mgr = manager();
        let mut store = MemoryStore::new();

        assert!(matches!(mgr.setup(&mut imu), Err(SensorError::SensorInitFailure { .. })));
        assert_eq!(mgr.update(&mut imu, &mut store, 0, 0.0), Ok(None));
        assert_eq!(imu.reads, 0);
        assert!(store.is_empty());

        imu.begin_ok = true;
        mgr.setup(&mut imu).unwrap();
        assert!(mgr.update(&mut imu, &mut store, 10, 0.01).unwrap().is_some());
    }

    #[test]
    fn publishes_every_field() {
        let mut imu = StillImu::new(level());
        let mut mgr = manager();
        let mut store = MemoryStore::new();
        mgr.setup(&mut imu).unwrap();

        mgr.update(&mut imu, &mut store, 1500, 0.01).unwrap();

        assert_eq!(store.get_u64(paths::imu::MILLIS), Some(1500));
        assert_eq!(store.get_f64(paths::imu::TIMESTAMP), Some(1.5));
        assert_eq!(store.get_f64(paths::imu::AZ_MPS2), Some(-9.80665f32 as f64));
        assert_eq!(store.get_f64(paths::imu::HX_RAW), Some(20.0));
        assert_eq!(store.get_f64(paths::imu::HZ), Some(40.0));
        assert_eq!(store.get_f64(paths::imu::TEMP_C), Some(31.0));
        assert_eq!(store.get_u64(paths::imu::GYROS_CALIBRATED), Some(1));
        assert_eq!(store.paths_under("sensors/imu/").count(), 19);
    }

    #[test]
    fn sim_suppresses_publication() {
        let mut imu = StillImu::new(level());
        let mut mgr = manager();
        let mut store = MemoryStore::new();
        store.set_bool(paths::SIM_ENABLE, true);
        mgr.setup(&mut imu).unwrap();

        let out = mgr.update(&mut imu, &mut store, 0, 0.0).unwrap();
        assert!(out.is_some());
        assert_eq!(store.paths_under("sensors/imu/").count(), 0);
    }

    #[test]
    fn gyro_request_restarts_convergence() {
        let mut imu = StillImu::new(level());
        let mut mgr = manager();
        let mut store = MemoryStore::new();
        mgr.setup(&mut imu).unwrap();

        for i in 0..3 {
            mgr.update(&mut imu, &mut store, i * 10, 0.01).unwrap();
        }
        assert!(mgr.gyro_bias().total_time() > 0.0);

        store.set_str(paths::imu::REQUEST, "calibrate-gyros");
        let out = mgr.update(&mut imu, &mut store, 30, 0.01).unwrap().unwrap();

        // Reset, then re-seeded by this tick's sample
        assert_eq!(out.bias_state, BiasState::Converging);
        assert_eq!(mgr.gyro_bias().total_time(), 0.01);
        assert_eq!(store.get_str(paths::imu::REQUEST), Some("received: calibrate-gyros"));
    }

    #[test]
    fn accel_request_begins_procedure() {
        let mut imu = StillImu::new(level());
        let mut mgr = manager();
        let mut store = MemoryStore::new();
        mgr.setup(&mut imu).unwrap();

        store.set_str(paths::imu::REQUEST, "calibrate-accels");
        mgr.update(&mut imu, &mut store, 0, 0.0).unwrap();

        assert!(mgr.accel_calibration().is_active());
        assert_eq!(store.get_str(paths::imu::REQUEST), Some("received: calibrate-accels"));
    }
}
