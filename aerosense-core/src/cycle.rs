//! Sensor Update Cycle
//!
//! ## Overview
//!
//! One [`SensorUpdateCycle`] owns the IMU driver, the airspeed bus, and all
//! acquisition state. The scheduler builds it once, calls
//! [`setup`](SensorUpdateCycle::setup), then calls
//! [`tick`](SensorUpdateCycle::tick) at the IMU rate:
//!
//! ```text
//! tick(now)
//!   ├─ dt = now - previous tick
//!   ├─ IMU: request → read → calibrate → bias → publish → accel cal
//!   └─ every Nth tick: airspeed read → decode → publish
//! ```
//!
//! Nothing in a tick is fatal. Sensor errors are logged and the sensor is
//! skipped until the next tick; degraded sensors are skipped until re-setup.
//!
//! ## Example
//!
//! ```rust
//! use aerosense_core::{
//!     config::CycleConfig,
//!     store::MemoryStore,
//!     traits::{ImuSource, RawImuSample, RegisterBus},
//!     SensorUpdateCycle,
//! };
//!
//! struct NoImu;
//! impl ImuSource for NoImu {
//!     type Error = ();
//!     fn begin(&mut self, _: &aerosense_core::config::ImuConfig) -> Result<(), ()> { Ok(()) }
//!     fn read_motion(&mut self) -> nb::Result<RawImuSample, ()> { Err(nb::Error::WouldBlock) }
//! }
//!
//! struct NoBus;
//! impl RegisterBus for NoBus {
//!     type Error = ();
//!     fn read(&mut self, _: u8, _: &mut [u8]) -> nb::Result<usize, ()> {
//!         Err(nb::Error::WouldBlock)
//!     }
//! }
//!
//! let mut store = MemoryStore::new();
//! let mut cycle = SensorUpdateCycle::new(CycleConfig::default(), NoImu, NoBus);
//! let setup = cycle.setup(&mut store);
//! assert!(setup.imu.is_ok());
//!
//! let report = cycle.tick(&mut store, 0);
//! assert!(report.imu.is_none());
//! ```

use crate::{
    airspeed::AirspeedSensor,
    calibration::{CalibrationKind, CalibrationModel},
    config::CycleConfig,
    errors::SensorResult,
    frame::PressureReading,
    imu::{ImuManager, ImuOutput},
    store::PropertyStore,
    time::{TickClock, TimeSource, Timestamp},
    traits::{ImuSource, RegisterBus},
};

/// Outcome of [`SensorUpdateCycle::setup`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetupReport {
    /// IMU driver start
    pub imu: SensorResult<()>,
    /// Airspeed probe
    pub airspeed: SensorResult<()>,
    /// Calibration load from the store
    pub calibration: SensorResult<()>,
}

/// What one tick produced
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    /// Tick number, starting at 0
    pub tick: u64,
    /// Seconds since the previous tick
    pub dt: f32,
    /// IMU sample, if one was read
    pub imu: Option<ImuOutput>,
    /// Airspeed reading, if this was an airspeed tick and a frame decoded
    pub airspeed: Option<PressureReading>,
}

/// Per-tick sensor acquisition
#[derive(Debug)]
pub struct SensorUpdateCycle<I: ImuSource, B: RegisterBus> {
    config: CycleConfig,
    imu_source: I,
    imu: ImuManager,
    airspeed: AirspeedSensor<B>,
    clock: TickClock,
    ticks: u64,
}

impl<I: ImuSource, B: RegisterBus> SensorUpdateCycle<I, B> {
    /// Cycle over an IMU driver and the airspeed bus
    pub fn new(config: CycleConfig, imu_source: I, bus: B) -> Self {
        let imu = ImuManager::new(
            config.imu.clone(),
            config.gyro_bias.clone(),
            config.accel_cal.clone(),
        );
        let airspeed = AirspeedSensor::new(bus, config.airspeed.clone());

        Self {
            config,
            imu_source,
            imu,
            airspeed,
            clock: TickClock::new(),
            ticks: 0,
        }
    }

    /// Start both sensors and load calibration
    ///
    /// Missing calibration properties are first written as identity, so the
    /// tree always shows what is in use. Failures are reported, not fatal:
    /// the affected sensor stays degraded.
    pub fn setup<S: PropertyStore + ?Sized>(&mut self, store: &mut S) -> SetupReport {
        let defaults = CalibrationModel::new();
        for kind in CalibrationKind::ALL {
            if store.get(kind.path()).is_none() {
                defaults.persist_kind(store, kind);
            }
        }
        let calibration = self.imu.load_calibration(&*store);

        let imu = self.imu.setup(&mut self.imu_source);
        let airspeed = if self.config.airspeed_divider > 0 {
            self.airspeed.begin()
        } else {
            Ok(())
        };

        SetupReport { imu, airspeed, calibration }
    }

    /// Run one tick at time `now` (ms)
    pub fn tick<S: PropertyStore + ?Sized>(&mut self, store: &mut S, now: Timestamp) -> TickReport {
        let tick = self.ticks;
        self.ticks += 1;
        let dt = self.clock.advance(now);

        let imu = match self.imu.update(&mut self.imu_source, store, now, dt) {
            Ok(output) => output,
            Err(_e) => {
                log_debug!("IMU tick {} skipped: {}", tick, _e);
                None
            }
        };

        let airspeed = if self.is_airspeed_tick(tick) {
            self.airspeed.update(store)
        } else {
            None
        };

        TickReport { tick, dt, imu, airspeed }
    }

    /// Run one tick at the time reported by `time`
    pub fn run_once<T, S>(&mut self, time: &T, store: &mut S) -> TickReport
    where
        T: TimeSource + ?Sized,
        S: PropertyStore + ?Sized,
    {
        self.tick(store, time.now())
    }

    fn is_airspeed_tick(&self, tick: u64) -> bool {
        match self.config.airspeed_divider {
            0 => false,
            n => tick % n as u64 == 0,
        }
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Configuration in use
    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    /// IMU manager
    pub fn imu(&self) -> &ImuManager {
        &self.imu
    }

    /// IMU manager, for calibration changes between ticks
    pub fn imu_mut(&mut self) -> &mut ImuManager {
        &mut self.imu
    }

    /// Airspeed sensor
    pub fn airspeed(&self) -> &AirspeedSensor<B> {
        &self.airspeed
    }

    /// IMU driver
    pub fn imu_source_mut(&mut self) -> &mut I {
        &mut self.imu_source
    }

    /// Airspeed bus
    pub fn bus_mut(&mut self) -> &mut B {
        self.airspeed.bus_mut()
    }
}
