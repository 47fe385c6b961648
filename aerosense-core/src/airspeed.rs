//! MS4525DO differential pressure transducer
//!
//! ## Overview
//!
//! The transducer needs no command to produce a reading: a 4-byte read from
//! its address returns the latest conversion. [`AirspeedSensor`] owns the bus
//! handle, turns each read into a [`PressureReading`] via [`decode`], and
//! publishes it under `sensors/airspeed/`.
//!
//! ```text
//!   RegisterBus::read ──▶ decode ──▶ PressureReading ──▶ publish
//!        │                  │
//!    WouldBlock         ShortFrame
//!        ▼                  ▼
//!     skip tick     skip tick, error_count += 1
//! ```
//!
//! A failed probe at startup marks the sensor degraded; reads are then not
//! attempted until [`AirspeedSensor::begin`] succeeds.

use crate::{
    config::AirspeedConfig,
    constants::airspeed::FRAME_LEN,
    errors::{SensorError, SensorResult},
    frame::{decode, PressureReading},
    store::{paths, PropertyStore},
    traits::RegisterBus,
};

/// Airspeed transducer on a register bus
#[derive(Debug)]
pub struct AirspeedSensor<B: RegisterBus> {
    bus: B,
    config: AirspeedConfig,
    degraded: bool,
    error_count: u64,
    last: Option<PressureReading>,
}

impl<B: RegisterBus> AirspeedSensor<B> {
    /// Sensor on `bus`; call [`begin`](Self::begin) before reading
    pub fn new(bus: B, config: AirspeedConfig) -> Self {
        Self {
            bus,
            config,
            degraded: true,
            error_count: 0,
            last: None,
        }
    }

    /// Probe the device
    pub fn begin(&mut self) -> SensorResult<()> {
        match self.bus.probe(self.config.address) {
            Ok(()) => {
                log_info!(
                    "MS4525DO on I2C: 0x{:02x} @ {} Hz",
                    self.config.address,
                    self.config.bus_rate_hz
                );
                self.degraded = false;
                Ok(())
            }
            Err(_e) => {
                log_warn!("MS4525DO init failed at 0x{:02x}: {:?}", self.config.address, _e);
                self.degraded = true;
                Err(SensorError::SensorInitFailure {
                    reason: "airspeed probe failed",
                })
            }
        }
    }

    /// True if the last [`begin`](Self::begin) failed or was never called
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Frames rejected since construction
    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    /// Most recent reading with a `Normal` status
    pub fn last_reading(&self) -> Option<&PressureReading> {
        self.last.as_ref()
    }

    /// Bus handle, for board code that shares it
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Read one frame
    ///
    /// `Ok(None)` when degraded or the bus has nothing this tick. A short
    /// frame is counted and returned as an error; the previous reading is
    /// kept. Stale and fault frames are still returned with their status,
    /// but do not replace [`last_reading`](Self::last_reading).
    pub fn read(&mut self) -> SensorResult<Option<PressureReading>> {
        if self.degraded {
            return Ok(None);
        }

        let mut buf = [0u8; FRAME_LEN];
        let n = match self.bus.read(self.config.address, &mut buf) {
            Ok(n) => n.min(FRAME_LEN),
            Err(nb::Error::WouldBlock) => return Ok(None),
            Err(nb::Error::Other(_e)) => {
                log_debug!("MS4525DO read failed: {:?}", _e);
                self.error_count += 1;
                return Err(SensorError::BusError {
                    reason: "airspeed read failed",
                });
            }
        };

        match decode(&buf[..n]) {
            Ok(reading) => {
                if reading.status.is_usable() {
                    self.last = Some(reading);
                } else {
                    log_debug!("MS4525DO status {:?}", reading.status);
                }
                Ok(Some(reading))
            }
            Err(e) => {
                log_warn!("MS4525DO: {}", e);
                self.error_count += 1;
                Err(e)
            }
        }
    }

    /// Read and publish in one step
    ///
    /// Errors are absorbed: the tick is skipped and the error count
    /// republished. Nothing is written while simulation is enabled. Returns
    /// the reading read this tick, if any.
    pub fn update<S: PropertyStore + ?Sized>(&mut self, store: &mut S) -> Option<PressureReading> {
        let sim = store.is_sim_enabled();
        match self.read() {
            Ok(Some(reading)) => {
                if !sim {
                    publish(store, &reading);
                }
                Some(reading)
            }
            Ok(None) => None,
            Err(_) => {
                if !sim {
                    store.set_u64(paths::airspeed::ERROR_COUNT, self.error_count);
                }
                None
            }
        }
    }
}

/// Write a reading to `sensors/airspeed/`
pub fn publish<S: PropertyStore + ?Sized>(store: &mut S, reading: &PressureReading) {
    store.set_f64(paths::airspeed::DIFF_PRESS_PA, reading.diff_press_pa as f64);
    store.set_f64(paths::airspeed::TEMP_C, reading.temperature_c as f64);
    store.set_u64(paths::airspeed::STATUS, reading.status.bits() as u64);
    store.set_u64(paths::airspeed::DP_RAW, reading.dp_raw as u64);
    store.set_u64(paths::airspeed::T_RAW, reading.t_raw as u64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{frame::FrameStatus, store::MemoryStore};

    /// Bus that replays one scripted response per read
    struct ScriptedBus {
        responses: heapless::Deque<nb::Result<heapless::Vec<u8, 8>, &'static str>, 8>,
        probe_ok: bool,
    }

    impl ScriptedBus {
        fn new(probe_ok: bool) -> Self {
            Self {
                responses: heapless::Deque::new(),
                probe_ok,
            }
        }

        fn push_bytes(&mut self, bytes: &[u8]) {
            let mut v = heapless::Vec::new();
            v.extend_from_slice(bytes).unwrap();
            self.responses.push_back(Ok(v)).unwrap();
        }

        fn push_err(&mut self, e: nb::Error<&'static str>) {
            self.responses.push_back(Err(e)).unwrap();
        }
    }

    impl RegisterBus for ScriptedBus {
        type Error = &'static str;

        fn read(&mut self, address: u8, buf: &mut [u8]) -> nb::Result<usize, Self::Error> {
            assert_eq!(address, 0x28);
            let bytes = self.responses.pop_front().unwrap_or(Err(nb::Error::WouldBlock))?;
            let n = bytes.len().min(buf.len());
            buf[..n].copy_from_slice(&bytes[..n]);
            Ok(n)
        }

        fn probe(&mut self, _address: u8) -> Result<(), Self::Error> {
            if self.probe_ok {
                Ok(())
            } else {
                Err("nack")
            }
        }
    }

    fn started(bus: ScriptedBus) -> AirspeedSensor<ScriptedBus> {
        let mut sensor = AirspeedSensor::new(bus, AirspeedConfig::default());
        sensor.begin().unwrap();
        sensor
    }

    #[test]
    fn failed_probe_degrades() {
        let mut bus = ScriptedBus::new(false);
        bus.push_bytes(&[0x20, 0x00, 0x64, 0x00]);
        let mut sensor = AirspeedSensor::new(bus, AirspeedConfig::default());

        assert!(matches!(sensor.begin(), Err(SensorError::SensorInitFailure { .. })));
        assert!(sensor.is_degraded());
        assert_eq!(sensor.read(), Ok(None));
    }

    #[test]
    fn good_frame_published() {
        let mut bus = ScriptedBus::new(true);
        bus.push_bytes(&[0x20, 0x00, 0x64, 0x00]);
        let mut sensor = started(bus);
        let mut store = MemoryStore::new();

        let reading = sensor.update(&mut store).unwrap();
        assert_eq!(reading.status, FrameStatus::Normal);
        assert_eq!(store.get_u64(paths::airspeed::DP_RAW), Some(8192));
        assert_eq!(store.get_u64(paths::airspeed::T_RAW), Some(800));
        assert_eq!(store.get_u64(paths::airspeed::STATUS), Some(0));
        assert_eq!(
            store.get_f64(paths::airspeed::DIFF_PRESS_PA),
            Some(reading.diff_press_pa as f64)
        );
        assert_eq!(sensor.last_reading(), Some(&reading));
    }

    #[test]
    fn short_frame_skipped_and_counted() {
        let mut bus = ScriptedBus::new(true);
        bus.push_bytes(&[0x20, 0x00, 0x64, 0x00]);
        bus.push_bytes(&[0x3F, 0xFF]);
        let mut sensor = started(bus);
        let mut store = MemoryStore::new();

        let first = sensor.update(&mut store).unwrap();
        assert_eq!(sensor.update(&mut store), None);

        assert_eq!(sensor.error_count(), 1);
        assert_eq!(store.get_u64(paths::airspeed::ERROR_COUNT), Some(1));
        // Previous reading untouched
        assert_eq!(store.get_u64(paths::airspeed::DP_RAW), Some(first.dp_raw as u64));
        assert_eq!(sensor.last_reading(), Some(&first));
    }

    #[test]
    fn stale_frame_published_but_not_kept() {
        let mut bus = ScriptedBus::new(true);
        bus.push_bytes(&[0x20, 0x00, 0x64, 0x00]);
        bus.push_bytes(&[0xA0, 0x10, 0x64, 0x00]);
        let mut sensor = started(bus);
        let mut store = MemoryStore::new();

        let fresh = sensor.update(&mut store).unwrap();
        let stale = sensor.update(&mut store).unwrap();

        assert_eq!(stale.status, FrameStatus::Stale);
        assert_eq!(store.get_u64(paths::airspeed::STATUS), Some(2));
        assert_eq!(store.get_u64(paths::airspeed::DP_RAW), Some(stale.dp_raw as u64));
        assert_eq!(sensor.last_reading(), Some(&fresh));
        assert_eq!(sensor.error_count(), 0);
    }

    #[test]
    fn sim_suppresses_publication() {
        let mut bus = ScriptedBus::new(true);
        bus.push_bytes(&[0x20, 0x00, 0x64, 0x00]);
        let mut sensor = started(bus);
        let mut store = MemoryStore::new();
        store.set_bool(paths::SIM_ENABLE, true);

        assert!(sensor.update(&mut store).is_some());
        assert_eq!(store.get(paths::airspeed::DIFF_PRESS_PA), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn would_block_is_not_an_error() {
        let mut bus = ScriptedBus::new(true);
        bus.push_err(nb::Error::WouldBlock);
        let mut sensor = started(bus);

        assert_eq!(sensor.read(), Ok(None));
        assert_eq!(sensor.error_count(), 0);
    }

    #[test]
    fn bus_failure_counted() {
        let mut bus = ScriptedBus::new(true);
        bus.push_err(nb::Error::Other("arbitration lost"));
        let mut sensor = started(bus);

        assert!(matches!(sensor.read(), Err(SensorError::BusError { .. })));
        assert_eq!(sensor.error_count(), 1);
    }
}
