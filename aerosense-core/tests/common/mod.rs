//! Fakes and fixtures shared by the integration tests
//!
//! - [`FakeImu`] - scripted IMU driver, repeats its last sample
//! - [`FakeBus`] - scripted register bus, counts reads
//! - [`frame`] - builds MS4525DO frames from field values

#![allow(dead_code)]

use std::collections::VecDeque;

use aerosense_core::{
    config::{CycleConfig, ImuConfig},
    traits::{ImuSource, RawImuSample, RegisterBus},
    SensorUpdateCycle,
};

pub const G: f32 = 9.80665;

/// Rotation of +90° about z, row-major
pub const ROT_Z_90: [f32; 9] = [
    0.0, -1.0, 0.0,
    1.0, 0.0, 0.0,
    0.0, 0.0, 1.0,
];

/// Vehicle level and still, with a constant gyro offset
pub fn level_sample(gyro: [f32; 3]) -> RawImuSample {
    RawImuSample {
        accel: [0.0, 0.0, -G],
        gyro,
        mag: [22.0, 3.0, 41.0],
        temp_c: 30.5,
    }
}

/// IMU driver that plays queued samples, then repeats the last one
#[derive(Debug, Default)]
pub struct FakeImu {
    pub queue: VecDeque<RawImuSample>,
    pub last: Option<RawImuSample>,
    pub fail_begin: bool,
    pub begin_calls: usize,
    pub reads: usize,
}

impl FakeImu {
    pub fn constant(sample: RawImuSample) -> Self {
        Self {
            last: Some(sample),
            ..Self::default()
        }
    }

    pub fn broken() -> Self {
        Self {
            fail_begin: true,
            ..Self::default()
        }
    }

    pub fn set(&mut self, sample: RawImuSample) {
        self.queue.clear();
        self.last = Some(sample);
    }
}

impl ImuSource for FakeImu {
    type Error = &'static str;

    fn begin(&mut self, _config: &ImuConfig) -> Result<(), Self::Error> {
        self.begin_calls += 1;
        if self.fail_begin {
            Err("no WHO_AM_I response")
        } else {
            Ok(())
        }
    }

    fn read_motion(&mut self) -> nb::Result<RawImuSample, Self::Error> {
        self.reads += 1;
        if let Some(next) = self.queue.pop_front() {
            self.last = Some(next);
        }
        self.last.ok_or(nb::Error::WouldBlock)
    }
}

/// Register bus that answers with queued byte strings, then repeats the last
#[derive(Debug, Default)]
pub struct FakeBus {
    pub queue: VecDeque<Vec<u8>>,
    pub last: Option<Vec<u8>>,
    pub reads: usize,
    pub nack: bool,
}

impl FakeBus {
    pub fn constant(bytes: &[u8]) -> Self {
        Self {
            last: Some(bytes.to_vec()),
            ..Self::default()
        }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.queue.push_back(bytes.to_vec());
    }
}

impl RegisterBus for FakeBus {
    type Error = &'static str;

    fn read(&mut self, _address: u8, buf: &mut [u8]) -> nb::Result<usize, Self::Error> {
        if self.nack {
            return Err(nb::Error::Other("nack"));
        }
        if buf.is_empty() {
            return Ok(0);
        }

        self.reads += 1;
        if let Some(next) = self.queue.pop_front() {
            self.last = Some(next);
        }
        let bytes = self.last.as_ref().ok_or(nb::Error::WouldBlock)?;
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        Ok(n)
    }
}

/// Encode an MS4525DO frame: 2 status bits, 14-bit pressure, 11-bit temperature
pub fn frame(status: u8, dp_raw: u16, t_raw: u16) -> [u8; 4] {
    let t_word = t_raw << 5;
    [
        (status << 6) | ((dp_raw >> 8) as u8 & 0x3F),
        dp_raw as u8,
        (t_word >> 8) as u8,
        t_word as u8,
    ]
}

/// Cycle over the fakes with default configuration
pub fn cycle(imu: FakeImu, bus: FakeBus) -> SensorUpdateCycle<FakeImu, FakeBus> {
    SensorUpdateCycle::new(CycleConfig::default(), imu, bus)
}
