//! Hardware seams
//!
//! The acquisition layer never touches a peripheral directly. Board support
//! implements these traits and the cycle drives them:
//!
//! - [`bus`] - register reads on a shared I2C/SPI bus (airspeed transducer)
//! - [`imu`] - the 9-axis motion sensor
//!
//! Both are pull-based and non-blocking in the same way: a read that has
//! nothing for this tick reports `nb::Error::WouldBlock` and the tick moves on.

pub mod bus;
pub mod imu;

pub use bus::RegisterBus;
pub use imu::{ImuSource, RawImuSample};

pub use crate::time::TimeSource;
