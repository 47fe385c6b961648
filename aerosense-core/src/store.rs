//! Property tree access
//!
//! Configuration and telemetry live in a hierarchical property tree owned by
//! the flight computer. This crate only needs get/set by path, so the tree
//! is consumed through [`PropertyStore`]. [`MemoryStore`] is a flat
//! path-keyed implementation used on the host and in tests.
//!
//! ## Paths
//!
//! Every path the acquisition layer reads or writes is in [`paths`]. Array
//! properties (calibration matrices) are indexed, matching how the tree
//! stores them.

use alloc::{collections::BTreeMap, string::String, vec::Vec};

/// A value held at a property path
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Floating point (the tree stores doubles)
    Double(f64),
    /// Unsigned integer
    UInt(u64),
    /// Boolean flag
    Bool(bool),
    /// String
    Str(String),
    /// Indexed array of doubles
    Array(Vec<f64>),
}

/// Get/set-by-path access to the shared property tree
pub trait PropertyStore {
    /// Value at `path`, if any
    fn get(&self, path: &str) -> Option<&Value>;

    /// Replace the value at `path`
    fn set(&mut self, path: &str, value: Value);

    /// Double at `path`; integers are widened
    fn get_f64(&self, path: &str) -> Option<f64> {
        match self.get(path)? {
            Value::Double(v) => Some(*v),
            Value::UInt(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Unsigned integer at `path`
    fn get_u64(&self, path: &str) -> Option<u64> {
        match self.get(path)? {
            Value::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Flag at `path`
    fn get_bool(&self, path: &str) -> Option<bool> {
        match self.get(path)? {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// String at `path`
    fn get_str(&self, path: &str) -> Option<&str> {
        match self.get(path)? {
            Value::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Whole array at `path`
    fn get_array(&self, path: &str) -> Option<&[f64]> {
        match self.get(path)? {
            Value::Array(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Store a double
    fn set_f64(&mut self, path: &str, value: f64) {
        self.set(path, Value::Double(value));
    }

    /// Store an unsigned integer
    fn set_u64(&mut self, path: &str, value: u64) {
        self.set(path, Value::UInt(value));
    }

    /// Store a flag
    fn set_bool(&mut self, path: &str, value: bool) {
        self.set(path, Value::Bool(value));
    }

    /// Store a string
    fn set_str(&mut self, path: &str, value: &str) {
        self.set(path, Value::Str(String::from(value)));
    }

    /// Store a whole array
    fn set_array(&mut self, path: &str, values: &[f64]) {
        self.set(path, Value::Array(values.to_vec()));
    }

    /// True when `sim/enable` is set; sensor outputs must then be left alone
    fn is_sim_enabled(&self) -> bool {
        self.get_bool(paths::SIM_ENABLE).unwrap_or(false)
    }
}

/// Flat in-memory property store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self { values: BTreeMap::new() }
    }

    /// Number of properties set
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing has been set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Paths under `prefix`, in order
    pub fn paths_under<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.values
            .keys()
            .filter(move |path| path.starts_with(prefix))
            .map(String::as_str)
    }
}

impl PropertyStore for MemoryStore {
    fn get(&self, path: &str) -> Option<&Value> {
        self.values.get(path)
    }

    fn set(&mut self, path: &str, value: Value) {
        self.values.insert(String::from(path), value);
    }
}

/// Property paths used by the acquisition layer
pub mod paths {
    /// Inertial sensor outputs
    #[allow(missing_docs)]
    pub mod imu {
        pub const MILLIS: &str = "sensors/imu/millis";
        pub const TIMESTAMP: &str = "sensors/imu/timestamp";
        pub const AX_RAW: &str = "sensors/imu/ax_raw";
        pub const AY_RAW: &str = "sensors/imu/ay_raw";
        pub const AZ_RAW: &str = "sensors/imu/az_raw";
        pub const HX_RAW: &str = "sensors/imu/hx_raw";
        pub const HY_RAW: &str = "sensors/imu/hy_raw";
        pub const HZ_RAW: &str = "sensors/imu/hz_raw";
        pub const AX_MPS2: &str = "sensors/imu/ax_mps2";
        pub const AY_MPS2: &str = "sensors/imu/ay_mps2";
        pub const AZ_MPS2: &str = "sensors/imu/az_mps2";
        pub const P_RPS: &str = "sensors/imu/p_rps";
        pub const Q_RPS: &str = "sensors/imu/q_rps";
        pub const R_RPS: &str = "sensors/imu/r_rps";
        pub const HX: &str = "sensors/imu/hx";
        pub const HY: &str = "sensors/imu/hy";
        pub const HZ: &str = "sensors/imu/hz";
        pub const TEMP_C: &str = "sensors/imu/temp_C";
        pub const GYROS_CALIBRATED: &str = "sensors/imu/gyros_calibrated";
        pub const REQUEST: &str = "sensors/imu/request";
    }

    /// Persisted IMU calibration
    #[allow(missing_docs)]
    pub mod calibration {
        pub const STRAPDOWN: &str = "config/imu/calibration/strapdown";
        pub const ACCEL_AFFINE: &str = "config/imu/calibration/accel_affine";
        pub const MAG_AFFINE: &str = "config/imu/calibration/mag_affine";
    }

    /// Airspeed transducer outputs
    #[allow(missing_docs)]
    pub mod airspeed {
        pub const DIFF_PRESS_PA: &str = "sensors/airspeed/diff_press_pa";
        pub const TEMP_C: &str = "sensors/airspeed/temp_C";
        pub const STATUS: &str = "sensors/airspeed/status";
        pub const DP_RAW: &str = "sensors/airspeed/dp_raw";
        pub const T_RAW: &str = "sensors/airspeed/t_raw";
        pub const ERROR_COUNT: &str = "sensors/airspeed/error_count";
    }

    /// Simulation input; true means sensor values are injected externally
    pub const SIM_ENABLE: &str = "sim/enable";
}
