//! Calibration requests from the ground station
//!
//! Operators ask for a recalibration by writing a token into the IMU
//! `request` property. The cycle polls that property once per tick:
//!
//! 1. A recognized token is turned into a [`CalibrationRequest`] and the
//!    property is overwritten with `"received: <token>"`.
//! 2. The same property value is never acted on twice. Writing the token
//!    again (after the acknowledgment replaced it) is a new request.
//! 3. Unrecognized values are ignored.

use heapless::String;

use crate::store::PropertyStore;

/// Longest property value remembered for de-duplication
pub const MAX_REQUEST_LEN: usize = 48;

/// Prefix written back to acknowledge a request
pub const ACK_PREFIX: &str = "received: ";

/// One-shot recalibration commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationRequest {
    /// Start the six-position accelerometer calibration
    CalibrateAccels,
    /// Discard the gyro bias and converge again
    CalibrateGyros,
}

impl CalibrationRequest {
    /// Token written by the operator
    pub fn token(&self) -> &'static str {
        match self {
            Self::CalibrateAccels => "calibrate-accels",
            Self::CalibrateGyros => "calibrate-gyros",
        }
    }

    /// Acknowledgment written back
    pub fn ack(&self) -> &'static str {
        match self {
            Self::CalibrateAccels => "received: calibrate-accels",
            Self::CalibrateGyros => "received: calibrate-gyros",
        }
    }

    /// Parse an operator token
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "calibrate-accels" => Some(Self::CalibrateAccels),
            "calibrate-gyros" => Some(Self::CalibrateGyros),
            _ => None,
        }
    }
}

/// Polls a request property with at-most-once handling per value
#[derive(Debug, Clone)]
pub struct RequestChannel {
    path: &'static str,
    last_seen: Option<String<MAX_REQUEST_LEN>>,
}

impl RequestChannel {
    /// Channel over the property at `path`
    pub fn new(path: &'static str) -> Self {
        Self { path, last_seen: None }
    }

    /// Check for a new request, acknowledging it in the store
    pub fn poll<S: PropertyStore + ?Sized>(&mut self, store: &mut S) -> Option<CalibrationRequest> {
        let current = store.get_str(self.path)?;
        if self.last_seen.as_deref() == Some(current) {
            return None;
        }

        let request = CalibrationRequest::parse(current);
        if request.is_none() && !current.starts_with(ACK_PREFIX) {
            log_debug!("Ignoring unrecognized request '{}'", current);
        }
        self.remember(current);

        let request = request?;
        store.set_str(self.path, request.ack());
        self.remember(request.ack());
        log_info!("IMU request acknowledged: {}", request.token());
        Some(request)
    }

    fn remember(&mut self, value: &str) {
        // Oversized values can never be a token; forget them instead
        let mut seen = String::new();
        self.last_seen = seen.push_str(value).ok().map(|_| seen);
    }
}
