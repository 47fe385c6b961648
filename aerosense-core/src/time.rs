//! Time sources for the acquisition loop
//!
//! The cycle never reads a clock on its own. The scheduler hands it the
//! current timestamp each tick and every elapsed-time counter is advanced by
//! the delta between ticks.

use crate::constants::time::{MS_PER_SECOND, MS_PER_SECOND_F32};

/// Timestamp in milliseconds since boot
pub type Timestamp = u64;

/// Source of time for the scheduler
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// System time source (requires std)
///
/// Milliseconds since the source was created, so it behaves like a boot
/// counter on the host.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct SystemTime {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemTime {
    /// Start counting from now
    pub fn new() -> Self {
        Self { start: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for SystemTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for SystemTime {
    fn now(&self) -> Timestamp {
        self.start.elapsed().as_millis() as Timestamp
    }
}

/// Fixed time source for testing and replay
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
}

impl FixedTime {
    /// Start at the given timestamp
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    /// Move forward by `ms`
    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }
}

/// Tracks the previous tick and turns timestamps into deltas
#[derive(Debug, Clone, Default)]
pub struct TickClock {
    last: Option<Timestamp>,
}

impl TickClock {
    /// Clock that has not seen a tick yet
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Record `now` and return seconds since the previous tick
    ///
    /// The first tick and any backwards step yield zero.
    pub fn advance(&mut self, now: Timestamp) -> f32 {
        let dt = match self.last {
            Some(last) => delta_seconds(last, now),
            None => 0.0,
        };
        self.last = Some(now);
        dt
    }
}

/// Seconds between two timestamps, saturating at zero
pub fn delta_seconds(earlier: Timestamp, later: Timestamp) -> f32 {
    later.saturating_sub(earlier) as f32 / MS_PER_SECOND_F32
}

/// Timestamp as fractional seconds, for publication
pub fn to_seconds(timestamp: Timestamp) -> f64 {
    timestamp as f64 / MS_PER_SECOND as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_time_advances() {
        let mut time = FixedTime::new(1000);
        assert_eq!(time.now(), 1000);

        time.advance(500);
        assert_eq!(time.now(), 1500);
    }

    #[test]
    fn tick_clock_deltas() {
        let mut clock = TickClock::new();
        assert_eq!(clock.advance(1000), 0.0);
        assert_eq!(clock.advance(1250), 0.25);

        // Clock stepped backwards
        assert_eq!(clock.advance(1200), 0.0);
        assert_eq!(clock.advance(1700), 0.5);
    }

    #[cfg(feature = "std")]
    #[test]
    fn system_time_is_monotonic() {
        let time = SystemTime::new();
        let a = time.now();
        assert!(time.now() >= a);
    }

    #[test]
    fn timestamp_in_seconds() {
        assert_eq!(to_seconds(1500), 1.5);
    }
}
