//! Time management for the measurement loops
//!
//! The deflation estimator reads a millisecond clock around every sample and
//! sleeps between samples. Both are injected:
//! - `TimeSource` for timestamps (hardware timer, `std::time::Instant`, test clock)
//! - `embedded_hal::delay::DelayNs` for the waits
//!
//! `ManualClock` implements both for deterministic tests: sleeping through it
//! advances the time it reports.

use core::cell::Cell;

use embedded_hal::delay::DelayNs;

/// Timestamp in milliseconds since an arbitrary, fixed origin
pub type Timestamp = u64;

/// Source of monotonic time for interval measurement
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;

    /// Milliseconds elapsed since `earlier`, zero if the clock went backwards
    fn elapsed_since(&self, earlier: Timestamp) -> u64 {
        self.now().saturating_sub(earlier)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Monotonic clock backed by `std::time::Instant`
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicClock {
    /// Start counting from now
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicClock {
    fn now(&self) -> Timestamp {
        self.origin.elapsed().as_millis() as Timestamp
    }
}

/// Blocking delay backed by `std::thread::sleep`
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

#[cfg(feature = "std")]
impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(ns as u64));
    }
}

/// Hand-driven clock for tests and simulation
///
/// Shared by reference: `&ManualClock` is both a `TimeSource` and a `DelayNs`,
/// so a simulated sensor, the estimator's clock and its delay can all point at
/// the same instance.
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: Cell<u64>,
}

impl ManualClock {
    /// Clock starting at `timestamp` milliseconds
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            nanos: Cell::new(timestamp * 1_000_000),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, timestamp: Timestamp) {
        self.nanos.set(timestamp * 1_000_000);
    }

    /// Move forward by `ms` milliseconds
    pub fn advance(&self, ms: u64) {
        self.advance_ns(ms * 1_000_000);
    }

    /// Move forward by `ns` nanoseconds
    pub fn advance_ns(&self, ns: u64) {
        self.nanos.set(self.nanos.get() + ns);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        self.nanos.get() / 1_000_000
    }
}

impl DelayNs for &ManualClock {
    fn delay_ns(&mut self, ns: u32) {
        self.advance_ns(ns as u64);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(ms as u64);
    }
}
