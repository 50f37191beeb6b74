//! Core measurement engine for CuffWatch
//!
//! Drives a Honeywell MPR series pressure transducer over I²C, converts its raw
//! counts to mmHg and checks that an operator deflates the cuff at a clinically
//! usable rate (about 4 mmHg/s).
//!
//! Key constraints:
//! - Single control flow, blocking waits only
//! - No heap allocation
//! - Hardware reached only through `embedded-hal` traits
//!
//! ```text
//! SensorLink → TransferFunction → MeasurementService
//!                                        │
//!                     ┌──────────────────┴──────────────────┐
//!              InflationMonitor                  DeflationRateEstimator
//!                     └──────────────────┬──────────────────┘
//!                                SessionController
//! ```
//!
//! ```no_run
//! # fn demo<I, D, P, T>(i2c: I, sensor_delay: D, mut delay: P, clock: T)
//! # where I: embedded_hal::i2c::I2c, D: embedded_hal::delay::DelayNs,
//! #       P: embedded_hal::delay::DelayNs, T: cuffwatch_core::time::TimeSource {
//! use cuffwatch_core::{DeflationRateEstimator, InflationMonitor, MeasurementService, SensorLink};
//!
//! let mut cuff = MeasurementService::new(SensorLink::new(i2c, sensor_delay));
//!
//! let peak = InflationMonitor::default().run(&mut cuff, &mut delay, &mut ());
//! let estimate = DeflationRateEstimator::default().run(&mut cuff, &clock, &mut delay, &mut ());
//! # }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod logging;

pub mod constants;
pub mod convert;
pub mod deflation;
pub mod errors;
pub mod events;
pub mod inflation;
pub mod measurement;
pub mod sensor;
pub mod session;
pub mod time;

// Public API
pub use convert::TransferFunction;
pub use deflation::{DeflationConfig, DeflationRate, DeflationRateEstimator, RateEstimate};
pub use errors::{CuffResult, Error, SensorFault};
pub use events::{DeflationTrace, SessionEvent, SessionEvents};
pub use inflation::{InflationConfig, InflationMonitor};
pub use measurement::{MeasurementService, PressureSource};
pub use sensor::{RawReading, SensorConfig, SensorLink, SensorStatus};
pub use session::{SessionController, SessionOutcome, Stage};

/// Crate version, reported at start-up
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
