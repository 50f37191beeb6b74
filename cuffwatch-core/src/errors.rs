//! Error Types for Sensor Faults and Aborted Measurements
//!
//! ## Design Philosophy
//!
//! Overloading negative numbers onto the pressure range (`-1` busy, `-2`
//! unpowered, ...) makes a reading of `-1.0 mmHg` indistinguishable from a
//! busy sensor. Here every failure is a tagged variant:
//!
//! 1. **No Sentinels**: a pressure is an `f32` inside `Ok`, a fault is never a number.
//! 2. **No Heap Allocation**: messages are `&'static str`.
//! 3. **Copy Semantics**: errors are `Copy` whenever the bus error is.
//!
//! ## Error Categories
//!
//! ### Sensor Faults
//! - `SensorFault`: decoded from the transducer's status byte
//!
//! ### Transport
//! - `Error::Bus`: the I²C driver itself failed
//! - `Error::Gpio`: trigger or indicator pin access failed
//!
//! ### Estimation Preconditions
//! - `Error::NoSamples`: the cuff was already below the stop threshold
//! - `Error::ClockStalled`: samples were taken but no time elapsed
//!
//! Deflation that is too fast or too slow is *not* an error. It is a valid
//! classification of a completed measurement, see [`crate::DeflationRate`].
//!
//! ## Handling Strategy
//!
//! ```rust
//! use cuffwatch_core::{Error, SensorFault};
//!
//! fn report(error: Error<()>) -> &'static str {
//!     match error {
//!         Error::Sensor(SensorFault::Busy) => "retry the session",
//!         Error::Sensor(_) => "check the transducer",
//!         Error::NoSamples => "inflate above the stop threshold first",
//!         _ => error.diagnostic(),
//!     }
//! }
//! ```

use core::fmt;

use thiserror_no_std::Error as ThisError;

/// Result type for sensor, monitor and session operations
pub type CuffResult<T, E> = Result<T, Error<E>>;

/// Faults reported by the transducer's status byte
#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorFault {
    /// A conversion is still running
    #[error("Pressure sensor is busy")]
    Busy,

    /// The power indication bit is clear
    #[error("Pressure sensor is not powered")]
    NotPowered,

    /// Calibration memory failed its integrity check
    #[error("Pressure sensor has bad memory")]
    MemoryError,

    /// Internal math saturated during compensation
    #[error("Pressure sensor has math saturation")]
    MathSaturation,
}

/// Everything that can stop a measurement
///
/// Generic over the I²C driver's error type, like most `embedded-hal` drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// The I²C transaction failed
    Bus(E),

    /// The transducer reported a fault
    Sensor(SensorFault),

    /// Deflation started below the stop threshold, so no slope exists
    NoSamples,

    /// Samples were collected but the clock never advanced
    ClockStalled,

    /// Reading the trigger or driving the indicator failed
    Gpio,
}

impl<E> Error<E> {
    /// The sensor fault behind this error, if any
    pub fn sensor_fault(&self) -> Option<SensorFault> {
        match self {
            Error::Sensor(fault) => Some(*fault),
            _ => None,
        }
    }

    /// Short operator-facing text
    pub fn diagnostic(&self) -> &'static str {
        match self {
            Error::Bus(_) => "Pressure Sensor Not Responding",
            Error::Sensor(SensorFault::Busy) => "Pressure Sensor is Busy",
            Error::Sensor(SensorFault::NotPowered) => "Pressure Sensor is Not Powered",
            Error::Sensor(SensorFault::MemoryError) => "Pressure Sensor has Bad Memory",
            Error::Sensor(SensorFault::MathSaturation) => "Pressure Sensor has Math Saturation",
            Error::NoSamples => "Cuff Pressure Already Below Deflation Cutoff",
            Error::ClockStalled => "Sample Clock Did Not Advance",
            Error::Gpio => "Button or Indicator Failure",
        }
    }

    /// Swap the bus error type, keeping every other variant
    pub fn map_bus<F>(self, f: impl FnOnce(E) -> F) -> Error<F> {
        match self {
            Error::Bus(e) => Error::Bus(f(e)),
            Error::Sensor(fault) => Error::Sensor(fault),
            Error::NoSamples => Error::NoSamples,
            Error::ClockStalled => Error::ClockStalled,
            Error::Gpio => Error::Gpio,
        }
    }
}

impl<E> From<SensorFault> for Error<E> {
    fn from(fault: SensorFault) -> Self {
        Error::Sensor(fault)
    }
}

impl<E> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bus(_) => f.write_str("I2C transaction with the pressure sensor failed"),
            Error::Sensor(fault) => write!(f, "{}", fault),
            Error::NoSamples => f.write_str("No deflation samples above the stop threshold"),
            Error::ClockStalled => f.write_str("Clock did not advance while sampling"),
            Error::Gpio => f.write_str("GPIO access failed"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for Error<E> {}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorFault {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Busy => defmt::write!(fmt, "Sensor busy"),
            Self::NotPowered => defmt::write!(fmt, "Sensor not powered"),
            Self::MemoryError => defmt::write!(fmt, "Sensor memory error"),
            Self::MathSaturation => defmt::write!(fmt, "Sensor math saturation"),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for Error<E> {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Bus(_) => defmt::write!(fmt, "I2C error"),
            Self::Sensor(fault) => defmt::write!(fmt, "{}", fault),
            Self::NoSamples => defmt::write!(fmt, "No deflation samples"),
            Self::ClockStalled => defmt::write!(fmt, "Clock stalled"),
            Self::Gpio => defmt::write!(fmt, "GPIO error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_fault_converts() {
        let error: Error<()> = SensorFault::MemoryError.into();
        assert_eq!(error, Error::Sensor(SensorFault::MemoryError));
        assert_eq!(error.sensor_fault(), Some(SensorFault::MemoryError));
        assert_eq!(Error::<()>::NoSamples.sensor_fault(), None);
    }

    #[test]
    fn every_fault_has_its_own_diagnostic() {
        let faults = [
            SensorFault::Busy,
            SensorFault::NotPowered,
            SensorFault::MemoryError,
            SensorFault::MathSaturation,
        ];

        for (i, a) in faults.iter().enumerate() {
            for b in &faults[i + 1..] {
                assert_ne!(
                    Error::<()>::Sensor(*a).diagnostic(),
                    Error::<()>::Sensor(*b).diagnostic()
                );
            }
        }
    }

    #[test]
    fn map_bus_keeps_other_variants() {
        let bus: Error<u8> = Error::Bus(7);
        assert_eq!(bus.map_bus(u16::from), Error::Bus(7u16));

        let fault: Error<u8> = Error::Sensor(SensorFault::Busy);
        assert_eq!(fault.map_bus(u16::from), Error::Sensor(SensorFault::Busy));
    }

    #[test]
    fn display_uses_fault_text() {
        let error: Error<()> = Error::Sensor(SensorFault::Busy);
        assert_eq!(std::format!("{}", error), "Pressure sensor is busy");
    }
}
