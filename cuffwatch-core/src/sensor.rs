//! Honeywell MPR Series Transducer over I²C
//!
//! ## Protocol
//!
//! One measurement is two bus transactions with a settle wait in between:
//!
//! ```text
//! write 0x18  [0xAA, 0x00, 0x00]        start conversion
//! wait  5 ms                            conversion settles
//! read  0x18  [status, msb, mid, lsb]   result
//! ```
//!
//! The read always pulls all four bytes, even when the status byte reports a
//! fault, so the next command starts on a clean bus.
//!
//! ## Status Byte
//!
//! ```text
//!  bit  7   6       5     4   3   2        1   0
//!      ┌───┬───────┬─────┬───┬───┬────────┬───┬─────────┐
//!      │ 0 │ power │ busy│ 0 │ 0 │ memory │ 0 │ math sat│
//!      └───┴───────┴─────┴───┴───┴────────┴───┴─────────┘
//! ```
//!
//! Faults are checked in the order busy, power, memory, math saturation. The
//! first one found wins and the pressure bytes are not interpreted.
//!
//! The power bit reads 1 on a powered device. Checking it is opt-in through
//! [`SensorConfig::with_power_check`]; by default a status of `0x00` decodes as
//! [`SensorStatus::Ok`].
//!
//! ## Pressure Bytes
//!
//! The count arrives most significant byte first and is reassembled as
//! `lsb + (mid << 8) + (msb << 16)`.

use embedded_hal::{delay::DelayNs, i2c::I2c};
use fugit::MillisDurationU32;

use crate::{
    constants::{
        sensor::{
            MPR_I2C_ADDRESS, RAW_COUNT_MAX, RESPONSE_LEN, START_CONVERSION_COMMAND,
            STATUS_BUSY_BIT, STATUS_MATH_SATURATION_BIT, STATUS_MEMORY_ERROR_BIT,
            STATUS_POWER_BIT,
        },
        timing::CONVERSION_SETTLE,
    },
    errors::{CuffResult, Error, SensorFault},
};

/// Raw 24-bit pressure count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawReading(u32);

impl RawReading {
    /// Largest representable count, 2^24 − 1
    pub const MAX: u32 = RAW_COUNT_MAX;

    /// Wrap a count, rejecting anything wider than 24 bits
    pub const fn new(counts: u32) -> Option<Self> {
        if counts <= Self::MAX {
            Some(Self(counts))
        } else {
            None
        }
    }

    /// Reassemble the three pressure bytes in wire order (MSB, MID, LSB)
    pub const fn from_wire(bytes: [u8; 3]) -> Self {
        let [msb, mid, lsb] = bytes;
        Self((lsb as u32) + ((mid as u32) << 8) + ((msb as u32) << 16))
    }

    /// The count itself
    pub const fn counts(self) -> u32 {
        self.0
    }
}

/// Classification of the leading status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorStatus {
    /// Conversion finished, pressure bytes are valid
    Ok,
    /// Conversion still running
    Busy,
    /// Power indication bit clear
    NotPowered,
    /// Calibration memory integrity failure
    MemoryError,
    /// Internal math saturation
    MathSaturation,
}

impl SensorStatus {
    /// Decode a status byte
    ///
    /// `check_power_bit` enables the `NotPowered` check (bit 6 clear).
    pub const fn decode(status: u8, check_power_bit: bool) -> Self {
        if status & STATUS_BUSY_BIT != 0 {
            SensorStatus::Busy
        } else if check_power_bit && status & STATUS_POWER_BIT == 0 {
            SensorStatus::NotPowered
        } else if status & STATUS_MEMORY_ERROR_BIT != 0 {
            SensorStatus::MemoryError
        } else if status & STATUS_MATH_SATURATION_BIT != 0 {
            SensorStatus::MathSaturation
        } else {
            SensorStatus::Ok
        }
    }

    /// The fault this status represents, `None` for `Ok`
    pub const fn fault(self) -> Option<SensorFault> {
        match self {
            SensorStatus::Ok => None,
            SensorStatus::Busy => Some(SensorFault::Busy),
            SensorStatus::NotPowered => Some(SensorFault::NotPowered),
            SensorStatus::MemoryError => Some(SensorFault::MemoryError),
            SensorStatus::MathSaturation => Some(SensorFault::MathSaturation),
        }
    }

    /// True when the pressure bytes can be trusted
    pub const fn is_ok(self) -> bool {
        matches!(self, SensorStatus::Ok)
    }
}

/// Decode a full 4-byte response
pub fn decode_response(
    response: &[u8; RESPONSE_LEN],
    check_power_bit: bool,
) -> Result<RawReading, SensorFault> {
    match SensorStatus::decode(response[0], check_power_bit).fault() {
        Some(fault) => Err(fault),
        None => Ok(RawReading::from_wire([response[1], response[2], response[3]])),
    }
}

/// Link configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorConfig {
    address: u8,
    settle: MillisDurationU32,
    check_power_bit: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            address: MPR_I2C_ADDRESS,
            settle: CONVERSION_SETTLE,
            check_power_bit: false,
        }
    }
}

impl SensorConfig {
    /// Use a non-default 7-bit address (MPR parts are ordered with 0x08–0x78)
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Change the wait between command and read
    pub fn with_settle(mut self, settle: MillisDurationU32) -> Self {
        self.settle = settle;
        self
    }

    /// Report `NotPowered` when status bit 6 is clear
    pub fn with_power_check(mut self, enabled: bool) -> Self {
        self.check_power_bit = enabled;
        self
    }

    /// Bus address in use
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Conversion settle wait
    pub fn settle(&self) -> MillisDurationU32 {
        self.settle
    }

    /// Whether the power bit is checked
    pub fn checks_power_bit(&self) -> bool {
        self.check_power_bit
    }
}

/// Exclusive owner of the I²C bus to the transducer
pub struct SensorLink<I2C, D> {
    i2c: I2C,
    delay: D,
    config: SensorConfig,
}

impl<I2C, D> SensorLink<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Link at the default address
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::with_config(i2c, delay, SensorConfig::default())
    }

    /// Link with explicit configuration
    pub fn with_config(i2c: I2C, delay: D, config: SensorConfig) -> Self {
        Self { i2c, delay, config }
    }

    /// Active configuration
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Run one command/read cycle and return the raw count
    ///
    /// Blocks for the settle wait. Never retries.
    pub fn read_raw(&mut self) -> CuffResult<RawReading, I2C::Error> {
        let address = self.config.address;

        self.i2c
            .write(address, &START_CONVERSION_COMMAND)
            .map_err(Error::Bus)?;

        self.delay.delay_ms(self.config.settle.to_millis());

        let mut response = [0u8; RESPONSE_LEN];
        self.i2c.read(address, &mut response).map_err(Error::Bus)?;

        log_trace!(
            "mpr response {} {} {} {}",
            response[0],
            response[1],
            response[2],
            response[3]
        );

        decode_response(&response, self.config.check_power_bit).map_err(Error::Sensor)
    }

    /// Give the bus and delay back
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}
