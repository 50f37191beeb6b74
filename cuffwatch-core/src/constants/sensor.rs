//! Honeywell MPR Series Specifications
//!
//! Values for the MPRLS0300YG00001BB: 0–300 mmHg gauge, I²C, transfer
//! function A (2.5% to 22.5% of 2^24 counts).
//!
//! Source: Honeywell MicroPressure MPR series datasheet, sections 6.5 and 6.6

// ===== BUS =====

/// Default 7-bit I²C address of the MPR series.
pub const MPR_I2C_ADDRESS: u8 = 0x18;

/// Output measurement command: opcode 0xAA followed by two zero bytes.
pub const START_CONVERSION_COMMAND: [u8; 3] = [0xAA, 0x00, 0x00];

/// Response length: status byte plus three pressure bytes.
pub const RESPONSE_LEN: usize = 4;

// ===== STATUS BYTE =====

/// Set while a conversion is still running.
pub const STATUS_BUSY_BIT: u8 = 1 << 5;

/// Set when the device is powered.
pub const STATUS_POWER_BIT: u8 = 1 << 6;

/// Set when the integrity test on the calibration memory failed.
pub const STATUS_MEMORY_ERROR_BIT: u8 = 1 << 2;

/// Set when the internal math saturated.
pub const STATUS_MATH_SATURATION_BIT: u8 = 1 << 0;

// ===== TRANSFER FUNCTION =====

/// Full digital output range, 2^24 counts.
pub const FULL_SCALE_COUNTS: u32 = 1 << 24;

/// Largest raw count the 24-bit output can carry.
pub const RAW_COUNT_MAX: u32 = FULL_SCALE_COUNTS - 1;

/// Output at `PRESSURE_MIN_MMHG`: 2.5% of 2^24.
pub const OUTPUT_MIN_COUNTS: u32 = 419_430;

/// Output at `PRESSURE_MAX_MMHG`: 22.5% of 2^24.
pub const OUTPUT_MAX_COUNTS: u32 = 3_774_874;

/// Lower end of the calibrated range (mmHg).
pub const PRESSURE_MIN_MMHG: f32 = 0.0;

/// Upper end of the calibrated range (mmHg).
pub const PRESSURE_MAX_MMHG: f32 = 300.0;
