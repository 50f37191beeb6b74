//! Constants for CuffWatch Core
//!
//! Every fixed number the measurement contract depends on lives here, grouped
//! by domain:
//! - **Sensor**: bus address, wire format, status bits, transfer function
//! - **Timing**: settle and pacing waits, priming countdown
//! - **Thresholds**: inflation target, deflation stop, acceptable rate band
//!
//! Names carry their units. Waits are `fugit` durations so they cannot be
//! confused with pressures or counts.

/// MPR series transducer specifications and wire format.
pub mod sensor;

/// Fixed waits and cadences.
pub mod timing;

/// Session thresholds in mmHg and mmHg/s.
pub mod thresholds;

pub use sensor::{
    MPR_I2C_ADDRESS, START_CONVERSION_COMMAND, RESPONSE_LEN,
    OUTPUT_MIN_COUNTS, OUTPUT_MAX_COUNTS, PRESSURE_MIN_MMHG, PRESSURE_MAX_MMHG,
};

pub use timing::{
    CONVERSION_SETTLE, DEFLATION_PACING, INFLATION_POLL_INTERVAL,
    COUNTDOWN_STEP, COUNTDOWN_STEPS, MS_PER_SECOND,
};

pub use thresholds::{
    INFLATION_TARGET_MMHG, DEFLATION_STOP_MMHG,
    DEFLATION_TOO_FAST_MMHG_PER_S, DEFLATION_TOO_SLOW_MMHG_PER_S,
};
