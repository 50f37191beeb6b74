//! Fixed Waits and Cadences
//!
//! All waits are plain blocking sleeps through `DelayNs`; none of them are
//! precision timers.

use fugit::MillisDurationU32;

/// Wait between the start-conversion command and reading the result.
///
/// Source: MPR datasheet, maximum conversion time ~5 ms
pub const CONVERSION_SETTLE: MillisDurationU32 = MillisDurationU32::millis(5);

/// Pause between deflation samples.
pub const DEFLATION_PACING: MillisDurationU32 = MillisDurationU32::millis(5);

/// Pause between inflation readings.
pub const INFLATION_POLL_INTERVAL: MillisDurationU32 = MillisDurationU32::millis(100);

/// Length of one priming countdown step.
pub const COUNTDOWN_STEP: MillisDurationU32 = MillisDurationU32::millis(1_000);

/// Number of countdown steps before deflation sampling begins.
pub const COUNTDOWN_STEPS: u8 = 5;

/// Milliseconds per second, for rate conversions.
pub const MS_PER_SECOND: f32 = 1_000.0;
