//! Session Thresholds
//!
//! The operator deflates the cuff by hand; the device targets 4 mmHg/s with
//! ±0.5 mmHg/s tolerance. Boundary slopes count as out of band.

/// Inflation is complete once a reading is strictly above this (mmHg).
pub const INFLATION_TARGET_MMHG: f32 = 150.0;

/// Deflation sampling stops on the first reading strictly below this (mmHg).
pub const DEFLATION_STOP_MMHG: f32 = 30.0;

/// Target deflation rate (mmHg/s).
pub const TARGET_DEFLATION_RATE_MMHG_PER_S: f32 = 4.0;

/// Accepted deviation from the target rate (mmHg/s).
pub const DEFLATION_RATE_TOLERANCE_MMHG_PER_S: f32 = 0.5;

/// Slopes at or above this are too fast (mmHg/s).
pub const DEFLATION_TOO_FAST_MMHG_PER_S: f32 =
    TARGET_DEFLATION_RATE_MMHG_PER_S + DEFLATION_RATE_TOLERANCE_MMHG_PER_S;

/// Slopes at or below this are too slow (mmHg/s).
pub const DEFLATION_TOO_SLOW_MMHG_PER_S: f32 =
    TARGET_DEFLATION_RATE_MMHG_PER_S - DEFLATION_RATE_TOLERANCE_MMHG_PER_S;
