//! Raw Count to mmHg Transfer Function
//!
//! The MPR series output is linear between two calibration points:
//!
//! ```text
//!            (raw − out_min) × (p_max − p_min)
//! P(mmHg) = ─────────────────────────────────── + p_min
//!                     out_max − out_min
//! ```
//!
//! For the 0300YG part: `p_min = 0`, `p_max = 300`, `out_min = 419430`
//! (2.5% of 2^24) and `out_max = 3774874` (22.5% of 2^24), so one count is
//! about 89 µmmHg.
//!
//! No clamping is applied. A saturated or miscalibrated sensor can produce
//! values below 0 or above 300 mmHg and callers see them as they are.
//!
//! The arithmetic runs in `f64`. The calibration points then map to exactly
//! `p_min` and `p_max` before the result is narrowed to `f32`.

use crate::{
    constants::sensor::{OUTPUT_MAX_COUNTS, OUTPUT_MIN_COUNTS, PRESSURE_MAX_MMHG, PRESSURE_MIN_MMHG},
    sensor::RawReading,
};

/// Affine map between raw counts and mmHg
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferFunction {
    p_min: f64,
    p_max: f64,
    out_min: f64,
    out_max: f64,
}

impl Default for TransferFunction {
    fn default() -> Self {
        Self::MPR_0300YG
    }
}

impl TransferFunction {
    /// Honeywell MPRLS0300YG00001BB, transfer function A
    pub const MPR_0300YG: Self = Self::new(
        PRESSURE_MIN_MMHG,
        PRESSURE_MAX_MMHG,
        OUTPUT_MIN_COUNTS,
        OUTPUT_MAX_COUNTS,
    );

    /// Build a transfer function from its two calibration points
    pub const fn new(p_min: f32, p_max: f32, out_min: u32, out_max: u32) -> Self {
        Self {
            p_min: p_min as f64,
            p_max: p_max as f64,
            out_min: out_min as f64,
            out_max: out_max as f64,
        }
    }

    /// Convert a raw count to mmHg
    pub fn to_mmhg(&self, raw: RawReading) -> f32 {
        let counts = raw.counts() as f64;
        ((counts - self.out_min) * (self.p_max - self.p_min) / (self.out_max - self.out_min)
            + self.p_min) as f32
    }

    /// Inverse of [`to_mmhg`](Self::to_mmhg), in fractional counts
    pub fn to_counts(&self, mmhg: f32) -> f64 {
        (mmhg as f64 - self.p_min) * (self.out_max - self.out_min) / (self.p_max - self.p_min)
            + self.out_min
    }

    /// mmHg represented by one count
    pub fn resolution_mmhg(&self) -> f64 {
        (self.p_max - self.p_min) / (self.out_max - self.out_min)
    }
}
