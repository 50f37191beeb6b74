//! Deflation curve preprocessing
//!
//! The cuff pressure during deflation is a slow ramp with small pulse-driven
//! ripples riding on it. Subtracting a moving average removes the ramp and
//! leaves the ripples:
//!
//! ```text
//!   pressure      ╲╲╲╲╲╲╲         (ramp + ripple)
//!   average        ╲  ╲  ╲        (ramp)
//!   |difference|  ∧∧∧∧∧∧∧         (ripple envelope)
//! ```

use alloc::vec::Vec;

/// Trim a deflation curve to the band worth analysing
///
/// Starts at the first sample at or below `high_mmhg` and ends just before
/// the last sample at or above `low_mmhg`. A curve that never enters the band
/// from above is left untrimmed at that end.
pub fn condense(pressures: &[f32], low_mmhg: f32, high_mmhg: f32) -> &[f32] {
    let start = pressures
        .iter()
        .position(|&p| p <= high_mmhg)
        .unwrap_or(0);
    let trimmed = &pressures[start..];

    match trimmed.iter().rposition(|&p| p >= low_mmhg) {
        Some(end) => &trimmed[..end],
        None => trimmed,
    }
}

/// Trailing moving average over `window` samples
///
/// Yields `len - window + 1` values, or none if the input is shorter than
/// the window.
pub fn moving_average(values: &[f32], window: usize) -> Vec<f32> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }

    let mut averages = Vec::with_capacity(values.len() - window + 1);
    let mut sum: f64 = values[..window].iter().map(|&v| v as f64).sum();
    averages.push((sum / window as f64) as f32);

    for i in window..values.len() {
        sum += values[i] as f64 - values[i - window] as f64;
        averages.push((sum / window as f64) as f32);
    }

    averages
}

/// The part of `values` aligned with [`moving_average`]'s output
///
/// Each average is compared with the sample half a window into it.
pub fn centered(values: &[f32], window: usize) -> &[f32] {
    if window == 0 || values.len() < window {
        return &[];
    }
    let start = window / 2;
    &values[start..start + values.len() - window + 1]
}

/// Absolute distance of each centred sample from its moving average
pub fn oscillations(values: &[f32], window: usize) -> Vec<f32> {
    moving_average(values, window)
        .iter()
        .zip(centered(values, window))
        .map(|(average, value)| libm::fabsf(value - average))
        .collect()
}
