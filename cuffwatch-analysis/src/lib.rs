//! Oscillometric Blood Pressure Estimation
//!
//! ## Overview
//!
//! While the cuff bleeds down, every heartbeat nudges the cuff pressure. The
//! nudges are largest near mean arterial pressure and fade above systolic
//! and below diastolic. Given a recorded deflation curve (see
//! [`cuffwatch_core::DeflationTrace`]) this crate recovers that envelope and
//! reads the pressures off it.
//!
//! ## Pipeline
//!
//! ```text
//! trace ─▶ condense(60..175) ─▶ oscillations(window 50) ─▶ find_peaks(width 3, distance 40)
//!                                                                   │
//!                       max pulse ◀── tallest peak ─────────────────┤
//!                       systolic  ◀── left of max, nearest 0.5 × max ┤
//!                       diastolic ◀── right of max, nearest 0.8 × max┘
//! ```
//!
//! The heart rate comes from the mean number of samples per oscillation and
//! the sampling interval reported by the deflation estimate.
//!
//! ## Limitations
//!
//! The ratios are the fixed empirical ones (0.5 and 0.8) and are not
//! validated against a reference sphygmomanometer.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

use alloc::vec::Vec;

use cuffwatch_core::{DeflationTrace, RateEstimate};
use thiserror_no_std::Error as ThisError;

pub mod peaks;
pub mod signal;

pub use peaks::find_peaks;
pub use signal::{condense, moving_average, oscillations};

/// Tuning for [`analyze`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalysisConfig {
    /// Lower edge of the analysed band (mmHg)
    pub low_mmhg: f32,
    /// Upper edge of the analysed band (mmHg)
    pub high_mmhg: f32,
    /// Moving average window (samples)
    pub window: usize,
    /// Minimum peak width at half prominence (samples)
    pub min_peak_width: f32,
    /// Minimum spacing between peaks (samples)
    pub min_peak_distance: usize,
    /// Share of the max pulse amplitude that marks systolic
    pub systolic_ratio: f32,
    /// Share of the max pulse amplitude that marks diastolic
    pub diastolic_ratio: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            low_mmhg: 60.0,
            high_mmhg: 175.0,
            window: 50,
            min_peak_width: 3.0,
            min_peak_distance: 40,
            systolic_ratio: 0.5,
            diastolic_ratio: 0.8,
        }
    }
}

/// Pressures read off the oscillation envelope
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BloodPressure {
    /// Cuff pressure at the largest oscillation (mmHg)
    pub max_pulse_mmhg: f32,
    /// Systolic pressure (mmHg)
    pub systolic_mmhg: f32,
    /// Diastolic pressure (mmHg)
    pub diastolic_mmhg: f32,
    /// Heart rate (beats per minute)
    pub heart_rate_bpm: f32,
    /// Oscillation peaks found
    pub peak_count: usize,
}

/// Why a curve could not be analysed
#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisError {
    /// Fewer samples in the band than one averaging window
    #[error("only {available} samples in the analysis band, need at least {required}")]
    TooShort {
        /// Samples left after trimming
        available: usize,
        /// Moving average window
        required: usize,
    },

    /// No oscillation survived peak filtering
    #[error("no oscillation peaks found")]
    NoPeaks,

    /// The largest oscillation is the first one, so no systolic peak precedes it
    #[error("no oscillation peak before the maximum")]
    NoSystolicPeak,

    /// Sampling interval was not positive
    #[error("sampling interval must be positive")]
    InvalidInterval,
}

/// Estimate blood pressure from a deflation curve sampled every `interval_ms`
pub fn analyze(
    pressures: &[f32],
    interval_ms: f32,
    config: &AnalysisConfig,
) -> Result<BloodPressure, AnalysisError> {
    if interval_ms.is_nan() || interval_ms <= 0.0 {
        return Err(AnalysisError::InvalidInterval);
    }

    let band = condense(pressures, config.low_mmhg, config.high_mmhg);
    if config.window == 0 || band.len() < config.window {
        return Err(AnalysisError::TooShort {
            available: band.len(),
            required: config.window,
        });
    }

    let centred = signal::centered(band, config.window);
    let envelope = oscillations(band, config.window);
    let peaks = find_peaks(&envelope, config.min_peak_width, config.min_peak_distance);
    if peaks.is_empty() {
        return Err(AnalysisError::NoPeaks);
    }

    let amplitudes: Vec<f32> = peaks.iter().map(|&i| envelope[i]).collect();
    let max_at = first_max(&amplitudes);
    let max_amplitude = amplitudes[max_at];

    let systolic_at = nearest(&amplitudes[..max_at], max_amplitude * config.systolic_ratio)
        .ok_or(AnalysisError::NoSystolicPeak)?;
    let diastolic_at = max_at
        + nearest(&amplitudes[max_at..], max_amplitude * config.diastolic_ratio)
            .unwrap_or(0);

    let samples_per_oscillation = envelope.len() as f32 / peaks.len() as f32;
    let heart_rate_bpm = 60_000.0 / (samples_per_oscillation * interval_ms);

    let result = BloodPressure {
        max_pulse_mmhg: centred[peaks[max_at]],
        systolic_mmhg: centred[peaks[systolic_at]],
        diastolic_mmhg: centred[peaks[diastolic_at]],
        heart_rate_bpm,
        peak_count: peaks.len(),
    };

    #[cfg(feature = "log")]
    log::debug!(
        "oscillometry: {} peaks, SBP {} DBP {} HR {}",
        result.peak_count,
        result.systolic_mmhg,
        result.diastolic_mmhg,
        result.heart_rate_bpm
    );

    Ok(result)
}

/// Analyse a recorded trace using the cadence from its deflation estimate
pub fn analyze_trace<const N: usize>(
    trace: &DeflationTrace<N>,
    estimate: &RateEstimate,
    config: &AnalysisConfig,
) -> Result<BloodPressure, AnalysisError> {
    let pressures: Vec<f32> = trace.pressures().collect();
    analyze(&pressures, estimate.avg_interval_ms, config)
}

fn first_max(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &value) in values.iter().enumerate() {
        if value > values[best] {
            best = i;
        }
    }
    best
}

fn nearest(values: &[f32], target: f32) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &value) in values.iter().enumerate() {
        let distance = libm::fabsf(value - target);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((i, distance));
        }
    }
    best.map(|(i, _)| i)
}
