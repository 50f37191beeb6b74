//! Peak picking on the oscillation envelope
//!
//! Three passes, in this order:
//!
//! 1. **Local maxima**: samples higher than both neighbours. A flat top
//!    counts once, at its middle. The first and last samples never count.
//! 2. **Distance**: peaks closer than `min_distance` samples compete and the
//!    taller one survives.
//! 3. **Width**: each survivor's width is measured at half its prominence;
//!    peaks narrower than `min_width` samples are dropped as noise.

use alloc::vec::Vec;

/// Indices of peaks in `signal`, ascending
pub fn find_peaks(signal: &[f32], min_width: f32, min_distance: usize) -> Vec<usize> {
    let mut peaks = local_maxima(signal);
    if min_distance > 1 {
        peaks = select_by_distance(signal, &peaks, min_distance);
    }
    peaks.retain(|&peak| width_at_half_prominence(signal, peak) >= min_width);
    peaks
}

fn local_maxima(signal: &[f32]) -> Vec<usize> {
    let mut maxima = Vec::new();
    if signal.len() < 3 {
        return maxima;
    }

    let last = signal.len() - 1;
    let mut i = 1;
    while i < last {
        if signal[i - 1] < signal[i] {
            let mut ahead = i + 1;
            while ahead < last && signal[ahead] == signal[i] {
                ahead += 1;
            }
            if signal[ahead] < signal[i] {
                maxima.push((i + ahead - 1) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }

    maxima
}

fn select_by_distance(signal: &[f32], peaks: &[usize], min_distance: usize) -> Vec<usize> {
    let mut keep = Vec::with_capacity(peaks.len());
    keep.resize(peaks.len(), true);

    // Tallest first; ties go to the later peak
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| {
        signal[peaks[b]]
            .partial_cmp(&signal[peaks[a]])
            .unwrap_or(core::cmp::Ordering::Equal)
            .then(b.cmp(&a))
    });

    for j in order {
        if !keep[j] {
            continue;
        }
        for k in (0..j).rev() {
            if peaks[j] - peaks[k] >= min_distance {
                break;
            }
            keep[k] = false;
        }
        for k in j + 1..peaks.len() {
            if peaks[k] - peaks[j] >= min_distance {
                break;
            }
            keep[k] = false;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&peak, kept)| kept.then_some(peak))
        .collect()
}

/// Prominence of the peak at `peak` and the indices of its two bases
fn prominence(signal: &[f32], peak: usize) -> (f32, usize, usize) {
    let height = signal[peak];

    let mut left_base = peak;
    let mut left_min = height;
    let mut i = peak;
    while i > 0 && signal[i - 1] <= height {
        i -= 1;
        if signal[i] < left_min {
            left_min = signal[i];
            left_base = i;
        }
    }

    let mut right_base = peak;
    let mut right_min = height;
    let mut i = peak;
    while i + 1 < signal.len() && signal[i + 1] <= height {
        i += 1;
        if signal[i] < right_min {
            right_min = signal[i];
            right_base = i;
        }
    }

    (height - left_min.max(right_min), left_base, right_base)
}

/// Width in samples at half prominence, interpolated between samples
fn width_at_half_prominence(signal: &[f32], peak: usize) -> f32 {
    let (prominence, left_base, right_base) = prominence(signal, peak);
    let level = signal[peak] - prominence * 0.5;

    let mut i = peak;
    while left_base < i && level < signal[i] {
        i -= 1;
    }
    let mut left = i as f32;
    if signal[i] < level {
        left += (level - signal[i]) / (signal[i + 1] - signal[i]);
    }

    let mut i = peak;
    while i < right_base && level < signal[i] {
        i += 1;
    }
    let mut right = i as f32;
    if signal[i] < level {
        right -= (level - signal[i]) / (signal[i - 1] - signal[i]);
    }

    right - left
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn finds_simple_maxima() {
        let signal = [0.0, 1.0, 0.0, 2.0, 0.0, 1.0, 0.0];
        assert_eq!(local_maxima(&signal), vec![1, 3, 5]);
    }

    #[test]
    fn edges_are_never_peaks() {
        let signal = [5.0, 1.0, 0.0, 1.0, 5.0];
        assert!(local_maxima(&signal).is_empty());
    }

    #[test]
    fn plateau_counts_once_at_its_middle() {
        let signal = [0.0, 2.0, 2.0, 2.0, 0.0];
        assert_eq!(local_maxima(&signal), vec![2]);

        let even = [0.0, 2.0, 2.0, 0.0];
        assert_eq!(local_maxima(&even), vec![1]);
    }

    #[test]
    fn taller_peak_wins_within_distance() {
        let signal = [0.0, 1.0, 0.0, 3.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        assert_eq!(select_by_distance(&signal, &[1, 3, 5, 9], 3), vec![3, 9]);
    }

    #[test]
    fn triangle_width_at_half_height() {
        // Rises and falls by 1 per sample from 0 to 4: half height at ±2
        let signal = [0.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0, 0.0];
        assert!((width_at_half_prominence(&signal, 4) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn narrow_spikes_are_dropped() {
        let mut signal = vec![0.0f32; 40];
        // One-sample spike
        signal[5] = 3.0;
        // Wide hump
        for (offset, value) in [1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0].iter().enumerate() {
            signal[20 + offset] = *value;
        }

        assert_eq!(find_peaks(&signal, 3.0, 1), vec![23]);
    }
}
