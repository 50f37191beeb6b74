//! Operator-facing session events
//!
//! ## Overview
//!
//! The monitors never print. Everything the operator should see (readings
//! while pumping, the priming countdown, each deflation sample, the final
//! verdict) is handed to a [`SessionEvents`] sink as it happens. A serial
//! console, a display driver and a test recorder are all just sinks.
//!
//! ```text
//! SessionStarted
//! InflationStarted → InflationReading* → InflationComplete
//! Countdown(5..=1) → DeflationStarted → DeflationSample* → DeflationComplete
//! SessionFinished
//! ```
//!
//! Events are `Copy` and borrowed by the sink; nothing is queued.
//!
//! ## Keeping a Trace
//!
//! The estimator itself keeps no sample history. When the deflation curve is
//! wanted afterwards (oscillometric analysis), attach a [`DeflationTrace`],
//! alone or next to another sink as a tuple:
//!
//! ```rust
//! use cuffwatch_core::{DeflationTrace, SessionEvent, SessionEvents};
//!
//! struct Console;
//! impl SessionEvents for Console {
//!     fn on_event(&mut self, event: &SessionEvent) {
//!         let _ = event;
//!     }
//! }
//!
//! let mut sinks = (Console, DeflationTrace::<4096>::new());
//! sinks.on_event(&SessionEvent::DeflationStarted);
//! assert!(sinks.1.samples().is_empty());
//! ```

use heapless::Vec;

use crate::deflation::{DeflationSample, RateEstimate};

/// Something the operator should be told about
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    /// Trigger accepted, indicator on
    SessionStarted,
    /// Pump the cuff up past the target
    InflationStarted {
        /// Pressure to exceed (mmHg)
        target_mmhg: f32,
    },
    /// Pressure while pumping (mmHg)
    InflationReading(f32),
    /// Target exceeded at this pressure (mmHg)
    InflationComplete(f32),
    /// Seconds left before deflation sampling starts
    Countdown(u8),
    /// Open the valve now
    DeflationStarted,
    /// One accepted deflation sample
    DeflationSample(DeflationSample),
    /// Deflation slope estimated
    DeflationComplete(RateEstimate),
    /// Session over, indicator off
    SessionFinished {
        /// Measurement usable and deflation in band
        successful: bool,
        /// Operator-facing verdict
        message: &'static str,
    },
}

/// Receiver of session events
pub trait SessionEvents {
    /// Handle one event
    fn on_event(&mut self, event: &SessionEvent);
}

/// Discards everything
impl SessionEvents for () {
    fn on_event(&mut self, _event: &SessionEvent) {}
}

impl<T: SessionEvents + ?Sized> SessionEvents for &mut T {
    fn on_event(&mut self, event: &SessionEvent) {
        (**self).on_event(event)
    }
}

/// Fan out to two sinks, first one first
impl<A: SessionEvents, B: SessionEvents> SessionEvents for (A, B) {
    fn on_event(&mut self, event: &SessionEvent) {
        self.0.on_event(event);
        self.1.on_event(event);
    }
}

/// Fixed-capacity recording of one deflation run
///
/// Cleared on `DeflationStarted`. Samples beyond `N` are counted but dropped.
#[derive(Debug, Clone, Default)]
pub struct DeflationTrace<const N: usize> {
    samples: Vec<DeflationSample, N>,
    dropped: usize,
}

impl<const N: usize> DeflationTrace<N> {
    /// Empty trace
    pub const fn new() -> Self {
        Self {
            samples: Vec::new(),
            dropped: 0,
        }
    }

    /// Recorded samples, oldest first
    pub fn samples(&self) -> &[DeflationSample] {
        &self.samples
    }

    /// Recorded pressures, oldest first
    pub fn pressures(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().map(|sample| sample.pressure_mmhg)
    }

    /// Samples that did not fit
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// True if the run outgrew the capacity
    pub fn is_truncated(&self) -> bool {
        self.dropped > 0
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.samples.clear();
        self.dropped = 0;
    }
}

impl<const N: usize> SessionEvents for DeflationTrace<N> {
    fn on_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::DeflationStarted => self.clear(),
            SessionEvent::DeflationSample(sample) => {
                if self.samples.push(*sample).is_err() {
                    self.dropped += 1;
                }
            }
            _ => {}
        }
    }
}
