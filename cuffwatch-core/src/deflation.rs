//! Cuff Deflation Rate Estimation
//!
//! ## Background
//!
//! Auscultatory and oscillometric readings are only trustworthy when the cuff
//! bleeds down at a steady rate. Too fast and the Korotkoff sounds (or the
//! oscillation envelope) are undersampled; too slow and the arm congests.
//! The operator opens the valve by hand, so the device's job is to tell them
//! afterwards whether the run was usable.
//!
//! ## State Machine
//!
//! ```text
//!           ┌──────────┐  5 × 1 s countdown   ┌──────────┐   reading < 30
//!  run() ──▶│ Priming  │─────────────────────▶│ Sampling │──────────────────▶ Finished(rate)
//!           └────┬─────┘  + baseline reading  └────┬─────┘
//!                │ fault                           │ fault
//!                └────────────────┬────────────────┘
//!                                 ▼
//!                              Faulted
//! ```
//!
//! ## Estimator
//!
//! Each sampling iteration, timed from just before the read to just after the
//! pacing sleep, contributes one absolute step and one interval:
//!
//! ```text
//! avg_interval_ms   = Σ interval / n
//! samples_per_sec   = 1000 / avg_interval_ms
//! avg_delta         = Σ |p_i − p_{i−1}| / n
//! slope (mmHg/s)    = avg_delta × samples_per_sec
//! ```
//!
//! This is deliberately *not* `(p_first − p_last) / elapsed`. Summing absolute
//! steps counts every wobble of the hand valve, and jittery intervals bias
//! the result. Both effects are part of the accepted behaviour.
//!
//! Only the running sums live in memory ([`RateAccumulator`]). Samples are
//! passed to the event sink and forgotten.
//!
//! ## Classification
//!
//! ```text
//!   slope ≤ 3.5        3.5 < slope < 4.5        slope ≥ 4.5
//!   TooSlow            Acceptable               TooFast
//! ```

use embedded_hal::delay::DelayNs;
use fugit::MillisDurationU32;

use crate::{
    constants::{
        thresholds::{DEFLATION_STOP_MMHG, DEFLATION_TOO_FAST_MMHG_PER_S, DEFLATION_TOO_SLOW_MMHG_PER_S},
        timing::{COUNTDOWN_STEP, COUNTDOWN_STEPS, DEFLATION_PACING, MS_PER_SECOND},
    },
    errors::{CuffResult, Error},
    events::{SessionEvent, SessionEvents},
    measurement::PressureSource,
    time::{TimeSource, Timestamp},
};

/// Verdict on a completed deflation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeflationRate {
    /// At or above the upper bound
    TooFast,
    /// At or below the lower bound
    TooSlow,
    /// Strictly inside the band
    Acceptable,
}

impl DeflationRate {
    /// True for `Acceptable`
    pub fn is_acceptable(self) -> bool {
        self == DeflationRate::Acceptable
    }

    /// Operator-facing text
    pub fn message(self) -> &'static str {
        match self {
            DeflationRate::TooFast => "Deflation Rate Too Fast",
            DeflationRate::TooSlow => "Deflation Rate Too Slow",
            DeflationRate::Acceptable => "Deflation Rate Acceptable",
        }
    }
}

/// Where the estimator is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Never run
    Idle,
    /// Countdown and baseline reading
    Priming,
    /// Collecting samples
    Sampling,
    /// Run completed with a verdict
    Finished(DeflationRate),
    /// Run aborted by an error
    Faulted,
}

/// One accepted deflation reading
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeflationSample {
    /// Cuff pressure (mmHg)
    pub pressure_mmhg: f32,
    /// Clock value just before the read (ms)
    pub timestamp: Timestamp,
}

/// Result of one deflation run
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RateEstimate {
    /// Estimated deflation slope (mmHg/s)
    pub slope_mmhg_per_s: f32,
    /// Mean time per sampling iteration (ms)
    pub avg_interval_ms: f32,
    /// Sampling cadence (Hz)
    pub samples_per_second: f32,
    /// Mean absolute step between consecutive readings (mmHg)
    pub avg_delta_mmhg: f32,
    /// Accepted samples
    pub sample_count: u32,
    /// Total time spent in sampling iterations (ms)
    pub total_elapsed_ms: u64,
    /// Verdict
    pub rate: DeflationRate,
}

/// Estimator thresholds and timing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeflationConfig {
    stop_mmhg: f32,
    too_fast_mmhg_per_s: f32,
    too_slow_mmhg_per_s: f32,
    pacing: MillisDurationU32,
    countdown_steps: u8,
    countdown_step: MillisDurationU32,
}

impl Default for DeflationConfig {
    fn default() -> Self {
        Self {
            stop_mmhg: DEFLATION_STOP_MMHG,
            too_fast_mmhg_per_s: DEFLATION_TOO_FAST_MMHG_PER_S,
            too_slow_mmhg_per_s: DEFLATION_TOO_SLOW_MMHG_PER_S,
            pacing: DEFLATION_PACING,
            countdown_steps: COUNTDOWN_STEPS,
            countdown_step: COUNTDOWN_STEP,
        }
    }
}

impl DeflationConfig {
    /// Stop sampling below this pressure
    pub fn with_stop_pressure(mut self, mmhg: f32) -> Self {
        self.stop_mmhg = mmhg;
        self
    }

    /// Acceptable band, exclusive at both ends
    pub fn with_rate_band(mut self, too_slow_mmhg_per_s: f32, too_fast_mmhg_per_s: f32) -> Self {
        self.too_slow_mmhg_per_s = too_slow_mmhg_per_s;
        self.too_fast_mmhg_per_s = too_fast_mmhg_per_s;
        self
    }

    /// Sleep between samples
    pub fn with_pacing(mut self, pacing: MillisDurationU32) -> Self {
        self.pacing = pacing;
        self
    }

    /// Countdown length before sampling
    pub fn with_countdown(mut self, steps: u8, step: MillisDurationU32) -> Self {
        self.countdown_steps = steps;
        self.countdown_step = step;
        self
    }

    /// Stop pressure (mmHg)
    pub fn stop_mmhg(&self) -> f32 {
        self.stop_mmhg
    }

    /// Classify a slope against the band
    pub fn classify(&self, slope_mmhg_per_s: f32) -> DeflationRate {
        if slope_mmhg_per_s >= self.too_fast_mmhg_per_s {
            DeflationRate::TooFast
        } else if slope_mmhg_per_s <= self.too_slow_mmhg_per_s {
            DeflationRate::TooSlow
        } else {
            DeflationRate::Acceptable
        }
    }
}

/// Running sums for one deflation run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateAccumulator {
    previous: f32,
    total_abs_delta: f64,
    sample_count: u32,
    total_elapsed_ms: u64,
}

impl RateAccumulator {
    /// Start from the baseline reading
    pub fn new(baseline_mmhg: f32) -> Self {
        Self {
            previous: baseline_mmhg,
            total_abs_delta: 0.0,
            sample_count: 0,
            total_elapsed_ms: 0,
        }
    }

    /// Add one sample and the duration of the iteration that produced it
    pub fn record(&mut self, pressure_mmhg: f32, elapsed_ms: u64) {
        self.total_abs_delta += libm::fabsf(pressure_mmhg - self.previous) as f64;
        self.previous = pressure_mmhg;
        self.sample_count += 1;
        self.total_elapsed_ms += elapsed_ms;
    }

    /// Samples recorded so far
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Last recorded pressure (the baseline before any sample)
    pub fn previous(&self) -> f32 {
        self.previous
    }

    /// Compute and classify the slope
    pub fn finish<E>(&self, config: &DeflationConfig) -> CuffResult<RateEstimate, E> {
        if self.sample_count == 0 {
            return Err(Error::NoSamples);
        }
        if self.total_elapsed_ms == 0 {
            return Err(Error::ClockStalled);
        }

        let count = self.sample_count as f32;
        let avg_interval_ms = self.total_elapsed_ms as f32 / count;
        let samples_per_second = MS_PER_SECOND / avg_interval_ms;
        let avg_delta_mmhg = (self.total_abs_delta / self.sample_count as f64) as f32;
        let slope_mmhg_per_s = avg_delta_mmhg * samples_per_second;

        Ok(RateEstimate {
            slope_mmhg_per_s,
            avg_interval_ms,
            samples_per_second,
            avg_delta_mmhg,
            sample_count: self.sample_count,
            total_elapsed_ms: self.total_elapsed_ms,
            rate: config.classify(slope_mmhg_per_s),
        })
    }
}

/// Times the operator's deflation and classifies its rate
#[derive(Debug, Clone)]
pub struct DeflationRateEstimator {
    config: DeflationConfig,
    phase: Phase,
}

impl Default for DeflationRateEstimator {
    fn default() -> Self {
        Self::new(DeflationConfig::default())
    }
}

impl DeflationRateEstimator {
    /// Estimator with explicit configuration
    pub fn new(config: DeflationConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &DeflationConfig {
        &self.config
    }

    /// Current or last phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Forget the last run's phase
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Prime, sample until the cuff is empty, then estimate
    ///
    /// Blocks for the countdown plus the whole deflation. Any error moves the
    /// estimator to [`Phase::Faulted`] and is returned unchanged.
    pub fn run<S, T, D, O>(
        &mut self,
        source: &mut S,
        clock: &T,
        delay: &mut D,
        events: &mut O,
    ) -> CuffResult<RateEstimate, S::Error>
    where
        S: PressureSource + ?Sized,
        T: TimeSource + ?Sized,
        D: DelayNs + ?Sized,
        O: SessionEvents + ?Sized,
    {
        let result = self
            .prime(source, delay, events)
            .and_then(|accumulator| self.sample(accumulator, source, clock, delay, events));

        match result {
            Ok(estimate) => {
                self.phase = Phase::Finished(estimate.rate);
                log_info!(
                    "deflation {} mmHg/s over {} samples, {} ms per sample",
                    estimate.slope_mmhg_per_s,
                    estimate.sample_count,
                    estimate.avg_interval_ms
                );
                events.on_event(&SessionEvent::DeflationComplete(estimate));
                Ok(estimate)
            }
            Err(error) => {
                self.phase = Phase::Faulted;
                log_warn!("deflation aborted: {}", error);
                Err(error)
            }
        }
    }

    fn prime<S, D, O>(
        &mut self,
        source: &mut S,
        delay: &mut D,
        events: &mut O,
    ) -> CuffResult<RateAccumulator, S::Error>
    where
        S: PressureSource + ?Sized,
        D: DelayNs + ?Sized,
        O: SessionEvents + ?Sized,
    {
        self.phase = Phase::Priming;

        for remaining in (1..=self.config.countdown_steps).rev() {
            log_debug!("deflation starts in {} s", remaining);
            events.on_event(&SessionEvent::Countdown(remaining));
            delay.delay_ms(self.config.countdown_step.to_millis());
        }
        events.on_event(&SessionEvent::DeflationStarted);

        let baseline = source.pressure()?;
        log_debug!("deflation baseline {} mmHg", baseline);

        Ok(RateAccumulator::new(baseline))
    }

    fn sample<S, T, D, O>(
        &mut self,
        mut accumulator: RateAccumulator,
        source: &mut S,
        clock: &T,
        delay: &mut D,
        events: &mut O,
    ) -> CuffResult<RateEstimate, S::Error>
    where
        S: PressureSource + ?Sized,
        T: TimeSource + ?Sized,
        D: DelayNs + ?Sized,
        O: SessionEvents + ?Sized,
    {
        self.phase = Phase::Sampling;

        loop {
            let started = clock.now();
            let pressure = source.pressure()?;

            if pressure < self.config.stop_mmhg {
                break;
            }

            log_trace!("deflation sample {} mmHg", pressure);
            events.on_event(&SessionEvent::DeflationSample(DeflationSample {
                pressure_mmhg: pressure,
                timestamp: started,
            }));

            delay.delay_ms(self.config.pacing.to_millis());
            accumulator.record(pressure, clock.elapsed_since(started));
        }

        accumulator.finish(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::SensorFault, time::ManualClock};

    /// Replays readings, each one taking `period_ms` of clock time
    struct Feed<'a> {
        readings: &'a [CuffResult<f32, ()>],
        next: usize,
        clock: &'a ManualClock,
        period_ms: u64,
    }

    impl<'a> Feed<'a> {
        fn new(readings: &'a [CuffResult<f32, ()>], clock: &'a ManualClock, period_ms: u64) -> Self {
            Self { readings, next: 0, clock, period_ms }
        }
    }

    impl PressureSource for Feed<'_> {
        type Error = ();

        fn pressure(&mut self) -> CuffResult<f32, ()> {
            let reading = self.readings[self.next];
            self.next += 1;
            self.clock.advance(self.period_ms);
            reading
        }
    }

    fn run(readings: &[CuffResult<f32, ()>]) -> (DeflationRateEstimator, CuffResult<RateEstimate, ()>, usize) {
        let clock = ManualClock::new(0);
        let mut delay = &clock;
        let mut feed = Feed::new(readings, &clock, 1_000);
        let mut estimator = DeflationRateEstimator::default();

        let result = estimator.run(&mut feed, &clock, &mut delay, &mut ());
        let consumed = feed.next;
        (estimator, result, consumed)
    }

    #[test]
    fn accumulator_uses_mean_step_times_cadence() {
        let mut acc = RateAccumulator::new(100.0);
        acc.record(96.0, 1000);
        acc.record(92.0, 1000);

        let estimate = acc.finish::<()>(&DeflationConfig::default()).unwrap();
        assert_eq!(estimate.sample_count, 2);
        assert!((estimate.avg_interval_ms - 1000.0).abs() < 1e-3);
        assert!((estimate.samples_per_second - 1.0).abs() < 1e-6);
        assert!((estimate.slope_mmhg_per_s - 4.0).abs() < 1e-6);
        assert_eq!(estimate.rate, DeflationRate::Acceptable);
    }

    #[test]
    fn accumulator_counts_wobble_not_net_drop() {
        // Net drop 0 over 2 s, but 8 mmHg of movement
        let mut acc = RateAccumulator::new(100.0);
        acc.record(96.0, 1000);
        acc.record(100.0, 1000);

        let estimate = acc.finish::<()>(&DeflationConfig::default()).unwrap();
        assert!((estimate.slope_mmhg_per_s - 4.0).abs() < 1e-6);
    }

    #[test]
    fn jittered_intervals_use_the_mean_interval() {
        // Steps of 2 and 6 mmHg over 500 and 1500 ms: mean step 4, mean interval 1000 ms
        let mut acc = RateAccumulator::new(100.0);
        acc.record(98.0, 500);
        acc.record(92.0, 1500);

        let estimate = acc.finish::<()>(&DeflationConfig::default()).unwrap();
        assert!((estimate.slope_mmhg_per_s - 4.0).abs() < 1e-6);
    }

    #[test]
    fn empty_accumulator_is_a_precondition_error() {
        let acc = RateAccumulator::new(25.0);
        assert_eq!(acc.finish::<()>(&DeflationConfig::default()), Err(Error::NoSamples));
    }

    #[test]
    fn zero_elapsed_time_is_an_error() {
        let mut acc = RateAccumulator::new(100.0);
        acc.record(96.0, 0);
        assert_eq!(acc.finish::<()>(&DeflationConfig::default()), Err(Error::ClockStalled));
    }

    #[test]
    fn band_edges_are_out_of_band() {
        let config = DeflationConfig::default();

        assert_eq!(config.classify(4.5), DeflationRate::TooFast);
        assert_eq!(config.classify(3.5), DeflationRate::TooSlow);
        assert_eq!(config.classify(4.49), DeflationRate::Acceptable);
        assert_eq!(config.classify(3.51), DeflationRate::Acceptable);
        assert_eq!(config.classify(12.0), DeflationRate::TooFast);
        assert_eq!(config.classify(0.0), DeflationRate::TooSlow);
    }

    #[test]
    fn steady_four_per_second_is_acceptable() {
        let readings = [
            Ok(100.0), Ok(96.0), Ok(92.0), Ok(88.0), Ok(84.0), Ok(80.0),
            Ok(76.0), Ok(72.0), Ok(68.0), Ok(64.0), Ok(60.0), Ok(56.0),
            Ok(52.0), Ok(48.0), Ok(44.0), Ok(40.0), Ok(36.0), Ok(32.0), Ok(28.0),
        ];

        let (estimator, result, consumed) = run(&readings);
        let estimate = result.unwrap();

        assert_eq!(consumed, readings.len());
        assert_eq!(estimate.sample_count, 17);
        // 1000 ms per read plus the 5 ms pacing sleep
        assert_eq!(estimate.total_elapsed_ms, 17 * 1005);
        assert!((estimate.slope_mmhg_per_s - 4.0 * 1000.0 / 1005.0).abs() < 1e-3);
        assert_eq!(estimate.rate, DeflationRate::Acceptable);
        assert_eq!(estimator.phase(), Phase::Finished(DeflationRate::Acceptable));
    }

    #[test]
    fn exactly_at_stop_pressure_keeps_sampling() {
        let readings = [Ok(40.0), Ok(35.0), Ok(30.0), Ok(29.9)];

        let (_, result, consumed) = run(&readings);

        assert_eq!(consumed, 4);
        assert_eq!(result.unwrap().sample_count, 2);
    }

    #[test]
    fn starting_below_stop_pressure_is_no_samples() {
        let readings = [Ok(40.0), Ok(20.0)];

        let (estimator, result, _) = run(&readings);

        assert_eq!(result, Err(Error::NoSamples));
        assert_eq!(estimator.phase(), Phase::Faulted);
    }

    #[test]
    fn fault_during_priming() {
        let readings = [Err(Error::Sensor(SensorFault::Busy))];

        let (estimator, result, consumed) = run(&readings);

        assert_eq!(result, Err(Error::Sensor(SensorFault::Busy)));
        assert_eq!(consumed, 1);
        assert_eq!(estimator.phase(), Phase::Faulted);
    }

    #[test]
    fn fault_during_sampling_stops_immediately() {
        let readings = [
            Ok(100.0),
            Ok(96.0),
            Err(Error::Sensor(SensorFault::MathSaturation)),
            Ok(92.0),
        ];

        let (estimator, result, consumed) = run(&readings);

        assert_eq!(result, Err(Error::Sensor(SensorFault::MathSaturation)));
        assert_eq!(consumed, 3);
        assert_eq!(estimator.phase(), Phase::Faulted);
    }

    #[test]
    fn countdown_is_five_seconds_before_the_baseline() {
        let clock = ManualClock::new(0);
        let mut delay = &clock;
        let readings = [Ok(100.0), Ok(96.0), Ok(20.0)];
        let mut feed = Feed::new(&readings, &clock, 0);
        let mut countdown = heapless::Vec::<u8, 8>::new();

        struct Countdown<'a>(&'a mut heapless::Vec<u8, 8>, &'a ManualClock, u64);
        impl SessionEvents for Countdown<'_> {
            fn on_event(&mut self, event: &SessionEvent) {
                match event {
                    SessionEvent::Countdown(n) => self.0.push(*n).unwrap(),
                    SessionEvent::DeflationStarted => self.2 = self.1.now(),
                    _ => {}
                }
            }
        }

        let mut sink = Countdown(&mut countdown, &clock, 0);
        let result = DeflationRateEstimator::default().run(&mut feed, &clock, &mut delay, &mut sink);
        let started_at = sink.2;

        // Zero-length reads: only the pacing sleep advances the sampling clock
        assert_eq!(result.unwrap().total_elapsed_ms, 5);
        assert_eq!(started_at, 5_000);
        assert_eq!(countdown.as_slice(), &[5, 4, 3, 2, 1]);
    }
}
