//! Operator-triggered measurement sessions
//!
//! A rising edge on the trigger input starts one session:
//!
//! ```text
//! indicator on → inflation → countdown → deflation → verdict → indicator off
//! ```
//!
//! Sensor faults end the session at the stage where they happened. Nothing is
//! retried; the operator presses the button again for a fresh session.
//!
//! [`SessionController::poll`] is non-blocking until an edge is seen
//! (`nb::Error::WouldBlock`), then blocks for the whole session. Call it from
//! the main loop.

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::{
    deflation::{DeflationRate, DeflationRateEstimator, RateEstimate},
    errors::{CuffResult, Error},
    events::{SessionEvent, SessionEvents},
    inflation::InflationMonitor,
    measurement::PressureSource,
    time::TimeSource,
};

/// Stage a session was in when it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stage {
    /// Pumping the cuff up
    Inflation,
    /// Countdown or bleeding the cuff down
    Deflation,
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionOutcome<E> {
    /// Both stages ran; the estimate carries the rate verdict
    Completed {
        /// Reading that ended inflation (mmHg)
        peak_mmhg: f32,
        /// Deflation estimate
        estimate: RateEstimate,
    },
    /// A stage failed
    Aborted {
        /// Where it failed
        stage: Stage,
        /// Why
        error: Error<E>,
    },
}

impl<E> SessionOutcome<E> {
    /// Rate verdict, if deflation completed
    pub fn rate(&self) -> Option<DeflationRate> {
        match self {
            SessionOutcome::Completed { estimate, .. } => Some(estimate.rate),
            SessionOutcome::Aborted { .. } => None,
        }
    }

    /// Completed with an acceptable deflation rate
    pub fn is_successful(&self) -> bool {
        self.rate().is_some_and(DeflationRate::is_acceptable)
    }

    /// Final status line for the operator
    pub fn message(&self) -> &'static str {
        match self {
            SessionOutcome::Completed { estimate, .. } => match estimate.rate {
                DeflationRate::Acceptable => "Successful Measurement",
                rate => rate.message(),
            },
            SessionOutcome::Aborted { error, .. } => error.diagnostic(),
        }
    }
}

/// Trigger, indicator and the two monitors
pub struct SessionController<B, L> {
    trigger: B,
    indicator: L,
    inflation: InflationMonitor,
    deflation: DeflationRateEstimator,
    trigger_was_high: bool,
    sessions: u32,
}

impl<B, L> SessionController<B, L>
where
    B: InputPin,
    L: OutputPin,
{
    /// Controller with default thresholds
    pub fn new(trigger: B, indicator: L) -> Self {
        Self::with_monitors(
            trigger,
            indicator,
            InflationMonitor::default(),
            DeflationRateEstimator::default(),
        )
    }

    /// Controller with explicit monitors
    pub fn with_monitors(
        trigger: B,
        indicator: L,
        inflation: InflationMonitor,
        deflation: DeflationRateEstimator,
    ) -> Self {
        Self {
            trigger,
            indicator,
            inflation,
            deflation,
            trigger_was_high: false,
            sessions: 0,
        }
    }

    /// Sessions started so far
    pub fn sessions(&self) -> u32 {
        self.sessions
    }

    /// The deflation estimator, for its last phase
    pub fn deflation(&self) -> &DeflationRateEstimator {
        &self.deflation
    }

    /// Run a session if the trigger went high since the last poll
    pub fn poll<S, T, D, O>(
        &mut self,
        source: &mut S,
        clock: &T,
        delay: &mut D,
        events: &mut O,
    ) -> nb::Result<SessionOutcome<S::Error>, Error<S::Error>>
    where
        S: PressureSource + ?Sized,
        T: TimeSource + ?Sized,
        D: DelayNs + ?Sized,
        O: SessionEvents + ?Sized,
    {
        let high = self
            .trigger
            .is_high()
            .map_err(|_| nb::Error::Other(Error::Gpio))?;
        let rising = high && !self.trigger_was_high;
        self.trigger_was_high = high;

        if !rising {
            return Err(nb::Error::WouldBlock);
        }

        self.run_session(source, clock, delay, events)
            .map_err(nb::Error::Other)
    }

    /// Run one session now, regardless of the trigger
    ///
    /// The outer `Err` is only for an indicator that cannot be switched on, in
    /// which case nothing is measured. Measurement problems are reported in
    /// [`SessionOutcome::Aborted`]. An indicator that cannot be switched off
    /// is logged and the outcome still returned.
    pub fn run_session<S, T, D, O>(
        &mut self,
        source: &mut S,
        clock: &T,
        delay: &mut D,
        events: &mut O,
    ) -> CuffResult<SessionOutcome<S::Error>, S::Error>
    where
        S: PressureSource + ?Sized,
        T: TimeSource + ?Sized,
        D: DelayNs + ?Sized,
        O: SessionEvents + ?Sized,
    {
        self.sessions += 1;
        log_info!("session {} started", self.sessions);

        self.indicator.set_high().map_err(|_| Error::Gpio)?;
        events.on_event(&SessionEvent::SessionStarted);
        self.deflation.reset();

        let outcome = self.measure(source, clock, delay, events);

        if outcome.is_successful() {
            log_info!("session {}: {}", self.sessions, outcome.message());
        } else {
            log_warn!("session {}: {}", self.sessions, outcome.message());
        }
        events.on_event(&SessionEvent::SessionFinished {
            successful: outcome.is_successful(),
            message: outcome.message(),
        });

        if self.indicator.set_low().is_err() {
            log_warn!("session {}: indicator stuck on", self.sessions);
        }
        Ok(outcome)
    }

    fn measure<S, T, D, O>(
        &mut self,
        source: &mut S,
        clock: &T,
        delay: &mut D,
        events: &mut O,
    ) -> SessionOutcome<S::Error>
    where
        S: PressureSource + ?Sized,
        T: TimeSource + ?Sized,
        D: DelayNs + ?Sized,
        O: SessionEvents + ?Sized,
    {
        let peak_mmhg = match self.inflation.run(source, delay, events) {
            Ok(peak) => peak,
            Err(error) => {
                return SessionOutcome::Aborted {
                    stage: Stage::Inflation,
                    error,
                }
            }
        };

        match self.deflation.run(source, clock, delay, events) {
            Ok(estimate) => SessionOutcome::Completed { peak_mmhg, estimate },
            Err(error) => SessionOutcome::Aborted {
                stage: Stage::Deflation,
                error,
            },
        }
    }

    /// Give the pins back
    pub fn release(self) -> (B, L) {
        (self.trigger, self.indicator)
    }
}
