//! Simulated Measurement Session
//!
//! Runs one full session (inflation, countdown, deflation, verdict) against a
//! modelled cuff instead of a real transducer. Time is simulated, so a
//! 40 second deflation finishes instantly.
//!
//! ## What You'll Learn
//!
//! - Implementing `PressureSource` for a custom feed
//! - Sharing one `ManualClock` between the feed, the delays and the estimator
//! - Writing an operator console as a `SessionEvents` sink
//! - Keeping the deflation curve with `DeflationTrace`
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example simulated_session -- 5.2
//! ```
//!
//! The optional argument is the bleed rate in mmHg/s (default 4.0).

use std::convert::Infallible;

use cuffwatch_core::{
    time::{ManualClock, TimeSource},
    CuffResult, DeflationTrace, PressureSource, SessionController, SessionEvent, SessionEvents,
    SessionOutcome,
};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// Hand-pumped cuff: +12 mmHg per squeeze up to 170, a 5 s pause, then a steady bleed
struct ModelCuff<'a> {
    clock: &'a ManualClock,
    bleed_mmhg_per_s: f32,
    pressure: f32,
    released_at: Option<u64>,
}

impl PressureSource for ModelCuff<'_> {
    type Error = Infallible;

    fn pressure(&mut self) -> CuffResult<f32, Infallible> {
        // One conversion takes 5 ms
        self.clock.advance(5);
        let now = self.clock.now();

        match self.released_at {
            None => {
                self.pressure = (self.pressure + 12.0).min(170.0);
                if self.pressure >= 170.0 {
                    self.released_at = Some(now + 5_000);
                }
            }
            Some(released_at) if now > released_at => {
                let bled = self.bleed_mmhg_per_s * (now - released_at) as f32 / 1000.0;
                self.pressure = 170.0 - bled;
            }
            Some(_) => {}
        }
        Ok(self.pressure)
    }
}

/// Prints what an LCD would show
struct Console;

impl SessionEvents for Console {
    fn on_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::SessionStarted => println!("== session started =="),
            SessionEvent::InflationStarted { target_mmhg } => {
                println!("Inflate cuff to {:.0} mmHg", target_mmhg)
            }
            SessionEvent::InflationReading(p) => println!("  {:6.1} mmHg", p),
            SessionEvent::InflationComplete(p) => println!("Cuff inflated to {:.1} mmHg", p),
            SessionEvent::Countdown(n) => println!("Start deflating in {}...", n),
            SessionEvent::DeflationStarted => println!("Deflate now"),
            SessionEvent::DeflationSample(_) => {}
            SessionEvent::DeflationComplete(estimate) => {
                println!("Deflation rate: {:.2} mmHg/s", estimate.slope_mmhg_per_s);
                println!("  samples:        {}", estimate.sample_count);
                println!("  avg interval:   {:.2} ms", estimate.avg_interval_ms);
                println!("  samples/s:      {:.1}", estimate.samples_per_second);
            }
            SessionEvent::SessionFinished { message, .. } => println!("== {} ==", message),
        }
    }
}

/// Button that reads high once
struct PressedOnce(bool);

impl ErrorType for PressedOnce {
    type Error = Infallible;
}

impl InputPin for PressedOnce {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(core::mem::replace(&mut self.0, false))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}

/// Indicator that prints its state
struct Led;

impl ErrorType for Led {
    type Error = Infallible;
}

impl OutputPin for Led {
    fn set_low(&mut self) -> Result<(), Infallible> {
        println!("[led off]");
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        println!("[led on]");
        Ok(())
    }
}

fn main() {
    let bleed_mmhg_per_s = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(4.0);

    println!("CuffWatch simulated session ({} mmHg/s bleed)", bleed_mmhg_per_s);
    println!("================================================\n");

    let clock = ManualClock::new(0);
    let mut delay = &clock;
    let mut cuff = ModelCuff {
        clock: &clock,
        bleed_mmhg_per_s,
        pressure: 0.0,
        released_at: None,
    };
    let mut sinks = (Console, DeflationTrace::<16_384>::new());
    let mut controller = SessionController::new(PressedOnce(true), Led);

    let outcome = loop {
        match controller.poll(&mut cuff, &clock, &mut delay, &mut sinks) {
            Ok(outcome) => break outcome,
            Err(nb::Error::WouldBlock) => continue,
            Err(nb::Error::Other(error)) => {
                eprintln!("session failed: {}", error);
                return;
            }
        }
    };

    let trace = &sinks.1;
    println!("\nSimulated time: {:.1} s", clock.now() as f32 / 1000.0);
    println!("Trace: {} samples{}", trace.samples().len(), if trace.is_truncated() { " (truncated)" } else { "" });

    match outcome {
        SessionOutcome::Completed { peak_mmhg, estimate } => {
            println!("Peak {:.1} mmHg, verdict {:?}", peak_mmhg, estimate.rate);
        }
        SessionOutcome::Aborted { stage, error } => {
            println!("Aborted during {:?}: {}", stage, error);
        }
    }
}
