//! Shared fixtures for the integration tests
//!
//! - `SimulatedCuff`: an MPR transducer on a fake I²C bus, driven by a
//!   hand-pumped cuff model and the shared `ManualClock`
//! - `Button` / `Indicator`: infallible GPIO doubles
//! - `Recorder`: an event sink that keeps everything

#![allow(dead_code)]

use std::collections::VecDeque;
use std::convert::Infallible;

use cuffwatch_core::{
    constants::sensor::{MPR_I2C_ADDRESS, START_CONVERSION_COMMAND, STATUS_POWER_BIT},
    time::{ManualClock, TimeSource, Timestamp},
    SessionEvent, SessionEvents, TransferFunction,
};
use embedded_hal::{
    digital::{ErrorType as DigitalErrorType, InputPin, OutputPin},
    i2c::{ErrorKind, ErrorType as I2cErrorType, I2c, Operation},
};

/// Pressure the operator pumps to before letting go of the bulb
pub const PUMP_TO_MMHG: f32 = 160.0;

/// Pressure added per bulb squeeze, one squeeze per inflation poll
pub const PUMP_STEP_MMHG: f32 = 10.0;

/// Time the operator waits with the valve closed, matching the countdown
pub const HOLD_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq)]
enum CuffState {
    Inflating(f32),
    Holding { released_at: Timestamp },
    Deflating { released_at: Timestamp },
}

/// MPR transducer attached to a cuff the operator inflates then bleeds down
///
/// Each conversion the cuff either gains `PUMP_STEP_MMHG` (until
/// `PUMP_TO_MMHG`), holds for `HOLD_MS`, or bleeds at a steady rate.
pub struct SimulatedCuff<'a> {
    clock: &'a ManualClock,
    transfer: TransferFunction,
    deflation_rate_mmhg_per_s: f32,
    state: CuffState,
    conversions: usize,
    pending: bool,
    status_override: Option<(usize, u8)>,
    bus_failure_at: Option<usize>,
}

impl<'a> SimulatedCuff<'a> {
    /// Cuff that bleeds down at `deflation_rate_mmhg_per_s`
    pub fn new(clock: &'a ManualClock, deflation_rate_mmhg_per_s: f32) -> Self {
        Self {
            clock,
            transfer: TransferFunction::default(),
            deflation_rate_mmhg_per_s,
            state: CuffState::Inflating(0.0),
            conversions: 0,
            pending: false,
            status_override: None,
            bus_failure_at: None,
        }
    }

    /// Report `status` instead of a healthy byte on conversion `index` (0-based)
    pub fn with_status_at(mut self, index: usize, status: u8) -> Self {
        self.status_override = Some((index, status));
        self
    }

    /// NAK the read of conversion `index` (0-based)
    pub fn with_bus_failure_at(mut self, index: usize) -> Self {
        self.bus_failure_at = Some(index);
        self
    }

    /// Completed command/read cycles
    pub fn conversions(&self) -> usize {
        self.conversions
    }

    /// True cuff pressure right now
    pub fn pressure_now(&mut self) -> f32 {
        let now = self.clock.now();
        match self.state {
            CuffState::Inflating(pressure) => {
                let pumped = (pressure + PUMP_STEP_MMHG).min(PUMP_TO_MMHG);
                self.state = if pumped >= PUMP_TO_MMHG {
                    CuffState::Holding {
                        released_at: now + HOLD_MS,
                    }
                } else {
                    CuffState::Inflating(pumped)
                };
                pumped
            }
            CuffState::Holding { released_at } if now < released_at => PUMP_TO_MMHG,
            CuffState::Holding { released_at } | CuffState::Deflating { released_at } => {
                self.state = CuffState::Deflating { released_at };
                let bled = self.deflation_rate_mmhg_per_s * (now - released_at) as f32 / 1000.0;
                PUMP_TO_MMHG - bled
            }
        }
    }

    fn response(&mut self) -> [u8; 4] {
        let index = self.conversions;
        self.conversions += 1;

        let pressure = self.pressure_now();
        let counts = self.transfer.to_counts(pressure).round() as u32;
        let status = match self.status_override {
            Some((at, status)) if at == index => status,
            _ => STATUS_POWER_BIT,
        };

        [status, (counts >> 16) as u8, (counts >> 8) as u8, counts as u8]
    }
}

impl I2cErrorType for SimulatedCuff<'_> {
    type Error = ErrorKind;
}

impl I2c for SimulatedCuff<'_> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        assert_eq!(address, MPR_I2C_ADDRESS, "transducer addressed at the wrong address");

        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    assert_eq!(*bytes, &START_CONVERSION_COMMAND[..]);
                    self.pending = true;
                }
                Operation::Read(buffer) => {
                    assert!(self.pending, "read without a conversion command");
                    self.pending = false;

                    if self.bus_failure_at == Some(self.conversions) {
                        self.conversions += 1;
                        return Err(ErrorKind::Other);
                    }
                    buffer.copy_from_slice(&self.response());
                }
            }
        }
        Ok(())
    }
}

/// Momentary push button replaying scripted levels, low once the script ends
#[derive(Debug, Default)]
pub struct Button {
    levels: VecDeque<bool>,
}

impl Button {
    /// Button that reports `levels`, one per poll
    pub fn scripted(levels: &[bool]) -> Self {
        Self {
            levels: levels.iter().copied().collect(),
        }
    }
}

impl DigitalErrorType for Button {
    type Error = Infallible;
}

impl InputPin for Button {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.levels.pop_front().unwrap_or(false))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Indicator LED that remembers how often it was switched
#[derive(Debug, Default)]
pub struct Indicator {
    pub lit: bool,
    pub switched_on: usize,
}

impl DigitalErrorType for Indicator {
    type Error = Infallible;
}

impl OutputPin for Indicator {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.lit = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.lit = true;
        self.switched_on += 1;
        Ok(())
    }
}

/// Keeps every event in order
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<SessionEvent>,
}

impl Recorder {
    /// Events matching `predicate`
    pub fn count(&self, predicate: impl Fn(&SessionEvent) -> bool) -> usize {
        self.events.iter().filter(|event| predicate(event)).count()
    }

    /// Countdown values in emission order
    pub fn countdown(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Countdown(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    /// Final verdict, if the session finished
    pub fn finished(&self) -> Option<(bool, &'static str)> {
        self.events.iter().rev().find_map(|event| match event {
            SessionEvent::SessionFinished { successful, message } => Some((*successful, *message)),
            _ => None,
        })
    }
}

impl SessionEvents for Recorder {
    fn on_event(&mut self, event: &SessionEvent) {
        self.events.push(*event);
    }
}
