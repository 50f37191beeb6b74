//! Cuff inflation monitoring
//!
//! The operator pumps the cuff by hand. The monitor polls every 100 ms and
//! returns on the first reading strictly above 150 mmHg.
//!
//! There is no timeout: an operator who never gets past the target keeps the
//! loop waiting. Faults end the wait at once and are never retried.

use embedded_hal::delay::DelayNs;
use fugit::MillisDurationU32;

use crate::{
    constants::{thresholds::INFLATION_TARGET_MMHG, timing::INFLATION_POLL_INTERVAL},
    errors::CuffResult,
    events::{SessionEvent, SessionEvents},
    measurement::PressureSource,
};

/// Inflation target and polling cadence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InflationConfig {
    target_mmhg: f32,
    poll_interval: MillisDurationU32,
}

impl Default for InflationConfig {
    fn default() -> Self {
        Self {
            target_mmhg: INFLATION_TARGET_MMHG,
            poll_interval: INFLATION_POLL_INTERVAL,
        }
    }
}

impl InflationConfig {
    /// Pressure that must be exceeded (mmHg)
    pub fn with_target(mut self, mmhg: f32) -> Self {
        self.target_mmhg = mmhg;
        self
    }

    /// Wait between readings
    pub fn with_poll_interval(mut self, interval: MillisDurationU32) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Target pressure (mmHg)
    pub fn target_mmhg(&self) -> f32 {
        self.target_mmhg
    }
}

/// Waits for the cuff to be pumped past the target
#[derive(Debug, Clone, Default)]
pub struct InflationMonitor {
    config: InflationConfig,
}

impl InflationMonitor {
    /// Monitor with explicit configuration
    pub fn new(config: InflationConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &InflationConfig {
        &self.config
    }

    /// Poll until a reading exceeds the target and return that reading
    pub fn run<S, D, O>(
        &self,
        source: &mut S,
        delay: &mut D,
        events: &mut O,
    ) -> CuffResult<f32, S::Error>
    where
        S: PressureSource + ?Sized,
        D: DelayNs + ?Sized,
        O: SessionEvents + ?Sized,
    {
        let target_mmhg = self.config.target_mmhg;
        log_info!("pump the cuff past {} mmHg", target_mmhg);
        events.on_event(&SessionEvent::InflationStarted { target_mmhg });

        loop {
            let pressure = source.pressure()?;

            if pressure > target_mmhg {
                log_info!("cuff inflated to {} mmHg", pressure);
                events.on_event(&SessionEvent::InflationComplete(pressure));
                return Ok(pressure);
            }

            log_trace!("inflating {} mmHg", pressure);
            events.on_event(&SessionEvent::InflationReading(pressure));
            delay.delay_ms(self.config.poll_interval.to_millis());
        }
    }
}
