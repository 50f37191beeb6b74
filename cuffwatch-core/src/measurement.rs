//! Calibrated pressure readings
//!
//! [`MeasurementService`] composes the sensor link and the transfer function
//! into the single call the monitors need. Monitors only see the
//! [`PressureSource`] trait, so they run unchanged against recorded or
//! synthetic feeds.

use embedded_hal::{delay::DelayNs, i2c::I2c};

use crate::{
    convert::TransferFunction,
    errors::{CuffResult, Error},
    sensor::SensorLink,
};

/// Anything that yields cuff pressure in mmHg
pub trait PressureSource {
    /// Transport error carried in [`Error::Bus`]
    type Error;

    /// Take one reading
    fn pressure(&mut self) -> CuffResult<f32, Self::Error>;
}

impl<S: PressureSource + ?Sized> PressureSource for &mut S {
    type Error = S::Error;

    fn pressure(&mut self) -> CuffResult<f32, Self::Error> {
        (**self).pressure()
    }
}

/// Sensor link plus calibration
pub struct MeasurementService<I2C, D> {
    link: SensorLink<I2C, D>,
    transfer: TransferFunction,
}

impl<I2C, D> MeasurementService<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Service with the 0300YG transfer function
    pub fn new(link: SensorLink<I2C, D>) -> Self {
        Self::with_transfer_function(link, TransferFunction::default())
    }

    /// Service with an explicit transfer function
    pub fn with_transfer_function(link: SensorLink<I2C, D>, transfer: TransferFunction) -> Self {
        Self { link, transfer }
    }

    /// Calibration in use
    pub fn transfer_function(&self) -> &TransferFunction {
        &self.transfer
    }

    /// Current pressure in mmHg, or the fault that prevented reading it
    pub fn read_pressure(&mut self) -> CuffResult<f32, I2C::Error> {
        match self.link.read_raw() {
            Ok(raw) => Ok(self.transfer.to_mmhg(raw)),
            Err(Error::Sensor(fault)) => {
                log_warn!("{}", fault);
                Err(Error::Sensor(fault))
            }
            Err(error) => {
                log_warn!("pressure sensor did not answer on the bus");
                Err(error)
            }
        }
    }

    /// Tear down into the link
    pub fn release(self) -> SensorLink<I2C, D> {
        self.link
    }
}

impl<I2C, D> PressureSource for MeasurementService<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = I2C::Error;

    fn pressure(&mut self) -> CuffResult<f32, Self::Error> {
        self.read_pressure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::sensor::MPR_I2C_ADDRESS, errors::SensorFault};
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
    };

    fn service(responses: &[[u8; 4]]) -> MeasurementService<I2cMock, NoopDelay> {
        let expectations: std::vec::Vec<I2cTransaction> = responses
            .iter()
            .flat_map(|response| {
                [
                    I2cTransaction::write(MPR_I2C_ADDRESS, std::vec![0xAA, 0x00, 0x00]),
                    I2cTransaction::read(MPR_I2C_ADDRESS, response.to_vec()),
                ]
            })
            .collect();

        MeasurementService::new(SensorLink::new(I2cMock::new(&expectations), NoopDelay::new()))
    }

    fn finish(service: MeasurementService<I2cMock, NoopDelay>) {
        let (mut i2c, _) = service.release().release();
        i2c.done();
    }

    #[test]
    fn converts_to_mmhg() {
        // 3774874 = 0x39999A, the 300 mmHg calibration point
        let mut cuff = service(&[[0x40, 0x39, 0x99, 0x9A]]);

        let pressure = cuff.pressure().unwrap();
        assert!((pressure - 300.0).abs() < 1e-3);

        finish(cuff);
    }

    #[test]
    fn fault_is_a_tagged_error_not_a_number() {
        let mut cuff = service(&[[0x04, 0x00, 0x00, 0x00], [0x01, 0x00, 0x00, 0x00]]);

        assert_eq!(cuff.pressure(), Err(Error::Sensor(SensorFault::MemoryError)));
        assert_eq!(cuff.pressure(), Err(Error::Sensor(SensorFault::MathSaturation)));

        finish(cuff);
    }

    #[test]
    fn low_readings_are_not_faults() {
        // Below out_min: a legitimate negative gauge pressure
        let mut cuff = service(&[[0x40, 0x00, 0x00, 0x00]]);

        let pressure = cuff.pressure().unwrap();
        assert!(pressure < 0.0);

        finish(cuff);
    }
}
