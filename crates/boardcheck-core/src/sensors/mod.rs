//! Sensor capability traits and the DHT22 driver

pub mod dht22;

pub use dht22::Dht22;

use crate::app_state::PeripheralError;

/// An analog input scaled to the full `u16` range.
pub trait AnalogInput {
    fn init(&mut self) -> Result<(), PeripheralError> {
        Ok(())
    }

    /// Raw reading, 0 to 65535 full-scale
    fn read_raw(&mut self) -> Result<u16, PeripheralError>;
}

/// A combined temperature and humidity sensor.
///
/// [`ClimateSensor::trigger_measurement`] performs one complete measurement;
/// the getters return the values of the last successful one.
pub trait ClimateSensor {
    fn init(&mut self) -> Result<(), PeripheralError> {
        Ok(())
    }

    fn trigger_measurement(&mut self) -> Result<(), PeripheralError>;

    /// Degrees Celsius
    fn last_temperature(&self) -> f32;

    /// Relative humidity in percent
    fn last_humidity(&self) -> f32;
}
