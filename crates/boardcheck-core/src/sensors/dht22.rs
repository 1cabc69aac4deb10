//! DHT22 (AM2302) single-wire temperature and humidity sensor
//!
//! The host pulls the line low to request a reading, then releases it. The
//! sensor answers with an 80 us low / 80 us high preamble followed by 40 data
//! bits. Every bit starts with a ~50 us low phase; the length of the following
//! high phase (~27 us or ~70 us) encodes a zero or a one.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, InputPin, OutputPin};
use log::{debug, error};

use super::ClimateSensor;
use crate::app_state::PeripheralError;

/// Host start pulse length
const START_LOW_US: u32 = 2_000;
/// Give up waiting for a level change after this many microseconds
const LEVEL_TIMEOUT_US: u32 = 200;

/// One decoded measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dht22Reading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// Decode the five raw bytes sent by the sensor and verify the checksum.
pub fn decode(bytes: [u8; 5]) -> Result<Dht22Reading, PeripheralError> {
    let sum = bytes[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != bytes[4] {
        error!("DHT22 checksum mismatch: {:02X} != {:02X}", sum, bytes[4]);
        return Err(PeripheralError::VerificationFailed {
            peripheral: "DHT22",
            details: "checksum mismatch",
        });
    }

    let humidity = u16::from_be_bytes([bytes[0], bytes[1]]);
    let magnitude = u16::from_be_bytes([bytes[2] & 0x7F, bytes[3]]);
    let mut temperature = magnitude as f32 / 10.0;
    if bytes[2] & 0x80 != 0 {
        temperature = -temperature;
    }

    Ok(Dht22Reading {
        temperature_c: temperature,
        humidity_pct: humidity as f32 / 10.0,
    })
}

pub struct Dht22<P, D> {
    pin: P,
    delay: D,
    last: Option<Dht22Reading>,
}

impl<P, D> Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// `pin` must be configured open-drain with a pull-up.
    pub fn new(pin: P, delay: D) -> Self {
        Self {
            pin,
            delay,
            last: None,
        }
    }

    fn pin_error(operation: &'static str, e: P::Error) -> PeripheralError {
        error!("DHT22 pin {} failed: {:?}", operation, e.kind());
        PeripheralError::OperationFailed {
            peripheral: "DHT22",
            operation,
            details: "GPIO error",
        }
    }

    /// Wait while the line stays at `level`. Returns the time spent, in
    /// microseconds.
    fn wait_while(&mut self, level: bool) -> Result<u32, PeripheralError> {
        let mut elapsed = 0;
        loop {
            let high = self.pin.is_high().map_err(|e| Self::pin_error("read", e))?;
            if high != level {
                return Ok(elapsed);
            }
            if elapsed >= LEVEL_TIMEOUT_US {
                return Err(PeripheralError::OperationFailed {
                    peripheral: "DHT22",
                    operation: "read",
                    details: "no response",
                });
            }
            self.delay.delay_us(1);
            elapsed += 1;
        }
    }

    fn read_frame(&mut self) -> Result<[u8; 5], PeripheralError> {
        self.pin
            .set_low()
            .map_err(|e| Self::pin_error("start", e))?;
        self.delay.delay_us(START_LOW_US);
        self.pin
            .set_high()
            .map_err(|e| Self::pin_error("release", e))?;

        // sensor pulls low after 20-40 us, then the preamble
        self.wait_while(true)?;
        self.wait_while(false)?;
        self.wait_while(true)?;

        let mut bytes = [0u8; 5];
        for bit in 0..40 {
            let low = self.wait_while(false)?;
            let high = self.wait_while(true)?;
            if high > low {
                bytes[bit / 8] |= 0x80 >> (bit % 8);
            }
        }
        Ok(bytes)
    }
}

impl<P, D> ClimateSensor for Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn init(&mut self) -> Result<(), PeripheralError> {
        // idle state of the bus is released (high)
        self.pin
            .set_high()
            .map_err(|_| PeripheralError::InitializationFailed {
                peripheral: "DHT22",
                details: "data pin not configurable",
            })
    }

    fn trigger_measurement(&mut self) -> Result<(), PeripheralError> {
        let bytes = self.read_frame()?;
        debug!("DHT22 raw frame: {:02X?}", bytes);
        self.last = Some(decode(bytes)?);
        Ok(())
    }

    fn last_temperature(&self) -> f32 {
        self.last.map_or(0.0, |r| r.temperature_c)
    }

    fn last_humidity(&self) -> f32 {
        self.last.map_or(0.0, |r| r.humidity_pct)
    }
}
