//! Output peripherals: PWM channels (buzzer, RGB LED) and the LED strip

pub mod pwm;
pub mod ws2812;

pub use pwm::{Buzzer, RgbLed, duty_from_channel};
pub use ws2812::Ws2812Spi;

use crate::app_state::PeripheralError;
use crate::color::Rgb8;

/// A PWM output with adjustable frequency and 16-bit duty.
pub trait PwmOutput {
    fn init(&mut self) -> Result<(), PeripheralError> {
        Ok(())
    }

    fn set_frequency(&mut self, hz: u32) -> Result<(), PeripheralError>;

    /// Duty from 0 (off) to 65535 (always on)
    fn set_duty(&mut self, duty: u16) -> Result<(), PeripheralError>;
}

/// An addressable LED strip. Pixels are buffered until [`LedStrip::commit`].
pub trait LedStrip {
    fn init(&mut self) -> Result<(), PeripheralError>;

    /// Number of pixels on the strip
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn set_pixel(&mut self, index: usize, color: Rgb8) -> Result<(), PeripheralError>;

    /// Write all buffered pixels to the strip in one transfer.
    fn commit(&mut self) -> Result<(), PeripheralError>;

    /// Set every pixel to `color` and commit.
    fn fill(&mut self, color: Rgb8) -> Result<(), PeripheralError> {
        for index in 0..self.len() {
            self.set_pixel(index, color)?;
        }
        self.commit()
    }
}
