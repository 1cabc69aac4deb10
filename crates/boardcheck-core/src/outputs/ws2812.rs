//! WS2812 (NeoPixel) strip driven through an SPI MOSI line
//!
//! At 3.2 MHz one SPI bit lasts 312.5 ns, so every WS2812 data bit is sent as
//! four SPI bits: `1000` for a zero and `1110` for a one. Each color byte
//! therefore expands to four SPI bytes. The strip latches after the line has
//! been low for more than 50 us, which the trailing zero bytes provide.

use embedded_hal::spi::{Error as _, SpiBus};
use heapless::Vec;
use log::{debug, error};

use super::LedStrip;
use crate::app_state::PeripheralError;
use crate::color::Rgb8;

/// SPI clock the encoding is built for
pub const SPI_FREQUENCY_HZ: u32 = 3_200_000;

/// Longest strip the driver buffers
pub const MAX_PIXELS: usize = 32;

/// Zero bytes appended after the pixel data (40 * 8 * 312.5 ns = 100 us)
const RESET_BYTES: usize = 40;

const BYTES_PER_PIXEL: usize = 3 * 4;
const TX_CAPACITY: usize = MAX_PIXELS * BYTES_PER_PIXEL + RESET_BYTES;

/// Expand one color byte into the four SPI bytes that encode it, MSB first.
pub const fn encode_byte(byte: u8) -> [u8; 4] {
    let mut out = [0u8; 4];
    let mut i = 0;
    while i < 4 {
        let hi = (byte >> (7 - 2 * i)) & 1;
        let lo = (byte >> (6 - 2 * i)) & 1;
        out[i] = (if hi == 1 { 0xE0 } else { 0x80 }) | (if lo == 1 { 0x0E } else { 0x08 });
        i += 1;
    }
    out
}

pub struct Ws2812Spi<SPI> {
    spi: SPI,
    pixels: [Rgb8; MAX_PIXELS],
    len: usize,
    tx: Vec<u8, TX_CAPACITY>,
}

impl<SPI: SpiBus> Ws2812Spi<SPI> {
    /// `len` is clamped to [`MAX_PIXELS`].
    pub fn new(spi: SPI, len: usize) -> Self {
        Self {
            spi,
            pixels: [Rgb8::OFF; MAX_PIXELS],
            len: len.min(MAX_PIXELS),
            tx: Vec::new(),
        }
    }

    fn encode(&mut self) {
        self.tx.clear();
        for pixel in &self.pixels[..self.len] {
            // WS2812 expects green, red, blue
            for byte in [pixel.g, pixel.r, pixel.b] {
                // capacity is sized for MAX_PIXELS, extending cannot overflow
                let _ = self.tx.extend_from_slice(&encode_byte(byte));
            }
        }
        for _ in 0..RESET_BYTES {
            let _ = self.tx.push(0);
        }
    }

    /// Bytes of the last committed frame
    pub fn last_transfer(&self) -> &[u8] {
        &self.tx
    }

    fn bus_error(operation: &'static str, e: SPI::Error) -> PeripheralError {
        error!("WS2812 SPI {} failed: {:?}", operation, e.kind());
        PeripheralError::OperationFailed {
            peripheral: "WS2812B",
            operation,
            details: "SPI transfer error",
        }
    }
}

impl<SPI: SpiBus> LedStrip for Ws2812Spi<SPI> {
    fn init(&mut self) -> Result<(), PeripheralError> {
        if self.len == 0 {
            return Err(PeripheralError::InitializationFailed {
                peripheral: "WS2812B",
                details: "strip has no pixels",
            });
        }
        self.pixels = [Rgb8::OFF; MAX_PIXELS];
        self.commit().map_err(|_| PeripheralError::InitializationFailed {
            peripheral: "WS2812B",
            details: "SPI bus not responding",
        })
    }

    fn len(&self) -> usize {
        self.len
    }

    fn set_pixel(&mut self, index: usize, color: Rgb8) -> Result<(), PeripheralError> {
        let pixel = self.pixels[..self.len].get_mut(index).ok_or(
            PeripheralError::OperationFailed {
                peripheral: "WS2812B",
                operation: "set_pixel",
                details: "index out of range",
            },
        )?;
        *pixel = color;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), PeripheralError> {
        self.encode();
        debug!("WS2812: writing {} bytes", self.tx.len());
        self.spi
            .write(&self.tx)
            .map_err(|e| Self::bus_error("write", e))?;
        self.spi.flush().map_err(|e| Self::bus_error("flush", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    #[derive(Default)]
    struct RecordingBus {
        written: std::vec::Vec<u8>,
    }

    impl embedded_hal::spi::ErrorType for RecordingBus {
        type Error = Infallible;
    }

    impl SpiBus for RecordingBus {
        fn read(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
            words.fill(0);
            Ok(())
        }

        fn write(&mut self, words: &[u8]) -> Result<(), Infallible> {
            self.written.extend_from_slice(words);
            Ok(())
        }

        fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Infallible> {
            read.fill(0);
            self.written.extend_from_slice(write);
            Ok(())
        }

        fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Infallible> {
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    #[test]
    fn test_encode_byte_patterns() {
        assert_eq!(encode_byte(0x00), [0x88; 4]);
        assert_eq!(encode_byte(0xFF), [0xEE; 4]);
        assert_eq!(encode_byte(0b1000_0001), [0xE8, 0x88, 0x88, 0x8E]);
    }

    #[test]
    fn test_pixels_are_sent_in_grb_order() {
        let mut strip = Ws2812Spi::new(RecordingBus::default(), 1);
        strip.set_pixel(0, Rgb8::new(0xFF, 0x00, 0x81)).unwrap();
        strip.commit().unwrap();

        let tx = strip.last_transfer();
        assert_eq!(tx.len(), BYTES_PER_PIXEL + RESET_BYTES);
        assert_eq!(&tx[0..4], &[0x88; 4]);
        assert_eq!(&tx[4..8], &[0xEE; 4]);
        assert_eq!(&tx[8..12], &[0xE8, 0x88, 0x88, 0x8E]);
        assert!(tx[12..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_init_blanks_the_strip() {
        let mut strip = Ws2812Spi::new(RecordingBus::default(), 10);
        strip.init().unwrap();
        assert_eq!(strip.len(), 10);
        assert_eq!(strip.spi.written.len(), 10 * BYTES_PER_PIXEL + RESET_BYTES);
        assert!(strip.spi.written[..10 * BYTES_PER_PIXEL].iter().all(|&b| b == 0x88));
    }

    #[test]
    fn test_out_of_range_pixel_is_rejected() {
        let mut strip = Ws2812Spi::new(RecordingBus::default(), 3);
        assert!(strip.set_pixel(3, Rgb8::RED).is_err());
    }
}
