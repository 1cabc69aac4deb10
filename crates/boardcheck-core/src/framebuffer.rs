//! In-memory 1-bit framebuffer with change tracking.
//!
//! Used as the [`Panel`] of the simulator and of the display tests. Pixels
//! are packed eight to a byte, row-major. A frame only counts as changed when
//! a pixel actually flipped, so redrawing identical content leaves
//! [`FrameBuffer::is_dirty`] false.

use core::convert::Infallible;
use core::fmt::{self, Write};

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

use crate::app_state::PeripheralError;
use crate::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, Panel};

const WIDTH: usize = DISPLAY_WIDTH_PX as usize;
const HEIGHT: usize = DISPLAY_HEIGHT_PX as usize;
const BYTES: usize = WIDTH * HEIGHT / 8;

pub struct FrameBuffer {
    pixels: [u8; BYTES],
    dirty: bool,
    flushes: u32,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// A blank (all off) framebuffer.
    pub const fn new() -> Self {
        Self {
            pixels: [0; BYTES],
            dirty: false,
            flushes: 0,
        }
    }

    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
        let idx = y * WIDTH + x;
        let mask = 0x80 >> (idx % 8);
        let byte = &mut self.pixels[idx / 8];
        if (*byte & mask != 0) != on {
            *byte ^= mask;
            self.dirty = true;
        }
    }

    /// Whether the pixel at `(x, y)` is lit. Out of range reads as off.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if x >= WIDTH || y >= HEIGHT {
            return false;
        }
        let idx = y * WIDTH + x;
        self.pixels[idx / 8] & (0x80 >> (idx % 8)) != 0
    }

    pub fn lit_pixels(&self) -> u32 {
        self.pixels.iter().map(|b| b.count_ones()).sum()
    }

    /// Changed since the last flush
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn flush_count(&self) -> u32 {
        self.flushes
    }

    /// Render the buffer as text, two pixel rows per line using half blocks.
    pub fn render_ascii<W: Write>(&self, out: &mut W) -> fmt::Result {
        for y in (0..HEIGHT).step_by(2) {
            for x in 0..WIDTH {
                let glyph = match (self.pixel(x, y), self.pixel(x, y + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                };
                out.write_char(glyph)?;
            }
            out.write_char('\n')?;
        }
        Ok(())
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let (x, y) = (coord.x, coord.y);
            if x >= 0 && y >= 0 && (x as usize) < WIDTH && (y as usize) < HEIGHT {
                self.set_pixel(x as usize, y as usize, color.is_on());
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };
        for y in area.top_left.y..=bottom_right.y {
            for x in area.top_left.x..=bottom_right.x {
                self.set_pixel(x as usize, y as usize, color.is_on());
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let fill = if color.is_on() { 0xFF } else { 0x00 };
        if self.pixels.iter().any(|&b| b != fill) {
            self.pixels = [fill; BYTES];
            self.dirty = true;
        }
        Ok(())
    }
}

impl Panel for FrameBuffer {
    fn init(&mut self) -> Result<(), PeripheralError> {
        self.pixels = [0; BYTES];
        self.dirty = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), PeripheralError> {
        if self.dirty {
            debug!("Framebuffer flush #{}", self.flushes + 1);
        }
        self.dirty = false;
        self.flushes += 1;
        Ok(())
    }
}
