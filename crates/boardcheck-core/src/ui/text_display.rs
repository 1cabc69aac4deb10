use core::fmt::Debug;

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use log::error;

use crate::app_state::PeripheralError;

/// A monochrome display that shows lines of text.
///
/// Drawing goes to an off-screen buffer; nothing is visible before
/// [`TextDisplay::commit`].
pub trait TextDisplay {
    fn init(&mut self) -> Result<(), PeripheralError>;

    fn clear(&mut self) -> Result<(), PeripheralError>;

    /// Draw `text` with its top-left corner at `position`.
    fn draw_text(&mut self, text: &str, position: Point) -> Result<(), PeripheralError>;

    fn commit(&mut self) -> Result<(), PeripheralError>;
}

/// A buffered 1-bit panel: an `embedded-graphics` draw target that needs a
/// bring-up sequence and an explicit flush.
pub trait Panel: DrawTarget<Color = BinaryColor> {
    fn init(&mut self) -> Result<(), PeripheralError>;

    fn flush(&mut self) -> Result<(), PeripheralError>;
}

/// [`TextDisplay`] on top of any [`Panel`], using the 6x10 ASCII font.
pub struct GraphicsDisplay<P> {
    panel: P,
}

impl<P> GraphicsDisplay<P>
where
    P: Panel,
    P::Error: Debug,
{
    pub fn new(panel: P) -> Self {
        Self { panel }
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    fn draw_error(operation: &'static str, e: P::Error) -> PeripheralError {
        error!("OLED {} failed: {:?}", operation, e);
        PeripheralError::OperationFailed {
            peripheral: "OLED",
            operation,
            details: "draw target error",
        }
    }
}

impl<P> TextDisplay for GraphicsDisplay<P>
where
    P: Panel,
    P::Error: Debug,
{
    fn init(&mut self) -> Result<(), PeripheralError> {
        self.panel.init()
    }

    fn clear(&mut self) -> Result<(), PeripheralError> {
        self.panel
            .clear(BinaryColor::Off)
            .map_err(|e| Self::draw_error("clear", e))
    }

    fn draw_text(&mut self, text: &str, position: Point) -> Result<(), PeripheralError> {
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        Text::with_baseline(text, position, style, Baseline::Top)
            .draw(&mut self.panel)
            .map(|_| ())
            .map_err(|e| Self::draw_error("draw_text", e))
    }

    fn commit(&mut self) -> Result<(), PeripheralError> {
        self.panel.flush()
    }
}
