//! Display abstraction and geometry of the 128x64 status screen

pub mod text_display;

pub use text_display::{GraphicsDisplay, Panel, TextDisplay};

pub const DISPLAY_WIDTH_PX: u32 = 128;
pub const DISPLAY_HEIGHT_PX: u32 = 64;

/// Advance of one FONT_6X10 glyph
pub const CHAR_WIDTH_PX: i32 = 6;
