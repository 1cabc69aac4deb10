// src/pages/mod.rs
//! The four status pages and the frame they render into.
//!
//! A page is rendered into a [`Frame`], a fixed-capacity list of positioned
//! text lines, which the display manager then pushes to the display in one
//! clear/draw/commit sequence. Rendering is pure: it reads the
//! [`Registry`] and never touches a peripheral.
//!
//! The live page is the exception on the data side: the display manager
//! re-reads the analog inputs before rendering it (see
//! [`crate::display_manager`]).

use core::fmt::{self, Write};

use embedded_graphics::prelude::Point;
use heapless::{String, Vec};

use crate::app_state::{AppError, Peripheral, Registry};
use crate::config::HarnessConfig;
use crate::ui::{CHAR_WIDTH_PX, DISPLAY_WIDTH_PX};

/// Longest text line a frame can hold
pub const LINE_CAPACITY: usize = 32;
/// Most lines a frame can hold
pub const MAX_LINES: usize = 12;

/// Top edge of the page indicator
const INDICATOR_Y: i32 = 54;
const ROWS: [i32; 5] = [12, 22, 32, 42, 52];
const SECOND_COLUMN_X: i32 = 66;

// ---------------------------------------------------------------------------
// Page identifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageId {
    /// Per-peripheral OK/FAIL/PRESS summary
    #[default]
    Status,
    /// Temperature, humidity and light level from the last reads
    Sensors,
    /// Trimmer level and output status with a usage hint
    Controls,
    /// Freshly read analog values and animation state
    Live,
}

impl PageId {
    pub const COUNT: usize = 4;
    pub const ALL: [PageId; Self::COUNT] = [Self::Status, Self::Sensors, Self::Controls, Self::Live];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// The page after this one, wrapping back to the first.
    pub const fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::COUNT]
    }

    /// 1-based page number as shown to the operator
    pub const fn number(self) -> usize {
        self.index() + 1
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub text: String<LINE_CAPACITY>,
    pub position: Point,
}

/// One screenful of text, drawn in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    lines: Vec<TextLine, MAX_LINES>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Format a line and place its top-left corner at `(x, y)`.
    pub fn push(&mut self, x: i32, y: i32, args: fmt::Arguments<'_>) -> Result<(), AppError> {
        let mut text = String::new();
        text.write_fmt(args)?;
        self.lines
            .push(TextLine {
                text,
                position: Point::new(x, y),
            })
            .map_err(|_| AppError::FrameFull)
    }

    pub fn lines(&self) -> &[TextLine] {
        &self.lines
    }

    /// Whether any line reads exactly `text`.
    pub fn has_line(&self, text: &str) -> bool {
        self.lines.iter().any(|line| line.text.as_str() == text)
    }
}

/// Scale a full-range raw reading to a percentage, rounding down.
pub const fn percent(raw: u16) -> u8 {
    (raw as u32 * 100 / u16::MAX as u32) as u8
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render `page` followed by the "P{n}/{total}" indicator in the bottom-right
/// corner.
pub fn render(page: PageId, registry: &Registry, config: &HarnessConfig) -> Result<Frame, AppError> {
    let mut frame = Frame::new();
    match page {
        PageId::Status => render_status(&mut frame, registry, config)?,
        PageId::Sensors => render_sensors(&mut frame, registry)?,
        PageId::Controls => render_controls(&mut frame, registry)?,
        PageId::Live => render_live(&mut frame, registry)?,
    }
    render_indicator(&mut frame, page)?;
    Ok(frame)
}

fn render_indicator(frame: &mut Frame, page: PageId) -> Result<(), AppError> {
    let mut text: String<8> = String::new();
    write!(text, "P{}/{}", page.number(), PageId::COUNT)?;
    let x = DISPLAY_WIDTH_PX as i32 - text.len() as i32 * CHAR_WIDTH_PX;
    frame.push(x, INDICATOR_Y, format_args!("{}", text))
}

fn render_status(frame: &mut Frame, registry: &Registry, config: &HarnessConfig) -> Result<(), AppError> {
    frame.push(0, 0, format_args!("== {} Status ==", config.board_name))?;

    let (first, second) = Peripheral::ALL.split_at(ROWS.len());
    for (peripheral, y) in first.iter().zip(ROWS) {
        status_line(frame, registry, *peripheral, 0, y)?;
    }
    for (peripheral, y) in second.iter().zip(ROWS) {
        status_line(frame, registry, *peripheral, SECOND_COLUMN_X, y)?;
    }
    Ok(())
}

fn status_line(
    frame: &mut Frame,
    registry: &Registry,
    peripheral: Peripheral,
    x: i32,
    y: i32,
) -> Result<(), AppError> {
    frame.push(
        x,
        y,
        format_args!(
            "{}:{}",
            peripheral.short_label(),
            registry.health(peripheral).status_text()
        ),
    )
}

fn render_sensors(frame: &mut Frame, registry: &Registry) -> Result<(), AppError> {
    let m = &registry.measurements;
    frame.push(0, 0, format_args!("=== Sensors ==="))?;

    if registry.is_available(Peripheral::ClimateSensor) {
        frame.push(0, ROWS[0], format_args!("Temp: {:.1}C", m.temperature_c))?;
        frame.push(0, ROWS[1], format_args!("Humidity: {:.1}%", m.humidity_pct))?;
    } else {
        frame.push(0, ROWS[0], format_args!("DHT22: No Data"))?;
    }

    if registry.is_available(Peripheral::LightSensor) {
        frame.push(0, ROWS[2], format_args!("LDR: {}%", percent(m.light_raw)))
    } else {
        frame.push(0, ROWS[2], format_args!("LDR: FAIL"))
    }
}

fn render_controls(frame: &mut Frame, registry: &Registry) -> Result<(), AppError> {
    frame.push(0, 0, format_args!("=== Controls ==="))?;

    if registry.is_available(Peripheral::Trimmer) {
        let level = percent(registry.measurements.trimmer_raw);
        frame.push(0, ROWS[0], format_args!("Trimmer: {}%", level))?;
    } else {
        frame.push(0, ROWS[0], format_args!("Trimmer: FAIL"))?;
    }
    frame.push(0, ROWS[1], format_args!("Buzzer: {}", ok_or_fail(registry, Peripheral::Buzzer)))?;
    frame.push(0, ROWS[2], format_args!("RGB LED: {}", ok_or_fail(registry, Peripheral::RgbLed)))?;
    frame.push(0, ROWS[3], format_args!("Press button to"))?;
    frame.push(0, ROWS[4], format_args!("cycle pages"))
}

fn render_live(frame: &mut Frame, registry: &Registry) -> Result<(), AppError> {
    let m = &registry.measurements;
    frame.push(0, 0, format_args!("=== Live Data ==="))?;

    if registry.is_available(Peripheral::ClimateSensor) {
        frame.push(
            0,
            ROWS[0],
            format_args!("T:{:.1}C H:{:.0}%", m.temperature_c, m.humidity_pct),
        )?;
    } else {
        frame.push(0, ROWS[0], format_args!("T/H: No Data"))?;
    }

    if registry.is_available(Peripheral::LightSensor) {
        frame.push(0, ROWS[1], format_args!("LDR: {}%", percent(m.light_raw)))?;
    } else {
        frame.push(0, ROWS[1], format_args!("LDR: FAIL"))?;
    }
    if registry.is_available(Peripheral::Trimmer) {
        frame.push(0, ROWS[2], format_args!("Trim: {}%", percent(m.trimmer_raw)))?;
    } else {
        frame.push(0, ROWS[2], format_args!("Trim: FAIL"))?;
    }

    let animation = if registry.is_usable(Peripheral::LedStrip) {
        "Rainbow"
    } else {
        "Off"
    };
    frame.push(0, ROWS[3], format_args!("WS2812B: {}", animation))
}

fn ok_or_fail(registry: &Registry, peripheral: Peripheral) -> &'static str {
    if registry.is_available(peripheral) {
        "OK"
    } else {
        "FAIL"
    }
}
