//! One-shot bring-up of every peripheral
//!
//! Each peripheral gets exactly one initialization attempt, in a fixed order,
//! and the outcome is recorded in the [`Registry`]. A failure is logged with
//! its reason and never stops the attempts that follow.

use core::fmt::Write;

use embedded_graphics::prelude::Point;
use heapless::String;
use log::{info, warn};

use crate::app_state::{Peripheral, PeripheralError, Registry};
use crate::board::Board;
use crate::color::Rgb8;
use crate::config::HarnessConfig;
use crate::input::DigitalInput;
use crate::outputs::{LedStrip, PwmOutput};
use crate::sensors::{AnalogInput, ClimateSensor};
use crate::storage::FileStorage;
use crate::ui::TextDisplay;

/// Clear the display, draw `lines` from the top, one per text row, and
/// commit.
pub fn show_message<D: TextDisplay>(display: &mut D, lines: &[&str]) -> Result<(), PeripheralError> {
    display.clear()?;
    for (row, line) in lines.iter().enumerate() {
        display.draw_text(line, Point::new(0, row as i32 * 12))?;
    }
    display.commit()
}

/// "<board> Test", or as much of the board name as fits when that is too
/// long.
fn splash_title(board_name: &str) -> String<32> {
    let mut title = String::new();
    if write!(title, "{} Test", board_name).is_err() {
        warn!("Board name too long for the splash screen");
        title.clear();
        for c in board_name.chars() {
            if title.push(c).is_err() {
                break;
            }
        }
    }
    title
}

fn record(registry: &mut Registry, peripheral: Peripheral, needs_confirmation: bool, result: Result<(), PeripheralError>) {
    match result {
        Ok(()) => registry.mark_brought_up(peripheral, needs_confirmation),
        Err(e) => registry.mark_failed(peripheral, e),
    }
}

impl<D, L, C, B, Z, R, A, T, S> Board<D, L, C, B, Z, R, A, T, S>
where
    D: TextDisplay,
    L: LedStrip,
    C: ClimateSensor,
    B: DigitalInput,
    Z: PwmOutput,
    R: PwmOutput,
    A: AnalogInput,
    T: AnalogInput,
    S: FileStorage,
{
    /// Initialize every peripheral once and leave the outputs idle: strip
    /// and RGB LED dark, buzzer silent.
    ///
    /// Order: display, LED strip, climate sensor, button, buzzer, RGB LED,
    /// analog inputs, storage. The display comes first so it can show the
    /// splash screen while the rest comes up.
    pub fn bring_up(&mut self, registry: &mut Registry, config: &HarnessConfig) {
        info!("{} component test starting", config.board_name);

        let display = self.display.init().and_then(|()| {
            let title = splash_title(config.board_name);
            show_message(&mut self.display, &[title.as_str(), "Initializing..."])
        });
        record(registry, Peripheral::Display, false, display);

        let strip = self.strip.init().and_then(|()| self.strip.fill(Rgb8::OFF));
        record(registry, Peripheral::LedStrip, false, strip);

        record(registry, Peripheral::ClimateSensor, false, self.climate.init());

        // the button only counts as working after the operator pressed it
        let button = self.button.init().and_then(|()| self.button.read().map(|_| ()));
        record(registry, Peripheral::Button, true, button);

        record(registry, Peripheral::Buzzer, false, self.buzzer.init(config.idle_pwm_hz));
        record(registry, Peripheral::RgbLed, false, self.rgb.init(config.idle_pwm_hz));

        record(registry, Peripheral::LightSensor, false, self.light.init());
        record(registry, Peripheral::Trimmer, false, self.trim.init());

        record(registry, Peripheral::Storage, false, self.storage.init());

        let (ok, pending, failed) = registry.summary();
        info!("Bring-up done: {} OK, {} pending, {} failed", ok, pending, failed);
    }
}
