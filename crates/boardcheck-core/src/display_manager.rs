//! Periodic redraw of the status display
//!
//! Every redraw is a full clear, render and commit of the current page. When
//! the live page is showing, the analog inputs are read again first so it
//! always shows fresh values.

use embassy_time::Instant;
use log::debug;

use crate::app_state::{AppError, Peripheral, PeripheralError, Registry, UiState};
use crate::config::HarnessConfig;
use crate::pages::{self, Frame, PageId};
use crate::sensors::AnalogInput;
use crate::ui::TextDisplay;

/// Clear the display, draw every line of `frame` and commit.
pub fn present<D: TextDisplay>(display: &mut D, frame: &Frame) -> Result<(), PeripheralError> {
    display.clear()?;
    for line in frame.lines() {
        display.draw_text(&line.text, line.position)?;
    }
    display.commit()
}

/// Refresh the live measurements from the analog inputs that still work.
pub fn sample_analog<A: AnalogInput, T: AnalogInput>(light: &mut A, trim: &mut T, registry: &mut Registry) {
    if let Some(raw) = registry.drive(Peripheral::LightSensor, || light.read_raw()) {
        registry.measurements.light_raw = raw;
    }
    if let Some(raw) = registry.drive(Peripheral::Trimmer, || trim.read_raw()) {
        registry.measurements.trimmer_raw = raw;
    }
}

/// Redraw the current page if the refresh interval has passed.
///
/// A display failure demotes the display and is not returned; an error here
/// means the page could not be rendered this time.
pub fn refresh<D, A, T>(
    display: &mut D,
    light: &mut A,
    trim: &mut T,
    registry: &mut Registry,
    ui: &mut UiState,
    config: &HarnessConfig,
    now: Instant,
) -> Result<(), AppError>
where
    D: TextDisplay,
    A: AnalogInput,
    T: AnalogInput,
{
    if !registry.is_usable(Peripheral::Display) || !ui.display.poll(now) {
        return Ok(());
    }

    if ui.page == PageId::Live {
        sample_analog(light, trim, registry);
    }

    let frame = pages::render(ui.page, registry, config)?;
    debug!("Drawing page {} ({} lines)", ui.page.number(), frame.lines().len());
    registry.drive(Peripheral::Display, || present(display, &frame));
    Ok(())
}
