//! Rainbow animation on the LED strip

use embassy_time::Instant;
use log::debug;

use crate::app_state::{Peripheral, Registry, UiState};
use crate::color::{Rgb8, hsv_to_rgb};
use crate::config::HarnessConfig;
use crate::outputs::LedStrip;

/// Color of pixel `index` out of `count` for the given phase. Pixels are
/// spread evenly around the hue circle.
pub fn rainbow_pixel(phase: u16, index: usize, count: usize, config: &HarnessConfig) -> Rgb8 {
    let spacing = 360 / count.max(1);
    let hue = (phase as usize + index * spacing) % 360;
    hsv_to_rgb(
        hue as u16,
        config.animation_saturation,
        config.animation_brightness,
    )
}

/// Draw one rainbow frame if the animation interval has passed.
///
/// All pixels are set first and committed once. The phase only advances when
/// the frame was written. Does nothing once the strip is unusable.
pub fn tick<L: LedStrip>(
    strip: &mut L,
    registry: &mut Registry,
    ui: &mut UiState,
    config: &HarnessConfig,
    now: Instant,
) {
    if !registry.is_usable(Peripheral::LedStrip) || !ui.animation.poll(now) {
        return;
    }

    let phase = ui.phase;
    let drawn = registry.drive(Peripheral::LedStrip, || {
        let count = strip.len();
        for index in 0..count {
            strip.set_pixel(index, rainbow_pixel(phase, index, count, config))?;
        }
        strip.commit()
    });

    if drawn.is_some() {
        ui.phase = (phase + config.hue_step) % 360;
        debug!("Rainbow phase {}", ui.phase);
    }
}
