//! Top-level orchestration: bring-up, self tests, main loop and shutdown
//!
//! The [`Harness`] owns the board, the [`Registry`] and the [`UiState`] and
//! lends them to the components. Its life cycle is:
//!
//! 1. [`Harness::start`]: bring up every peripheral, wait for the board to
//!    settle, run the functional tests.
//! 2. [`Harness::run`]: poll the button, refresh the display and advance the
//!    LED animation until a stop is requested.
//! 3. [`Harness::shutdown`]: switch off every output that was ever brought up.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::{error, info, warn};

use crate::animation;
use crate::app_state::{
    AppError, Peripheral, PeripheralError, Registry, StopReason, StopSignal, UiState,
};
use crate::board::Board;
use crate::color::Rgb8;
use crate::config::HarnessConfig;
use crate::display_manager;
use crate::input::DigitalInput;
use crate::outputs::{LedStrip, PwmOutput};
use crate::sensors::{AnalogInput, ClimateSensor};
use crate::storage::FileStorage;
use crate::time::{Clock, sleep};
use crate::ui::TextDisplay;

/// Outputs that could not be switched off during shutdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    failures: Vec<(Peripheral, PeripheralError), 3>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[(Peripheral, PeripheralError)] {
        &self.failures
    }

    fn record(&mut self, peripheral: Peripheral, result: Result<(), PeripheralError>) {
        match result {
            Ok(()) => info!("{}: off", peripheral.label()),
            Err(e) => {
                warn!("{}: shutdown failed - {}", peripheral.label(), e);
                // one slot per output, cannot overflow
                let _ = self.failures.push((peripheral, e));
            }
        }
    }
}

pub struct Harness<D, L, C, B, Z, R, A, T, S, K, Y> {
    board: Board<D, L, C, B, Z, R, A, T, S>,
    registry: Registry,
    ui: UiState,
    config: HarnessConfig,
    clock: K,
    delay: Y,
}

impl<D, L, C, B, Z, R, A, T, S, K, Y> Harness<D, L, C, B, Z, R, A, T, S, K, Y>
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
    K: Clock,
    Y: DelayNs,
{
    pub fn new(
        board: Board<D, L, C, B, Z, R, A, T, S>,
        clock: K,
        delay: Y,
        config: HarnessConfig,
    ) -> Self {
        Self {
            board,
            registry: Registry::new(),
            ui: UiState::new(&config),
            config,
            clock,
            delay,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Bring up the board and run the one-shot functional tests.
    pub fn start(&mut self) {
        self.board.bring_up(&mut self.registry, &self.config);

        info!("Settling for {} ms", self.config.boot_settle.as_millis());
        sleep(&mut self.delay, self.config.boot_settle);

        self.board
            .run_self_tests(&mut self.registry, &self.config, &mut self.delay);

        info!("Starting main loop...");
        info!("Press the button to cycle through pages!");
    }

    /// One main loop iteration: button, display, animation.
    ///
    /// Peripheral failures are absorbed into the registry. An error means
    /// this iteration could not finish and should be retried after a pause.
    pub fn tick(&mut self) -> Result<(), AppError> {
        self.check_button();

        display_manager::refresh(
            &mut self.board.display,
            &mut self.board.light,
            &mut self.board.trim,
            &mut self.registry,
            &mut self.ui,
            &self.config,
            self.clock.now(),
        )?;

        animation::tick(
            &mut self.board.strip,
            &mut self.registry,
            &mut self.ui,
            &self.config,
            self.clock.now(),
        );
        Ok(())
    }

    /// Sample the button and handle an accepted press. Returns whether a
    /// press was accepted.
    fn check_button(&mut self) -> bool {
        let button = &mut self.board.button;
        let Some(level_high) = self.registry.drive(Peripheral::Button, || button.read()) else {
            return false;
        };
        if !self.ui.button.sample(level_high, self.clock.now()) {
            return false;
        }

        self.registry.confirm(Peripheral::Button);
        self.ui.page = self.ui.page.next();
        info!("Button pressed - Page: {}", self.ui.page.number());

        let config = &self.config;
        let delay = &mut self.delay;
        let buzzer = &mut self.board.buzzer;
        self.registry
            .drive(Peripheral::Buzzer, || buzzer.play(config.confirm_tone, delay));
        let rgb = &mut self.board.rgb;
        self.registry
            .drive(Peripheral::RgbLed, || rgb.flash(Rgb8::WHITE, config.rgb_flash, delay));
        true
    }

    /// Whether the button has been held long enough to request a stop.
    fn long_press(&self) -> bool {
        let Some(hold) = self.config.stop_hold else {
            return false;
        };
        self.registry.is_usable(Peripheral::Button)
            && self
                .ui
                .button
                .held_for(self.clock.now())
                .is_some_and(|held| held >= hold)
    }

    /// Run the main loop until `stop` is signalled.
    ///
    /// A held button signals `stop` itself when a stop hold time is
    /// configured.
    pub fn run(&mut self, stop: &StopSignal) -> StopReason {
        loop {
            if stop.signaled() {
                let reason = stop.try_take().unwrap_or(StopReason::Requested);
                info!("Main loop stopped: {:?}", reason);
                return reason;
            }

            match self.tick() {
                Ok(()) => {
                    if self.long_press() {
                        info!("Button held, requesting stop");
                        stop.signal(StopReason::LongPress);
                    }
                    sleep(&mut self.delay, self.config.loop_interval);
                }
                Err(e) => {
                    error!("Error in main loop: {}", e);
                    sleep(&mut self.delay, self.config.fault_backoff);
                }
            }
        }
    }

    /// Switch off the RGB LED, the LED strip and the buzzer.
    ///
    /// Outputs that never came up are not touched. Outputs that came up and
    /// failed later still get one attempt. A failing step does not stop the
    /// ones after it.
    pub fn shutdown(&mut self) -> ShutdownReport {
        info!("Shutting down outputs");
        let mut report = ShutdownReport::default();

        if self.registry.was_brought_up(Peripheral::RgbLed) {
            report.record(Peripheral::RgbLed, self.board.rgb.set_color(Rgb8::OFF));
        }
        if self.registry.was_brought_up(Peripheral::LedStrip) {
            report.record(Peripheral::LedStrip, self.board.strip.fill(Rgb8::OFF));
        }
        if self.registry.was_brought_up(Peripheral::Buzzer) {
            report.record(Peripheral::Buzzer, self.board.buzzer.silence());
        }
        report
    }
}
