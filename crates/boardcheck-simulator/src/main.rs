//! Desktop simulator for the boardcheck self-test harness.
//!
//! Runs the real harness (bring-up, functional tests, main loop and
//! shutdown) against simulated peripherals. The OLED is printed to the
//! terminal whenever its content changes and the simulated button presses
//! itself every few seconds, so all four pages come by.
//!
//! # Environment
//!
//! | Variable             | Meaning                                          |
//! |----------------------|--------------------------------------------------|
//! | `BOARDCHECK_RUN_SECS`| Seconds the main loop runs before stopping (10)  |
//! | `BOARDCHECK_FAIL`    | Comma separated peripherals that fail bring-up   |
//! | `RUST_LOG`           | Log filter, `info` by default                    |

mod sim;

use std::thread;

use boardcheck_core::outputs::{Buzzer, RgbLed};
use boardcheck_core::time::EmbassyClock;
use boardcheck_core::ui::GraphicsDisplay;
use boardcheck_core::{Board, Harness, HarnessConfig, Peripheral, StopReason, StopSignal};
use embassy_time::{Delay, Duration};
use log::{info, warn};

use sim::{ConsolePanel, Faults, SimAnalog, SimButton, SimClimate, SimPwm, SimStorage, SimStrip};

/// Length of the simulated WS2812B strip.
const STRIP_LEN: usize = 10;

/// How often the simulated button presses itself.
const BUTTON_PERIOD: Duration = Duration::from_secs(3);

const DEFAULT_RUN_SECS: u64 = 10;

static STOP: StopSignal = StopSignal::new();

fn run_secs() -> u64 {
    match std::env::var("BOARDCHECK_RUN_SECS") {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!(
                "BOARDCHECK_RUN_SECS='{}' is not a number, using {}",
                value, DEFAULT_RUN_SECS
            );
            DEFAULT_RUN_SECS
        }),
        Err(_) => DEFAULT_RUN_SECS,
    }
}

/// Board name short enough for the status page title on a 128 px panel.
fn harness_config() -> HarnessConfig {
    HarnessConfig::new()
        .with_board_name("Sim")
        .with_stop_hold(Duration::from_secs(3))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting boardcheck simulator");

    let faults = Faults::parse(&std::env::var("BOARDCHECK_FAIL").unwrap_or_default());
    let config = harness_config();

    let fail = |p: Peripheral| faults.contains(p);
    let board = Board {
        display: GraphicsDisplay::new(ConsolePanel::new(fail(Peripheral::Display))),
        strip: SimStrip::new(STRIP_LEN, fail(Peripheral::LedStrip)),
        climate: SimClimate::new(fail(Peripheral::ClimateSensor)),
        button: SimButton::new(fail(Peripheral::Button), BUTTON_PERIOD),
        buzzer: Buzzer::new(
            SimPwm::new("Buzzer", Peripheral::Buzzer, fail(Peripheral::Buzzer)),
            config.tone_duty,
        ),
        rgb: RgbLed::new(
            SimPwm::new("RGB red", Peripheral::RgbLed, fail(Peripheral::RgbLed)),
            SimPwm::new("RGB green", Peripheral::RgbLed, false),
            SimPwm::new("RGB blue", Peripheral::RgbLed, false),
        ),
        light: SimAnalog::new(
            Peripheral::LightSensor,
            fail(Peripheral::LightSensor),
            30_000,
            20_000,
            20.0,
        ),
        trim: SimAnalog::new(
            Peripheral::Trimmer,
            fail(Peripheral::Trimmer),
            32_768,
            32_767,
            7.0,
        ),
        storage: SimStorage::new(fail(Peripheral::Storage)),
    };

    let mut harness = Harness::new(board, EmbassyClock, Delay, config);
    harness.start();

    let secs = run_secs();
    info!("Main loop runs for {} s", secs);
    thread::spawn(move || {
        thread::sleep(std::time::Duration::from_secs(secs));
        STOP.signal(StopReason::Requested);
    });

    harness.run(&STOP);

    let report = harness.shutdown();
    for (peripheral, err) in report.failures() {
        warn!("{} did not shut down cleanly: {}", peripheral.label(), err);
    }
    let (ok, pending, failed) = harness.registry().summary();
    info!("Final state: {} OK, {} pending, {} failed", ok, pending, failed);
    info!("Simulator exiting");
}
