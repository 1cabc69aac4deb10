#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use boardcheck_core::time::EmbassyClock;
use boardcheck_core::{Harness, HarnessConfig, StopSignal};
use boardcheck_firmware::board::init_board;
use embassy_executor::Spawner;
use embassy_time::{Delay, Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use log::{info, warn};

/// Signalled by the long-press handler inside the harness loop.
static STOP: StopSignal = StopSignal::new();

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[allow(
    clippy::large_stack_frames,
    reason = "the harness owns every driver and lives in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    let config = HarnessConfig::new()
        .with_board_name("ESP32-S3")
        .with_stop_hold(Duration::from_secs(3));
    let board = init_board(peripherals, config.tone_duty);

    let mut harness = Harness::new(board, EmbassyClock, Delay, config);
    harness.start();

    harness.run(&STOP);

    let report = harness.shutdown();
    if report.is_clean() {
        info!("Shutdown complete");
    } else {
        for (peripheral, err) in report.failures() {
            warn!("{} did not shut down cleanly: {}", peripheral.label(), err);
        }
    }

    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}
