//! Harness timing and test constants
//!
//! Every interval, tone and probe value used by the components lives here so
//! that the firmware and the simulator can tune them without touching logic.

use embassy_time::Duration;

/// A tone played on the buzzer: frequency in Hz and how long it is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration: Duration,
}

impl Tone {
    pub const fn new(frequency_hz: u32, duration_ms: u64) -> Self {
        Self {
            frequency_hz,
            duration: Duration::from_millis(duration_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    /// Name shown on the splash and status screens
    pub board_name: &'static str,

    /// Minimum time between two accepted button presses
    pub debounce_window: Duration,
    /// Minimum time between two display redraws
    pub display_refresh: Duration,
    /// Minimum time between two animation frames
    pub animation_interval: Duration,
    /// Sleep at the end of every main loop iteration
    pub loop_interval: Duration,
    /// Pause after a transient fault inside the main loop
    pub fault_backoff: Duration,
    /// Button hold time that requests a stop, if any
    pub stop_hold: Option<Duration>,

    /// Settle time before the functional tests start
    pub boot_settle: Duration,
    /// Settle time before the first climate sensor measurement
    pub sensor_settle: Duration,

    /// Idle PWM frequency programmed into the buzzer and RGB channels
    pub idle_pwm_hz: u32,
    /// Duty used while a tone is sounding (50%)
    pub tone_duty: u16,
    /// Tones played by the buzzer test
    pub test_tones: [Tone; 2],
    /// Silence after each test tone
    pub tone_gap: Duration,
    /// Tone played when a button press is accepted
    pub confirm_tone: Tone,
    /// How long each color is held during the RGB test
    pub rgb_test_hold: Duration,
    /// How long the RGB LED flashes white on a button press
    pub rgb_flash: Duration,

    /// Hue advance per animation frame, in degrees
    pub hue_step: u16,
    /// Saturation of the rainbow (0-255)
    pub animation_saturation: u8,
    /// Brightness of the rainbow (0-255)
    pub animation_brightness: u8,

    /// File written and removed by the storage test
    pub storage_probe_path: &'static str,
    /// Content written by the storage test
    pub storage_probe_content: &'static str,
    /// Substring the read-back content must contain
    pub storage_probe_expect: &'static str,
}

impl HarnessConfig {
    pub const fn new() -> Self {
        Self {
            board_name: "Pico2 W",
            debounce_window: Duration::from_millis(200),
            display_refresh: Duration::from_millis(500),
            animation_interval: Duration::from_millis(150),
            loop_interval: Duration::from_millis(50),
            fault_backoff: Duration::from_secs(1),
            stop_hold: None,
            boot_settle: Duration::from_secs(2),
            sensor_settle: Duration::from_secs(2),
            idle_pwm_hz: 1000,
            tone_duty: 32768,
            test_tones: [Tone::new(1500, 200), Tone::new(2000, 200)],
            tone_gap: Duration::from_millis(100),
            confirm_tone: Tone::new(1000, 100),
            rgb_test_hold: Duration::from_millis(300),
            rgb_flash: Duration::from_millis(100),
            hue_step: 15,
            animation_saturation: 255,
            animation_brightness: 100,
            storage_probe_path: "TEST.TXT",
            storage_probe_content: "Pico2 W Test",
            storage_probe_expect: "Pico2 W",
        }
    }

    pub const fn with_board_name(mut self, name: &'static str) -> Self {
        self.board_name = name;
        self
    }

    pub const fn with_stop_hold(mut self, hold: Duration) -> Self {
        self.stop_hold = Some(hold);
        self
    }

    pub const fn with_boot_settle(mut self, settle: Duration) -> Self {
        self.boot_settle = settle;
        self
    }

    pub const fn with_sensor_settle(mut self, settle: Duration) -> Self {
        self.sensor_settle = settle;
        self
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new()
    }
}
