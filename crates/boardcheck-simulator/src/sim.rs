//! Simulated peripherals for the desktop build.
//!
//! Every device implements the same capability trait as its hardware
//! counterpart. A device listed in the fault set refuses to initialize, which
//! is enough to watch the harness route around it.

use std::collections::BTreeMap;
use std::f32::consts::TAU;

use boardcheck_core::Peripheral;
use boardcheck_core::PeripheralError;
use boardcheck_core::color::Rgb8;
use boardcheck_core::framebuffer::FrameBuffer;
use boardcheck_core::outputs::{LedStrip, PwmOutput};
use boardcheck_core::sensors::{AnalogInput, ClimateSensor};
use boardcheck_core::storage::FileStorage;
use boardcheck_core::ui::Panel;
use embassy_time::{Duration, Instant};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin};
use log::{debug, info};

/// Peripherals that should fail their bring-up.
#[derive(Debug, Default, Clone)]
pub struct Faults(Vec<Peripheral>);

impl Faults {
    /// Parse a comma separated list of peripheral names. Either the log
    /// label ("SD Card") or the status label ("SD") is accepted, in any case.
    pub fn parse(list: &str) -> Self {
        let mut faults = Vec::new();
        for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let found = Peripheral::ALL.into_iter().find(|p| {
                p.label().eq_ignore_ascii_case(name) || p.short_label().eq_ignore_ascii_case(name)
            });
            match found {
                Some(p) => faults.push(p),
                None => log::warn!("Unknown peripheral '{}' in fault list", name),
            }
        }
        Self(faults)
    }

    pub fn contains(&self, peripheral: Peripheral) -> bool {
        self.0.contains(&peripheral)
    }
}

fn init_result(fail: bool, peripheral: Peripheral) -> Result<(), PeripheralError> {
    if fail {
        Err(PeripheralError::InitializationFailed {
            peripheral: peripheral.label(),
            details: "simulated fault",
        })
    } else {
        Ok(())
    }
}

/// Seconds since `start` as a float, for the synthetic waveforms.
fn elapsed_secs(start: Instant) -> f32 {
    Instant::now().saturating_duration_since(start).as_millis() as f32 / 1000.0
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// Framebuffer that prints itself to stdout whenever a flush changes it.
pub struct ConsolePanel {
    fb: FrameBuffer,
    fail: bool,
}

impl ConsolePanel {
    pub fn new(fail: bool) -> Self {
        Self {
            fb: FrameBuffer::new(),
            fail,
        }
    }
}

impl OriginDimensions for ConsolePanel {
    fn size(&self) -> Size {
        self.fb.size()
    }
}

impl DrawTarget for ConsolePanel {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.fb.draw_iter(pixels)
    }
}

impl Panel for ConsolePanel {
    fn init(&mut self) -> Result<(), PeripheralError> {
        init_result(self.fail, Peripheral::Display)?;
        self.fb.init()
    }

    fn flush(&mut self) -> Result<(), PeripheralError> {
        if self.fb.is_dirty() {
            let mut screen = String::new();
            // writing into a String cannot fail
            let _ = self.fb.render_ascii(&mut screen);
            let border = "-".repeat(boardcheck_core::ui::DISPLAY_WIDTH_PX as usize);
            println!("+{border}+");
            for line in screen.lines() {
                println!("|{line}|");
            }
            println!("+{border}+");
        }
        self.fb.flush()
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

pub struct SimStrip {
    pixels: Vec<Rgb8>,
    fail: bool,
    commits: u64,
}

impl SimStrip {
    pub fn new(len: usize, fail: bool) -> Self {
        Self {
            pixels: vec![Rgb8::OFF; len],
            fail,
            commits: 0,
        }
    }
}

impl LedStrip for SimStrip {
    fn init(&mut self) -> Result<(), PeripheralError> {
        init_result(self.fail, Peripheral::LedStrip)
    }

    fn len(&self) -> usize {
        self.pixels.len()
    }

    fn set_pixel(&mut self, index: usize, color: Rgb8) -> Result<(), PeripheralError> {
        let pixel = self
            .pixels
            .get_mut(index)
            .ok_or(PeripheralError::OperationFailed {
                peripheral: "WS2812B",
                operation: "set_pixel",
                details: "index out of range",
            })?;
        *pixel = color;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), PeripheralError> {
        self.commits += 1;
        if let Some(first) = self.pixels.first() {
            debug!(
                "WS2812B commit #{}: pixel 0 = ({}, {}, {})",
                self.commits, first.r, first.g, first.b
            );
        }
        Ok(())
    }
}

/// A PWM channel that only logs what it is told.
pub struct SimPwm {
    name: &'static str,
    peripheral: Peripheral,
    fail: bool,
    frequency: u32,
}

impl SimPwm {
    pub fn new(name: &'static str, peripheral: Peripheral, fail: bool) -> Self {
        Self {
            name,
            peripheral,
            fail,
            frequency: 0,
        }
    }
}

impl PwmOutput for SimPwm {
    fn init(&mut self) -> Result<(), PeripheralError> {
        init_result(self.fail, self.peripheral)
    }

    fn set_frequency(&mut self, hz: u32) -> Result<(), PeripheralError> {
        self.frequency = hz;
        Ok(())
    }

    fn set_duty(&mut self, duty: u16) -> Result<(), PeripheralError> {
        if self.peripheral == Peripheral::Buzzer && duty > 0 {
            info!("{}: {} Hz", self.name, self.frequency);
        } else {
            debug!("{}: duty {} at {} Hz", self.name, duty, self.frequency);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// DHT22 stand-in with slowly drifting readings.
pub struct SimClimate {
    start: Instant,
    fail: bool,
    temperature: f32,
    humidity: f32,
}

impl SimClimate {
    pub fn new(fail: bool) -> Self {
        Self {
            start: Instant::now(),
            fail,
            temperature: 0.0,
            humidity: 0.0,
        }
    }
}

impl ClimateSensor for SimClimate {
    fn init(&mut self) -> Result<(), PeripheralError> {
        init_result(self.fail, Peripheral::ClimateSensor)
    }

    fn trigger_measurement(&mut self) -> Result<(), PeripheralError> {
        let t = elapsed_secs(self.start);
        // 20-26 C and 40-60 % on different periods
        self.temperature = 23.0 + 3.0 * (t * TAU / 120.0).sin();
        self.humidity = 50.0 + 10.0 * (t * TAU / 180.0).sin();
        Ok(())
    }

    fn last_temperature(&self) -> f32 {
        self.temperature
    }

    fn last_humidity(&self) -> f32 {
        self.humidity
    }
}

/// ADC channel following a sine wave around `center`.
pub struct SimAnalog {
    start: Instant,
    peripheral: Peripheral,
    fail: bool,
    center: f32,
    swing: f32,
    period_secs: f32,
}

impl SimAnalog {
    pub fn new(
        peripheral: Peripheral,
        fail: bool,
        center: u16,
        swing: u16,
        period_secs: f32,
    ) -> Self {
        Self {
            start: Instant::now(),
            peripheral,
            fail,
            center: f32::from(center),
            swing: f32::from(swing),
            period_secs,
        }
    }
}

impl AnalogInput for SimAnalog {
    fn init(&mut self) -> Result<(), PeripheralError> {
        init_result(self.fail, self.peripheral)
    }

    fn read_raw(&mut self) -> Result<u16, PeripheralError> {
        let t = elapsed_secs(self.start);
        let value = self.center + self.swing * (t * TAU / self.period_secs).sin();
        Ok(value.clamp(0.0, f32::from(u16::MAX)) as u16)
    }
}

/// Push-button that presses itself for a moment once every `period`.
pub struct SimButton {
    start: Instant,
    fail: bool,
    period: Duration,
    press_len: Duration,
}

impl SimButton {
    pub fn new(fail: bool, period: Duration) -> Self {
        Self {
            start: Instant::now(),
            fail,
            period,
            press_len: Duration::from_millis(120),
        }
    }
}

impl ErrorType for SimButton {
    type Error = ErrorKind;
}

impl InputPin for SimButton {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.fail {
            return Err(ErrorKind::Other);
        }
        let since = Instant::now().saturating_duration_since(self.start).as_millis();
        let phase = since % self.period.as_millis().max(1);
        // active low, and never pressed during the first period
        Ok(since < self.period.as_millis() || phase >= self.press_len.as_millis())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// In-memory file system.
pub struct SimStorage {
    files: BTreeMap<String, Vec<u8>>,
    fail: bool,
}

impl SimStorage {
    pub fn new(fail: bool) -> Self {
        Self {
            files: BTreeMap::new(),
            fail,
        }
    }
}

fn not_found(operation: &'static str) -> PeripheralError {
    PeripheralError::OperationFailed {
        peripheral: "SD Card",
        operation,
        details: "file not found",
    }
}

impl FileStorage for SimStorage {
    fn init(&mut self) -> Result<(), PeripheralError> {
        init_result(self.fail, Peripheral::Storage)
    }

    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<(), PeripheralError> {
        self.files.insert(path.to_owned(), data.to_vec());
        Ok(())
    }

    fn read_file(&mut self, path: &str, buf: &mut [u8]) -> Result<usize, PeripheralError> {
        let data = self.files.get(path).ok_or(not_found("read"))?;
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }

    fn delete_file(&mut self, path: &str) -> Result<(), PeripheralError> {
        self.files.remove(path).map(|_| ()).ok_or(not_found("delete"))
    }
}
