//! Fake time and recording peripherals for host tests.
//!
//! Every mock is a cheap handle around shared state: clone it, hand one copy
//! to the code under test and keep the other to inspect what happened or to
//! inject failures. All clocks and delays made from one [`FakeTime`] share a
//! single timeline, so sleeping through a [`FakeDelay`] moves the
//! [`FakeClock`] forward.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use embassy_time::{Duration, Instant};
use embedded_graphics::prelude::Point;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin};

use crate::app_state::PeripheralError;
use crate::board::Board;
use crate::color::Rgb8;
use crate::config::HarnessConfig;
use crate::harness::Harness;
use crate::outputs::{Buzzer, LedStrip, PwmOutput, RgbLed};
use crate::sensors::{AnalogInput, ClimateSensor};
use crate::storage::FileStorage;
use crate::ui::TextDisplay;

const fn init_error(peripheral: &'static str) -> PeripheralError {
    PeripheralError::InitializationFailed {
        peripheral,
        details: "injected failure",
    }
}

const fn op_error(peripheral: &'static str, operation: &'static str) -> PeripheralError {
    PeripheralError::OperationFailed {
        peripheral,
        operation,
        details: "injected failure",
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct FakeTime {
    micros: Rc<Cell<u64>>,
}

impl FakeTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.micros.set(self.micros.get() + duration.as_micros());
    }

    pub fn now(&self) -> Instant {
        Instant::from_micros(self.micros.get())
    }

    pub fn now_ms(&self) -> u64 {
        self.micros.get() / 1_000
    }

    pub fn clock(&self) -> FakeClock {
        FakeClock(self.clone())
    }

    pub fn delay(&self) -> FakeDelay {
        FakeDelay(self.clone())
    }
}

#[derive(Clone)]
pub struct FakeClock(FakeTime);

impl crate::time::Clock for FakeClock {
    fn now(&self) -> Instant {
        self.0.now()
    }
}

/// Sleeping advances the shared timeline instead of blocking.
#[derive(Clone)]
pub struct FakeDelay(FakeTime);

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance(Duration::from_micros(ns.div_ceil(1_000) as u64));
    }

    fn delay_us(&mut self, us: u32) {
        self.0.advance(Duration::from_micros(us as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.advance(Duration::from_millis(ms as u64));
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

#[derive(Default)]
struct DisplayState {
    fail_init: bool,
    fail_draw: bool,
    pending: Vec<(String, Point)>,
    frames: Vec<Vec<(String, Point)>>,
}

#[derive(Clone, Default)]
pub struct MockDisplay(Rc<RefCell<DisplayState>>);

impl MockDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_init(&self) {
        self.0.borrow_mut().fail_init = true;
    }

    pub fn fail_draws(&self) {
        self.0.borrow_mut().fail_draw = true;
    }

    /// Number of committed frames
    pub fn commits(&self) -> usize {
        self.0.borrow().frames.len()
    }

    /// Text of every line of the last committed frame
    pub fn last_frame(&self) -> Vec<String> {
        self.0
            .borrow()
            .frames
            .last()
            .map(|f| f.iter().map(|(text, _)| text.clone()).collect())
            .unwrap_or_default()
    }

    /// Whether any committed frame contained `text`
    pub fn showed(&self, text: &str) -> bool {
        self.0
            .borrow()
            .frames
            .iter()
            .any(|f| f.iter().any(|(t, _)| t == text))
    }
}

impl TextDisplay for MockDisplay {
    fn init(&mut self) -> Result<(), PeripheralError> {
        if self.0.borrow().fail_init {
            return Err(init_error("OLED"));
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PeripheralError> {
        self.0.borrow_mut().pending.clear();
        Ok(())
    }

    fn draw_text(&mut self, text: &str, position: Point) -> Result<(), PeripheralError> {
        let mut state = self.0.borrow_mut();
        if state.fail_draw {
            return Err(op_error("OLED", "draw_text"));
        }
        state.pending.push((text.to_string(), position));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), PeripheralError> {
        let mut state = self.0.borrow_mut();
        let frame = core::mem::take(&mut state.pending);
        state.frames.push(frame);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LED strip
// ---------------------------------------------------------------------------

struct StripState {
    pixels: Vec<Rgb8>,
    committed: Vec<Vec<Rgb8>>,
    fail_init: bool,
    fail_commit: bool,
}

#[derive(Clone)]
pub struct MockStrip(Rc<RefCell<StripState>>);

impl MockStrip {
    pub fn new(len: usize) -> Self {
        Self(Rc::new(RefCell::new(StripState {
            pixels: vec![Rgb8::OFF; len],
            committed: Vec::new(),
            fail_init: false,
            fail_commit: false,
        })))
    }

    pub fn fail_init(&self) {
        self.0.borrow_mut().fail_init = true;
    }

    pub fn fail_commits(&self) {
        self.0.borrow_mut().fail_commit = true;
    }

    pub fn commits(&self) -> usize {
        self.0.borrow().committed.len()
    }

    pub fn last_commit(&self) -> Vec<Rgb8> {
        self.0.borrow().committed.last().cloned().unwrap_or_default()
    }
}

impl LedStrip for MockStrip {
    fn init(&mut self) -> Result<(), PeripheralError> {
        if self.0.borrow().fail_init {
            return Err(init_error("WS2812B"));
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.0.borrow().pixels.len()
    }

    fn set_pixel(&mut self, index: usize, color: Rgb8) -> Result<(), PeripheralError> {
        let mut state = self.0.borrow_mut();
        let pixel = state
            .pixels
            .get_mut(index)
            .ok_or(op_error("WS2812B", "set_pixel"))?;
        *pixel = color;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), PeripheralError> {
        let mut state = self.0.borrow_mut();
        if state.fail_commit {
            return Err(op_error("WS2812B", "commit"));
        }
        let frame = state.pixels.clone();
        state.committed.push(frame);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PWM
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PwmState {
    frequencies: Vec<u32>,
    duties: Vec<u16>,
    fail_init: bool,
    fail_duty: bool,
}

#[derive(Clone, Default)]
pub struct MockPwm(Rc<RefCell<PwmState>>);

impl MockPwm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_init(&self) {
        self.0.borrow_mut().fail_init = true;
    }

    pub fn fail_duty(&self) {
        self.0.borrow_mut().fail_duty = true;
    }

    /// Current frequency, 0 if never set
    pub fn frequency(&self) -> u32 {
        self.0.borrow().frequencies.last().copied().unwrap_or(0)
    }

    /// Every frequency set so far, oldest first
    pub fn frequencies(&self) -> Vec<u32> {
        self.0.borrow().frequencies.clone()
    }

    /// Every duty written so far, oldest first
    pub fn duties(&self) -> Vec<u16> {
        self.0.borrow().duties.clone()
    }

    /// Current duty, 0 if never written
    pub fn duty(&self) -> u16 {
        self.0.borrow().duties.last().copied().unwrap_or(0)
    }
}

impl PwmOutput for MockPwm {
    fn init(&mut self) -> Result<(), PeripheralError> {
        if self.0.borrow().fail_init {
            return Err(init_error("PWM"));
        }
        Ok(())
    }

    fn set_frequency(&mut self, hz: u32) -> Result<(), PeripheralError> {
        self.0.borrow_mut().frequencies.push(hz);
        Ok(())
    }

    fn set_duty(&mut self, duty: u16) -> Result<(), PeripheralError> {
        let mut state = self.0.borrow_mut();
        if state.fail_duty {
            return Err(op_error("PWM", "set_duty"));
        }
        state.duties.push(duty);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

#[derive(Default)]
struct AnalogState {
    value: u16,
    reads: usize,
    fail_init: bool,
    fail_read: bool,
}

#[derive(Clone, Default)]
pub struct MockAnalog(Rc<RefCell<AnalogState>>);

impl MockAnalog {
    pub fn new(value: u16) -> Self {
        let analog = Self::default();
        analog.set(value);
        analog
    }

    pub fn set(&self, value: u16) {
        self.0.borrow_mut().value = value;
    }

    pub fn fail_init(&self) {
        self.0.borrow_mut().fail_init = true;
    }

    pub fn fail_reads(&self) {
        self.0.borrow_mut().fail_read = true;
    }

    pub fn reads(&self) -> usize {
        self.0.borrow().reads
    }
}

impl AnalogInput for MockAnalog {
    fn init(&mut self) -> Result<(), PeripheralError> {
        if self.0.borrow().fail_init {
            return Err(init_error("ADC"));
        }
        Ok(())
    }

    fn read_raw(&mut self) -> Result<u16, PeripheralError> {
        let mut state = self.0.borrow_mut();
        state.reads += 1;
        if state.fail_read {
            return Err(op_error("ADC", "read"));
        }
        Ok(state.value)
    }
}

struct ClimateState {
    temperature: f32,
    humidity: f32,
    last: Option<(f32, f32)>,
    triggered_at: Vec<u64>,
    fail_init: bool,
    fail_read: bool,
}

#[derive(Clone)]
pub struct MockClimate {
    state: Rc<RefCell<ClimateState>>,
    time: FakeTime,
}

impl MockClimate {
    pub fn new(time: &FakeTime, temperature: f32, humidity: f32) -> Self {
        Self {
            state: Rc::new(RefCell::new(ClimateState {
                temperature,
                humidity,
                last: None,
                triggered_at: Vec::new(),
                fail_init: false,
                fail_read: false,
            })),
            time: time.clone(),
        }
    }

    pub fn fail_init(&self) {
        self.state.borrow_mut().fail_init = true;
    }

    pub fn fail_reads(&self) {
        self.state.borrow_mut().fail_read = true;
    }

    /// Timeline milliseconds of every measurement request
    pub fn triggered_at(&self) -> Vec<u64> {
        self.state.borrow().triggered_at.clone()
    }
}

impl ClimateSensor for MockClimate {
    fn init(&mut self) -> Result<(), PeripheralError> {
        if self.state.borrow().fail_init {
            return Err(init_error("DHT22"));
        }
        Ok(())
    }

    fn trigger_measurement(&mut self) -> Result<(), PeripheralError> {
        let mut state = self.state.borrow_mut();
        state.triggered_at.push(self.time.now_ms());
        if state.fail_read {
            return Err(op_error("DHT22", "read"));
        }
        state.last = Some((state.temperature, state.humidity));
        Ok(())
    }

    fn last_temperature(&self) -> f32 {
        self.state.borrow().last.map_or(0.0, |(t, _)| t)
    }

    fn last_humidity(&self) -> f32 {
        self.state.borrow().last.map_or(0.0, |(_, h)| h)
    }
}

// ---------------------------------------------------------------------------
// Button
// ---------------------------------------------------------------------------

struct ButtonState {
    high: bool,
    fail: bool,
    reads: usize,
    press_after: Option<usize>,
}

/// Active-low push button. Released (high) until [`MockButton::press`].
#[derive(Clone)]
pub struct MockButton(Rc<RefCell<ButtonState>>);

impl MockButton {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(ButtonState {
            high: true,
            fail: false,
            reads: 0,
            press_after: None,
        })))
    }

    pub fn press(&self) {
        self.0.borrow_mut().high = false;
    }

    pub fn release(&self) {
        self.0.borrow_mut().high = true;
    }

    pub fn fail_reads(&self) {
        self.0.borrow_mut().fail = true;
    }

    /// Read high for the next `reads` reads, then held down for good.
    pub fn press_after(&self, reads: usize) {
        let mut state = self.0.borrow_mut();
        state.press_after = Some(state.reads + reads);
    }

    pub fn reads(&self) -> usize {
        self.0.borrow().reads
    }
}

impl ErrorType for MockButton {
    type Error = ErrorKind;
}

impl InputPin for MockButton {
    fn is_high(&mut self) -> Result<bool, ErrorKind> {
        let mut state = self.0.borrow_mut();
        let read = state.reads;
        state.reads += 1;
        if state.fail {
            return Err(ErrorKind::Other);
        }
        if state.press_after.is_some_and(|at| read >= at) {
            return Ok(false);
        }
        Ok(state.high)
    }

    fn is_low(&mut self) -> Result<bool, ErrorKind> {
        self.is_high().map(|high| !high)
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StorageState {
    files: HashMap<String, Vec<u8>>,
    deletes: usize,
    fail_init: bool,
    fail_write: bool,
    fail_read: bool,
    fail_delete: bool,
    corrupt: bool,
}

#[derive(Clone, Default)]
pub struct MockStorage(Rc<RefCell<StorageState>>);

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_init(&self) {
        self.0.borrow_mut().fail_init = true;
    }

    pub fn fail_writes(&self) {
        self.0.borrow_mut().fail_write = true;
    }

    pub fn fail_reads(&self) {
        self.0.borrow_mut().fail_read = true;
    }

    pub fn fail_deletes(&self) {
        self.0.borrow_mut().fail_delete = true;
    }

    /// Reads return garbage instead of the stored content.
    pub fn corrupt_reads(&self) {
        self.0.borrow_mut().corrupt = true;
    }

    pub fn exists(&self, path: &str) -> bool {
        self.0.borrow().files.contains_key(path)
    }

    pub fn deletes(&self) -> usize {
        self.0.borrow().deletes
    }
}

impl FileStorage for MockStorage {
    fn init(&mut self) -> Result<(), PeripheralError> {
        if self.0.borrow().fail_init {
            return Err(init_error("SD Card"));
        }
        Ok(())
    }

    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<(), PeripheralError> {
        let mut state = self.0.borrow_mut();
        if state.fail_write {
            return Err(op_error("SD Card", "write"));
        }
        state.files.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn read_file(&mut self, path: &str, buf: &mut [u8]) -> Result<usize, PeripheralError> {
        let state = self.0.borrow();
        if state.fail_read {
            return Err(op_error("SD Card", "read"));
        }
        let data = state
            .files
            .get(path)
            .ok_or(op_error("SD Card", "open for read"))?;
        let len = data.len().min(buf.len());
        if state.corrupt {
            buf[..len].fill(b'?');
        } else {
            buf[..len].copy_from_slice(&data[..len]);
        }
        Ok(len)
    }

    fn delete_file(&mut self, path: &str) -> Result<(), PeripheralError> {
        let mut state = self.0.borrow_mut();
        state.deletes += 1;
        if state.fail_delete {
            return Err(op_error("SD Card", "delete"));
        }
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or(op_error("SD Card", "delete"))
    }
}

// ---------------------------------------------------------------------------
// Whole board
// ---------------------------------------------------------------------------

pub type TestBoard = Board<
    MockDisplay,
    MockStrip,
    MockClimate,
    MockButton,
    MockPwm,
    MockPwm,
    MockAnalog,
    MockAnalog,
    MockStorage,
>;

pub type TestHarness = Harness<
    MockDisplay,
    MockStrip,
    MockClimate,
    MockButton,
    MockPwm,
    MockPwm,
    MockAnalog,
    MockAnalog,
    MockStorage,
    FakeClock,
    FakeDelay,
>;

/// One set of mock peripherals plus the handles to inspect them.
pub struct Bench {
    pub time: FakeTime,
    pub display: MockDisplay,
    pub strip: MockStrip,
    pub climate: MockClimate,
    pub button: MockButton,
    pub buzzer: MockPwm,
    pub red: MockPwm,
    pub green: MockPwm,
    pub blue: MockPwm,
    pub light: MockAnalog,
    pub trim: MockAnalog,
    pub storage: MockStorage,
}

impl Bench {
    pub fn new() -> Self {
        let time = FakeTime::new();
        Self {
            display: MockDisplay::new(),
            strip: MockStrip::new(10),
            climate: MockClimate::new(&time, 21.5, 40.0),
            button: MockButton::new(),
            buzzer: MockPwm::new(),
            red: MockPwm::new(),
            green: MockPwm::new(),
            blue: MockPwm::new(),
            light: MockAnalog::new(32767),
            trim: MockAnalog::new(65535),
            storage: MockStorage::new(),
            time,
        }
    }

    pub fn board(&self, config: &HarnessConfig) -> TestBoard {
        Board {
            display: self.display.clone(),
            strip: self.strip.clone(),
            climate: self.climate.clone(),
            button: self.button.clone(),
            buzzer: Buzzer::new(self.buzzer.clone(), config.tone_duty),
            rgb: RgbLed::new(self.red.clone(), self.green.clone(), self.blue.clone()),
            light: self.light.clone(),
            trim: self.trim.clone(),
            storage: self.storage.clone(),
        }
    }

    pub fn harness(&self, config: HarnessConfig) -> TestHarness {
        Harness::new(
            self.board(&config),
            self.time.clock(),
            self.time.delay(),
            config,
        )
    }
}
