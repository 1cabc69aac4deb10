//! Buzzer tones and RGB LED colors on top of raw PWM channels

use embassy_time::Duration;
use embedded_hal::delay::DelayNs;

use super::PwmOutput;
use crate::app_state::PeripheralError;
use crate::color::Rgb8;
use crate::config::Tone;
use crate::time::sleep;

/// Map an 8-bit color channel onto the full 16-bit duty range.
pub const fn duty_from_channel(channel: u8) -> u16 {
    // 65535 / 255 == 257 exactly
    channel as u16 * 257
}

/// A passive buzzer driven by one PWM channel.
pub struct Buzzer<Z> {
    channel: Z,
    tone_duty: u16,
}

impl<Z: PwmOutput> Buzzer<Z> {
    pub fn new(channel: Z, tone_duty: u16) -> Self {
        Self { channel, tone_duty }
    }

    /// Program the idle frequency and silence the output.
    pub fn init(&mut self, idle_hz: u32) -> Result<(), PeripheralError> {
        self.channel.init()?;
        self.channel.set_frequency(idle_hz)?;
        self.channel.set_duty(0)
    }

    /// Sound `tone` and block until it is over.
    pub fn play<Y: DelayNs>(&mut self, tone: Tone, delay: &mut Y) -> Result<(), PeripheralError> {
        self.channel.set_frequency(tone.frequency_hz)?;
        self.channel.set_duty(self.tone_duty)?;
        sleep(delay, tone.duration);
        self.channel.set_duty(0)
    }

    pub fn silence(&mut self) -> Result<(), PeripheralError> {
        self.channel.set_duty(0)
    }
}

/// A common-cathode RGB LED on three PWM channels.
pub struct RgbLed<R> {
    red: R,
    green: R,
    blue: R,
}

impl<R: PwmOutput> RgbLed<R> {
    pub fn new(red: R, green: R, blue: R) -> Self {
        Self { red, green, blue }
    }

    /// Bring up all three channels at `idle_hz` and switch the LED off.
    pub fn init(&mut self, idle_hz: u32) -> Result<(), PeripheralError> {
        for channel in [&mut self.red, &mut self.green, &mut self.blue] {
            channel.init()?;
            channel.set_frequency(idle_hz)?;
        }
        self.set_color(Rgb8::OFF)
    }

    pub fn set_color(&mut self, color: Rgb8) -> Result<(), PeripheralError> {
        self.red.set_duty(duty_from_channel(color.r))?;
        self.green.set_duty(duty_from_channel(color.g))?;
        self.blue.set_duty(duty_from_channel(color.b))
    }

    /// Show `color` for `duration`, then switch off.
    pub fn flash<Y: DelayNs>(
        &mut self,
        color: Rgb8,
        duration: Duration,
        delay: &mut Y,
    ) -> Result<(), PeripheralError> {
        self.set_color(color)?;
        sleep(delay, duration);
        self.set_color(Rgb8::OFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeTime, MockPwm};

    #[test]
    fn test_duty_from_channel_spans_full_range() {
        assert_eq!(duty_from_channel(0), 0);
        assert_eq!(duty_from_channel(255), 65535);
        assert_eq!(duty_from_channel(128), 32896);
    }

    #[test]
    fn test_tone_is_silenced_after_duration() {
        let time = FakeTime::new();
        let pwm = MockPwm::new();
        let mut buzzer = Buzzer::new(pwm.clone(), 32768);
        buzzer.init(1000).unwrap();
        buzzer.play(Tone::new(1500, 200), &mut time.delay()).unwrap();

        assert_eq!(pwm.frequency(), 1500);
        assert_eq!(pwm.duties(), vec![0, 32768, 0]);
        assert_eq!(time.now_ms(), 200);
    }

    #[test]
    fn test_rgb_color_maps_to_duties() {
        let (r, g, b) = (MockPwm::new(), MockPwm::new(), MockPwm::new());
        let mut led = RgbLed::new(r.clone(), g.clone(), b.clone());
        led.init(1000).unwrap();
        led.set_color(Rgb8::new(255, 0, 128)).unwrap();

        assert_eq!(r.duty(), 65535);
        assert_eq!(g.duty(), 0);
        assert_eq!(b.duty(), 32896);
        assert_eq!(r.frequency(), 1000);
    }

    #[test]
    fn test_rgb_init_fails_when_a_channel_fails() {
        let green = MockPwm::new();
        green.fail_init();
        let mut led = RgbLed::new(MockPwm::new(), green, MockPwm::new());
        assert!(led.init(1000).is_err());
    }
}
