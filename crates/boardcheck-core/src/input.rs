//! Push-button input and debouncing
//!
//! The button is active-low: it reads electrically low while pressed. A
//! press is accepted only when more than the debounce window has passed since
//! the last accepted press, so contact chatter inside the window is absorbed
//! entirely. There is no separate release detection.

use embassy_time::{Duration, Instant};
use embedded_hal::digital::{Error as _, InputPin};
use log::error;

use crate::app_state::PeripheralError;
use crate::scheduler::Periodic;

/// A digital input pin. `read` returns the electrical level (`true` = high).
pub trait DigitalInput {
    /// Configure the pin. Pins handed over already configured need nothing.
    fn init(&mut self) -> Result<(), PeripheralError> {
        Ok(())
    }

    fn read(&mut self) -> Result<bool, PeripheralError>;
}

impl<P: InputPin> DigitalInput for P {
    fn read(&mut self) -> Result<bool, PeripheralError> {
        self.is_high().map_err(|e| {
            error!("Button pin read failed: {:?}", e.kind());
            PeripheralError::OperationFailed {
                peripheral: "Button",
                operation: "read",
                details: "GPIO read error",
            }
        })
    }
}

/// Edge plus time-window debouncer for an active-low button.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Periodic,
    held_since: Option<Instant>,
}

impl Debouncer {
    pub const fn new(window: Duration) -> Self {
        Self {
            window: Periodic::new(window),
            held_since: None,
        }
    }

    /// Feed one sample of the pin level. Returns `true` when a press is
    /// accepted.
    pub fn sample(&mut self, level_high: bool, now: Instant) -> bool {
        let active = !level_high;
        if !active {
            self.held_since = None;
            return false;
        }
        if self.held_since.is_none() {
            self.held_since = Some(now);
        }
        self.window.poll(now)
    }

    /// How long the button has been held without a high sample in between.
    pub fn held_for(&self, now: Instant) -> Option<Duration> {
        self.held_since
            .map(|since| now.saturating_duration_since(since))
    }

    pub fn last_accepted(&self) -> Option<Instant> {
        self.window.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOW: bool = false;
    const HIGH: bool = true;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn debouncer() -> Debouncer {
        Debouncer::new(Duration::from_millis(200))
    }

    #[test]
    fn test_released_button_is_never_accepted() {
        let mut d = debouncer();
        assert!(!d.sample(HIGH, at(1000)));
        assert_eq!(d.last_accepted(), None);
    }

    #[test]
    fn test_presses_inside_window_count_once() {
        let mut d = debouncer();
        assert!(d.sample(LOW, at(1000)));
        assert!(!d.sample(HIGH, at(1050)));
        assert!(!d.sample(LOW, at(1100)));
        assert!(!d.sample(LOW, at(1200)));
        assert_eq!(d.last_accepted(), Some(at(1000)));
    }

    #[test]
    fn test_presses_outside_window_count_twice() {
        let mut d = debouncer();
        assert!(d.sample(LOW, at(1000)));
        assert!(!d.sample(HIGH, at(1100)));
        assert!(d.sample(LOW, at(1201)));
        assert_eq!(d.last_accepted(), Some(at(1201)));
    }

    #[test]
    fn test_hold_duration_resets_on_release() {
        let mut d = debouncer();
        d.sample(LOW, at(0));
        d.sample(LOW, at(2500));
        assert_eq!(d.held_for(at(3000)), Some(Duration::from_millis(3000)));
        d.sample(HIGH, at(3100));
        assert_eq!(d.held_for(at(3200)), None);
    }

    struct Pin(bool);

    impl embedded_hal::digital::ErrorType for Pin {
        type Error = core::convert::Infallible;
    }

    impl InputPin for Pin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.0)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.0)
        }
    }

    #[test]
    fn test_any_input_pin_is_a_digital_input() {
        let mut pin = Pin(true);
        assert_eq!(DigitalInput::read(&mut pin), Ok(true));
        pin.0 = false;
        assert_eq!(DigitalInput::read(&mut pin), Ok(false));
        assert_eq!(DigitalInput::init(&mut pin), Ok(()));
    }
}
