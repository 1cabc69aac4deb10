//! Monotonic time source used by the scheduler

use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;

/// A monotonic clock.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Clock backed by the embassy time driver of the running platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Block for `duration` on any `DelayNs` implementation.
pub fn sleep<Y: DelayNs>(delay: &mut Y, duration: Duration) {
    let micros = duration.as_micros().min(u32::MAX as u64) as u32;
    delay.delay_us(micros);
}
