//! Page cursor and periodic job timestamps owned by the main loop

use crate::config::HarnessConfig;
use crate::input::Debouncer;
use crate::pages::PageId;
use crate::scheduler::Periodic;

/// UI and scheduling state created at startup and only touched by the main
/// loop's jobs.
#[derive(Debug, Clone)]
pub struct UiState {
    pub page: PageId,
    /// Accepted button presses
    pub button: Debouncer,
    /// Last display redraw
    pub display: Periodic,
    /// Last animation frame
    pub animation: Periodic,
    /// Rainbow phase in degrees, always below 360
    pub phase: u16,
}

impl UiState {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            page: PageId::Status,
            button: Debouncer::new(config.debounce_window),
            display: Periodic::new(config.display_refresh),
            animation: Periodic::new(config.animation_interval),
            phase: 0,
        }
    }
}
