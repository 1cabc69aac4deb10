//! Application-wide state and error types for boardcheck

mod registry;
mod ui_state;

pub use registry::*;
pub use ui_state::*;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use thiserror_no_std::Error;

/// Why the main loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// An operator or the host asked the harness to stop
    Requested,
    /// The button was held for the configured stop time
    LongPress,
}

/// Signal polled by the main loop once per iteration.
pub type StopSignal = Signal<CriticalSectionRawMutex, StopReason>;

/// Failure of a single peripheral operation.
///
/// Drivers log the underlying bus error where it occurs and return one of
/// these, so the value is `Copy` and can be kept in the registry as the last
/// failure of a peripheral.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralError {
    #[error("{peripheral}: initialization failed ({details})")]
    InitializationFailed {
        peripheral: &'static str,
        details: &'static str,
    },
    #[error("{peripheral}: {operation} failed ({details})")]
    OperationFailed {
        peripheral: &'static str,
        operation: &'static str,
        details: &'static str,
    },
    #[error("{peripheral}: verification failed ({details})")]
    VerificationFailed {
        peripheral: &'static str,
        details: &'static str,
    },
}

/// Transient faults inside one main loop iteration.
///
/// These are not tied to a peripheral; the loop logs them, backs off and
/// carries on.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppError {
    #[error("text did not fit its buffer")]
    Format,
    #[error("too many lines for one frame")]
    FrameFull,
}

impl From<core::fmt::Error> for AppError {
    fn from(_: core::fmt::Error) -> Self {
        AppError::Format
    }
}
