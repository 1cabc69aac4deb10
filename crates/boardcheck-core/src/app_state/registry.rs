//! Per-peripheral health and last known measurements
//!
//! The [`Registry`] is the single shared record of what works on the board.
//! It is owned by the harness and lent to every component; nothing keeps a
//! private copy. Once a peripheral has failed it stays failed: the registry
//! has no way back to a usable state.

use log::{info, warn};

use super::PeripheralError;

/// Every peripheral the harness knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peripheral {
    Display,
    LedStrip,
    Storage,
    ClimateSensor,
    Button,
    Buzzer,
    LightSensor,
    Trimmer,
    RgbLed,
}

impl Peripheral {
    pub const COUNT: usize = 9;

    pub const ALL: [Peripheral; Self::COUNT] = [
        Peripheral::Display,
        Peripheral::LedStrip,
        Peripheral::Storage,
        Peripheral::ClimateSensor,
        Peripheral::Button,
        Peripheral::Buzzer,
        Peripheral::LightSensor,
        Peripheral::Trimmer,
        Peripheral::RgbLed,
    ];

    /// Name used in log records
    pub const fn label(self) -> &'static str {
        match self {
            Self::Display => "OLED",
            Self::LedStrip => "WS2812B",
            Self::Storage => "SD Card",
            Self::ClimateSensor => "DHT22",
            Self::Button => "Button",
            Self::Buzzer => "Buzzer",
            Self::LightSensor => "LDR",
            Self::Trimmer => "Trimmer",
            Self::RgbLed => "RGB LED",
        }
    }

    /// Name used on the status page
    pub const fn short_label(self) -> &'static str {
        match self {
            Self::Display => "OLED",
            Self::LedStrip => "LED",
            Self::Storage => "SD",
            Self::ClimateSensor => "DHT",
            Self::Button => "BTN",
            Self::Buzzer => "BUZ",
            Self::LightSensor => "LDR",
            Self::Trimmer => "POT",
            Self::RgbLed => "RGB",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Health of one peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Health {
    /// Bring-up has not been attempted yet
    #[default]
    Unknown,
    /// Brought up, waiting for the operator to prove it works
    Pending,
    /// Brought up and working
    Ok,
    /// Bring-up or a later operation failed
    Failed,
}

impl Health {
    /// Whether the peripheral may still be driven.
    pub const fn is_usable(self) -> bool {
        matches!(self, Self::Pending | Self::Ok)
    }

    /// Text shown on the status page
    pub const fn status_text(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Pending => "PRESS",
            Self::Unknown | Self::Failed => "FAIL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeripheralStatus {
    pub health: Health,
    /// Set once bring-up succeeded, never cleared
    pub brought_up: bool,
    pub last_error: Option<PeripheralError>,
}

impl PeripheralStatus {
    pub const fn available(&self) -> bool {
        matches!(self.health, Health::Ok)
    }
}

/// Last successful readings. Values are kept when a later read fails.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeasurementSet {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub light_raw: u16,
    pub trimmer_raw: u16,
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    statuses: [PeripheralStatus; Peripheral::COUNT],
    pub measurements: MeasurementSet,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, peripheral: Peripheral) -> &PeripheralStatus {
        &self.statuses[peripheral.index()]
    }

    pub fn health(&self, peripheral: Peripheral) -> Health {
        self.status(peripheral).health
    }

    /// `true` only for peripherals that initialized and passed every
    /// operation so far.
    pub fn is_available(&self, peripheral: Peripheral) -> bool {
        self.status(peripheral).available()
    }

    pub fn is_usable(&self, peripheral: Peripheral) -> bool {
        self.health(peripheral).is_usable()
    }

    pub fn was_brought_up(&self, peripheral: Peripheral) -> bool {
        self.status(peripheral).brought_up
    }

    /// Record a successful bring-up. Peripherals that need operator
    /// confirmation start out [`Health::Pending`].
    pub fn mark_brought_up(&mut self, peripheral: Peripheral, needs_confirmation: bool) {
        let status = &mut self.statuses[peripheral.index()];
        if status.health == Health::Failed {
            return;
        }
        status.brought_up = true;
        status.health = if needs_confirmation {
            Health::Pending
        } else {
            Health::Ok
        };
        info!("{}: OK", peripheral.label());
    }

    /// Promote a pending peripheral once it proved itself.
    pub fn confirm(&mut self, peripheral: Peripheral) {
        let status = &mut self.statuses[peripheral.index()];
        if status.health == Health::Pending {
            status.health = Health::Ok;
            info!("{}: confirmed", peripheral.label());
        }
    }

    /// Demote a peripheral for the rest of the run.
    pub fn mark_failed(&mut self, peripheral: Peripheral, error: PeripheralError) {
        let status = &mut self.statuses[peripheral.index()];
        status.health = Health::Failed;
        status.last_error = Some(error);
        warn!("{}: FAIL - {}", peripheral.label(), error);
    }

    /// Run `op` against a peripheral that is still usable.
    ///
    /// Returns `None` without calling `op` when the peripheral is not usable.
    /// An error from `op` demotes the peripheral and is not propagated.
    pub fn drive<T>(
        &mut self,
        peripheral: Peripheral,
        op: impl FnOnce() -> Result<T, PeripheralError>,
    ) -> Option<T> {
        if !self.is_usable(peripheral) {
            return None;
        }
        match op() {
            Ok(value) => Some(value),
            Err(error) => {
                self.mark_failed(peripheral, error);
                None
            }
        }
    }

    /// Number of peripherals currently OK, pending, and failed.
    pub fn summary(&self) -> (usize, usize, usize) {
        self.statuses
            .iter()
            .fold((0, 0, 0), |(ok, pending, failed), s| match s.health {
                Health::Ok => (ok + 1, pending, failed),
                Health::Pending => (ok, pending + 1, failed),
                Health::Unknown | Health::Failed => (ok, pending, failed + 1),
            })
    }
}
