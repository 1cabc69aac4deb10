//! The set of peripheral handles the harness drives

use crate::outputs::{Buzzer, RgbLed};

/// Every peripheral on the board, already constructed but not yet brought up.
///
/// The firmware fills this with real drivers, the simulator with simulated
/// ones. Handles whose hardware is missing still have to be provided; their
/// `init` simply fails and the harness leaves them alone afterwards.
pub struct Board<D, L, C, B, Z, R, A, T, S> {
    pub display: D,
    pub strip: L,
    pub climate: C,
    pub button: B,
    pub buzzer: Buzzer<Z>,
    pub rgb: RgbLed<R>,
    /// Light-dependent resistor
    pub light: A,
    /// Trim potentiometer
    pub trim: T,
    pub storage: S,
}
