//! File storage capability and the SD card implementation

pub mod sd_card;

pub use sd_card::{FixedTimeSource, SdCardStorage};

use crate::app_state::PeripheralError;

/// Whole-file access to a flat filesystem.
pub trait FileStorage {
    /// Mount the filesystem and check it is readable.
    fn init(&mut self) -> Result<(), PeripheralError>;

    /// Create or truncate `path` and write `data` to it.
    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<(), PeripheralError>;

    /// Read `path` into `buf`. Returns the number of bytes read, at most
    /// `buf.len()`.
    fn read_file(&mut self, path: &str, buf: &mut [u8]) -> Result<usize, PeripheralError>;

    fn delete_file(&mut self, path: &str) -> Result<(), PeripheralError>;
}
