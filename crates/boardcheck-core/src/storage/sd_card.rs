use core::fmt::Debug;

use embedded_sdmmc::{BlockDevice, Mode, TimeSource, Timestamp, VolumeIdx, VolumeManager};
use log::{debug, error, info};

use super::FileStorage;
use crate::app_state::PeripheralError;

/// Timestamp source for boards without a real-time clock.
///
/// Every file gets the same creation and modification date.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedTimeSource;

impl TimeSource for FixedTimeSource {
    fn get_timestamp(&self) -> Timestamp {
        // 2024-01-01 00:00:00
        Timestamp {
            year_since_1970: 54,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }
}

/// Files in the root directory of the first FAT volume.
///
/// Every operation opens and closes the volume so no handle outlives a call.
pub struct SdCardStorage<D, T>
where
    D: BlockDevice,
    T: TimeSource,
{
    volume_mgr: VolumeManager<D, T, 4, 4, 1>,
}

fn sd_error<E: Debug>(operation: &'static str, e: embedded_sdmmc::Error<E>) -> PeripheralError {
    error!("SD card {} failed: {:?}", operation, e);
    PeripheralError::OperationFailed {
        peripheral: "SD Card",
        operation,
        details: "filesystem error",
    }
}

impl<D, T> SdCardStorage<D, T>
where
    D: BlockDevice,
    T: TimeSource,
{
    pub fn new(device: D, ts: T) -> Self {
        Self {
            volume_mgr: VolumeManager::new(device, ts),
        }
    }
}

impl<D, T> FileStorage for SdCardStorage<D, T>
where
    D: BlockDevice,
    T: TimeSource,
{
    fn init(&mut self) -> Result<(), PeripheralError> {
        let volume0 = self.volume_mgr.open_volume(VolumeIdx(0)).map_err(|e| {
            error!("SD card mount failed: {:?}", e);
            PeripheralError::InitializationFailed {
                peripheral: "SD Card",
                details: "no FAT volume found",
            }
        })?;
        volume0.close().map_err(|e| sd_error("close volume", e))?;
        info!("SD card mounted");
        Ok(())
    }

    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<(), PeripheralError> {
        let volume0 = self
            .volume_mgr
            .open_volume(VolumeIdx(0))
            .map_err(|e| sd_error("open volume", e))?;
        let root_dir = volume0
            .open_root_dir()
            .map_err(|e| sd_error("open root", e))?;
        let file = root_dir
            .open_file_in_dir(path, Mode::ReadWriteCreateOrTruncate)
            .map_err(|e| sd_error("open for write", e))?;

        file.write(data).map_err(|e| sd_error("write", e))?;

        file.close().map_err(|e| sd_error("close file", e))?;
        root_dir.close().map_err(|e| sd_error("close root", e))?;
        volume0.close().map_err(|e| sd_error("close volume", e))?;
        debug!("SD card: wrote {} bytes to {}", data.len(), path);
        Ok(())
    }

    fn read_file(&mut self, path: &str, buf: &mut [u8]) -> Result<usize, PeripheralError> {
        let volume0 = self
            .volume_mgr
            .open_volume(VolumeIdx(0))
            .map_err(|e| sd_error("open volume", e))?;
        let root_dir = volume0
            .open_root_dir()
            .map_err(|e| sd_error("open root", e))?;
        let file = root_dir
            .open_file_in_dir(path, Mode::ReadOnly)
            .map_err(|e| sd_error("open for read", e))?;

        let mut total = 0;
        while total < buf.len() {
            let read = file
                .read(&mut buf[total..])
                .map_err(|e| sd_error("read", e))?;
            if read == 0 {
                break;
            }
            total += read;
        }

        file.close().map_err(|e| sd_error("close file", e))?;
        root_dir.close().map_err(|e| sd_error("close root", e))?;
        volume0.close().map_err(|e| sd_error("close volume", e))?;
        Ok(total)
    }

    fn delete_file(&mut self, path: &str) -> Result<(), PeripheralError> {
        let volume0 = self
            .volume_mgr
            .open_volume(VolumeIdx(0))
            .map_err(|e| sd_error("open volume", e))?;
        let root_dir = volume0
            .open_root_dir()
            .map_err(|e| sd_error("open root", e))?;

        root_dir
            .delete_file_in_dir(path)
            .map_err(|e| sd_error("delete", e))?;

        root_dir.close().map_err(|e| sd_error("close root", e))?;
        volume0.close().map_err(|e| sd_error("close volume", e))?;
        Ok(())
    }
}
