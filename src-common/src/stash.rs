//! Volume stash used to restore levels after a mute/unmute cycle.
//!
//! Muting zeroes a device's volume, so the previous level is parked here keyed
//! by device ID and consumed by the next unmute. An entry is removed when it is
//! taken; nothing guards against two processes racing on the same device.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::AudioError;
use crate::types::DeviceId;

/// Key-value store from device ID to the last linear volume level.
pub trait VolumeStash {
    /// Remember `level` for `device`, replacing any earlier entry.
    fn store(&self, device: DeviceId, level: f32) -> Result<(), AudioError>;

    /// Remove and return the entry for `device`.
    fn take(&self, device: DeviceId) -> Result<Option<f32>, AudioError>;

    /// Whether an entry for `device` is waiting to be restored.
    fn contains(&self, device: DeviceId) -> Result<bool, AudioError>;
}

/// One text file per device in a directory (the system temp dir by default).
#[derive(Debug, Clone)]
pub struct FileVolumeStash {
    dir: PathBuf,
}

impl FileVolumeStash {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, device: DeviceId) -> PathBuf {
        self.dir.join(format!("audio_manager_volume_{}.txt", device))
    }
}

impl VolumeStash for FileVolumeStash {
    fn store(&self, device: DeviceId, level: f32) -> Result<(), AudioError> {
        let path = self.path_for(device);
        // Write then rename so a reader never sees a half-written value.
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, level.to_string())?;
        std::fs::rename(&tmp, &path)?;
        tracing::debug!("Stashed volume {} for device {} at {:?}", level, device, path);
        Ok(())
    }

    fn take(&self, device: DeviceId) -> Result<Option<f32>, AudioError> {
        let path = self.path_for(device);
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        std::fs::remove_file(&path)?;

        match contents.trim().parse::<f32>() {
            Ok(level) if level.is_finite() => {
                tracing::debug!("Restoring stashed volume {} for device {}", level, device);
                Ok(Some(level))
            }
            _ => {
                tracing::warn!(
                    "Discarding unreadable volume stash {:?}: {:?}",
                    path,
                    contents.trim()
                );
                Ok(None)
            }
        }
    }

    fn contains(&self, device: DeviceId) -> Result<bool, AudioError> {
        Ok(self.path_for(device).try_exists()?)
    }
}

/// In-process stash, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryVolumeStash {
    entries: RefCell<HashMap<DeviceId, f32>>,
}

impl MemoryVolumeStash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Peek at an entry without consuming it.
    pub fn get(&self, device: DeviceId) -> Option<f32> {
        self.entries.borrow().get(&device).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl VolumeStash for MemoryVolumeStash {
    fn store(&self, device: DeviceId, level: f32) -> Result<(), AudioError> {
        self.entries.borrow_mut().insert(device, level);
        Ok(())
    }

    fn take(&self, device: DeviceId) -> Result<Option<f32>, AudioError> {
        Ok(self.entries.borrow_mut().remove(&device))
    }

    fn contains(&self, device: DeviceId) -> Result<bool, AudioError> {
        Ok(self.entries.borrow().contains_key(&device))
    }
}
