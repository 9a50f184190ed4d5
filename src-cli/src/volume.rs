//! Volume and mute control with aggregate fan-out.
//!
//! Operations on an aggregate apply to each active sub-device that has
//! output channels; the aggregate's own controls are never touched. Muting
//! zeroes the volume (many devices have no real mute control) and parks the
//! previous level in a [`VolumeStash`] for the next unmute. A device without
//! a mute flag counts as muted while its level is stashed.

use ledfx_audio_common::{clamp_level, AudioError, DeviceId, VolumeStash};
use tracing::debug;

use crate::platform::{AudioHardware, ELEMENT_LEFT, ELEMENT_MAIN, ELEMENT_RIGHT, VOLUME_ELEMENTS};
use crate::query::DeviceQuery;

pub struct VolumeController<'a> {
    hardware: &'a dyn AudioHardware,
    stash: &'a dyn VolumeStash,
}

impl<'a> VolumeController<'a> {
    pub fn new(hardware: &'a dyn AudioHardware, stash: &'a dyn VolumeStash) -> Self {
        Self { hardware, stash }
    }

    fn query(&self) -> DeviceQuery<'a> {
        DeviceQuery::new(self.hardware)
    }

    /// Devices an operation on `device` applies to.
    fn targets(&self, device: DeviceId) -> Vec<DeviceId> {
        let query = self.query();
        if query.is_aggregate(device) {
            query
                .sub_devices(device)
                .into_iter()
                .filter(|&sub| query.has_output_channels(sub))
                .collect()
        } else {
            vec![device]
        }
    }

    /// Volume of a plain device: main element, else the louder stereo channel.
    fn device_volume(&self, device: DeviceId) -> Option<f32> {
        if let Some(level) = self.hardware.scalar_volume(device, ELEMENT_MAIN) {
            return Some(level);
        }
        [ELEMENT_LEFT, ELEMENT_RIGHT]
            .iter()
            .filter_map(|&element| self.hardware.scalar_volume(device, element))
            .reduce(f32::max)
    }

    /// Write `level` to the main, left and right elements. Devices commonly
    /// lack some of these, so individual failures are ignored.
    fn write_device_volume(&self, device: DeviceId, level: f32) {
        for element in VOLUME_ELEMENTS {
            if let Err(e) = self.hardware.set_scalar_volume(device, element, level) {
                debug!("Device {} element {}: {}", device, element, e);
            }
        }
    }

    fn device_muted(&self, device: DeviceId) -> bool {
        match self.hardware.mute(device) {
            Some(muted) => muted,
            None => self.stash.contains(device).unwrap_or(false),
        }
    }

    /// Current volume (0.0-1.0). For an aggregate, the loudest sub-device.
    pub fn get_volume(&self, device: DeviceId) -> Option<f32> {
        if self.query().is_aggregate(device) {
            let loudest = self
                .targets(device)
                .into_iter()
                .filter_map(|sub| self.device_volume(sub))
                .fold(0.0f32, f32::max);
            Some(loudest)
        } else {
            self.device_volume(device)
        }
    }

    pub fn set_volume(&self, device: DeviceId, level: f32) {
        let level = clamp_level(level);
        for target in self.targets(device) {
            debug!("Setting device {} volume to {:.3}", target, level);
            self.write_device_volume(target, level);
        }
    }

    /// Add `delta` to the current volume, clamped, and return the new level.
    pub fn adjust_volume(&self, device: DeviceId, delta: f32) -> Result<f32, AudioError> {
        let current = self
            .get_volume(device)
            .ok_or(AudioError::VolumeUnavailable)?;
        let level = clamp_level(current + delta);
        self.set_volume(device, level);
        Ok(level)
    }

    /// For an aggregate, true if any sub-device is muted.
    pub fn is_muted(&self, device: DeviceId) -> bool {
        self.targets(device)
            .into_iter()
            .any(|target| self.device_muted(target))
    }

    pub fn set_mute(&self, device: DeviceId, mute: bool) -> Result<(), AudioError> {
        for target in self.targets(device) {
            if mute {
                // A second mute must not overwrite the saved level with 0.0
                if self.hardware.mute(target) == Some(true) || self.stash.contains(target)? {
                    debug!("Device {} already muted, keeping stashed level", target);
                } else if let Some(level) = self.device_volume(target) {
                    self.stash.store(target, level)?;
                }
                self.write_device_volume(target, 0.0);
            } else if let Some(level) = self.stash.take(target)? {
                self.write_device_volume(target, level);
            }

            if let Err(e) = self.hardware.set_mute(target, mute) {
                debug!("Device {} has no mute control: {}", target, e);
            }
        }
        Ok(())
    }

    /// Flip the mute state and return the new state.
    pub fn toggle_mute(&self, device: DeviceId) -> Result<bool, AudioError> {
        let mute = !self.is_muted(device);
        self.set_mute(device, mute)?;
        Ok(mute)
    }
}
