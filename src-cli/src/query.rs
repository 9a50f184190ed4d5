//! Device queries over the audio hardware.
//!
//! Every query re-reads live registry state and fails silently: an OS error
//! shows up as `None`, `false` or an empty list.

use ledfx_audio_common::{AudioDevice, DeviceId, TransportType};

use crate::platform::AudioHardware;

/// Read-only view over the device registry.
pub struct DeviceQuery<'a> {
    hardware: &'a dyn AudioHardware,
}

impl<'a> DeviceQuery<'a> {
    pub fn new(hardware: &'a dyn AudioHardware) -> Self {
        Self { hardware }
    }

    /// Snapshot of one device's properties.
    pub fn describe(&self, id: DeviceId) -> AudioDevice {
        AudioDevice {
            id,
            name: self
                .hardware
                .device_name(id)
                .unwrap_or_else(|| format!("Unknown Device {}", id)),
            uid: self.hardware.device_uid(id).unwrap_or_default(),
            transport: TransportType::from_raw(self.hardware.transport_type(id)),
            output: self.hardware.has_output(id),
        }
    }

    /// All devices currently known to the OS, in registry order.
    pub fn list_devices(&self) -> Vec<AudioDevice> {
        self.hardware
            .device_ids()
            .into_iter()
            .map(|id| self.describe(id))
            .collect()
    }

    /// First device whose name contains `substring` (case-sensitive).
    pub fn find_by_name(&self, substring: &str) -> Option<AudioDevice> {
        self.hardware
            .device_ids()
            .into_iter()
            .find(|&id| {
                self.hardware
                    .device_name(id)
                    .is_some_and(|name| name.contains(substring))
            })
            .map(|id| self.describe(id))
    }

    /// First device with exactly this UID.
    pub fn find_by_uid(&self, uid: &str) -> Option<AudioDevice> {
        self.hardware
            .device_ids()
            .into_iter()
            .find(|&id| self.hardware.device_uid(id).is_some_and(|u| u == uid))
            .map(|id| self.describe(id))
    }

    pub fn has_output_channels(&self, id: DeviceId) -> bool {
        self.hardware.has_output(id)
    }

    pub fn is_aggregate(&self, id: DeviceId) -> bool {
        TransportType::from_raw(self.hardware.transport_type(id)).is_aggregate()
    }

    /// Active members of an aggregate (empty for plain devices).
    pub fn sub_devices(&self, aggregate: DeviceId) -> Vec<DeviceId> {
        self.hardware.active_sub_devices(aggregate)
    }

    pub fn default_output(&self) -> Option<DeviceId> {
        self.hardware.default_output_device()
    }

    /// First real output device, skipping aggregates and anything whose name
    /// or UID contains one of the `denylist` substrings.
    pub fn first_physical_output(&self, denylist: &[String]) -> Option<AudioDevice> {
        self.hardware
            .device_ids()
            .into_iter()
            .map(|id| self.describe(id))
            .find(|device| {
                let denied = denylist.iter().any(|entry| {
                    device.name.contains(entry.as_str()) || device.uid.contains(entry.as_str())
                });
                !denied && !device.is_aggregate() && device.has_output()
            })
    }
}
