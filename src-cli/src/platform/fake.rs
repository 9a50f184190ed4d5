//! In-memory audio hardware for tests.

use std::cell::RefCell;

use ledfx_audio_common::{AggregateDescriptor, AudioError, DeviceId, TransportType};

use super::backend::AudioHardware;

#[derive(Debug, Clone)]
pub struct FakeDevice {
    pub id: DeviceId,
    pub name: String,
    pub uid: String,
    pub transport: u32,
    pub output: bool,
    /// Volume per element (main, left, right); `None` = no control.
    pub volume: [Option<f32>; 3],
    pub mute: Option<bool>,
    pub sub_devices: Vec<DeviceId>,
}

impl FakeDevice {
    /// Output device with main/left/right volume controls and a mute flag.
    pub fn output(id: DeviceId, name: &str, uid: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            uid: uid.to_string(),
            transport: TransportType::BUILT_IN,
            output: true,
            volume: [Some(0.5); 3],
            mute: Some(false),
            sub_devices: Vec::new(),
        }
    }

    /// Input-only device.
    pub fn input(id: DeviceId, name: &str, uid: &str) -> Self {
        Self {
            output: false,
            volume: [None; 3],
            mute: None,
            ..Self::output(id, name, uid)
        }
    }

    pub fn virtual_output(id: DeviceId, name: &str, uid: &str) -> Self {
        Self {
            transport: TransportType::VIRTUAL,
            ..Self::output(id, name, uid)
        }
    }

    pub fn aggregate(id: DeviceId, name: &str, uid: &str, members: &[DeviceId]) -> Self {
        Self {
            transport: TransportType::AGGREGATE,
            volume: [None; 3],
            mute: None,
            sub_devices: members.to_vec(),
            ..Self::output(id, name, uid)
        }
    }

    pub fn with_volume(mut self, level: f32) -> Self {
        self.volume = [Some(level); 3];
        self
    }

    pub fn with_volume_elements(mut self, volume: [Option<f32>; 3]) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_mute(mut self, mute: Option<bool>) -> Self {
        self.mute = mute;
        self
    }
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub devices: Vec<FakeDevice>,
    pub default_output: Option<DeviceId>,
    pub next_id: DeviceId,
    pub created: Vec<AggregateDescriptor>,
    pub destroyed: Vec<DeviceId>,
    /// Default output history, oldest first.
    pub default_changes: Vec<DeviceId>,
    /// Status returned by `create_aggregate`, if set.
    pub create_error: Option<i32>,
    pub destroy_error: Option<i32>,
    pub set_default_error: Option<i32>,
}

/// Fake HAL backed by a list of devices.
#[derive(Debug, Default)]
pub struct FakeHardware {
    pub state: RefCell<FakeState>,
}

impl FakeHardware {
    pub fn new(devices: Vec<FakeDevice>, default_output: Option<DeviceId>) -> Self {
        let next_id = devices.iter().map(|d| d.id).max().unwrap_or(0) + 100;
        Self {
            state: RefCell::new(FakeState {
                devices,
                default_output,
                next_id,
                ..FakeState::default()
            }),
        }
    }

    pub fn device(&self, id: DeviceId) -> FakeDevice {
        self.state
            .borrow()
            .devices
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .unwrap_or_else(|| panic!("no fake device {}", id))
    }

    pub fn default_output(&self) -> Option<DeviceId> {
        self.state.borrow().default_output
    }

    fn with_device<T>(&self, id: DeviceId, f: impl FnOnce(&FakeDevice) -> T) -> Option<T> {
        self.state.borrow().devices.iter().find(|d| d.id == id).map(f)
    }

    fn with_device_mut<T>(&self, id: DeviceId, f: impl FnOnce(&mut FakeDevice) -> T) -> Option<T> {
        self.state
            .borrow_mut()
            .devices
            .iter_mut()
            .find(|d| d.id == id)
            .map(f)
    }
}

impl AudioHardware for FakeHardware {
    fn device_ids(&self) -> Vec<DeviceId> {
        self.state.borrow().devices.iter().map(|d| d.id).collect()
    }

    fn default_output_device(&self) -> Option<DeviceId> {
        self.state.borrow().default_output
    }

    fn set_default_output_device(&self, device: DeviceId) -> Result<(), AudioError> {
        let mut state = self.state.borrow_mut();
        if let Some(status) = state.set_default_error {
            return Err(AudioError::os("set default output device", status));
        }
        state.default_output = Some(device);
        state.default_changes.push(device);
        Ok(())
    }

    fn device_name(&self, device: DeviceId) -> Option<String> {
        self.with_device(device, |d| d.name.clone())
    }

    fn device_uid(&self, device: DeviceId) -> Option<String> {
        self.with_device(device, |d| d.uid.clone())
    }

    fn transport_type(&self, device: DeviceId) -> Option<u32> {
        self.with_device(device, |d| d.transport)
    }

    fn has_output(&self, device: DeviceId) -> bool {
        self.with_device(device, |d| d.output).unwrap_or(false)
    }

    fn active_sub_devices(&self, device: DeviceId) -> Vec<DeviceId> {
        self.with_device(device, |d| d.sub_devices.clone())
            .unwrap_or_default()
    }

    fn scalar_volume(&self, device: DeviceId, element: u32) -> Option<f32> {
        self.with_device(device, |d| d.volume.get(element as usize).copied().flatten())
            .flatten()
    }

    fn set_scalar_volume(
        &self,
        device: DeviceId,
        element: u32,
        level: f32,
    ) -> Result<(), AudioError> {
        let written = self.with_device_mut(device, |d| {
            match d.volume.get_mut(element as usize) {
                Some(slot) if slot.is_some() => {
                    *slot = Some(level);
                    true
                }
                _ => false,
            }
        });
        match written {
            Some(true) => Ok(()),
            // kAudioHardwareUnknownPropertyError ('who?')
            _ => Err(AudioError::os("set volume", 2003332927)),
        }
    }

    fn mute(&self, device: DeviceId) -> Option<bool> {
        self.with_device(device, |d| d.mute).flatten()
    }

    fn set_mute(&self, device: DeviceId, muted: bool) -> Result<(), AudioError> {
        let written = self.with_device_mut(device, |d| match d.mute.as_mut() {
            Some(flag) => {
                *flag = muted;
                true
            }
            None => false,
        });
        match written {
            Some(true) => Ok(()),
            _ => Err(AudioError::os("set mute", 2003332927)),
        }
    }

    fn create_aggregate(&self, descriptor: &AggregateDescriptor) -> Result<DeviceId, AudioError> {
        let mut state = self.state.borrow_mut();
        if let Some(status) = state.create_error {
            return Err(AudioError::os("AudioHardwareCreateAggregateDevice", status));
        }

        let members: Vec<DeviceId> = descriptor
            .members()
            .iter()
            .filter_map(|uid| state.devices.iter().find(|d| &d.uid == uid).map(|d| d.id))
            .collect();
        let id = state.next_id;
        state.next_id += 1;
        state.devices.push(FakeDevice::aggregate(
            id,
            descriptor.name(),
            descriptor.uid(),
            &members,
        ));
        state.created.push(descriptor.clone());
        Ok(id)
    }

    fn destroy_aggregate(&self, device: DeviceId) -> Result<(), AudioError> {
        let mut state = self.state.borrow_mut();
        if let Some(status) = state.destroy_error {
            return Err(AudioError::os("AudioHardwareDestroyAggregateDevice", status));
        }
        state.devices.retain(|d| d.id != device);
        if state.default_output == Some(device) {
            state.default_output = None;
        }
        state.destroyed.push(device);
        Ok(())
    }
}
