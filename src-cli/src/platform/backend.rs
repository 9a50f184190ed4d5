//! Audio hardware interface.
//!
//! Thin wrapper over the HAL primitives the controllers need. Reads return
//! `Option`/empty on OS error so callers decide whether absence is fatal;
//! writes return the raw status as [`AudioError::OsStatus`].

use ledfx_audio_common::{AggregateDescriptor, AudioError, DeviceId};

/// Main element (master channel).
pub const ELEMENT_MAIN: u32 = 0;
/// Left channel element.
pub const ELEMENT_LEFT: u32 = 1;
/// Right channel element.
pub const ELEMENT_RIGHT: u32 = 2;

/// Volume elements written by a volume change, in order.
pub const VOLUME_ELEMENTS: [u32; 3] = [ELEMENT_MAIN, ELEMENT_LEFT, ELEMENT_RIGHT];

/// Audio hardware abstraction layer.
pub trait AudioHardware {
    /// IDs of every device in the registry, in registry order.
    fn device_ids(&self) -> Vec<DeviceId>;

    /// Current system default output device.
    fn default_output_device(&self) -> Option<DeviceId>;

    /// Make `device` the system default output.
    fn set_default_output_device(&self, device: DeviceId) -> Result<(), AudioError>;

    fn device_name(&self, device: DeviceId) -> Option<String>;

    fn device_uid(&self, device: DeviceId) -> Option<String>;

    /// Raw transport type four-character code.
    fn transport_type(&self, device: DeviceId) -> Option<u32>;

    /// Whether the output stream configuration has at least one buffer.
    fn has_output(&self, device: DeviceId) -> bool;

    /// Active members of an aggregate device.
    fn active_sub_devices(&self, device: DeviceId) -> Vec<DeviceId>;

    /// Output scalar volume (0.0-1.0) of one element.
    fn scalar_volume(&self, device: DeviceId, element: u32) -> Option<f32>;

    fn set_scalar_volume(&self, device: DeviceId, element: u32, level: f32)
        -> Result<(), AudioError>;

    /// Output mute flag of the main element.
    fn mute(&self, device: DeviceId) -> Option<bool>;

    fn set_mute(&self, device: DeviceId, muted: bool) -> Result<(), AudioError>;

    /// Create an aggregate device and return its ID.
    fn create_aggregate(&self, descriptor: &AggregateDescriptor) -> Result<DeviceId, AudioError>;

    fn destroy_aggregate(&self, device: DeviceId) -> Result<(), AudioError>;
}
