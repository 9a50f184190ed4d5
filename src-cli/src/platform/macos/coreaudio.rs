//! CoreAudio HAL backend for macOS
//!
//! Device enumeration, names and output detection use the `coreaudio-rs`
//! macOS helpers. Everything they don't cover goes through
//! `AudioObjectGetPropertyData` / `AudioObjectSetPropertyData` directly.
//! Aggregate devices are created from a `CFDictionary` built out of an
//! [`AggregateDescriptor`].

use crate::platform::backend::{AudioHardware, ELEMENT_MAIN};
use core_foundation::array::CFArray;
use core_foundation::base::{CFType, TCFType};
use core_foundation::dictionary::CFDictionary;
use core_foundation::number::CFNumber;
use core_foundation::string::{CFString, CFStringRef};
use coreaudio::audio_unit::macos_helpers::{
    get_audio_device_ids, get_audio_device_supports_scope, get_default_device_id, get_device_name,
};
use coreaudio::audio_unit::Scope;
use coreaudio::sys::{self, AudioObjectID, AudioObjectPropertyAddress, OSStatus};
use ledfx_audio_common::{fourcc, AggregateDescriptor, AudioError, DeviceId};
use std::mem;
use std::os::raw::c_void;
use std::ptr;

/// `kAudioObjectSystemObject`
const SYSTEM_OBJECT: AudioObjectID = 1;

const SCOPE_GLOBAL: u32 = fourcc(b"glob");
const SCOPE_OUTPUT: u32 = fourcc(b"outp");

const PROP_DEFAULT_OUTPUT: u32 = fourcc(b"dOut");
const PROP_UID: u32 = fourcc(b"uid ");
const PROP_TRANSPORT_TYPE: u32 = fourcc(b"tran");
const PROP_ACTIVE_SUB_DEVICES: u32 = fourcc(b"agrp");
const PROP_VOLUME_SCALAR: u32 = fourcc(b"volm");
const PROP_MUTE: u32 = fourcc(b"mute");

// Aggregate description dictionary keys (AudioHardware.h)
const AGGREGATE_NAME_KEY: &str = "name";
const AGGREGATE_UID_KEY: &str = "uid";
const AGGREGATE_SUB_DEVICES_KEY: &str = "subdevices";
const AGGREGATE_MASTER_KEY: &str = "master";
const AGGREGATE_STACKED_KEY: &str = "stacked";
const SUB_DEVICE_UID_KEY: &str = "uid";

fn property_address(selector: u32, scope: u32, element: u32) -> AudioObjectPropertyAddress {
    AudioObjectPropertyAddress {
        mSelector: selector,
        mScope: scope,
        mElement: element,
    }
}

fn global(selector: u32) -> AudioObjectPropertyAddress {
    property_address(selector, SCOPE_GLOBAL, ELEMENT_MAIN)
}

/// Read a fixed-size property value.
fn get_property<T: Copy>(
    object: AudioObjectID,
    address: &AudioObjectPropertyAddress,
    mut value: T,
) -> Result<T, OSStatus> {
    let mut size = mem::size_of::<T>() as u32;
    let status = unsafe {
        sys::AudioObjectGetPropertyData(
            object,
            address,
            0,
            ptr::null(),
            &mut size,
            &mut value as *mut T as *mut c_void,
        )
    };
    if status == 0 {
        Ok(value)
    } else {
        Err(status)
    }
}

/// Write a fixed-size property value.
fn set_property<T: Copy>(
    object: AudioObjectID,
    address: &AudioObjectPropertyAddress,
    value: T,
) -> Result<(), OSStatus> {
    let status = unsafe {
        sys::AudioObjectSetPropertyData(
            object,
            address,
            0,
            ptr::null(),
            mem::size_of::<T>() as u32,
            &value as *const T as *const c_void,
        )
    };
    if status == 0 {
        Ok(())
    } else {
        Err(status)
    }
}

fn property_size(
    object: AudioObjectID,
    address: &AudioObjectPropertyAddress,
) -> Result<u32, OSStatus> {
    let mut size: u32 = 0;
    let status =
        unsafe { sys::AudioObjectGetPropertyDataSize(object, address, 0, ptr::null(), &mut size) };
    if status == 0 {
        Ok(size)
    } else {
        Err(status)
    }
}

/// Read a variable-length list of object IDs.
fn get_id_list(
    object: AudioObjectID,
    address: &AudioObjectPropertyAddress,
) -> Result<Vec<AudioObjectID>, OSStatus> {
    let mut size = property_size(object, address)?;
    let count = size as usize / mem::size_of::<AudioObjectID>();
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut ids: Vec<AudioObjectID> = vec![0; count];
    let status = unsafe {
        sys::AudioObjectGetPropertyData(
            object,
            address,
            0,
            ptr::null(),
            &mut size,
            ids.as_mut_ptr() as *mut c_void,
        )
    };
    if status != 0 {
        return Err(status);
    }

    // The list can shrink between the size query and the read
    ids.truncate(size as usize / mem::size_of::<AudioObjectID>());
    Ok(ids)
}

/// Read a CFString property, taking ownership of the returned reference.
fn get_string(object: AudioObjectID, selector: u32) -> Result<String, OSStatus> {
    let value: CFStringRef = get_property(object, &global(selector), ptr::null())?;
    if value.is_null() {
        return Err(0);
    }
    let string = unsafe { CFString::wrap_under_create_rule(value) };
    Ok(string.to_string())
}

/// Build the HAL aggregate description dictionary.
fn aggregate_dictionary(descriptor: &AggregateDescriptor) -> CFDictionary<CFString, CFType> {
    let sub_devices: Vec<CFDictionary<CFString, CFType>> = descriptor
        .members()
        .iter()
        .map(|uid| {
            CFDictionary::from_CFType_pairs(&[(
                CFString::new(SUB_DEVICE_UID_KEY),
                CFString::new(uid).as_CFType(),
            )])
        })
        .collect();
    let sub_device_list = CFArray::from_CFTypes(&sub_devices);

    CFDictionary::from_CFType_pairs(&[
        (
            CFString::new(AGGREGATE_NAME_KEY),
            CFString::new(descriptor.name()).as_CFType(),
        ),
        (
            CFString::new(AGGREGATE_UID_KEY),
            CFString::new(descriptor.uid()).as_CFType(),
        ),
        (
            CFString::new(AGGREGATE_SUB_DEVICES_KEY),
            sub_device_list.as_CFType(),
        ),
        (
            CFString::new(AGGREGATE_MASTER_KEY),
            CFString::new(descriptor.master_uid()).as_CFType(),
        ),
        (
            CFString::new(AGGREGATE_STACKED_KEY),
            CFNumber::from(i32::from(descriptor.is_stacked())).as_CFType(),
        ),
    ])
}

/// CoreAudio HAL access for the current process.
#[derive(Debug, Default)]
pub struct CoreAudioHardware;

impl CoreAudioHardware {
    pub fn new() -> Self {
        Self
    }
}

impl AudioHardware for CoreAudioHardware {
    fn device_ids(&self) -> Vec<DeviceId> {
        get_audio_device_ids().unwrap_or_else(|e| {
            tracing::warn!("CoreAudio: failed to list devices: {:?}", e);
            Vec::new()
        })
    }

    fn default_output_device(&self) -> Option<DeviceId> {
        // Zero is kAudioObjectUnknown
        get_default_device_id(false).filter(|&id| id != 0)
    }

    fn set_default_output_device(&self, device: DeviceId) -> Result<(), AudioError> {
        set_property(SYSTEM_OBJECT, &global(PROP_DEFAULT_OUTPUT), device as AudioObjectID)
            .map_err(|status| AudioError::os("set default output device", status))
    }

    fn device_name(&self, device: DeviceId) -> Option<String> {
        get_device_name(device).ok()
    }

    fn device_uid(&self, device: DeviceId) -> Option<String> {
        get_string(device, PROP_UID).ok()
    }

    fn transport_type(&self, device: DeviceId) -> Option<u32> {
        get_property(device, &global(PROP_TRANSPORT_TYPE), 0u32).ok()
    }

    fn has_output(&self, device: DeviceId) -> bool {
        get_audio_device_supports_scope(device, Scope::Output).unwrap_or_else(|e| {
            tracing::debug!(
                "CoreAudio: stream configuration of device {} unavailable: {:?}",
                device,
                e
            );
            false
        })
    }

    fn active_sub_devices(&self, device: DeviceId) -> Vec<DeviceId> {
        get_id_list(device, &global(PROP_ACTIVE_SUB_DEVICES)).unwrap_or_else(|status| {
            tracing::debug!(
                "CoreAudio: no active sub-devices for device {}: {}",
                device,
                status
            );
            Vec::new()
        })
    }

    fn scalar_volume(&self, device: DeviceId, element: u32) -> Option<f32> {
        let address = property_address(PROP_VOLUME_SCALAR, SCOPE_OUTPUT, element);
        get_property(device, &address, 0f32).ok()
    }

    fn set_scalar_volume(
        &self,
        device: DeviceId,
        element: u32,
        level: f32,
    ) -> Result<(), AudioError> {
        let address = property_address(PROP_VOLUME_SCALAR, SCOPE_OUTPUT, element);
        set_property(device, &address, level)
            .map_err(|status| AudioError::os("set volume", status))
    }

    fn mute(&self, device: DeviceId) -> Option<bool> {
        let address = property_address(PROP_MUTE, SCOPE_OUTPUT, ELEMENT_MAIN);
        get_property(device, &address, 0u32).ok().map(|m| m == 1)
    }

    fn set_mute(&self, device: DeviceId, muted: bool) -> Result<(), AudioError> {
        let address = property_address(PROP_MUTE, SCOPE_OUTPUT, ELEMENT_MAIN);
        set_property(device, &address, u32::from(muted))
            .map_err(|status| AudioError::os("set mute", status))
    }

    fn create_aggregate(&self, descriptor: &AggregateDescriptor) -> Result<DeviceId, AudioError> {
        let dictionary = aggregate_dictionary(descriptor);
        let mut device: AudioObjectID = 0;
        let status = unsafe {
            sys::AudioHardwareCreateAggregateDevice(
                dictionary.as_concrete_TypeRef() as sys::CFDictionaryRef,
                &mut device,
            )
        };
        if status != 0 {
            return Err(AudioError::os("AudioHardwareCreateAggregateDevice", status));
        }

        tracing::info!(
            "CoreAudio: created aggregate '{}' ({}) as device {}",
            descriptor.name(),
            descriptor.uid(),
            device
        );
        Ok(device)
    }

    fn destroy_aggregate(&self, device: DeviceId) -> Result<(), AudioError> {
        let status = unsafe { sys::AudioHardwareDestroyAggregateDevice(device) };
        if status != 0 {
            return Err(AudioError::os("AudioHardwareDestroyAggregateDevice", status));
        }
        tracing::info!("CoreAudio: destroyed aggregate device {}", device);
        Ok(())
    }
}
