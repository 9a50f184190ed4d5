//! Platform-specific audio hardware access.
//!
//! Only macOS has a real backend (CoreAudio HAL). Other targets build, but
//! [`open`] reports the platform as unsupported.

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(test)]
pub mod fake;

mod backend;

pub use backend::{AudioHardware, ELEMENT_LEFT, ELEMENT_MAIN, ELEMENT_RIGHT, VOLUME_ELEMENTS};

use ledfx_audio_common::AudioError;

/// Open the platform audio hardware.
pub fn open() -> Result<Box<dyn AudioHardware>, AudioError> {
    #[cfg(target_os = "macos")]
    {
        macos::init()
    }

    #[cfg(not(target_os = "macos"))]
    {
        Err(AudioError::UnsupportedPlatform)
    }
}
