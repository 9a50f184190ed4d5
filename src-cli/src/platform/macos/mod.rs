//! macOS audio hardware using the CoreAudio HAL.

mod coreaudio;

use super::AudioHardware;
use ledfx_audio_common::AudioError;

pub use coreaudio::CoreAudioHardware;

/// Initialize the macOS audio hardware backend.
pub fn init() -> Result<Box<dyn AudioHardware>, AudioError> {
    tracing::debug!("Initializing macOS CoreAudio hardware backend");
    Ok(Box::new(CoreAudioHardware::new()))
}
