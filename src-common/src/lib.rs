//! Shared types, settings and volume stash for the LedFx audio helper.

pub mod error;
pub mod settings;
pub mod stash;
pub mod types;

pub use error::AudioError;
pub use settings::Settings;
pub use stash::{FileVolumeStash, MemoryVolumeStash, VolumeStash};
pub use types::*;
