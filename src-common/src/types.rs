//! Shared types for LedFx audio routing and volume control.

use serde::{Deserialize, Serialize};

use crate::error::AudioError;

/// CoreAudio object identifier (`AudioObjectID`).
pub type DeviceId = u32;

/// Pack a four-character code the way CoreAudio does (`'grup'` etc).
pub const fn fourcc(code: &[u8; 4]) -> u32 {
    ((code[0] as u32) << 24) | ((code[1] as u32) << 16) | ((code[2] as u32) << 8) | code[3] as u32
}

/// How a device is attached to the system.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
    /// Built-in speakers, headphone jack, etc.
    BuiltIn,
    /// Aggregate of several other devices
    Aggregate,
    /// Software-only device (loopback drivers)
    Virtual,
    Usb,
    Bluetooth,
    Hdmi,
    DisplayPort,
    AirPlay,
    /// Any other transport, raw four-character code
    Other(u32),
    /// Transport could not be read
    #[default]
    Unknown,
}

impl TransportType {
    pub const BUILT_IN: u32 = fourcc(b"bltn");
    pub const AGGREGATE: u32 = fourcc(b"grup");
    pub const VIRTUAL: u32 = fourcc(b"virt");
    pub const USB: u32 = fourcc(b"usb ");
    pub const BLUETOOTH: u32 = fourcc(b"blue");
    pub const BLUETOOTH_LE: u32 = fourcc(b"blea");
    pub const HDMI: u32 = fourcc(b"hdmi");
    pub const DISPLAY_PORT: u32 = fourcc(b"dprt");
    pub const AIRPLAY: u32 = fourcc(b"airp");

    /// Decode a raw `kAudioDevicePropertyTransportType` value.
    pub fn from_raw(raw: Option<u32>) -> Self {
        match raw {
            None => TransportType::Unknown,
            Some(Self::BUILT_IN) => TransportType::BuiltIn,
            Some(Self::AGGREGATE) => TransportType::Aggregate,
            Some(Self::VIRTUAL) => TransportType::Virtual,
            Some(Self::USB) => TransportType::Usb,
            Some(Self::BLUETOOTH) | Some(Self::BLUETOOTH_LE) => TransportType::Bluetooth,
            Some(Self::HDMI) => TransportType::Hdmi,
            Some(Self::DISPLAY_PORT) => TransportType::DisplayPort,
            Some(Self::AIRPLAY) => TransportType::AirPlay,
            Some(other) => TransportType::Other(other),
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, TransportType::Aggregate)
    }

    /// Short label for terminal output.
    pub fn label(&self) -> &'static str {
        match self {
            TransportType::BuiltIn => "built-in",
            TransportType::Aggregate => "aggregate",
            TransportType::Virtual => "virtual",
            TransportType::Usb => "usb",
            TransportType::Bluetooth => "bluetooth",
            TransportType::Hdmi => "hdmi",
            TransportType::DisplayPort => "displayport",
            TransportType::AirPlay => "airplay",
            TransportType::Other(_) => "other",
            TransportType::Unknown => "unknown",
        }
    }
}

/// Information about an audio device known to the OS registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioDevice {
    /// CoreAudio object ID
    pub id: DeviceId,
    /// Display name
    pub name: String,
    /// Persistent unique identifier
    pub uid: String,
    /// How the device is attached
    pub transport: TransportType,
    /// Has at least one output stream buffer (false = input only)
    pub output: bool,
}

impl AudioDevice {
    pub fn has_output(&self) -> bool {
        self.output
    }

    pub fn is_aggregate(&self) -> bool {
        self.transport.is_aggregate()
    }
}

/// Description of an aggregate device to create.
///
/// Members are listed in order; the first is normally the physical device that
/// also drives the master clock. With `stacked` set, every member receives the
/// full signal instead of the channels being split across members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateDescriptor {
    name: String,
    uid: String,
    members: Vec<String>,
    master_uid: String,
    stacked: bool,
}

impl AggregateDescriptor {
    pub fn builder(name: impl Into<String>, uid: impl Into<String>) -> AggregateDescriptorBuilder {
        AggregateDescriptorBuilder {
            name: name.into(),
            uid: uid.into(),
            members: Vec::new(),
            master_uid: None,
            stacked: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Member device UIDs, in order.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// UID of the member used as master clock.
    pub fn master_uid(&self) -> &str {
        &self.master_uid
    }

    pub fn is_stacked(&self) -> bool {
        self.stacked
    }
}

/// Builder for [`AggregateDescriptor`].
#[derive(Debug, Clone)]
pub struct AggregateDescriptorBuilder {
    name: String,
    uid: String,
    members: Vec<String>,
    master_uid: Option<String>,
    stacked: bool,
}

impl AggregateDescriptorBuilder {
    /// Append a member device UID.
    pub fn member(mut self, uid: impl Into<String>) -> Self {
        self.members.push(uid.into());
        self
    }

    /// Select the master clock. Defaults to the first member.
    pub fn master(mut self, uid: impl Into<String>) -> Self {
        self.master_uid = Some(uid.into());
        self
    }

    pub fn stacked(mut self, stacked: bool) -> Self {
        self.stacked = stacked;
        self
    }

    pub fn build(self) -> Result<AggregateDescriptor, AudioError> {
        if self.name.is_empty() {
            return Err(AudioError::InvalidDescriptor("name is empty".into()));
        }
        if self.uid.is_empty() {
            return Err(AudioError::InvalidDescriptor("uid is empty".into()));
        }
        if self.members.len() < 2 {
            return Err(AudioError::InvalidDescriptor(format!(
                "an aggregate needs at least 2 members, got {}",
                self.members.len()
            )));
        }
        if let Some(empty) = self.members.iter().position(|m| m.is_empty()) {
            return Err(AudioError::InvalidDescriptor(format!(
                "member {} has no uid",
                empty
            )));
        }
        for (i, member) in self.members.iter().enumerate() {
            if self.members[..i].contains(member) {
                return Err(AudioError::InvalidDescriptor(format!(
                    "member '{}' listed twice",
                    member
                )));
            }
        }

        let master_uid = match self.master_uid {
            Some(master) => master,
            None => self.members[0].clone(),
        };
        if !self.members.contains(&master_uid) {
            return Err(AudioError::InvalidDescriptor(format!(
                "master '{}' is not a member",
                master_uid
            )));
        }

        Ok(AggregateDescriptor {
            name: self.name,
            uid: self.uid,
            members: self.members,
            master_uid,
            stacked: self.stacked,
        })
    }
}

/// Current state of the managed aggregate device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationStatus {
    /// ID of the managed aggregate, if it exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate_id: Option<DeviceId>,
    /// Whether the managed aggregate is the system default output
    pub is_default: bool,
    /// Current system default output device
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_output: Option<AudioDevice>,
}

impl AggregationStatus {
    pub fn enabled(&self) -> bool {
        self.aggregate_id.is_some() && self.is_default
    }
}

/// Convert a CLI percentage to a linear level, clamping to [0, 1].
pub fn level_from_percent(percent: f32) -> f32 {
    if percent.is_nan() {
        return 0.0;
    }
    percent.clamp(0.0, 100.0) / 100.0
}

/// Convert a linear level to the nearest whole percentage.
pub fn percent_from_level(level: f32) -> u32 {
    (level.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// Clamp a linear level to [0, 1].
pub fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        return 0.0;
    }
    level.clamp(0.0, 1.0)
}
