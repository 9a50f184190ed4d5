//! Parsing of `volume` / `mute` sub-verbs and their values.
//!
//! Sub-verbs are taken as free-form strings so unknown ones can be reported
//! as `Unknown <kind>: <value>` with exit code 1.

use ledfx_audio_common::AudioError;

pub const USAGE: &str = "Usage: enable [DriverName] | disable | volume <get|set|up|down> | mute <toggle|get|set>";
pub const VOLUME_USAGE: &str = "Usage: volume <get|set|up|down> [value]";
pub const VOLUME_SET_USAGE: &str = "Usage: volume set <0-100>";
pub const VOLUME_STEP_USAGE: &str = "Usage: volume <up|down> [amount]";
pub const MUTE_USAGE: &str = "Usage: mute <toggle|get|set> [on|off]";
pub const MUTE_SET_USAGE: &str = "Usage: mute set <on|off>";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolumeCommand {
    Get,
    /// Absolute level in percent (not yet clamped).
    Set(f32),
    /// Relative change in percent; `None` uses the configured step.
    Up(Option<f32>),
    Down(Option<f32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteCommand {
    Toggle,
    Get,
    Set(bool),
}

fn parse_percent(value: &str, usage: &str) -> Result<f32, AudioError> {
    match value.trim().parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AudioError::Usage(usage.to_string())),
    }
}

impl VolumeCommand {
    pub fn parse(action: Option<&str>, value: Option<&str>) -> Result<Self, AudioError> {
        let action = action.ok_or_else(|| AudioError::Usage(VOLUME_USAGE.to_string()))?;
        match action {
            "get" => Ok(VolumeCommand::Get),
            "set" => {
                let value = value.ok_or_else(|| AudioError::Usage(VOLUME_SET_USAGE.to_string()))?;
                parse_percent(value, VOLUME_SET_USAGE).map(VolumeCommand::Set)
            }
            "up" => value
                .map(|v| parse_percent(v, VOLUME_STEP_USAGE))
                .transpose()
                .map(VolumeCommand::Up),
            "down" => value
                .map(|v| parse_percent(v, VOLUME_STEP_USAGE))
                .transpose()
                .map(VolumeCommand::Down),
            other => Err(AudioError::Unknown {
                kind: "volume subcommand",
                value: other.to_string(),
            }),
        }
    }

    /// Relative change as a linear delta, or `None` for absolute commands.
    pub fn delta(&self, default_step: f32) -> Option<f32> {
        match self {
            VolumeCommand::Up(step) => Some(step.unwrap_or(default_step) / 100.0),
            VolumeCommand::Down(step) => Some(-(step.unwrap_or(default_step) / 100.0)),
            _ => None,
        }
    }
}

impl MuteCommand {
    pub fn parse(action: Option<&str>, value: Option<&str>) -> Result<Self, AudioError> {
        let action = action.ok_or_else(|| AudioError::Usage(MUTE_USAGE.to_string()))?;
        match action {
            "toggle" => Ok(MuteCommand::Toggle),
            "get" => Ok(MuteCommand::Get),
            "set" => {
                let value = value.ok_or_else(|| AudioError::Usage(MUTE_SET_USAGE.to_string()))?;
                match value.to_ascii_lowercase().as_str() {
                    "on" => Ok(MuteCommand::Set(true)),
                    "off" => Ok(MuteCommand::Set(false)),
                    _ => Err(AudioError::Usage(MUTE_SET_USAGE.to_string())),
                }
            }
            other => Err(AudioError::Unknown {
                kind: "mute subcommand",
                value: other.to_string(),
            }),
        }
    }
}

pub fn mute_label(muted: bool) -> &'static str {
    if muted {
        "ON"
    } else {
        "OFF"
    }
}
