//! Command execution.
//!
//! Turns a parsed [`Request`] into calls on the controllers and returns the
//! text printed on stdout. Device resolution failures become errors here;
//! the query layer itself never fails.

use colored::Colorize;
use ledfx_audio_common::{
    level_from_percent, percent_from_level, AudioDevice, AudioError, DeviceId, Settings,
    VolumeStash,
};

use crate::aggregation::{AggregationController, DisableOutcome, EnableOutcome};
use crate::command::{mute_label, MuteCommand, VolumeCommand};
use crate::platform::AudioHardware;
use crate::query::DeviceQuery;
use crate::volume::VolumeController;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// A fully parsed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Enable aggregation; `None` uses the configured driver name.
    Enable(Option<String>),
    Disable,
    Volume(VolumeCommand),
    Mute(MuteCommand),
    Devices,
    Status,
}

pub struct Dispatcher<'a> {
    hardware: &'a dyn AudioHardware,
    stash: &'a dyn VolumeStash,
    settings: &'a Settings,
    format: OutputFormat,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        hardware: &'a dyn AudioHardware,
        stash: &'a dyn VolumeStash,
        settings: &'a Settings,
        format: OutputFormat,
    ) -> Self {
        Self {
            hardware,
            stash,
            settings,
            format,
        }
    }

    pub fn execute(&self, request: Request) -> Result<String, AudioError> {
        match request {
            Request::Enable(driver) => {
                let driver = driver.unwrap_or_else(|| self.settings.default_driver.clone());
                let controller = AggregationController::new(self.hardware, self.settings);
                match controller.enable(&driver)? {
                    EnableOutcome::AlreadyActive => Ok("Already active.".to_string()),
                    EnableOutcome::Enabled { aggregate_id } => Ok(format!(
                        "Success: Enabled Multi-Output (Stacked). AggregateID: {}",
                        aggregate_id
                    )),
                }
            }

            Request::Disable => {
                let controller = AggregationController::new(self.hardware, self.settings);
                match controller.disable()? {
                    DisableOutcome::NotPresent => {
                        Ok("Aggregate not found, nothing to disable.".to_string())
                    }
                    DisableOutcome::Disabled { .. } => Ok("Success: Disabled.".to_string()),
                }
            }

            Request::Volume(command) => self.volume(command),
            Request::Mute(command) => self.mute(command),
            Request::Devices => self.devices(),
            Request::Status => self.status(),
        }
    }

    fn default_output(&self) -> Result<DeviceId, AudioError> {
        DeviceQuery::new(self.hardware)
            .default_output()
            .ok_or(AudioError::NoDefaultOutput)
    }

    fn volume(&self, command: VolumeCommand) -> Result<String, AudioError> {
        let device = self.default_output()?;
        let controller = VolumeController::new(self.hardware, self.stash);

        let level = match command {
            VolumeCommand::Get => {
                let level = controller
                    .get_volume(device)
                    .ok_or(AudioError::VolumeUnavailable)?;
                return Ok(percent_from_level(level).to_string());
            }
            VolumeCommand::Set(percent) => {
                let level = level_from_percent(percent);
                controller.set_volume(device, level);
                level
            }
            VolumeCommand::Up(_) | VolumeCommand::Down(_) => {
                let delta = command.delta(self.settings.volume_step).unwrap_or(0.0);
                controller.adjust_volume(device, delta)?
            }
        };

        Ok(format!("Success: Volume set to {}%", percent_from_level(level)))
    }

    fn mute(&self, command: MuteCommand) -> Result<String, AudioError> {
        let device = self.default_output()?;
        let controller = VolumeController::new(self.hardware, self.stash);

        match command {
            MuteCommand::Get => {
                let state = if controller.is_muted(device) { "on" } else { "off" };
                Ok(state.to_string())
            }
            MuteCommand::Toggle => {
                controller.toggle_mute(device)?;
                // Report what the hardware now says, not what was requested
                let muted = controller.is_muted(device);
                Ok(format!("Success: Mute {}", mute_label(muted)))
            }
            MuteCommand::Set(mute) => {
                controller.set_mute(device, mute)?;
                Ok(format!("Success: Mute {}", mute_label(mute)))
            }
        }
    }

    fn devices(&self) -> Result<String, AudioError> {
        let query = DeviceQuery::new(self.hardware);
        let devices = query.list_devices();
        let default_output = query.default_output();

        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(&devices)?);
        }
        if devices.is_empty() {
            return Ok("No audio devices found".to_string());
        }

        let mut out = format!(
            "{} {} found:\n",
            devices.len().to_string().green().bold(),
            if devices.len() == 1 { "device" } else { "devices" }
        );
        for device in &devices {
            out.push('\n');
            out.push_str(&describe_device(device, default_output == Some(device.id)));
        }
        Ok(out)
    }

    fn status(&self) -> Result<String, AudioError> {
        let status = AggregationController::new(self.hardware, self.settings).status();

        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(&status)?);
        }

        let state = if status.enabled() {
            "enabled".green().bold()
        } else if status.aggregate_id.is_some() {
            "present (not default output)".yellow()
        } else {
            "disabled".dimmed()
        };
        let mut out = format!("Aggregation: {}", state);
        if let Some(id) = status.aggregate_id {
            out.push_str(&format!("\nAggregate ID: {}", id));
        }
        match &status.default_output {
            Some(device) => out.push_str(&format!("\nDefault output: {}", device.name)),
            None => out.push_str(&format!("\nDefault output: {}", "none".red())),
        }
        Ok(out)
    }
}

fn describe_device(device: &AudioDevice, is_default: bool) -> String {
    let badge = if device.is_aggregate() {
        format!("[{}]", device.transport.label()).yellow()
    } else if device.has_output() {
        format!("[{}]", device.transport.label()).cyan()
    } else {
        format!("[{}]", device.transport.label()).dimmed()
    };
    let default_marker = if is_default {
        " (default output)".green().to_string()
    } else {
        String::new()
    };

    format!(
        "  {} {}{}\n    ID: {}  UID: {}",
        badge,
        device.name,
        default_marker,
        device.id.to_string().dimmed(),
        device.uid.dimmed()
    )
}
