//! Enable/disable of the LedFx multi-output aggregate.
//!
//! Enabled means an aggregate with the configured UID exists and is the
//! system default output. It stacks the physical speakers (first member and
//! master clock) with the loopback driver so both receive the full signal.

use ledfx_audio_common::{
    AggregateDescriptor, AggregationStatus, AudioDevice, AudioError, DeviceId, Settings,
};
use tracing::{debug, info, warn};

use crate::platform::AudioHardware;
use crate::query::DeviceQuery;

/// Result of [`AggregationController::enable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnableOutcome {
    /// The default output already is the managed aggregate.
    AlreadyActive,
    /// A new aggregate was created and made the default output.
    Enabled { aggregate_id: DeviceId },
}

/// Result of [`AggregationController::disable`].
#[derive(Debug, Clone, PartialEq)]
pub enum DisableOutcome {
    /// No managed aggregate exists.
    NotPresent,
    /// The aggregate was destroyed. `fallback` is the device that became the
    /// default output, or `None` if no switch happened.
    Disabled { fallback: Option<AudioDevice> },
}

pub struct AggregationController<'a> {
    hardware: &'a dyn AudioHardware,
    settings: &'a Settings,
}

impl<'a> AggregationController<'a> {
    pub fn new(hardware: &'a dyn AudioHardware, settings: &'a Settings) -> Self {
        Self { hardware, settings }
    }

    fn query(&self) -> DeviceQuery<'a> {
        DeviceQuery::new(self.hardware)
    }

    /// Stack the current default output with the loopback driver matching
    /// `driver_name` and make the aggregate the default output.
    pub fn enable(&self, driver_name: &str) -> Result<EnableOutcome, AudioError> {
        let query = self.query();

        let current = query.default_output().ok_or(AudioError::NoDefaultOutput)?;
        let speakers = query.describe(current);
        if speakers.name == self.settings.aggregate_name {
            info!("Default output {} is already the aggregate", current);
            return Ok(EnableOutcome::AlreadyActive);
        }

        let loopback = query
            .find_by_name(driver_name)
            .ok_or_else(|| AudioError::DriverNotInstalled(driver_name.to_string()))?;

        debug!(
            "Stacking '{}' ({}) with '{}' ({})",
            speakers.name, speakers.uid, loopback.name, loopback.uid
        );

        let descriptor = AggregateDescriptor::builder(
            self.settings.aggregate_name.as_str(),
            self.settings.aggregate_uid.as_str(),
        )
        .member(speakers.uid.as_str())
        .member(loopback.uid.as_str())
        .master(speakers.uid.as_str())
        .stacked(true)
        .build()?;

        let aggregate_id = self.hardware.create_aggregate(&descriptor)?;
        self.hardware.set_default_output_device(aggregate_id)?;

        info!("Aggregate {} is now the default output", aggregate_id);
        Ok(EnableOutcome::Enabled { aggregate_id })
    }

    /// Destroy the managed aggregate, switching the default output to the
    /// first physical output first.
    pub fn disable(&self) -> Result<DisableOutcome, AudioError> {
        let query = self.query();

        let Some(aggregate) = query.find_by_uid(&self.settings.aggregate_uid) else {
            info!("No aggregate with uid {}", self.settings.aggregate_uid);
            return Ok(DisableOutcome::NotPresent);
        };

        let fallback = match query.first_physical_output(&self.settings.fallback_denylist) {
            Some(device) => match self.hardware.set_default_output_device(device.id) {
                Ok(()) => {
                    info!("Default output switched to '{}'", device.name);
                    Some(device)
                }
                Err(e) => {
                    warn!("Failed to switch default output to '{}': {}", device.name, e);
                    None
                }
            },
            None => {
                warn!("No physical output found to fall back to");
                None
            }
        };

        self.hardware.destroy_aggregate(aggregate.id)?;
        Ok(DisableOutcome::Disabled { fallback })
    }

    /// Whether the managed aggregate exists and is the default output.
    pub fn status(&self) -> AggregationStatus {
        let query = self.query();
        let aggregate_id = query
            .find_by_uid(&self.settings.aggregate_uid)
            .map(|d| d.id);
        let default_output = query.default_output().map(|id| query.describe(id));
        let is_default = match (aggregate_id, &default_output) {
            (Some(aggregate), Some(default)) => aggregate == default.id,
            _ => false,
        };

        AggregationStatus {
            aggregate_id,
            is_default,
            default_output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::{FakeDevice, FakeHardware};

    const SPEAKERS: DeviceId = 41;
    const LOOPBACK: DeviceId = 42;

    fn system() -> FakeHardware {
        FakeHardware::new(
            vec![
                FakeDevice::input(40, "MacBook Pro Microphone", "BuiltInMicrophoneDevice"),
                FakeDevice::output(SPEAKERS, "MacBook Pro Speakers", "BuiltInSpeakerDevice"),
                FakeDevice::virtual_output(LOOPBACK, "LedFx Loopback", "LedFxLoopback_UID"),
            ],
            Some(SPEAKERS),
        )
    }

    #[test]
    fn test_enable_creates_stacked_aggregate() {
        let hw = system();
        let settings = Settings::default();
        let controller = AggregationController::new(&hw, &settings);

        let outcome = controller.enable("LedFx").unwrap();
        let EnableOutcome::Enabled { aggregate_id } = outcome else {
            panic!("expected a new aggregate, got {:?}", outcome);
        };

        let state = hw.state.borrow();
        assert_eq!(state.created.len(), 1);
        let desc = &state.created[0];
        assert_eq!(desc.name(), "LedFx Audio System");
        assert_eq!(desc.uid(), "com.ledfx.aggregate.auto");
        assert_eq!(desc.members(), ["BuiltInSpeakerDevice", "LedFxLoopback_UID"]);
        assert_eq!(desc.master_uid(), "BuiltInSpeakerDevice");
        assert!(desc.is_stacked());
        assert_eq!(state.default_output, Some(aggregate_id));
    }

    #[test]
    fn test_enable_twice_is_idempotent() {
        let hw = system();
        let settings = Settings::default();
        let controller = AggregationController::new(&hw, &settings);

        assert!(matches!(
            controller.enable("LedFx").unwrap(),
            EnableOutcome::Enabled { .. }
        ));
        assert_eq!(controller.enable("LedFx").unwrap(), EnableOutcome::AlreadyActive);
        assert_eq!(hw.state.borrow().created.len(), 1);
    }

    #[test]
    fn test_enable_without_driver_fails() {
        let hw = system();
        let settings = Settings::default();
        let controller = AggregationController::new(&hw, &settings);

        let err = controller.enable("BlackHole").unwrap_err();
        assert!(matches!(err, AudioError::DriverNotInstalled(ref name) if name == "BlackHole"));
        assert!(hw.state.borrow().created.is_empty());
        assert_eq!(hw.default_output(), Some(SPEAKERS));
    }

    #[test]
    fn test_enable_without_default_output_fails() {
        let hw = FakeHardware::new(
            vec![FakeDevice::virtual_output(LOOPBACK, "LedFx Loopback", "LedFxLoopback_UID")],
            None,
        );
        let settings = Settings::default();
        let controller = AggregationController::new(&hw, &settings);

        assert!(matches!(
            controller.enable("LedFx"),
            Err(AudioError::NoDefaultOutput)
        ));
    }

    #[test]
    fn test_enable_reports_os_status() {
        let hw = system();
        hw.state.borrow_mut().create_error = Some(1852797029);
        let settings = Settings::default();
        let controller = AggregationController::new(&hw, &settings);

        let err = controller.enable("LedFx").unwrap_err();
        assert!(matches!(err, AudioError::OsStatus { status: 1852797029, .. }));
        assert_eq!(hw.default_output(), Some(SPEAKERS));
    }

    #[test]
    fn test_disable_without_aggregate_is_noop() {
        let hw = system();
        let settings = Settings::default();
        let controller = AggregationController::new(&hw, &settings);

        assert_eq!(controller.disable().unwrap(), DisableOutcome::NotPresent);
        let state = hw.state.borrow();
        assert!(state.destroyed.is_empty());
        assert!(state.default_changes.is_empty());
    }

    #[test]
    fn test_disable_falls_back_then_destroys() {
        let hw = system();
        let settings = Settings::default();
        let controller = AggregationController::new(&hw, &settings);

        let EnableOutcome::Enabled { aggregate_id } = controller.enable("LedFx").unwrap() else {
            panic!("enable did not create an aggregate");
        };

        let outcome = controller.disable().unwrap();
        let DisableOutcome::Disabled { fallback } = outcome else {
            panic!("expected disable, got {:?}", outcome);
        };
        assert_eq!(fallback.map(|d| d.id), Some(SPEAKERS));

        let state = hw.state.borrow();
        assert_eq!(state.destroyed, vec![aggregate_id]);
        assert_eq!(state.default_output, Some(SPEAKERS));
        assert_eq!(state.default_changes, vec![aggregate_id, SPEAKERS]);
    }

    #[test]
    fn test_disable_destroys_even_without_fallback() {
        let hw = FakeHardware::new(
            vec![
                FakeDevice::virtual_output(LOOPBACK, "LedFx Loopback", "LedFxLoopback_UID"),
                FakeDevice::aggregate(
                    50,
                    "LedFx Audio System",
                    "com.ledfx.aggregate.auto",
                    &[LOOPBACK],
                ),
            ],
            Some(50),
        );
        let settings = Settings::default();
        let controller = AggregationController::new(&hw, &settings);

        assert_eq!(
            controller.disable().unwrap(),
            DisableOutcome::Disabled { fallback: None }
        );
        assert_eq!(hw.state.borrow().destroyed, vec![50]);
    }

    #[test]
    fn test_disable_survives_failed_fallback_switch() {
        let hw = system();
        let settings = Settings::default();
        let controller = AggregationController::new(&hw, &settings);

        let EnableOutcome::Enabled { aggregate_id } = controller.enable("LedFx").unwrap() else {
            panic!("enable did not create an aggregate");
        };
        hw.state.borrow_mut().set_default_error = Some(-1);

        assert_eq!(
            controller.disable().unwrap(),
            DisableOutcome::Disabled { fallback: None }
        );
        let state = hw.state.borrow();
        assert_eq!(state.destroyed, vec![aggregate_id]);
        assert_eq!(state.default_changes, vec![aggregate_id]);
    }

    #[test]
    fn test_disable_destroy_failure_is_fatal() {
        let hw = system();
        let settings = Settings::default();
        let controller = AggregationController::new(&hw, &settings);

        let EnableOutcome::Enabled { aggregate_id } = controller.enable("LedFx").unwrap() else {
            panic!("enable did not create an aggregate");
        };
        hw.state.borrow_mut().destroy_error = Some(-50);

        let err = controller.disable().unwrap_err();
        assert!(matches!(err, AudioError::OsStatus { status: -50, .. }));

        // The fallback switch already happened; the aggregate is still there
        let state = hw.state.borrow();
        assert!(state.destroyed.is_empty());
        assert_eq!(state.default_output, Some(SPEAKERS));
        assert!(state.devices.iter().any(|d| d.id == aggregate_id));
    }

    #[test]
    fn test_status_tracks_state_machine() {
        let hw = system();
        let settings = Settings::default();
        let controller = AggregationController::new(&hw, &settings);

        let before = controller.status();
        assert!(!before.enabled());
        assert_eq!(before.default_output.map(|d| d.id), Some(SPEAKERS));

        controller.enable("LedFx").unwrap();
        let during = controller.status();
        assert!(during.enabled());

        controller.disable().unwrap();
        let after = controller.status();
        assert!(after.aggregate_id.is_none());
        assert!(!after.enabled());
    }
}
