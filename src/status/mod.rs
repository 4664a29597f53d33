//! # Status Evaluators & Aggregation
//!
//! Per-device status query generation and response normalization
//! (spec.md §4.6), grounded in `original_source/status/helpers.go`
//! (`generateStatusCommands`, `evaluateResponses`, `processAudioDevice`,
//! `processDisplay`) and `original_source/status/power-default.go`'s
//! `PowerDefault` evaluator shape.
//!
//! Shares its selection mechanism with [`crate::evaluators`]:
//! `room.configuration.evaluators` (spec.md §3) names which entries in
//! *both* registries apply to a given room, so a room's one
//! configuration list carries both its status evaluator keys (handled
//! here) and its command evaluator keys (handled by
//! [`crate::evaluators::plan`]).

use crate::domain::model::{
    Configuration, DestinationDevice, Device, DeviceRole, PublicAudioDevice, PublicDisplay,
    PublicRoom, Room, Status, StatusCommand,
};
use crate::domain::value_objects::EvaluatorKey;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Prefix marking a command as status-producing (spec.md §6
/// "Command-name conventions").
pub const STATUS_FLAG: &str = "STATUS";

/// A per-attribute status query generator and response normalizer.
pub trait StatusEvaluator: Send + Sync {
    /// Registry key, e.g. "PowerDefault".
    fn key(&self) -> EvaluatorKey;

    /// Build one [`StatusCommand`] per applicable device in `room`.
    fn generate_commands(&self, room: &Room) -> Vec<StatusCommand>;

    /// Normalize a raw device-reported key/value into the canonical
    /// schema (`power`, `input`, `blanked`, `muted`, `volume`). Returns
    /// `None` to drop malformed entries (spec.md §4.6).
    fn normalize(&self, key: &str, value: &Value) -> Option<(String, Value)>;
}

fn generate_standard(
    room: &Room,
    suffix: &str,
    generator: EvaluatorKey,
) -> Vec<StatusCommand> {
    room.devices
        .iter()
        .filter_map(|device| {
            let command = device.command_matching(STATUS_FLAG, suffix)?;
            Some(StatusCommand {
                action: command.clone(),
                device: device.clone(),
                parameters: HashMap::new(),
                generator: generator.clone(),
                destination_device: destination_for(device),
            })
        })
        .collect()
}

fn destination_for(device: &Device) -> DestinationDevice {
    DestinationDevice {
        device: device.clone(),
        audio_device: device.has_role(DeviceRole::AudioOut),
        display: device.has_role(DeviceRole::VideoOut),
    }
}

/// `power` status: on/standby.
pub struct PowerStatus;

impl StatusEvaluator for PowerStatus {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("PowerDefault")
    }

    fn generate_commands(&self, room: &Room) -> Vec<StatusCommand> {
        generate_standard(room, "Power", self.key())
    }

    fn normalize(&self, key: &str, value: &Value) -> Option<(String, Value)> {
        if key.eq_ignore_ascii_case("power") {
            Some(("power".to_string(), value.clone()))
        } else {
            None
        }
    }
}

/// `input` status: active input source name.
pub struct InputStatus;

impl StatusEvaluator for InputStatus {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("InputDefault")
    }

    fn generate_commands(&self, room: &Room) -> Vec<StatusCommand> {
        generate_standard(room, "Input", self.key())
    }

    fn normalize(&self, key: &str, value: &Value) -> Option<(String, Value)> {
        if key.eq_ignore_ascii_case("input") {
            Some(("input".to_string(), value.clone()))
        } else {
            None
        }
    }
}

/// `muted` status: boolean only, rejects non-bool reports.
pub struct MutedStatus;

impl StatusEvaluator for MutedStatus {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("MutedDefault")
    }

    fn generate_commands(&self, room: &Room) -> Vec<StatusCommand> {
        generate_standard(room, "Muted", self.key())
    }

    fn normalize(&self, key: &str, value: &Value) -> Option<(String, Value)> {
        if key.eq_ignore_ascii_case("muted") && value.is_boolean() {
            Some(("muted".to_string(), value.clone()))
        } else {
            None
        }
    }
}

/// `blanked` status: boolean only.
pub struct BlankedStatus;

impl StatusEvaluator for BlankedStatus {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("BlankedDefault")
    }

    fn generate_commands(&self, room: &Room) -> Vec<StatusCommand> {
        generate_standard(room, "Blanked", self.key())
    }

    fn normalize(&self, key: &str, value: &Value) -> Option<(String, Value)> {
        if key.eq_ignore_ascii_case("blanked") && value.is_boolean() {
            Some(("blanked".to_string(), value.clone()))
        } else {
            None
        }
    }
}

/// `volume` status: numeric, truncated to integer (spec.md §4.6 "numeric
/// `volume` may arrive as floating-point and must be truncated").
pub struct VolumeStatus;

impl StatusEvaluator for VolumeStatus {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("VolumeDefault")
    }

    fn generate_commands(&self, room: &Room) -> Vec<StatusCommand> {
        generate_standard(room, "Volume", self.key())
    }

    fn normalize(&self, key: &str, value: &Value) -> Option<(String, Value)> {
        if !key.eq_ignore_ascii_case("volume") {
            return None;
        }
        let truncated = value.as_f64()?.trunc() as i64;
        Some(("volume".to_string(), Value::from(truncated)))
    }
}

/// Process-wide table of status evaluators, mirroring
/// [`crate::evaluators::Registry`]'s `OnceLock` pattern.
pub struct StatusRegistry {
    evaluators: HashMap<EvaluatorKey, Box<dyn StatusEvaluator>>,
}

impl StatusRegistry {
    fn build() -> Self {
        let all: Vec<Box<dyn StatusEvaluator>> = vec![
            Box::new(PowerStatus),
            Box::new(InputStatus),
            Box::new(MutedStatus),
            Box::new(BlankedStatus),
            Box::new(VolumeStatus),
        ];
        Self {
            evaluators: all.into_iter().map(|e| (e.key(), e)).collect(),
        }
    }

    /// The process-wide status evaluator registry.
    pub fn global() -> &'static StatusRegistry {
        static REGISTRY: OnceLock<StatusRegistry> = OnceLock::new();
        REGISTRY.get_or_init(StatusRegistry::build)
    }

    /// Look up a status evaluator by key.
    pub fn get(&self, key: &EvaluatorKey) -> Option<&dyn StatusEvaluator> {
        self.evaluators.get(key).map(|b| b.as_ref())
    }
}

/// Configuration naming every built-in status evaluator and none of the
/// command evaluators — a fixture for tests that only exercise status
/// generation/aggregation. A real room's configuration (sourced from
/// the config DB) also names the command evaluator keys matching its
/// installed control hardware; this helper intentionally omits them.
pub fn default_configuration() -> Configuration {
    Configuration {
        evaluators: vec![
            EvaluatorKey::new("PowerDefault"),
            EvaluatorKey::new("InputDefault"),
            EvaluatorKey::new("MutedDefault"),
            EvaluatorKey::new("BlankedDefault"),
            EvaluatorKey::new("VolumeDefault"),
        ],
    }
}

/// Generate the status commands for every status evaluator named in
/// `room.configuration.evaluators`.
pub fn generate_status_commands(room: &Room) -> Vec<StatusCommand> {
    let registry = StatusRegistry::global();
    room.configuration
        .evaluators
        .iter()
        .filter_map(|key| registry.get(key))
        .flat_map(|evaluator| evaluator.generate_commands(room))
        .collect()
}

/// Normalize and merge dispatched [`Status`] results into a [`PublicRoom`]
/// view (spec.md §4.6). Malformed entries are dropped with a warning,
/// never fatal.
pub fn aggregate(statuses: Vec<Status>, room: &Room) -> PublicRoom {
    let registry = StatusRegistry::global();
    let mut displays: HashMap<String, PublicDisplay> = HashMap::new();
    let mut audio_devices: HashMap<String, PublicAudioDevice> = HashMap::new();

    for status in statuses {
        let destination = &status.destination_device;
        let device_name = destination.device.name.clone();

        if let Some(message) = &status.error_message {
            tracing::warn!(device = %device_name, error = %message, "status command failed");
        }

        for response in &status.responses {
            let Some(evaluator) = registry.get(&response.generator) else {
                tracing::warn!(generator = %response.generator, "unknown status generator");
                continue;
            };

            for (raw_key, raw_value) in &response.status {
                let Some((key, value)) = evaluator.normalize(raw_key, raw_value) else {
                    tracing::warn!(
                        device = %device_name,
                        generator = %response.generator,
                        key = %raw_key,
                        "dropping malformed status entry"
                    );
                    continue;
                };

                if destination.display {
                    let entry = displays
                        .entry(device_name.as_str().to_string())
                        .or_insert_with(|| PublicDisplay {
                            name: device_name.clone(),
                            ..Default::default()
                        });
                    apply_display_field(entry, &key, &value);
                }
                if destination.audio_device {
                    let entry = audio_devices
                        .entry(device_name.as_str().to_string())
                        .or_insert_with(|| PublicAudioDevice {
                            name: device_name.clone(),
                            ..Default::default()
                        });
                    apply_audio_field(entry, &key, &value);
                }
            }
        }
    }

    PublicRoom {
        building: Some(room.building.clone()),
        room: Some(room.room.clone()),
        power: None,
        muted: None,
        blanked: None,
        displays: displays.into_values().collect(),
        audio_devices: audio_devices.into_values().collect(),
    }
}

fn apply_display_field(display: &mut PublicDisplay, key: &str, value: &Value) {
    match key {
        "power" => display.power = value.as_str().map(str::to_string),
        "input" => display.input = value.as_str().map(str::to_string),
        "blanked" => display.blanked = value.as_bool(),
        _ => {}
    }
}

fn apply_audio_field(audio: &mut PublicAudioDevice, key: &str, value: &Value) {
    match key {
        "power" => audio.power = value.as_str().map(str::to_string),
        "input" => audio.input = value.as_str().map(str::to_string),
        "muted" => audio.muted = value.as_bool(),
        "volume" => audio.volume = value.as_i64(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{DeviceCommand, Status, StatusResponse};
    use crate::domain::value_objects::{BuildingId, CommandName, DeviceName, RoomId};

    fn dsp_device() -> Device {
        Device {
            name: DeviceName::new("DSP1"),
            address: "10.0.0.1".to_string(),
            roles: vec![DeviceRole::AudioOut],
            commands: vec![DeviceCommand {
                name: CommandName::new("STATUSVolume"),
                microservice_address: "http://ms/".to_string(),
                endpoint_path: "/:address/volume".to_string(),
                method: "GET".to_string(),
            }],
            ports: vec![],
        }
    }

    #[test]
    fn volume_is_truncated_to_integer() {
        let room = Room {
            building: BuildingId::new("ITB"),
            room: RoomId::new("1010"),
            devices: vec![dsp_device()],
            configuration: default_configuration(),
        };
        let mut raw = HashMap::new();
        raw.insert("volume".to_string(), Value::from(63.9));
        let status = Status {
            destination_device: destination_for(&dsp_device()),
            responses: vec![StatusResponse {
                generator: EvaluatorKey::new("VolumeDefault"),
                status: raw,
            }],
            error_message: None,
        };
        let view = aggregate(vec![status], &room);
        assert_eq!(view.audio_devices[0].volume, Some(63));
    }

    #[test]
    fn non_boolean_muted_is_dropped() {
        let room = Room {
            building: BuildingId::new("ITB"),
            room: RoomId::new("1010"),
            devices: vec![dsp_device()],
            configuration: default_configuration(),
        };
        let mut raw = HashMap::new();
        raw.insert("muted".to_string(), Value::from("yes"));
        let status = Status {
            destination_device: destination_for(&dsp_device()),
            responses: vec![StatusResponse {
                generator: EvaluatorKey::new("MutedDefault"),
                status: raw,
            }],
            error_message: None,
        };
        let view = aggregate(vec![status], &room);
        assert!(view.audio_devices.is_empty() || view.audio_devices[0].muted.is_none());
    }
}
