//! Volume-setting evaluators (spec.md §4.2 `SetVolume*`).
//!
//! Volume is clamped into `[0, 100]` prior to emission, per spec.md §4.2
//! "Numeric semantics".

use super::{build_action, CommandEvaluator};
use crate::domain::errors::ControlError;
use crate::domain::model::{ActionStructure, EventInfo};
use crate::domain::value_objects::EvaluatorKey;
use crate::domain::{PublicRoom, Room};
use crate::graph::InputGraph;
use std::collections::HashMap;

fn plan_volume(
    room: &Room,
    intent: &PublicRoom,
    evaluator_key: &str,
) -> Result<Vec<ActionStructure>, ControlError> {
    let mut actions = Vec::new();
    for audio in &intent.audio_devices {
        let Some(level) = audio.volume else {
            continue;
        };
        let device = room
            .device(&audio.name)
            .ok_or_else(|| ControlError::UnknownDevice(audio.name.clone()))?;
        let clamped = level.clamp(0, 100);

        let mut parameters = HashMap::new();
        parameters.insert("level".to_string(), clamped.to_string());

        let event_log = vec![EventInfo {
            event_type: "UserAction".to_string(),
            cause: "UserInput".to_string(),
            key: "volume".to_string(),
            value: clamped.to_string(),
            device: Some(device.name.clone()),
        }];

        actions.push(build_action(
            device,
            "SetVolume",
            evaluator_key,
            true,
            parameters,
            event_log,
        )?);
    }
    Ok(actions)
}

/// Default volume control.
pub struct SetVolumeDefault;

impl CommandEvaluator for SetVolumeDefault {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("SetVolumeDefault")
    }

    fn evaluate(
        &self,
        room: &Room,
        intent: &PublicRoom,
        _graph: &InputGraph,
    ) -> Result<Vec<ActionStructure>, ControlError> {
        plan_volume(room, intent, "SetVolumeDefault")
    }
}

/// DMPS-controlled volume variant.
pub struct SetVolumeDmps;

impl CommandEvaluator for SetVolumeDmps {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("SetVolumeDMPS")
    }

    fn evaluate(
        &self,
        room: &Room,
        intent: &PublicRoom,
        _graph: &InputGraph,
    ) -> Result<Vec<ActionStructure>, ControlError> {
        plan_volume(room, intent, "SetVolumeDMPS")
    }
}

/// TecLite-controlled volume variant.
pub struct SetVolumeTecLite;

impl CommandEvaluator for SetVolumeTecLite {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("SetVolumeTecLite")
    }

    fn evaluate(
        &self,
        room: &Room,
        intent: &PublicRoom,
        _graph: &InputGraph,
    ) -> Result<Vec<ActionStructure>, ControlError> {
        plan_volume(room, intent, "SetVolumeTecLite")
    }
}

/// DSP-controlled volume variant.
pub struct SetVolumeDsp;

impl CommandEvaluator for SetVolumeDsp {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("SetVolumeDSP")
    }

    fn evaluate(
        &self,
        room: &Room,
        intent: &PublicRoom,
        _graph: &InputGraph,
    ) -> Result<Vec<ActionStructure>, ControlError> {
        plan_volume(room, intent, "SetVolumeDSP")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Configuration, Device, DeviceCommand, DeviceRole, PublicAudioDevice};
    use crate::domain::value_objects::{BuildingId, CommandName, DeviceName, RoomId};

    fn room_with_dsp() -> Room {
        Room {
            building: BuildingId::new("ITB"),
            room: RoomId::new("1010"),
            devices: vec![Device {
                name: DeviceName::new("DSP1"),
                address: "10.0.0.1".to_string(),
                roles: vec![DeviceRole::AudioOut],
                commands: vec![DeviceCommand {
                    name: CommandName::new("SetVolume"),
                    microservice_address: "http://ms/".to_string(),
                    endpoint_path: "/:address/volume/:level".to_string(),
                    method: "GET".to_string(),
                }],
                ports: vec![],
            }],
            configuration: Configuration::default(),
        }
    }

    #[test]
    fn volume_above_100_is_clamped() {
        let room = room_with_dsp();
        let intent = PublicRoom {
            audio_devices: vec![PublicAudioDevice {
                name: DeviceName::new("DSP1"),
                volume: Some(150),
                ..Default::default()
            }],
            ..Default::default()
        };
        let graph = InputGraph::build(&room);
        let actions = SetVolumeDefault.evaluate(&room, &intent, &graph).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].parameters.get("level").unwrap(), "100");
    }
}
