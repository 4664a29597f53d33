//! Audio input-switching evaluator (spec.md §4.2 `ChangeAudioInputDefault`).

use super::{build_action, CommandEvaluator};
use crate::domain::errors::ControlError;
use crate::domain::model::{ActionStructure, EventInfo};
use crate::domain::value_objects::{DeviceName, EvaluatorKey};
use crate::domain::{PublicRoom, Room};
use crate::graph::InputGraph;
use std::collections::HashMap;

/// Changes the active input on an audio device by resolving the
/// requested input name against its declared ports, the same rule
/// [`super::video_input::ChangeVideoInputDefault`] applies to displays.
pub struct ChangeAudioInputDefault;

impl CommandEvaluator for ChangeAudioInputDefault {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("ChangeAudioInputDefault")
    }

    fn evaluate(
        &self,
        room: &Room,
        intent: &PublicRoom,
        _graph: &InputGraph,
    ) -> Result<Vec<ActionStructure>, ControlError> {
        let mut actions = Vec::new();
        for public_audio in &intent.audio_devices {
            let Some(input) = &public_audio.input else {
                continue;
            };
            let device = room
                .device(&public_audio.name)
                .ok_or_else(|| ControlError::UnknownDevice(public_audio.name.clone()))?;
            let port = device
                .ports
                .iter()
                .find(|p| p.source_device.as_str() == input.as_str())
                .ok_or_else(|| ControlError::NoRoute {
                    source: DeviceName::new(input.clone()),
                    sink: device.name.clone(),
                })?;

            let mut parameters = HashMap::new();
            parameters.insert("port".to_string(), port.id.as_str().to_string());

            let event_log = vec![EventInfo {
                event_type: "UserAction".to_string(),
                cause: "UserInput".to_string(),
                key: "input".to_string(),
                value: input.clone(),
                device: Some(device.name.clone()),
            }];

            actions.push(build_action(
                device,
                "ChangeInput",
                "ChangeAudioInputDefault",
                true,
                parameters,
                event_log,
            )?);
        }
        Ok(actions)
    }
}
