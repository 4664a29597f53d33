//! Room-wide and per-device power evaluators.
//!
//! Grounded in `original_source/commandevaluators/unmute-default.go`'s
//! room-wide/per-device split, applied here to the `Power` intent field
//! instead of `Muted`.

use super::{build_action, devices_with_command, CommandEvaluator};
use crate::domain::errors::ControlError;
use crate::domain::model::{ActionStructure, EventInfo};
use crate::domain::value_objects::EvaluatorKey;
use crate::domain::{PublicRoom, Room};
use crate::graph::InputGraph;

fn plan_power(
    room: &Room,
    intent: &PublicRoom,
    action_name: &str,
    state_value: &str,
    evaluator_key: &str,
) -> Result<Vec<ActionStructure>, ControlError> {
    let mut actions = Vec::new();

    if intent.power.as_deref() == Some(state_value) {
        for device in devices_with_command(room, action_name) {
            let event_log = vec![EventInfo {
                event_type: "UserAction".to_string(),
                cause: "UserInput".to_string(),
                key: "power".to_string(),
                value: state_value.to_string(),
                device: Some(device.name.clone()),
            }];
            actions.push(build_action(
                device,
                action_name,
                evaluator_key,
                false,
                Default::default(),
                event_log,
            )?);
        }
    }

    for display in &intent.displays {
        if display.power.as_deref() == Some(state_value) {
            let device = room
                .device(&display.name)
                .ok_or_else(|| ControlError::UnknownDevice(display.name.clone()))?;
            let event_log = vec![EventInfo {
                event_type: "UserAction".to_string(),
                cause: "UserInput".to_string(),
                key: "power".to_string(),
                value: state_value.to_string(),
                device: Some(device.name.clone()),
            }];
            actions.push(build_action(
                device,
                action_name,
                evaluator_key,
                true,
                Default::default(),
                event_log,
            )?);
        }
    }

    for audio in &intent.audio_devices {
        if audio.power.as_deref() == Some(state_value) {
            let device = room
                .device(&audio.name)
                .ok_or_else(|| ControlError::UnknownDevice(audio.name.clone()))?;
            let event_log = vec![EventInfo {
                event_type: "UserAction".to_string(),
                cause: "UserInput".to_string(),
                key: "power".to_string(),
                value: state_value.to_string(),
                device: Some(device.name.clone()),
            }];
            actions.push(build_action(
                device,
                action_name,
                evaluator_key,
                true,
                Default::default(),
                event_log,
            )?);
        }
    }

    Ok(actions)
}

/// Powers on every device advertising `PowerOn`, room-wide or per-device.
pub struct PowerOnDefault;

impl CommandEvaluator for PowerOnDefault {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("PowerOnDefault")
    }

    fn evaluate(
        &self,
        room: &Room,
        intent: &PublicRoom,
        _graph: &InputGraph,
    ) -> Result<Vec<ActionStructure>, ControlError> {
        plan_power(room, intent, "PowerOn", "on", "PowerOnDefault")
    }

    fn incompatible_commands(&self) -> &'static [&'static str] {
        &["Standby"]
    }
}

/// Stands by every device advertising `Standby`, room-wide or per-device.
pub struct StandbyDefault;

impl CommandEvaluator for StandbyDefault {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("StandbyDefault")
    }

    fn evaluate(
        &self,
        room: &Room,
        intent: &PublicRoom,
        _graph: &InputGraph,
    ) -> Result<Vec<ActionStructure>, ControlError> {
        plan_power(room, intent, "Standby", "standby", "StandbyDefault")
    }

    fn incompatible_commands(&self) -> &'static [&'static str] {
        &["PowerOn"]
    }
}
