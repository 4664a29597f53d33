//! Display blank/unblank evaluators (spec.md §4.2 `Blank/UnBlank Default`).

use super::{build_action, CommandEvaluator};
use crate::domain::errors::ControlError;
use crate::domain::model::{ActionStructure, EventInfo};
use crate::domain::value_objects::EvaluatorKey;
use crate::domain::{PublicRoom, Room};
use crate::graph::InputGraph;

fn plan_blank(
    room: &Room,
    intent: &PublicRoom,
    blanked: bool,
    action_name: &str,
    evaluator_key: &str,
) -> Result<Vec<ActionStructure>, ControlError> {
    let mut actions = Vec::new();
    for display in &intent.displays {
        if display.blanked == Some(blanked) {
            let device = room
                .device(&display.name)
                .ok_or_else(|| ControlError::UnknownDevice(display.name.clone()))?;
            let event_log = vec![EventInfo {
                event_type: "UserAction".to_string(),
                cause: "UserInput".to_string(),
                key: "blanked".to_string(),
                value: blanked.to_string(),
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

/// Blanks displays whose `Blanked` field is set to `true`.
pub struct BlankDisplayDefault;

impl CommandEvaluator for BlankDisplayDefault {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("BlankDisplayDefault")
    }

    fn evaluate(
        &self,
        room: &Room,
        intent: &PublicRoom,
        _graph: &InputGraph,
    ) -> Result<Vec<ActionStructure>, ControlError> {
        plan_blank(room, intent, true, "BlankDisplay", "BlankDisplayDefault")
    }

    fn incompatible_commands(&self) -> &'static [&'static str] {
        &["UnblankDisplay"]
    }
}

/// Unblanks displays whose `Blanked` field is set to `false`.
pub struct UnBlankDisplayDefault;

impl CommandEvaluator for UnBlankDisplayDefault {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("UnBlankDisplayDefault")
    }

    fn evaluate(
        &self,
        room: &Room,
        intent: &PublicRoom,
        _graph: &InputGraph,
    ) -> Result<Vec<ActionStructure>, ControlError> {
        plan_blank(
            room,
            intent,
            false,
            "UnblankDisplay",
            "UnBlankDisplayDefault",
        )
    }

    fn incompatible_commands(&self) -> &'static [&'static str] {
        &["BlankDisplay"]
    }
}
