//! Mute/unmute evaluators, grounded directly in
//! `original_source/commandevaluators/unmute-default.go`.

use super::{build_action, devices_with_command, CommandEvaluator};
use crate::domain::errors::ControlError;
use crate::domain::model::{ActionStructure, EventInfo};
use crate::domain::value_objects::EvaluatorKey;
use crate::domain::{PublicRoom, Room};
use crate::graph::InputGraph;

fn plan_mute(
    room: &Room,
    intent: &PublicRoom,
    muted: bool,
    action_name: &str,
    evaluator_key: &str,
) -> Result<Vec<ActionStructure>, ControlError> {
    let mut actions = Vec::new();

    if intent.muted == Some(muted) {
        for device in devices_with_command(room, action_name) {
            let event_log = vec![EventInfo {
                event_type: "UserAction".to_string(),
                cause: "UserInput".to_string(),
                key: "muted".to_string(),
                value: muted.to_string(),
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

    for audio in &intent.audio_devices {
        if audio.muted == Some(muted) {
            let device = room
                .device(&audio.name)
                .ok_or_else(|| ControlError::UnknownDevice(audio.name.clone()))?;
            let event_log = vec![EventInfo {
                event_type: "UserAction".to_string(),
                cause: "UserInput".to_string(),
                key: "muted".to_string(),
                value: muted.to_string(),
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

/// Mutes all/requested `AudioOut` devices.
pub struct MuteDefault;

impl CommandEvaluator for MuteDefault {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("MuteDefault")
    }

    fn evaluate(
        &self,
        room: &Room,
        intent: &PublicRoom,
        _graph: &InputGraph,
    ) -> Result<Vec<ActionStructure>, ControlError> {
        plan_mute(room, intent, true, "Mute", "MuteDefault")
    }

    fn incompatible_commands(&self) -> &'static [&'static str] {
        &["UnMute"]
    }
}

/// Unmutes all/requested `AudioOut` devices.
pub struct UnMuteDefault;

impl CommandEvaluator for UnMuteDefault {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("UnMuteDefault")
    }

    fn evaluate(
        &self,
        room: &Room,
        intent: &PublicRoom,
        _graph: &InputGraph,
    ) -> Result<Vec<ActionStructure>, ControlError> {
        plan_mute(room, intent, false, "UnMute", "UnMuteDefault")
    }

    fn incompatible_commands(&self) -> &'static [&'static str] {
        &["Mute"]
    }
}

/// DSP-controlled mute variant — same evaluation, distinct generator tag
/// for status-response normalization.
pub struct MuteDsp;

impl CommandEvaluator for MuteDsp {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("MuteDSP")
    }

    fn evaluate(
        &self,
        room: &Room,
        intent: &PublicRoom,
        _graph: &InputGraph,
    ) -> Result<Vec<ActionStructure>, ControlError> {
        plan_mute(room, intent, true, "Mute", "MuteDSP")
    }

    fn incompatible_commands(&self) -> &'static [&'static str] {
        &["UnMute"]
    }
}

/// DSP-controlled unmute variant.
pub struct UnmuteDsp;

impl CommandEvaluator for UnmuteDsp {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("UnmuteDSP")
    }

    fn evaluate(
        &self,
        room: &Room,
        intent: &PublicRoom,
        _graph: &InputGraph,
    ) -> Result<Vec<ActionStructure>, ControlError> {
        plan_mute(room, intent, false, "UnMute", "UnmuteDSP")
    }

    fn incompatible_commands(&self) -> &'static [&'static str] {
        &["Mute"]
    }
}
