//! # Command Evaluators
//!
//! The pluggable registry of per-command planners (spec.md §4.1–4.2),
//! grounded in `original_source/commandevaluators/commandevaluators.go`'s
//! `CommandEvaluator` interface and `CommandMap` singleton, and
//! `unmute-default.go` for the room-wide/per-device evaluation shape each
//! concrete evaluator follows.

pub mod audio_input;
pub mod blank;
pub mod mute;
pub mod power;
pub mod video_input;
pub mod volume;

use crate::domain::errors::ControlError;
use crate::domain::model::{ActionStructure, Device, EventInfo};
use crate::domain::value_objects::{CommandName, EvaluatorKey};
use crate::domain::{PublicRoom, Room};
use crate::graph::InputGraph;
use std::collections::HashMap;
use std::sync::OnceLock;

/// A pluggable planner for one command family: translates a room intent
/// into zero or more [`ActionStructure`] values, validates that an
/// action's target device actually advertises the command, and declares
/// which other command names it conflicts with.
///
/// Implementations are zero-sized and stateless; all the state they need
/// (the room, the intent, the input graph) is passed into `evaluate`.
pub trait CommandEvaluator: Send + Sync {
    /// The key this evaluator is registered under, e.g. "PowerOnDefault".
    fn key(&self) -> EvaluatorKey;

    /// Read the intent and emit the actions this evaluator is
    /// responsible for.
    fn evaluate(
        &self,
        room: &Room,
        intent: &PublicRoom,
        graph: &InputGraph,
    ) -> Result<Vec<ActionStructure>, ControlError>;

    /// Confirm the action's target device advertises a command matching
    /// this evaluator's action name.
    fn validate(&self, action: &ActionStructure) -> Result<(), ControlError> {
        action
            .device
            .command(&action.action)
            .map(|_| ())
            .ok_or_else(|| ControlError::UnknownCommand {
                device: action.device.name.clone(),
                command: action.action.clone(),
            })
    }

    /// Command names that cannot coexist on the same device as this
    /// evaluator's emitted action.
    fn incompatible_commands(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Build an [`ActionStructure`], failing with [`ControlError::UnknownCommand`]
/// if `device` does not advertise `action_name`.
pub(crate) fn build_action(
    device: &Device,
    action_name: &str,
    evaluator_key: &str,
    device_specific: bool,
    parameters: HashMap<String, String>,
    event_log: Vec<EventInfo>,
) -> Result<ActionStructure, ControlError> {
    let name = CommandName::new(action_name);
    device
        .command(&name)
        .ok_or_else(|| ControlError::UnknownCommand {
            device: device.name.clone(),
            command: name.clone(),
        })?;
    Ok(ActionStructure {
        action: name,
        device: device.clone(),
        generating_evaluator: EvaluatorKey::new(evaluator_key),
        device_specific,
        parameters,
        event_log,
        overridden: false,
    })
}

/// Devices in `room` that advertise a command named `action_name`.
pub(crate) fn devices_with_command<'a>(
    room: &'a Room,
    action_name: &str,
) -> impl Iterator<Item = &'a Device> {
    let name = CommandName::new(action_name);
    room.devices
        .iter()
        .filter(move |d| d.command(&name).is_some())
}

/// Process-wide, name-keyed table of evaluators (spec.md §4.1). Built
/// once and never mutated afterward, initialized lazily behind a
/// [`OnceLock`] — the idiomatic std equivalent of the one-time
/// initializer spec.md §9 calls for.
pub struct Registry {
    evaluators: HashMap<EvaluatorKey, Box<dyn CommandEvaluator>>,
}

impl Registry {
    fn build() -> Self {
        let all: Vec<Box<dyn CommandEvaluator>> = vec![
            Box::new(power::PowerOnDefault),
            Box::new(power::StandbyDefault),
            Box::new(video_input::ChangeVideoInputDefault),
            Box::new(video_input::ChangeVideoInputVideoSwitcher),
            Box::new(video_input::ChangeVideoInputDmps),
            Box::new(audio_input::ChangeAudioInputDefault),
            Box::new(mute::MuteDefault),
            Box::new(mute::UnMuteDefault),
            Box::new(mute::MuteDsp),
            Box::new(mute::UnmuteDsp),
            Box::new(volume::SetVolumeDefault),
            Box::new(volume::SetVolumeDmps),
            Box::new(volume::SetVolumeTecLite),
            Box::new(volume::SetVolumeDsp),
            Box::new(blank::BlankDisplayDefault),
            Box::new(blank::UnBlankDisplayDefault),
        ];
        let evaluators = all.into_iter().map(|e| (e.key(), e)).collect();
        tracing::info!(count = %evaluators_len(&evaluators), "evaluator registry initialized");
        Self { evaluators }
    }

    /// The process-wide registry, built on first access.
    pub fn global() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::build)
    }

    /// Look up an evaluator by key.
    pub fn get(&self, key: &EvaluatorKey) -> Option<&dyn CommandEvaluator> {
        self.evaluators.get(key).map(|b| b.as_ref())
    }

    /// All registered evaluator keys, in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = &EvaluatorKey> {
        self.evaluators.keys()
    }
}

fn evaluators_len(map: &HashMap<EvaluatorKey, Box<dyn CommandEvaluator>>) -> usize {
    map.len()
}

/// Run every command evaluator named in `room.configuration.evaluators`
/// against `intent`, then apply conflict resolution (spec.md §4.1).
///
/// `room.configuration.evaluators` (spec.md §3) scopes both command and
/// status evaluator selection, not status alone: a room's configuration
/// names the exact evaluator set matching its installed control
/// hardware, e.g. `SetVolumeDSP` for a DSP-controlled room rather than
/// `SetVolumeDefault`. Several evaluators in the registry share the
/// same emitted action name by design (every `SetVolume*` variant
/// emits `SetVolume`, every `Mute*`/`UnMute*` variant emits
/// `Mute`/`UnMute` — see the §4.2 table) and differ only in which
/// downstream device advertises that name. Running the full registry
/// unconditionally would fire every variant whose target device
/// happens to advertise that action name, issuing duplicate requests
/// for one intent; scoping by configuration keeps exactly one variant
/// active per room.
pub fn plan(room: &Room, intent: &PublicRoom, graph: &InputGraph) -> Result<Vec<ActionStructure>, ControlError> {
    let registry = Registry::global();
    let mut actions = Vec::new();
    for key in &room.configuration.evaluators {
        let Some(evaluator) = registry.get(key) else {
            continue;
        };
        let mut emitted = evaluator.evaluate(room, intent, graph)?;
        for action in &emitted {
            evaluator.validate(action)?;
        }
        actions.append(&mut emitted);
    }
    Ok(resolve_conflicts(actions, registry))
}

/// Conflict resolution policy (spec.md §4.1): process actions in
/// planning order; for each action, drop any previously-accepted action
/// targeting the same device that appears in the current action's
/// incompatible list. Device-specific actions unconditionally supersede
/// device-agnostic actions of the same action name on the same device.
pub fn resolve_conflicts(
    actions: Vec<ActionStructure>,
    registry: &Registry,
) -> Vec<ActionStructure> {
    let mut accepted: Vec<ActionStructure> = Vec::new();

    for mut action in actions {
        let mut overrode_something = false;

        if action.device_specific {
            let before = accepted.len();
            accepted.retain(|existing| {
                !(existing.device.name == action.device.name
                    && existing.action == action.action
                    && !existing.device_specific)
            });
            overrode_something |= accepted.len() != before;
        }

        if let Some(evaluator) = registry.get(&action.generating_evaluator) {
            let incompatible = evaluator.incompatible_commands();
            if !incompatible.is_empty() {
                let before = accepted.len();
                accepted.retain(|existing| {
                    !(existing.device.name == action.device.name
                        && incompatible.contains(&existing.action.as_str()))
                });
                overrode_something |= accepted.len() != before;
            }
        }

        action.overridden = overrode_something;
        accepted.push(action);
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Configuration, DeviceCommand, DeviceRole, PublicDisplay};
    use crate::domain::value_objects::{BuildingId, DeviceName, RoomId};

    fn device_with_commands(name: &str, roles: Vec<DeviceRole>, commands: &[&str]) -> Device {
        Device {
            name: DeviceName::new(name),
            address: "10.0.0.1".to_string(),
            roles,
            commands: commands
                .iter()
                .map(|c| DeviceCommand {
                    name: CommandName::new(*c),
                    microservice_address: "http://ms/".to_string(),
                    endpoint_path: format!("/:address/{c}"),
                    method: "GET".to_string(),
                })
                .collect(),
            ports: vec![],
        }
    }

    fn room_with(devices: Vec<Device>, evaluators: &[&str]) -> Room {
        Room {
            building: BuildingId::new("ITB"),
            room: RoomId::new("1010"),
            devices,
            configuration: Configuration {
                evaluators: evaluators.iter().map(|e| EvaluatorKey::new(*e)).collect(),
            },
        }
    }

    #[test]
    fn plan_emits_room_wide_power_on_for_all_devices() {
        let room = room_with(
            vec![
                device_with_commands("TV1", vec![DeviceRole::VideoOut], &["PowerOn", "Standby"]),
                device_with_commands("DSP1", vec![DeviceRole::AudioOut], &["PowerOn", "Standby"]),
            ],
            &["PowerOnDefault"],
        );
        let intent = PublicRoom {
            power: Some("on".to_string()),
            ..Default::default()
        };
        let graph = InputGraph::build(&room);
        let actions = plan(&room, &intent, &graph).unwrap();
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| a.action.as_str() == "PowerOn"));
        assert!(actions.iter().all(|a| !a.device_specific));
    }

    #[test]
    fn device_specific_standby_overrides_room_wide_power_on() {
        let room = room_with(
            vec![
                device_with_commands("TV1", vec![DeviceRole::VideoOut], &["PowerOn", "Standby"]),
                device_with_commands("TV2", vec![DeviceRole::VideoOut], &["PowerOn", "Standby"]),
            ],
            &["PowerOnDefault", "StandbyDefault"],
        );
        let intent = PublicRoom {
            power: Some("on".to_string()),
            displays: vec![PublicDisplay {
                name: DeviceName::new("TV1"),
                power: Some("standby".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let graph = InputGraph::build(&room);
        let actions = plan(&room, &intent, &graph).unwrap();

        let tv1_actions: Vec<_> = actions
            .iter()
            .filter(|a| a.device.name == DeviceName::new("TV1"))
            .collect();
        assert_eq!(tv1_actions.len(), 1);
        assert_eq!(tv1_actions[0].action.as_str(), "Standby");
        assert!(tv1_actions[0].device_specific);

        let tv2_actions: Vec<_> = actions
            .iter()
            .filter(|a| a.device.name == DeviceName::new("TV2"))
            .collect();
        assert_eq!(tv2_actions.len(), 1);
        assert_eq!(tv2_actions[0].action.as_str(), "PowerOn");
    }
}
