//! Video input-switching evaluators (spec.md §4.2 `ChangeVideoInput*`).

use super::{build_action, CommandEvaluator};
use crate::domain::errors::ControlError;
use crate::domain::model::{ActionStructure, Device, DeviceRole, EventInfo};
use crate::domain::value_objects::{DeviceName, EvaluatorKey, PortId};
use crate::domain::{PublicRoom, Room};
use crate::graph::InputGraph;
use std::collections::HashMap;

fn event_log_for(device: &DeviceName, input: &str) -> Vec<EventInfo> {
    vec![EventInfo {
        event_type: "UserAction".to_string(),
        cause: "UserInput".to_string(),
        key: "input".to_string(),
        value: input.to_string(),
        device: Some(device.clone()),
    }]
}

/// Finds the port on `display` whose source device is named `input_name`
/// — input names are opaque strings matched against declared ports
/// (spec.md §4.2 "Input names are opaque strings").
fn resolve_port_on_display<'a>(display: &'a Device, input_name: &str) -> Option<&'a PortId> {
    display
        .ports
        .iter()
        .find(|p| p.source_device.as_str() == input_name)
        .map(|p| &p.id)
}

/// Direct display-to-source switching: the display itself has a port for
/// the requested input.
pub struct ChangeVideoInputDefault;

impl CommandEvaluator for ChangeVideoInputDefault {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("ChangeVideoInputDefault")
    }

    fn evaluate(
        &self,
        room: &Room,
        intent: &PublicRoom,
        _graph: &InputGraph,
    ) -> Result<Vec<ActionStructure>, ControlError> {
        let mut actions = Vec::new();
        for public_display in &intent.displays {
            let Some(input) = &public_display.input else {
                continue;
            };
            let device = room
                .device(&public_display.name)
                .ok_or_else(|| ControlError::UnknownDevice(public_display.name.clone()))?;
            let port = resolve_port_on_display(device, input).ok_or_else(|| {
                ControlError::NoRoute {
                    source: DeviceName::new(input.clone()),
                    sink: device.name.clone(),
                }
            })?;
            let mut parameters = HashMap::new();
            parameters.insert("port".to_string(), port.as_str().to_string());
            actions.push(build_action(
                device,
                "ChangeInput",
                "ChangeVideoInputDefault",
                true,
                parameters,
                event_log_for(&device.name, input),
            )?);
        }
        Ok(actions)
    }
}

/// Alternate control-system variant of [`ChangeVideoInputDefault`],
/// stamped for rooms whose downstream controller is a DMPS — same port
/// resolution, different generator tag for status normalization.
pub struct ChangeVideoInputDmps;

impl CommandEvaluator for ChangeVideoInputDmps {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("ChangeVideoInputDMPS")
    }

    fn evaluate(
        &self,
        room: &Room,
        intent: &PublicRoom,
        _graph: &InputGraph,
    ) -> Result<Vec<ActionStructure>, ControlError> {
        let mut actions = Vec::new();
        for public_display in &intent.displays {
            let Some(input) = &public_display.input else {
                continue;
            };
            let device = room
                .device(&public_display.name)
                .ok_or_else(|| ControlError::UnknownDevice(public_display.name.clone()))?;
            let port = resolve_port_on_display(device, input).ok_or_else(|| {
                ControlError::NoRoute {
                    source: DeviceName::new(input.clone()),
                    sink: device.name.clone(),
                }
            })?;
            let mut parameters = HashMap::new();
            parameters.insert("port".to_string(), port.as_str().to_string());
            actions.push(build_action(
                device,
                "ChangeInput",
                "ChangeVideoInputDMPS",
                true,
                parameters,
                event_log_for(&device.name, input),
            )?);
        }
        Ok(actions)
    }
}

fn find_port_id(room: &Room, destination: &DeviceName, source: &DeviceName) -> Option<PortId> {
    room.devices
        .iter()
        .flat_map(|d| d.ports.iter())
        .find(|p| &p.destination_device == destination && &p.source_device == source)
        .map(|p| p.id.clone())
}

/// Routes through a video switcher: consults [`InputGraph`] for a path
/// from the requested source to the display, then derives the
/// switcher's own `{output, input}` port pair along that path.
pub struct ChangeVideoInputVideoSwitcher;

impl CommandEvaluator for ChangeVideoInputVideoSwitcher {
    fn key(&self) -> EvaluatorKey {
        EvaluatorKey::new("ChangeVideoInputVideoSwitcher")
    }

    fn evaluate(
        &self,
        room: &Room,
        intent: &PublicRoom,
        graph: &InputGraph,
    ) -> Result<Vec<ActionStructure>, ControlError> {
        let mut actions = Vec::new();
        let switcher = room.devices_with_role(DeviceRole::VideoSwitcher).next();

        for public_display in &intent.displays {
            let Some(input) = &public_display.input else {
                continue;
            };
            let Some(switcher) = switcher else {
                continue;
            };
            let source = DeviceName::new(input.clone());
            let path = graph
                .check_reachability(&public_display.name, &source)?
                .ok_or_else(|| ControlError::NoRoute {
                    source: source.clone(),
                    sink: public_display.name.clone(),
                })?;

            let idx = path
                .iter()
                .position(|d| d == &switcher.name)
                .ok_or_else(|| ControlError::NoRoute {
                    source: source.clone(),
                    sink: public_display.name.clone(),
                })?;

            let output_port = if idx == 0 {
                None
            } else {
                find_port_id(room, &path[idx - 1], &switcher.name)
            };
            let input_port = if idx + 1 >= path.len() {
                None
            } else {
                find_port_id(room, &switcher.name, &path[idx + 1])
            };

            let mut parameters = HashMap::new();
            if let Some(output) = output_port {
                parameters.insert("output".to_string(), output.as_str().to_string());
            }
            if let Some(input_port) = input_port {
                parameters.insert("input".to_string(), input_port.as_str().to_string());
            }

            actions.push(build_action(
                switcher,
                "ChangeInput",
                "ChangeVideoInputVideoSwitcher",
                true,
                parameters,
                event_log_for(&public_display.name, input),
            )?);
        }
        Ok(actions)
    }
}
