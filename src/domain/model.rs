//! Core data model: devices, commands, ports, rooms, and the
//! action/status structures evaluators and the dispatcher pass around.

use crate::domain::value_objects::{BuildingId, CommandName, DeviceName, EvaluatorKey, PortId, RoomId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tags describing what role a device plays in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DeviceRole {
    /// Produces audio the room cares about muting/volume-controlling.
    AudioOut,
    /// Produces video the room displays.
    VideoOut,
    /// Proxies control traffic to one or more gated devices.
    Gateway,
    /// Reachable only through a `Gateway` device.
    GatedDevice,
    /// Routes video/audio signals between other devices (e.g. a matrix switcher).
    VideoSwitcher,
}

/// Named operation a device advertises, with a microservice base address
/// and an endpoint path template containing `:placeholder` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCommand {
    /// Command name, e.g. "PowerOn", "STATUSPowerOn", "port1".
    pub name: CommandName,
    /// Base address of the microservice implementing this command.
    pub microservice_address: String,
    /// Endpoint path template, e.g. "/:address/power/on".
    pub endpoint_path: String,
    /// HTTP method to use when issuing this command (GET for most status
    /// and many control commands).
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Directed edge: a port on `device` that connects to `destination_device`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Port identifier on the owning device (may carry positional params).
    pub id: PortId,
    /// Device the port flows from (signal source).
    pub source_device: DeviceName,
    /// Device the port flows to (signal destination).
    pub destination_device: DeviceName,
}

/// A controllable endpoint in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Unique name within the room.
    pub name: DeviceName,
    /// Host or host:port address of the device itself (used as a
    /// template parameter, not dialed directly — the dispatcher always
    /// talks to the command's `microservice_address`).
    pub address: String,
    /// Roles this device plays.
    pub roles: Vec<DeviceRole>,
    /// Commands this device advertises.
    pub commands: Vec<DeviceCommand>,
    /// Ports (signal edges) originating or terminating at this device.
    pub ports: Vec<Port>,
}

impl Device {
    /// Whether this device has the given role.
    pub fn has_role(&self, role: DeviceRole) -> bool {
        self.roles.contains(&role)
    }

    /// Find a command by exact name.
    pub fn command(&self, name: &CommandName) -> Option<&DeviceCommand> {
        self.commands.iter().find(|c| &c.name == name)
    }

    /// Find the first command whose name carries `flag` as a prefix and
    /// contains `contains` as a substring — the discovery rule spec.md
    /// §6 describes for evaluator/command matching.
    pub fn command_matching(&self, flag: &str, contains: &str) -> Option<&DeviceCommand> {
        self.commands
            .iter()
            .find(|c| c.name.has_flag(flag) && c.name.as_str().contains(contains))
    }
}

/// Which command and status evaluators apply to a room.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Configuration {
    /// Evaluator keys enabled for this room, spanning both the command
    /// registry (`evaluators::plan`) and the status registry
    /// (`status::generate_status_commands`) — a key only matches the
    /// registry it was registered in, so listing both is harmless.
    pub evaluators: Vec<EvaluatorKey>,
}

/// A room: its devices and which evaluators apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Building code.
    pub building: BuildingId,
    /// Room code, unique within the building.
    pub room: RoomId,
    /// Devices present in this room.
    pub devices: Vec<Device>,
    /// Status evaluator configuration.
    pub configuration: Configuration,
}

impl Room {
    /// Look up a device by name.
    pub fn device(&self, name: &DeviceName) -> Option<&Device> {
        self.devices.iter().find(|d| &d.name == name)
    }

    /// All devices carrying the given role.
    pub fn devices_with_role(&self, role: DeviceRole) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(move |d| d.has_role(role))
    }
}

/// Per-display intent/view fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicDisplay {
    /// Display device name.
    pub name: DeviceName,
    /// "on" / "standby", or unset for "no change" (intent) / "unknown" (view).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<String>,
    /// Requested/observed input source name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// Requested/observed blanked state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blanked: Option<bool>,
}

/// Per-audio-device intent/view fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicAudioDevice {
    /// Audio device name.
    pub name: DeviceName,
    /// "on" / "standby", or unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<String>,
    /// Requested/observed input source name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// Requested/observed mute state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    /// Requested/observed volume, 0..=100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<i64>,
}

/// Both the input intent and the output view shape of a room.
///
/// An unset optional field means "no change" when this is submitted as
/// an intent, and "unknown" when this is returned as a status view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicRoom {
    /// Building code (filled on status responses).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building: Option<BuildingId>,
    /// Room code (filled on status responses).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomId>,
    /// Room-wide power: "on" / "standby".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<String>,
    /// Room-wide mute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    /// Room-wide blanked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blanked: Option<bool>,
    /// Per-display fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub displays: Vec<PublicDisplay>,
    /// Per-audio-device fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audio_devices: Vec<PublicAudioDevice>,
}

/// One entry in an action's event-log seed, published to the event bus
/// once the action completes (spec.md §6 "Event bus").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInfo {
    /// Always "UserAction" for actions originating from a room intent.
    pub event_type: String,
    /// Always "UserInput" for actions originating from a room intent.
    pub cause: String,
    /// Normalized key, e.g. "power", "muted", "volume", "input".
    pub key: String,
    /// Normalized value, e.g. "on", "true", "50", or a JSON blob for input.
    pub value: String,
    /// Device the event concerns. Filled in once the action's device is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceName>,
}

/// A resolved, device-scoped unit of work produced by an evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionStructure {
    /// Action/command name to issue, e.g. "PowerOn".
    pub action: CommandName,
    /// Target device.
    pub device: Device,
    /// Name of the evaluator that produced this action.
    pub generating_evaluator: EvaluatorKey,
    /// True if this action came from a per-device intent field (and so
    /// should survive over a room-wide default targeting the same device).
    pub device_specific: bool,
    /// Template parameters to substitute into the command's endpoint path.
    pub parameters: HashMap<String, String>,
    /// Event-log seed for the event bus.
    pub event_log: Vec<EventInfo>,
    /// Set by conflict resolution when this action overrode another.
    pub overridden: bool,
}

/// Per-action success/failure report returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandExecutionReporting {
    /// Whether the action completed successfully.
    pub success: bool,
    /// Action name that was issued.
    pub action: CommandName,
    /// Device the action targeted.
    pub device: DeviceName,
    /// Error message, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The device whose externally-visible status a status row populates —
/// may differ from the device actually queried (e.g. a DSP channel that
/// reports as an `AudioDevice` named after a room-facing alias).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationDevice {
    /// Device actually queried.
    pub device: Device,
    /// Populate an `AudioDevice` record for this destination.
    pub audio_device: bool,
    /// Populate a `Display` record for this destination.
    pub display: bool,
}

/// A query analogous to `ActionStructure`, produced by a status
/// evaluator and consumed by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCommand {
    /// Command to issue (always a `STATUS`-flagged command).
    pub action: DeviceCommand,
    /// Device the command is issued against.
    pub device: Device,
    /// Template parameters for the command's endpoint path.
    pub parameters: HashMap<String, String>,
    /// Name of the status evaluator that generated this command — used
    /// to look up the response normalizer.
    pub generator: EvaluatorKey,
    /// Which public-facing record(s) this command's result populates.
    pub destination_device: DestinationDevice,
}

/// One raw key/value pair returned by a device microservice, tagged with
/// the generator that issued the request it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Evaluator that generated the originating `StatusCommand`.
    pub generator: EvaluatorKey,
    /// Raw key/value pairs as returned by the device microservice.
    pub status: HashMap<String, serde_json::Value>,
}

/// The aggregated result of querying one destination device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    /// Device whose public attributes this row populates.
    pub destination_device: DestinationDevice,
    /// Raw responses collected from each command issued for this device.
    pub responses: Vec<StatusResponse>,
    /// Set if a command for this device failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
