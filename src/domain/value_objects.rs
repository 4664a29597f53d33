//! Value objects for the room-control domain
//!
//! Most identifiers in this domain are natural keys (device names,
//! building/room codes) rather than synthetic IDs, so the newtypes here
//! wrap `String` instead of `Uuid` — unlike a system that mints its own
//! aggregate IDs, this one is keyed the way the upstream configuration
//! database already keys its records.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Request-scoped correlation id stamped onto dispatcher tracing spans
/// and published events, so a single control/status request can be
/// followed across concurrent per-device workers. Unlike the natural-key
/// identifiers below, a correlation id has no meaning outside this
/// process, so it follows the teacher's `Uuid`-newtype convention
/// (`domain/value_objects.rs::CorrelationId`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Mint a new correlation id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Building identifier (e.g. "ITB")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildingId(String);

impl BuildingId {
    /// Wrap a raw building code
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for BuildingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Room identifier, unique within a building (e.g. "1010")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    /// Wrap a raw room code
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Device name, unique within a room
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct DeviceName(String);

impl DeviceName {
    /// Wrap a raw device name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DeviceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DeviceName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Name of a command advertised by a device (e.g. "PowerOn", "STATUSPowerOn")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandName(String);

impl CommandName {
    /// Wrap a raw command name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this command name carries the given prefix flag (e.g. the
    /// `STATUS` convention from spec.md §6).
    pub fn has_flag(&self, flag: &str) -> bool {
        self.0.starts_with(flag)
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CommandName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CommandName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Port identifier on a device's port list (may carry positional params,
/// e.g. `"port1:0:1"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(String);

impl PortId {
    /// Wrap a raw port id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split a gateway port key into the bare command name and its
    /// positional parameters.
    ///
    /// Per spec.md §9 "Port-parameter parsing ambiguity": split on `:`,
    /// element 0 is the command name, elements `1..k` become positional
    /// parameters `:0`, `:1`, ... `:k-1` in order.
    pub fn split_positional(&self) -> (CommandName, Vec<String>) {
        let mut parts = self.0.split(':');
        let command = CommandName::new(parts.next().unwrap_or_default());
        (command, parts.map(str::to_string).collect())
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PortId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PortId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Key identifying a registered evaluator (e.g. "PowerOnDefault")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvaluatorKey(String);

impl EvaluatorKey {
    /// Wrap a raw evaluator key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EvaluatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EvaluatorKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
