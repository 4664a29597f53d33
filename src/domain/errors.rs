//! Domain errors
//!
//! One flat `thiserror` enum per layer, the way the teacher crate
//! structures `NetworkError`/`PortError` — a single error type rather
//! than a nested hierarchy per submodule.

use crate::domain::value_objects::{CommandName, DeviceName};
use thiserror::Error;

/// Errors raised by planning, routing, gateway rewriting, and dispatch.
#[derive(Error, Debug)]
pub enum ControlError {
    /// A device referenced by an intent or action is absent from the room.
    #[error("unknown device: {0}")]
    UnknownDevice(DeviceName),

    /// A device lacks the command an evaluator needs.
    #[error("device {device} has no command matching {command}")]
    UnknownCommand {
        /// Device missing the command
        device: DeviceName,
        /// Command name the evaluator looked for
        command: CommandName,
    },

    /// `InputGraph` has no path for a requested input switch.
    #[error("no route from {source} to {sink}")]
    NoRoute {
        /// Requested source device
        source: DeviceName,
        /// Requested sink (display) device
        sink: DeviceName,
    },

    /// BFS path reconstruction exceeded the node count — corrupted graph.
    #[error("cyclic path detected reconstructing route to {0}")]
    CyclicPath(DeviceName),

    /// The rewriter could not find a gateway for a gated device.
    #[error("no gateway found for gated device {0}")]
    GatewayNotFound(DeviceName),

    /// The gateway device has no command matching the port key.
    #[error("gateway {gateway} has no command named {port_key}")]
    GatewayCommandMissing {
        /// Gateway device
        gateway: DeviceName,
        /// Port key that should have named a command
        port_key: String,
    },

    /// The original URL did not parse as `http://HOST/PATH`.
    #[error("malformed device URL: {0}")]
    MalformedDeviceUrl(String),

    /// A command template still has an unresolved `:placeholder` after
    /// substitution.
    #[error("unresolved template placeholder {placeholder} in {url}")]
    TemplateUnresolved {
        /// Residual placeholder
        placeholder: String,
        /// URL it was found in
        url: String,
    },

    /// Network/HTTP/JSON error talking to a device microservice.
    #[error("transport error: {0}")]
    Transport(String),

    /// Error talking to the configuration database.
    #[error("configuration database error: {0}")]
    DbFailure(String),

    /// Bearer token acquisition failed.
    #[error("authentication failure: {0}")]
    AuthFailure(String),

    /// Catch-all for validation failures not otherwise categorized.
    #[error("validation error: {0}")]
    Validation(String),
}

impl From<reqwest::Error> for ControlError {
    fn from(err: reqwest::Error) -> Self {
        ControlError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ControlError {
    fn from(err: serde_json::Error) -> Self {
        ControlError::Transport(err.to_string())
    }
}
