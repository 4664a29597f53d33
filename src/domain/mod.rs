//! # Domain Layer
//!
//! Pure data model and error types for the AV control plane: no I/O, no
//! async, nothing but the shapes evaluators and the dispatcher pass
//! around.

pub mod errors;
pub mod model;
pub mod value_objects;

pub use errors::ControlError;
pub use model::{
    ActionStructure, CommandExecutionReporting, Configuration, Device, DeviceCommand, Port,
    PublicAudioDevice, PublicDisplay, PublicRoom, Room, Status, StatusCommand,
};
pub use value_objects::{BuildingId, CommandName, DeviceName, EvaluatorKey, PortId, RoomId};
