//! # AV Room Control Plane
//!
//! Control plane for audio/video room management. Given a declarative
//! description of a room's desired state, computes a set of device-level
//! actions, dispatches them in parallel to downstream device-control
//! microservices, and reports per-action success. Symmetrically, queries
//! current device state and assembles a unified room status.
//!
//! The three tightly coupled subsystems are [`evaluators`] (command
//! planning), [`graph`] + [`gateway`] (input routing and reachability),
//! and [`dispatch`] + [`status`] (concurrent fan-out and aggregation).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod domain;
pub mod evaluators;
pub mod graph;
pub mod gateway;
pub mod dispatch;
pub mod status;
pub mod ports;
pub mod adapters;
pub mod service;
pub mod api;

pub use domain::errors::ControlError;
pub use domain::model::{
    ActionStructure, CommandExecutionReporting, Configuration, Device, DeviceCommand, PublicRoom,
    Room,
};
pub use domain::value_objects::{BuildingId, DeviceName, RoomId};
pub use service::RoomControlService;
