//! # API Façade
//!
//! Thin entry points a top-level HTTP router would call (spec.md §6
//! "HTTP (inbound)"), mirroring the teacher's
//! `api::deployment::NetworkDeploymentAPI` — not a router itself, just
//! the boundary a router's handlers call into.

use crate::domain::errors::ControlError;
use crate::domain::model::{CommandExecutionReporting, PublicRoom};
use crate::domain::value_objects::{BuildingId, RoomId};
use crate::service::RoomControlService;
use tokio_util::sync::CancellationToken;

/// `POST /buildings/:b/rooms/:r` — apply `intent` and return one report
/// per resolved action.
pub async fn execute_room_command(
    service: &RoomControlService,
    building: &BuildingId,
    room: &RoomId,
    intent: PublicRoom,
    cancellation: CancellationToken,
) -> Result<Vec<CommandExecutionReporting>, ControlError> {
    service
        .execute_room_command(building, room, intent, cancellation)
        .await
}

/// `GET /buildings/:b/rooms/:r` — current status of every device in the
/// room, assembled into a [`PublicRoom`] view.
pub async fn get_room_status(
    service: &RoomControlService,
    building: &BuildingId,
    room: &RoomId,
    cancellation: CancellationToken,
) -> Result<PublicRoom, ControlError> {
    service.get_room_status(building, room, cancellation).await
}
