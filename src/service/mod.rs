//! # Room Control Service
//!
//! Orchestrates evaluators, the input graph, the gateway rewriter, and
//! the dispatcher into the two request flows from spec.md §2, built with
//! the teacher's builder pattern (`NetworkServiceBuilder` in
//! `service/mod.rs`).

use crate::dispatch::Dispatcher;
use crate::domain::errors::ControlError;
use crate::domain::model::{ActionStructure, CommandExecutionReporting, PublicRoom};
use crate::domain::value_objects::{BuildingId, CorrelationId, RoomId};
use crate::evaluators;
use crate::graph::InputGraph;
use crate::ports::{ConfigDatabasePort, DeviceTransportPort, EventPublisherPort};
use crate::status;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// The orchestrator wiring evaluators, graph, gateway, dispatcher, and
/// the config DB port together.
#[derive(Clone)]
pub struct RoomControlService {
    config_db: Arc<dyn ConfigDatabasePort>,
    dispatcher: Dispatcher,
}

impl RoomControlService {
    /// Start building a service.
    pub fn builder() -> RoomControlServiceBuilder {
        RoomControlServiceBuilder::default()
    }

    /// Control path (spec.md §2 "Data flow (control path)"): evaluate
    /// `intent` against the room's devices, resolve conflicts, and
    /// dispatch the resulting actions.
    pub async fn execute_room_command(
        &self,
        building: &BuildingId,
        room: &RoomId,
        intent: PublicRoom,
        cancellation: CancellationToken,
    ) -> Result<Vec<CommandExecutionReporting>, ControlError> {
        let correlation = CorrelationId::new();
        let room_record = self.config_db.get_room(building, room).await?;
        let graph = InputGraph::build(&room_record);
        let actions = evaluators::plan(&room_record, &intent, &graph)?;

        tracing::info!(
            %correlation,
            building = %building,
            room = %room,
            action_count = actions.len(),
            "planned room command"
        );

        let room_arc = Arc::new(room_record);
        let planned = actions.clone();
        let reports = self
            .dispatcher
            .dispatch_actions(actions, room_arc, cancellation, correlation.clone())
            .await;

        tracing::info!(
            %correlation,
            building = %building,
            room = %room,
            success = reports.iter().filter(|r| r.success).count(),
            total = reports.len(),
            "dispatch finished"
        );

        self.persist_state_updates(building, room, &planned, &reports)
            .await;

        Ok(reports)
    }

    /// Write volume/mute state back to the configuration database for
    /// every successfully dispatched `SetVolume*`/`Mute*`/`UnMute*`
    /// action (spec.md §6), mirroring
    /// `original_source/dbo/dbo.go`'s `SetAudioInDB`. Best-effort: a
    /// failure here is logged, not propagated, since the device itself
    /// already carried out the command.
    async fn persist_state_updates(
        &self,
        building: &BuildingId,
        room: &RoomId,
        planned: &[ActionStructure],
        reports: &[CommandExecutionReporting],
    ) {
        for report in reports.iter().filter(|r| r.success) {
            let Some(action) = planned
                .iter()
                .find(|a| a.device.name == report.device && a.action == report.action)
            else {
                continue;
            };

            let result = match report.action.as_str() {
                "SetVolume" => match action.parameters.get("level").and_then(|v| v.parse().ok()) {
                    Some(level) => self.config_db.set_volume(building, room, &report.device, level).await,
                    None => continue,
                },
                "Mute" => self.config_db.set_muted(building, room, &report.device, true).await,
                "UnMute" => self.config_db.set_muted(building, room, &report.device, false).await,
                _ => continue,
            };

            if let Err(e) = result {
                tracing::warn!(
                    building = %building,
                    room = %room,
                    device = %report.device,
                    error = %e,
                    "failed to persist device state"
                );
            }
        }
    }

    /// Status path (spec.md §2 "Data flow (status path)"): generate
    /// status commands, dispatch them, and aggregate the result into a
    /// [`PublicRoom`] view.
    pub async fn get_room_status(
        &self,
        building: &BuildingId,
        room: &RoomId,
        cancellation: CancellationToken,
    ) -> Result<PublicRoom, ControlError> {
        let correlation = CorrelationId::new();
        let room_record = self.config_db.get_room(building, room).await?;
        let commands = status::generate_status_commands(&room_record);

        tracing::info!(
            %correlation,
            building = %building,
            room = %room,
            command_count = commands.len(),
            "generated status commands"
        );

        let room_arc = Arc::new(room_record.clone());
        let statuses = self
            .dispatcher
            .dispatch_status(commands, room_arc, cancellation, correlation)
            .await;

        Ok(status::aggregate(statuses, &room_record))
    }
}

/// Builder for [`RoomControlService`], mirroring the teacher's
/// `NetworkServiceBuilder`.
#[derive(Default)]
pub struct RoomControlServiceBuilder {
    config_db: Option<Arc<dyn ConfigDatabasePort>>,
    transport: Option<Arc<dyn DeviceTransportPort>>,
    events: Option<Arc<dyn EventPublisherPort>>,
    request_timeout: Option<Duration>,
    dispatch_concurrency: Option<usize>,
}

impl RoomControlServiceBuilder {
    /// Set the configuration-database port.
    pub fn config_db(mut self, port: Arc<dyn ConfigDatabasePort>) -> Self {
        self.config_db = Some(port);
        self
    }

    /// Set the device transport port.
    pub fn transport(mut self, port: Arc<dyn DeviceTransportPort>) -> Self {
        self.transport = Some(port);
        self
    }

    /// Set the event publisher port.
    pub fn events(mut self, port: Arc<dyn EventPublisherPort>) -> Self {
        self.events = Some(port);
        self
    }

    /// Set the per-request dispatch timeout (default 5s).
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Bound the number of device groups dispatched concurrently
    /// (`Config::dispatch_concurrency`). Unset means unbounded.
    pub fn dispatch_concurrency(mut self, limit: usize) -> Self {
        self.dispatch_concurrency = Some(limit);
        self
    }

    /// Finish building the service.
    pub fn build(self) -> Result<RoomControlService, ControlError> {
        let config_db = self
            .config_db
            .ok_or_else(|| ControlError::Validation("config_db port is required".to_string()))?;
        let transport = self
            .transport
            .ok_or_else(|| ControlError::Validation("transport port is required".to_string()))?;
        let events = self
            .events
            .ok_or_else(|| ControlError::Validation("events port is required".to_string()))?;
        let request_timeout = self.request_timeout.unwrap_or(Duration::from_secs(5));

        Ok(RoomControlService {
            config_db,
            dispatcher: Dispatcher::new(transport, events, request_timeout, self.dispatch_concurrency),
        })
    }
}
