//! # Concurrent Dispatcher
//!
//! Fan-out of HTTP requests to device microservices with per-device
//! sequential ordering and cross-device parallelism (spec.md §4.5),
//! translating `original_source/status/helpers.go`'s
//! `runStatusCommands`/`issueCommands` (`sync.WaitGroup` + buffered
//! channel of goroutines) into `tokio::spawn` + `tokio::sync::mpsc`.
//! `Config::dispatch_concurrency` optionally bounds how many device
//! groups run at once via a shared `tokio::sync::Semaphore`.

use crate::domain::errors::ControlError;
use crate::domain::model::{
    ActionStructure, CommandExecutionReporting, Device, Room, Status, StatusCommand,
    StatusResponse,
};
use crate::domain::value_objects::{CorrelationId, DeviceName};
use crate::gateway;
use crate::ports::{DeviceTransportPort, EventPublisherPort, HttpMethod, OutboundRequest};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

/// Groups items by their target device name, preserving first-seen
/// device order (spec.md §4.5 "Group actions by target device name").
fn group_by_device<T>(items: Vec<T>, device_of: impl Fn(&T) -> DeviceName) -> Vec<(DeviceName, Vec<T>)> {
    let mut order: Vec<DeviceName> = Vec::new();
    let mut groups: HashMap<DeviceName, Vec<T>> = HashMap::new();
    for item in items {
        let key = device_of(&item);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(item);
    }
    order
        .into_iter()
        .map(|name| {
            let items = groups.remove(&name).unwrap_or_default();
            (name, items)
        })
        .collect()
}

/// Build the fully-substituted, gateway-rewritten URL for one command
/// invocation.
fn build_url(
    microservice_address: &str,
    endpoint_path: &str,
    device: &Device,
    room: &Room,
    parameters: &HashMap<String, String>,
) -> Result<(HttpMethod, String), ControlError> {
    let mut url = format!("{microservice_address}{endpoint_path}");
    url = url.replace(":address", &device.address);
    for (key, value) in parameters {
        url = url.replace(&format!(":{key}"), value);
    }
    url = gateway::rewrite(&url, device, room)?;

    if url.split('/').any(|seg| seg.starts_with(':') && seg.len() > 1) {
        return Err(ControlError::TemplateUnresolved {
            placeholder: url
                .split('/')
                .find(|seg| seg.starts_with(':') && seg.len() > 1)
                .unwrap_or_default()
                .to_string(),
            url: url.clone(),
        });
    }

    Ok((HttpMethod::Get, url))
}

/// Fan-out executor for both control actions and status queries.
///
/// Holds the shared collaborators every worker needs: a pooled
/// transport and a fire-and-forget event publisher. Built once per
/// process and shared behind `Arc` (spec.md §9 "Global HTTP client").
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn DeviceTransportPort>,
    events: Arc<dyn EventPublisherPort>,
    request_timeout: Duration,
    /// Bounds the number of device groups dispatched concurrently
    /// (`Config::dispatch_concurrency`). `None` leaves it unbounded —
    /// one task per device group, as spec.md §4.5 assumes.
    concurrency: Option<Arc<Semaphore>>,
}

impl Dispatcher {
    /// Construct a dispatcher over the given transport and event bus.
    pub fn new(
        transport: Arc<dyn DeviceTransportPort>,
        events: Arc<dyn EventPublisherPort>,
        request_timeout: Duration,
        concurrency: Option<usize>,
    ) -> Self {
        Self {
            transport,
            events,
            request_timeout,
            concurrency: concurrency.map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    /// Issue every action, grouped by device and run sequentially within
    /// a group, concurrently across groups. Returns exactly one report
    /// per submitted action (spec.md §8 invariant 6), in no particular
    /// cross-device order.
    pub async fn dispatch_actions(
        &self,
        actions: Vec<ActionStructure>,
        room: Arc<Room>,
        cancellation: CancellationToken,
        correlation: CorrelationId,
    ) -> Vec<CommandExecutionReporting> {
        let groups = group_by_device(actions, |a| a.device.name.clone());
        let group_count = groups.len();
        if group_count == 0 {
            return Vec::new();
        }

        tracing::info!(%correlation, groups = group_count, "dispatching actions");
        let (tx, mut rx) = mpsc::channel(group_count);

        for (_, group) in groups {
            let transport = self.transport.clone();
            let events = self.events.clone();
            let room = room.clone();
            let tx = tx.clone();
            let cancellation = cancellation.clone();
            let timeout = self.request_timeout;
            let correlation = correlation.clone();
            let concurrency = self.concurrency.clone();

            tokio::spawn(async move {
                let _permit = match &concurrency {
                    Some(semaphore) => Some(
                        semaphore
                            .clone()
                            .acquire_owned()
                            .await
                            .expect("dispatch semaphore is never closed"),
                    ),
                    None => None,
                };
                for action in group {
                    if cancellation.is_cancelled() {
                        break;
                    }
                    let report =
                        issue_action(&action, &room, &transport, &events, timeout, &correlation)
                            .await;
                    if tx.send(report).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut reports = Vec::with_capacity(group_count);
        while let Some(report) = rx.recv().await {
            reports.push(report);
        }
        reports
    }

    /// Issue every status command, grouped and scheduled the same way as
    /// [`Dispatcher::dispatch_actions`].
    pub async fn dispatch_status(
        &self,
        commands: Vec<StatusCommand>,
        room: Arc<Room>,
        cancellation: CancellationToken,
        correlation: CorrelationId,
    ) -> Vec<Status> {
        let groups = group_by_device(commands, |c| c.device.name.clone());
        let group_count = groups.len();
        if group_count == 0 {
            return Vec::new();
        }

        tracing::info!(%correlation, groups = group_count, "dispatching status commands");
        let (tx, mut rx) = mpsc::channel::<Status>(group_count);

        for (_, group) in groups {
            let transport = self.transport.clone();
            let room = room.clone();
            let tx = tx.clone();
            let cancellation = cancellation.clone();
            let timeout = self.request_timeout;
            let correlation = correlation.clone();
            let concurrency = self.concurrency.clone();

            tokio::spawn(async move {
                let _permit = match &concurrency {
                    Some(semaphore) => Some(
                        semaphore
                            .clone()
                            .acquire_owned()
                            .await
                            .expect("dispatch semaphore is never closed"),
                    ),
                    None => None,
                };
                if group.is_empty() {
                    return;
                }
                let destination_device = group[0].destination_device.clone();
                let mut responses = Vec::new();
                let mut error_message = None;

                for command in &group {
                    if cancellation.is_cancelled() {
                        break;
                    }
                    match issue_status_command(command, &room, &transport, timeout, &correlation).await {
                        Ok(status) => responses.push(status),
                        Err(e) => error_message = Some(e.to_string()),
                    }
                }

                let status = Status {
                    destination_device,
                    responses,
                    error_message,
                };
                let _ = tx.send(status).await;
            });
        }
        drop(tx);

        let mut statuses = Vec::with_capacity(group_count);
        while let Some(status) = rx.recv().await {
            statuses.push(status);
        }
        statuses
    }
}

async fn issue_action(
    action: &ActionStructure,
    room: &Room,
    transport: &Arc<dyn DeviceTransportPort>,
    events: &Arc<dyn EventPublisherPort>,
    request_timeout: Duration,
    correlation: &CorrelationId,
) -> CommandExecutionReporting {
    let command = match action.device.command(&action.action) {
        Some(c) => c,
        None => {
            return CommandExecutionReporting {
                success: false,
                action: action.action.clone(),
                device: action.device.name.clone(),
                error: Some(format!(
                    "device {} has no command {}",
                    action.device.name, action.action
                )),
            }
        }
    };

    let (method, url) = match build_url(
        &command.microservice_address,
        &command.endpoint_path,
        &action.device,
        room,
        &action.parameters,
    ) {
        Ok(pair) => pair,
        Err(e) => {
            return CommandExecutionReporting {
                success: false,
                action: action.action.clone(),
                device: action.device.name.clone(),
                error: Some(e.to_string()),
            }
        }
    };
    let method = if command.method.eq_ignore_ascii_case("GET") {
        method
    } else {
        HttpMethod::parse(&command.method)
    };

    tracing::debug!(%correlation, device = %action.device.name, action = %action.action, %url, "issuing action");

    let request = OutboundRequest { method, url };
    let outcome = tokio::time::timeout(request_timeout, transport.execute(request)).await;

    match outcome {
        Ok(Ok(_body)) => {
            for event in &action.event_log {
                let mut event = event.clone();
                if event.device.is_none() {
                    event.device = Some(action.device.name.clone());
                }
                events.publish(event).await;
            }
            CommandExecutionReporting {
                success: true,
                action: action.action.clone(),
                device: action.device.name.clone(),
                error: None,
            }
        }
        Ok(Err(e)) => {
            tracing::warn!(%correlation, device = %action.device.name, action = %action.action, error = %e, "action failed");
            CommandExecutionReporting {
                success: false,
                action: action.action.clone(),
                device: action.device.name.clone(),
                error: Some(e.to_string()),
            }
        }
        Err(_elapsed) => {
            tracing::warn!(%correlation, device = %action.device.name, action = %action.action, "action timed out");
            CommandExecutionReporting {
                success: false,
                action: action.action.clone(),
                device: action.device.name.clone(),
                error: Some("request timed out".to_string()),
            }
        }
    }
}

async fn issue_status_command(
    command: &StatusCommand,
    room: &Room,
    transport: &Arc<dyn DeviceTransportPort>,
    request_timeout: Duration,
    correlation: &CorrelationId,
) -> Result<StatusResponse, ControlError> {
    let url = format!(
        "{}{}",
        command.action.microservice_address, command.action.endpoint_path
    );
    let mut url = url.replace(":address", &command.device.address);
    for (key, value) in &command.parameters {
        url = url.replace(&format!(":{key}"), value);
    }
    let url = gateway::rewrite(&url, &command.device, room)?;

    tracing::debug!(%correlation, device = %command.device.name, %url, "issuing status command");

    let request = OutboundRequest {
        method: HttpMethod::Get,
        url,
    };
    let body = tokio::time::timeout(request_timeout, transport.execute(request))
        .await
        .map_err(|_| ControlError::Transport("request timed out".to_string()))??;

    let status: HashMap<String, serde_json::Value> = match body {
        serde_json::Value::Object(map) => map.into_iter().collect(),
        other => {
            let mut single = HashMap::new();
            single.insert("value".to_string(), other);
            single
        }
    };

    Ok(StatusResponse {
        generator: command.generator.clone(),
        status,
    })
}
