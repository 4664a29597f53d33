//! # Ports (Hexagonal Architecture)
//!
//! Traits defining the boundary between the domain/orchestration layers
//! and the external collaborators named in spec.md §1: the configuration
//! database, the per-device control microservices, the bearer-token
//! provider, and the event bus. Concrete implementations live in
//! [`crate::adapters`]; tests substitute mocks implementing these same
//! traits.

use crate::domain::errors::ControlError;
use crate::domain::model::{Device, EventInfo, Room};
use crate::domain::value_objects::{BuildingId, DeviceName, RoomId};
use async_trait::async_trait;
use serde_json::Value;

/// Read/write access to the external configuration database (spec.md §6
/// "HTTP (outbound — config DB)"). Treated as opaque; this crate does not
/// implement its storage, only the client contract.
#[async_trait]
pub trait ConfigDatabasePort: Send + Sync {
    /// `GET /buildings/:b/rooms/:r`
    async fn get_room(&self, building: &BuildingId, room: &RoomId) -> Result<Room, ControlError>;

    /// `GET /buildings/:b/rooms/:r/devices`
    async fn get_devices(
        &self,
        building: &BuildingId,
        room: &RoomId,
    ) -> Result<Vec<Device>, ControlError>;

    /// `GET /buildings/:b/rooms/:r/devices/roles/:role`
    async fn get_devices_by_role(
        &self,
        building: &BuildingId,
        room: &RoomId,
        role: &str,
    ) -> Result<Vec<Device>, ControlError>;

    /// `GET /buildings/:b/rooms/:r/devices/:d`
    async fn get_device(
        &self,
        building: &BuildingId,
        room: &RoomId,
        device: &DeviceName,
    ) -> Result<Device, ControlError>;

    /// `PUT /buildings/:b/rooms/:r/devices/:d/attributes/volume/:n`
    async fn set_volume(
        &self,
        building: &BuildingId,
        room: &RoomId,
        device: &DeviceName,
        level: i64,
    ) -> Result<(), ControlError>;

    /// `PUT /buildings/:b/rooms/:r/devices/:d/attributes/muted/:bool`
    async fn set_muted(
        &self,
        building: &BuildingId,
        room: &RoomId,
        device: &DeviceName,
        muted: bool,
    ) -> Result<(), ControlError>;
}

/// Bearer-token acquisition for inter-microservice authentication
/// (spec.md §6 "Environment" / §9 "Authentication in local mode").
#[async_trait]
pub trait TokenProviderPort: Send + Sync {
    /// Return a valid bearer token, refreshing/caching internally as needed.
    async fn get_token(&self) -> Result<String, ControlError>;
}

/// Fire-and-forget publisher for the event bus (spec.md §6 "Event bus").
#[async_trait]
pub trait EventPublisherPort: Send + Sync {
    /// Publish one event. Failures are logged, never propagated — the
    /// event bus is best-effort and must never fail a dispatch.
    async fn publish(&self, event: EventInfo);
}

/// An HTTP method understood by [`DeviceTransportPort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
}

impl HttpMethod {
    /// Parse from the string carried on a `DeviceCommand`/config record.
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            _ => HttpMethod::Get,
        }
    }
}

/// A fully URL-templated outbound request to a device microservice.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Fully substituted URL.
    pub url: String,
}

/// Transport for device microservice calls (spec.md §4.5, §6 "HTTP
/// (outbound — device microservices)"). Separated from
/// [`ConfigDatabasePort`] because device microservices are untyped —
/// callers decode the JSON body themselves.
#[async_trait]
pub trait DeviceTransportPort: Send + Sync {
    /// Issue the request and return the decoded JSON body, or an error
    /// if the transport failed or the response was not valid JSON.
    async fn execute(&self, request: OutboundRequest) -> Result<Value, ControlError>;
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    //! In-memory mocks of the ports above, for tests.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned-response transport for dispatcher tests.
    #[derive(Default)]
    pub struct MockTransport {
        /// Maps exact URL → canned response (or error message).
        pub responses: Mutex<HashMap<String, Result<Value, String>>>,
        /// Every request this mock has seen, in call order.
        pub calls: Mutex<Vec<OutboundRequest>>,
    }

    impl MockTransport {
        /// Create an empty mock.
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a canned success response for a URL.
        pub fn respond(&self, url: impl Into<String>, body: Value) {
            self.responses.lock().unwrap().insert(url.into(), Ok(body));
        }

        /// Register a canned failure for a URL.
        pub fn fail(&self, url: impl Into<String>, message: impl Into<String>) {
            self.responses
                .lock()
                .unwrap()
                .insert(url.into(), Err(message.into()));
        }
    }

    #[async_trait]
    impl DeviceTransportPort for MockTransport {
        async fn execute(&self, request: OutboundRequest) -> Result<Value, ControlError> {
            self.calls.lock().unwrap().push(request.clone());
            match self.responses.lock().unwrap().get(&request.url) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(message)) => Err(ControlError::Transport(message.clone())),
                None => Err(ControlError::Transport(format!(
                    "no canned response for {}",
                    request.url
                ))),
            }
        }
    }

    /// No-op event publisher that records events for assertions.
    #[derive(Default)]
    pub struct RecordingEventPublisher {
        /// Every event published so far.
        pub events: Mutex<Vec<EventInfo>>,
    }

    #[async_trait]
    impl EventPublisherPort for RecordingEventPublisher {
        async fn publish(&self, event: EventInfo) {
            self.events.lock().unwrap().push(event);
        }
    }

    /// Constant-token provider for tests.
    pub struct StaticTokenProvider(pub String);

    #[async_trait]
    impl TokenProviderPort for StaticTokenProvider {
        async fn get_token(&self) -> Result<String, ControlError> {
            Ok(self.0.clone())
        }
    }
}
