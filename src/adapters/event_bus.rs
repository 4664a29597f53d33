//! Fire-and-forget event publisher over NATS (spec.md §6 "Event bus"),
//! reusing the teacher's existing `async-nats` dependency and
//! `nats_subject()`-style naming from `domain/events.rs`.

use crate::domain::model::EventInfo;
use crate::ports::EventPublisherPort;
use async_nats::Client;
use async_trait::async_trait;

/// Subject every action event is published to.
pub const ROOM_ACTIONS_SUBJECT: &str = "av.room.actions";

/// Publishes JSON-encoded [`EventInfo`] records onto a NATS subject.
/// Failures are logged and swallowed — the event bus is best-effort and
/// must never fail a dispatch (spec.md §1 "treated as a fire-and-forget
/// publisher").
pub struct NatsEventPublisher {
    client: Client,
    subject: String,
}

impl NatsEventPublisher {
    /// Build a publisher over an already-connected NATS client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            subject: ROOM_ACTIONS_SUBJECT.to_string(),
        }
    }
}

#[async_trait]
impl EventPublisherPort for NatsEventPublisher {
    async fn publish(&self, event: EventInfo) {
        let payload = match serde_json::to_vec(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode event for publishing");
                return;
            }
        };

        if let Err(e) = self
            .client
            .publish(self.subject.clone(), payload.into())
            .await
        {
            tracing::warn!(error = %e, subject = %self.subject, "failed to publish event");
        }
    }
}
