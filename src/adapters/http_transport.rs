//! Pooled HTTP transport for device microservice calls.
//!
//! Grounded in the teacher's `adapters/netbox/client.rs`: a single
//! `reqwest::Client` built once and reused (spec.md §9 "Global HTTP
//! client"), private response-status handling, `tracing::debug!` on
//! every outbound call.

use crate::domain::errors::ControlError;
use crate::ports::{DeviceTransportPort, HttpMethod, OutboundRequest, TokenProviderPort};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// `reqwest`-backed [`DeviceTransportPort`]. Attaches
/// `Authorization: Bearer <token>` to every call unless running in local
/// mode (spec.md §6 "Environment").
pub struct ReqwestTransport {
    client: Client,
    token_provider: Option<Arc<dyn TokenProviderPort>>,
}

impl ReqwestTransport {
    /// Build a transport with a freshly pooled client and the given
    /// per-request timeout.
    pub fn new(timeout: Duration, token_provider: Option<Arc<dyn TokenProviderPort>>) -> Result<Self, ControlError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ControlError::from)?;
        Ok(Self {
            client,
            token_provider,
        })
    }

    async fn attach_auth(
        &self,
        mut builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, ControlError> {
        if let Some(provider) = &self.token_provider {
            let token = provider.get_token().await?;
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }
}

#[async_trait]
impl DeviceTransportPort for ReqwestTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<Value, ControlError> {
        tracing::debug!(method = ?request.method, url = %request.url, "device request");

        let builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Put => self.client.put(&request.url),
        };
        let builder = self.attach_auth(builder).await?;

        let response = builder.send().await.map_err(ControlError::from)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(ControlError::from)?;

        if !status.is_success() {
            return Err(ControlError::Transport(format!(
                "device microservice returned status {status}"
            )));
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(ControlError::from)
    }
}
