//! Client for the external configuration database (spec.md §6 "HTTP
//! (outbound — config DB)"), following the teacher's
//! `adapters/netbox/client.rs` GET/POST/PATCH helper-method shape and
//! `handle_response` status-code dispatch.

use crate::domain::errors::ControlError;
use crate::domain::model::{Device, Room};
use crate::domain::value_objects::{BuildingId, DeviceName, RoomId};
use crate::ports::{ConfigDatabasePort, TokenProviderPort};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

/// `reqwest`-backed [`ConfigDatabasePort`] against the path schema of
/// spec.md §6.
pub struct ConfigDbClient {
    client: Client,
    base_url: Url,
    token_provider: Option<Arc<dyn TokenProviderPort>>,
}

impl ConfigDbClient {
    /// Build a client pooled against `base_url`.
    pub fn new(
        client: Client,
        base_url: Url,
        token_provider: Option<Arc<dyn TokenProviderPort>>,
    ) -> Self {
        Self {
            client,
            base_url,
            token_provider,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ControlError> {
        let mut builder = self.client.get(self.url(path));
        if let Some(provider) = &self.token_provider {
            let token = provider.get_token().await?;
            builder = builder.bearer_auth(token);
        }
        let response = builder.send().await.map_err(ControlError::from)?;
        Self::handle_response(response).await
    }

    async fn put(&self, path: &str) -> Result<(), ControlError> {
        let mut builder = self.client.put(self.url(path));
        if let Some(provider) = &self.token_provider {
            let token = provider.get_token().await?;
            builder = builder.bearer_auth(token);
        }
        let response = builder.send().await.map_err(ControlError::from)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ControlError::DbFailure(format!(
                "config DB returned status {}",
                response.status()
            )))
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ControlError> {
        match response.status() {
            StatusCode::OK => response.json().await.map_err(ControlError::from),
            StatusCode::NOT_FOUND => Err(ControlError::DbFailure("not found".to_string())),
            StatusCode::UNAUTHORIZED => Err(ControlError::AuthFailure(
                "config DB rejected credentials".to_string(),
            )),
            other => Err(ControlError::DbFailure(format!(
                "config DB returned status {other}"
            ))),
        }
    }
}

#[async_trait]
impl ConfigDatabasePort for ConfigDbClient {
    async fn get_room(&self, building: &BuildingId, room: &RoomId) -> Result<Room, ControlError> {
        self.get(&format!("/buildings/{building}/rooms/{room}")).await
    }

    async fn get_devices(
        &self,
        building: &BuildingId,
        room: &RoomId,
    ) -> Result<Vec<Device>, ControlError> {
        self.get(&format!("/buildings/{building}/rooms/{room}/devices"))
            .await
    }

    async fn get_devices_by_role(
        &self,
        building: &BuildingId,
        room: &RoomId,
        role: &str,
    ) -> Result<Vec<Device>, ControlError> {
        self.get(&format!(
            "/buildings/{building}/rooms/{room}/devices/roles/{role}"
        ))
        .await
    }

    async fn get_device(
        &self,
        building: &BuildingId,
        room: &RoomId,
        device: &DeviceName,
    ) -> Result<Device, ControlError> {
        self.get(&format!(
            "/buildings/{building}/rooms/{room}/devices/{device}"
        ))
        .await
    }

    async fn set_volume(
        &self,
        building: &BuildingId,
        room: &RoomId,
        device: &DeviceName,
        level: i64,
    ) -> Result<(), ControlError> {
        self.put(&format!(
            "/buildings/{building}/rooms/{room}/devices/{device}/attributes/volume/{level}"
        ))
        .await
    }

    async fn set_muted(
        &self,
        building: &BuildingId,
        room: &RoomId,
        device: &DeviceName,
        muted: bool,
    ) -> Result<(), ControlError> {
        self.put(&format!(
            "/buildings/{building}/rooms/{room}/devices/{device}/attributes/muted/{muted}"
        ))
        .await
    }
}
