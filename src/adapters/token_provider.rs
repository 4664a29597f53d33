//! Bearer-token provider with cached-with-expiry semantics (spec.md §9
//! "Authentication in local mode": "may be cached with expiry"),
//! grounded in the teacher's `RwLock<HashMap<...>>` cache in
//! `service/mod.rs`.

use crate::domain::errors::ControlError;
use crate::ports::TokenProviderPort;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
    expires_in_seconds: u64,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Fetches and caches a bearer token from an external token endpoint,
/// refreshing shortly before expiry.
pub struct CachedTokenProvider {
    client: Client,
    token_endpoint: String,
    cache: RwLock<Option<CachedToken>>,
    refresh_margin: Duration,
}

impl CachedTokenProvider {
    /// Build a provider pointed at `token_endpoint`, a URL expected to
    /// return `{"token": "...", "expires_in_seconds": N}`.
    pub fn new(client: Client, token_endpoint: impl Into<String>) -> Self {
        Self {
            client,
            token_endpoint: token_endpoint.into(),
            cache: RwLock::new(None),
            refresh_margin: Duration::from_secs(30),
        }
    }

    async fn fetch(&self) -> Result<CachedToken, ControlError> {
        let response = self
            .client
            .get(&self.token_endpoint)
            .send()
            .await
            .map_err(|e| ControlError::AuthFailure(e.to_string()))?;
        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| ControlError::AuthFailure(e.to_string()))?;

        Ok(CachedToken {
            token: parsed.token,
            expires_at: Instant::now() + Duration::from_secs(parsed.expires_in_seconds),
        })
    }
}

#[async_trait]
impl TokenProviderPort for CachedTokenProvider {
    async fn get_token(&self) -> Result<String, ControlError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() + self.refresh_margin {
                    return Ok(cached.token.clone());
                }
            }
        }

        let fresh = self.fetch().await?;
        let token = fresh.token.clone();
        *self.cache.write().await = Some(fresh);
        tracing::debug!("refreshed bearer token");
        Ok(token)
    }
}
