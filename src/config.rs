//! # Process Configuration
//!
//! Loaded once from environment variables at process start, the same
//! direct-env-var style the original service uses (spec.md §6
//! "Environment") rather than a layered file-based config — there is
//! nothing here that needs layering.

use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors produced while reading configuration from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable was not set.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable was set but could not be parsed.
    #[error("invalid value for {name}: {value}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Offending raw value.
        value: String,
    },
}

/// Process-wide configuration, read once via [`Config::from_env`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the external configuration database.
    pub config_db_address: Url,
    /// Skip bearer-token attachment when true (spec.md §9 "Authentication
    /// in local mode").
    pub local_environment: bool,
    /// Per-request timeout enforced at the HTTP client level (spec.md
    /// §4.5, default 5s).
    pub device_request_timeout: Duration,
    /// Upper bound on simultaneously in-flight device groups. `None`
    /// means unbounded (one task per device, as spec.md §4.5 assumes).
    pub dispatch_concurrency: Option<usize>,
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// - `CONFIGURATION_DATABASE_MICROSERVICE_ADDRESS` — required.
    /// - `LOCAL_ENVIRONMENT` — any non-empty value enables local mode.
    /// - `DEVICE_REQUEST_TIMEOUT_MS` — optional, default 5000.
    /// - `DISPATCH_CONCURRENCY` — optional, default unbounded.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_address = env::var("CONFIGURATION_DATABASE_MICROSERVICE_ADDRESS")
            .map_err(|_| ConfigError::Missing("CONFIGURATION_DATABASE_MICROSERVICE_ADDRESS"))?;
        let config_db_address = Url::parse(&raw_address).map_err(|_| ConfigError::Invalid {
            name: "CONFIGURATION_DATABASE_MICROSERVICE_ADDRESS",
            value: raw_address,
        })?;

        let local_environment = env::var("LOCAL_ENVIRONMENT")
            .map(|v| !v.is_empty())
            .unwrap_or(false);

        let device_request_timeout = match env::var("DEVICE_REQUEST_TIMEOUT_MS") {
            Ok(raw) => {
                let millis: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                    name: "DEVICE_REQUEST_TIMEOUT_MS",
                    value: raw.clone(),
                })?;
                Duration::from_millis(millis)
            }
            Err(_) => Duration::from_secs(5),
        };

        let dispatch_concurrency = match env::var("DISPATCH_CONCURRENCY") {
            Ok(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid {
                name: "DISPATCH_CONCURRENCY",
                value: raw,
            })?),
            Err(_) => None,
        };

        Ok(Self {
            config_db_address,
            local_environment,
            device_request_timeout,
            dispatch_concurrency,
        })
    }
}
