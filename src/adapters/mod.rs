//! # Adapters
//!
//! Concrete implementations of the [`crate::ports`] traits: a pooled
//! `reqwest`-backed transport and config-DB client, a cached bearer-token
//! provider, and a `async-nats`-backed event publisher. Grounded in the
//! teacher crate's `adapters/netbox/client.rs` pooled-client pattern.

pub mod config_db;
pub mod event_bus;
pub mod http_transport;
pub mod token_provider;
