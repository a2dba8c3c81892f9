//! Persistent push-channel client.
//!
//! This crate owns the one logical connection to the monitoring server.
//! The subscription registry ([`router::EventRouter`]) is independent of
//! the connection itself, so subscriptions survive reconnects without
//! being re-registered.

pub mod client;
pub mod error;
pub mod router;

pub use client::{ChannelClient, ConnectionState, ReconnectConfig};
pub use error::{TransportError, TransportResult};
pub use router::{EventRouter, Subscription};
