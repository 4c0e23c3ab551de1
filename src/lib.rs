//! # peerbus
//!
//! Runtime-agnostic WebSocket peer layer with hook-based lifecycle handling
//! and topic publish/subscribe.
//!
//! ## Architecture
//!
//! - **Domain Layer**: peers, messages, upgrade requests and the peer registry
//! - **Application Layer**: hook sets, the hook dispatcher and the adapter
//! - **Infrastructure Layer**: socket backends and metrics
//! - **Presentation Layer**: axum WebSocket binding and HTTP routes
//!
//! ## Module Structure
//!
//! ```text
//! peerbus/
//! +-- config/         Configuration management
//! +-- domain/         Peer, Message, PeerRegistry, Connection traits
//! +-- application/    HookSet, HookDispatcher, Adapter
//! +-- infrastructure/ Channel and hub backends, Prometheus metrics
//! +-- presentation/   axum handlers and demo hooks
//! +-- shared/         Error types
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use peerbus::application::{Adapter, AdapterOptions, HookSet};
//! use peerbus::domain::SendOptions;
//!
//! let hooks = HookSet::new().on_message(|peer, message| async move {
//!     peer.send(message.text().to_string(), SendOptions::default())?;
//!     Ok(())
//! });
//! let adapter = Adapter::new(AdapterOptions::new(hooks));
//! ```

// Configuration module
pub mod config;

// Domain layer - Peers and messages
pub mod domain;

// Application layer - Hooks and adapter
pub mod application;

// Infrastructure layer - Socket backends and metrics
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use application::{Adapter, AdapterOptions, HookSet};
pub use domain::{Message, Payload, Peer, SendOptions};
pub use shared::{AdapterError, Result};
