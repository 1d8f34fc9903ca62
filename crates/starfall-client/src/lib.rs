//! Backend session management for Starfall.
//!
//! This crate owns the game's relationship with the remote backend:
//!
//! 1. **Authentication state** — who the player is ([`Session`]), persisted
//!    identifiers for silent reconnects ([`IdentityVault`])
//! 2. **Request issuance** — every backend operation the game uses, each
//!    non-blocking ([`SessionClient`])
//! 3. **Completion delivery** — a per-frame drain that turns buffered
//!    transport replies into typed [`BackendEvent`]s, exactly one per
//!    issued request
//!
//! # How it fits in the stack
//!
//! ```text
//! Game Layer (above)   ← consumes BackendEvents, drives progression
//!     ↕
//! Client Layer (this crate)  ← session state, request/completion pairing
//!     ↕
//! Transport (external)  ← delivers opaque response documents
//! ```

mod client;
mod error;
mod event;
mod session;
mod transport;

pub use client::SessionClient;
pub use error::ClientError;
pub use event::BackendEvent;
pub use session::{ClientConfig, IdentityVault, MemoryVault, Session, StoredIdentity};
pub use transport::{BackendFault, BackendReply, BackendRequest, BackendTransport, ReplySender};
