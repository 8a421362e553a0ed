//! Storage Engine Module
//!
//! This module provides the core storage functionality for Strata:
//! the tagged value model, the single-owner storage engine with TTL support,
//! and the raw snapshot hook used by persistence collaborators.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │      HashMap<Bytes, ValueContainer>                         │
//! │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐                │
//! │  │ String │ │  List  │ │  Set   │ │  Hash  │  + expires_at  │
//! │  └────────┘ └────────┘ └────────┘ └────────┘                │
//! └─────────────────────────────────────────────────────────────┘
//!              │                              ▲
//!              ▼                              │
//!        Snapshot (export)            Snapshot (import)
//! ```
//!
//! ## Features
//!
//! - **Four value types**: strings, lists, sets and hashes in one keyspace
//! - **TTL Support**: Keys can have time-to-live expiry
//! - **Lazy Expiry**: Expired keys read as absent and are evicted on write
//! - **Active Expiry**: `cleanup_expired` sweeps on demand
//!
//! ## Example
//!
//! ```
//! use strata::storage::{StorageEngine, ValueKind};
//! use bytes::Bytes;
//! use std::time::Duration;
//!
//! let mut engine = StorageEngine::new();
//!
//! engine.set(Bytes::from("name"), Bytes::from("Ariz"), 0);
//! assert_eq!(engine.get(b"name"), Some(Bytes::from("Ariz")));
//!
//! engine.hset(Bytes::from("user:1"), Bytes::from("email"), Bytes::from("a@b.c"));
//! assert_eq!(engine.key_type(b"user:1"), Some(ValueKind::Hash));
//!
//! engine.set_with_ttl(
//!     Bytes::from("session"),
//!     Bytes::from("token123"),
//!     Duration::from_secs(3600),
//! );
//! assert!(engine.ttl(b"session") > 0);
//! ```

pub mod engine;
pub mod snapshot;
pub mod value;

// Re-export commonly used types
pub use engine::{StorageEngine, StorageStats};
pub use snapshot::{Snapshot, SnapshotError};
pub use value::{Value, ValueContainer, ValueKind};
