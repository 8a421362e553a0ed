//! # Strata - An In-Process Multi-Type Key-Value Store
//!
//! Strata is an in-memory key-value store that emulates a subset of the Redis
//! data model: strings, lists, sets and hashes in one keyspace, per-key TTL
//! with lazy expiration, and a thread-safe wrapper around the whole store.
//!
//! There is no server and no wire protocol. Callers use the typed API directly.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        SharedStore                          │
//! │                 RwLock (one per store)                      │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │                   StorageEngine                       │  │
//! │  │        HashMap<Bytes, ValueContainer>                 │  │
//! │  │   ┌────────┐ ┌──────┐ ┌─────┐ ┌──────┐                │  │
//! │  │   │ String │ │ List │ │ Set │ │ Hash │ + expires_at   │  │
//! │  │   └────────┘ └──────┘ └─────┘ └──────┘                │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!               ▲                               │
//!               │ cleanup_expired()             │ snapshot()
//!        external caller                 persistence collaborator
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use strata::SharedStore;
//! use bytes::Bytes;
//!
//! let store = SharedStore::new();
//!
//! store.set(Bytes::from("name"), Bytes::from("Ariz"), 0);
//! store.lpush(Bytes::from("tasks"), vec![Bytes::from("a"), Bytes::from("b")]);
//! store.sadd(Bytes::from("tags"), vec![Bytes::from("rust"), Bytes::from("rust")]);
//! store.hset(Bytes::from("user:1"), Bytes::from("name"), Bytes::from("Alice"));
//!
//! assert_eq!(store.get(b"name"), Some(Bytes::from("Ariz")));
//! assert_eq!(store.lrange(b"tasks", 0, -1), vec![Bytes::from("b"), Bytes::from("a")]);
//! assert_eq!(store.scard(b"tags"), 1);
//! assert_eq!(store.size(), 4);
//! ```
//!
//! ## Supported Commands
//!
//! ### String Commands
//! - `SET key value [EX seconds]` / `SET key value PX milliseconds`
//! - `GET key`
//!
//! ### List Commands
//! - `LPUSH` / `RPUSH key value [value ...]`
//! - `LPOP` / `RPOP key`
//! - `LRANGE key start stop`, `LLEN key`
//!
//! ### Set Commands
//! - `SADD` / `SREM key member [member ...]`
//! - `SISMEMBER key member`, `SMEMBERS key`, `SCARD key`
//!
//! ### Hash Commands
//! - `HSET key field value`, `HGET key field`
//! - `HDEL key field [field ...]`, `HEXISTS key field`
//! - `HGETALL key`, `HLEN key`
//!
//! ### Key Commands
//! - `DEL`, `EXISTS`, `TYPE`, `KEYS *`, `DBSIZE`, `FLUSHDB`
//! - `EXPIRE` / `PEXPIRE`, `TTL` / `PTTL`, `PERSIST`
//!
//! ## Design Highlights
//!
//! ### Misses Are Not Errors
//!
//! A missing key, an expired key and a key of the wrong type all produce an
//! ordinary sentinel result (`None`, `0`, `false`, an empty collection or a
//! negative TTL). Only importing a malformed [`storage::Snapshot`] returns an error.
//!
//! ### Lazy + Active Expiry
//!
//! 1. **Lazy**: an expired key reads as absent and is removed on its next access
//! 2. **Active**: [`SharedStore::cleanup_expired`] removes everything that has expired
//!
//! No background thread is spawned; periodic sweeping is left to the caller.

pub mod storage;
pub mod store;

// Re-export commonly used types for convenience
pub use storage::{
    Snapshot, SnapshotError, StorageEngine, StorageStats, Value, ValueContainer, ValueKind,
};
pub use store::SharedStore;

/// Version of Strata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
