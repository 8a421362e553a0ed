//! Concurrency Module
//!
//! This module makes the storage engine safe to share between threads.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐ ┌──────────┐ ┌──────────┐
//! │ Thread 1 │ │ Thread 2 │ │ Thread N │
//! └────┬─────┘ └────┬─────┘ └────┬─────┘
//!      │  read()    │  read()    │  write()
//!      ▼            ▼            ▼
//! ┌─────────────────────────────────────┐
//! │            SharedStore              │
//! │   RwLock<StorageEngine>             │
//! │   many readers OR one writer        │
//! └─────────────────────────────────────┘
//! ```
//!
//! The lock is coarse-grained: one writer blocks every reader store-wide.
//! All operations are linearizable in lock-acquisition order.

pub mod shared;

pub use shared::SharedStore;
