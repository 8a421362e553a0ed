//! Thread-Safe Store
//!
//! [`SharedStore`] wraps one [`StorageEngine`] in a single store-wide
//! `RwLock`. Observational calls take the shared lock, mutating calls take the
//! exclusive lock, and every guard is released when the call returns.
//!
//! ## Expired Entries Under A Read Lock
//!
//! A read that finds an expired entry must not remove it while holding only
//! the shared lock. Instead the read is promoted:
//!
//! ```text
//!  read lock ──> entry stale? ──no──> answer, release
//!                     │
//!                    yes
//!                     ▼
//!  release read lock, take write lock
//!                     │
//!                     ▼
//!  evict_if_expired(key) ──> answer under the write lock
//! ```
//!
//! The key may have been rewritten between the two locks, so the eviction
//! re-checks expiry before removing anything. Reads of live keys never touch
//! the write lock.

use crate::storage::{Snapshot, SnapshotError, StorageEngine, StorageStats, ValueKind};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::warn;

/// A storage engine shared between threads behind one reader-writer lock.
///
/// Wrap it in an `Arc` to hand it to several threads.
///
/// # Example
///
/// ```
/// use strata::store::SharedStore;
/// use bytes::Bytes;
/// use std::sync::Arc;
/// use std::thread;
///
/// let store = Arc::new(SharedStore::new());
///
/// let writer = {
///     let store = Arc::clone(&store);
///     thread::spawn(move || {
///         store.set(Bytes::from("greeting"), Bytes::from("hello"), 0);
///     })
/// };
/// writer.join().unwrap();
///
/// assert_eq!(store.get(b"greeting"), Some(Bytes::from("hello")));
/// ```
#[derive(Debug, Default)]
pub struct SharedStore {
    engine: RwLock<StorageEngine>,
}

impl From<StorageEngine> for SharedStore {
    fn from(engine: StorageEngine) -> Self {
        Self {
            engine: RwLock::new(engine),
        }
    }
}

impl SharedStore {
    /// Creates an empty shared store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty shared store with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        StorageEngine::with_capacity(capacity).into()
    }

    /// Consumes the store and returns the engine inside.
    pub fn into_inner(self) -> StorageEngine {
        self.engine.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquires the shared lock.
    ///
    /// A writer that panicked cannot have left the engine half-mutated, so a
    /// poisoned lock is recovered rather than propagated.
    fn read(&self) -> RwLockReadGuard<'_, StorageEngine> {
        self.engine.read().unwrap_or_else(|poisoned| {
            warn!("Store lock poisoned by a panicked writer, recovering");
            poisoned.into_inner()
        })
    }

    /// Acquires the exclusive lock.
    fn write(&self) -> RwLockWriteGuard<'_, StorageEngine> {
        self.engine.write().unwrap_or_else(|poisoned| {
            warn!("Store lock poisoned by a panicked writer, recovering");
            poisoned.into_inner()
        })
    }

    /// Runs a read of `key`, promoting to the exclusive lock only when the
    /// entry has expired and needs evicting.
    fn read_key<T>(&self, key: &[u8], op: impl Fn(&StorageEngine) -> T) -> T {
        {
            let engine = self.read();
            if !engine.is_stale(key) {
                return op(&*engine);
            }
        }

        let mut engine = self.write();
        engine.evict_if_expired(key);
        op(&*engine)
    }

    // ========================================================================
    // STRING COMMANDS
    // ========================================================================

    /// SET key value [EX seconds]. A `ttl_secs` of zero or less means no expiry.
    pub fn set(&self, key: Bytes, value: Bytes, ttl_secs: i64) -> bool {
        self.write().set(key, value, ttl_secs)
    }

    /// SET key value PX milliseconds
    pub fn set_with_ttl(&self, key: Bytes, value: Bytes, ttl: Duration) -> bool {
        self.write().set_with_ttl(key, value, ttl)
    }

    /// GET key
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.read_key(key, |engine| engine.get(key))
    }

    // ========================================================================
    // LIST COMMANDS
    // ========================================================================

    /// LPUSH key value [value ...]
    pub fn lpush(&self, key: Bytes, values: Vec<Bytes>) -> usize {
        self.write().lpush(key, values)
    }

    /// RPUSH key value [value ...]
    pub fn rpush(&self, key: Bytes, values: Vec<Bytes>) -> usize {
        self.write().rpush(key, values)
    }

    /// LPOP key
    pub fn lpop(&self, key: &[u8]) -> Option<Bytes> {
        self.write().lpop(key)
    }

    /// RPOP key
    pub fn rpop(&self, key: &[u8]) -> Option<Bytes> {
        self.write().rpop(key)
    }

    /// LRANGE key start stop
    pub fn lrange(&self, key: &[u8], start: i64, stop: i64) -> Vec<Bytes> {
        self.read_key(key, |engine| engine.lrange(key, start, stop))
    }

    /// LLEN key
    pub fn llen(&self, key: &[u8]) -> usize {
        self.read_key(key, |engine| engine.llen(key))
    }

    // ========================================================================
    // SET COMMANDS
    // ========================================================================

    /// SADD key member [member ...]
    pub fn sadd(&self, key: Bytes, members: Vec<Bytes>) -> usize {
        self.write().sadd(key, members)
    }

    /// SREM key member [member ...]
    pub fn srem(&self, key: &[u8], members: &[Bytes]) -> usize {
        self.write().srem(key, members)
    }

    /// SISMEMBER key member
    pub fn sismember(&self, key: &[u8], member: &[u8]) -> bool {
        self.read_key(key, |engine| engine.sismember(key, member))
    }

    /// SMEMBERS key
    pub fn smembers(&self, key: &[u8]) -> Vec<Bytes> {
        self.read_key(key, |engine| engine.smembers(key))
    }

    /// SCARD key
    pub fn scard(&self, key: &[u8]) -> usize {
        self.read_key(key, |engine| engine.scard(key))
    }

    // ========================================================================
    // HASH COMMANDS
    // ========================================================================

    /// HSET key field value
    pub fn hset(&self, key: Bytes, field: Bytes, value: Bytes) -> bool {
        self.write().hset(key, field, value)
    }

    /// HGET key field
    pub fn hget(&self, key: &[u8], field: &[u8]) -> Option<Bytes> {
        self.read_key(key, |engine| engine.hget(key, field))
    }

    /// HDEL key field [field ...]
    pub fn hdel(&self, key: &[u8], fields: &[Bytes]) -> usize {
        self.write().hdel(key, fields)
    }

    /// HEXISTS key field
    pub fn hexists(&self, key: &[u8], field: &[u8]) -> bool {
        self.read_key(key, |engine| engine.hexists(key, field))
    }

    /// HGETALL key
    pub fn hgetall(&self, key: &[u8]) -> HashMap<Bytes, Bytes> {
        self.read_key(key, |engine| engine.hgetall(key))
    }

    /// HLEN key
    pub fn hlen(&self, key: &[u8]) -> usize {
        self.read_key(key, |engine| engine.hlen(key))
    }

    // ========================================================================
    // KEY COMMANDS
    // ========================================================================

    /// DEL key
    pub fn del(&self, key: &[u8]) -> bool {
        self.write().remove(key)
    }

    /// EXISTS key
    pub fn exists(&self, key: &[u8]) -> bool {
        self.read_key(key, |engine| engine.exists(key))
    }

    /// TYPE key
    pub fn key_type(&self, key: &[u8]) -> Option<ValueKind> {
        self.read_key(key, |engine| engine.key_type(key))
    }

    /// EXPIRE key seconds. Zero or less clears the TTL.
    pub fn expire(&self, key: &[u8], seconds: i64) -> bool {
        self.write().expire(key, seconds)
    }

    /// PEXPIRE key milliseconds
    pub fn expire_in(&self, key: &[u8], ttl: Duration) -> bool {
        self.write().expire_in(key, ttl)
    }

    /// PERSIST key
    pub fn persist(&self, key: &[u8]) -> bool {
        self.write().persist(key)
    }

    /// TTL key: -2 if missing, -1 if persistent, otherwise whole seconds left.
    pub fn ttl(&self, key: &[u8]) -> i64 {
        self.read_key(key, |engine| engine.ttl(key))
    }

    /// PTTL key
    pub fn pttl(&self, key: &[u8]) -> i64 {
        self.read_key(key, |engine| engine.pttl(key))
    }

    /// KEYS *
    pub fn keys(&self) -> Vec<Bytes> {
        self.read().keys()
    }

    /// DBSIZE
    pub fn size(&self) -> usize {
        self.read().size()
    }

    /// FLUSHDB
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Sweeps every expired entry. See [`StorageEngine::cleanup_expired`].
    pub fn cleanup_expired(&self) -> usize {
        self.write().cleanup_expired()
    }

    // ========================================================================
    // SNAPSHOTS & STATS
    // ========================================================================

    /// Exports every unexpired entry.
    pub fn snapshot(&self) -> Snapshot {
        self.read().snapshot()
    }

    /// Replaces the whole store with `snapshot`.
    pub fn restore(&self, snapshot: Snapshot) -> Result<usize, SnapshotError> {
        self.write().restore(snapshot)
    }

    /// Returns engine statistics.
    pub fn stats(&self) -> StorageStats {
        self.read().stats()
    }
}
