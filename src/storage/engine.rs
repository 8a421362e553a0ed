//! Storage Engine with Expiry Support
//!
//! This module implements the core storage engine for Strata: a single
//! `HashMap` from key to [`ValueContainer`], with type-dispatched operations
//! for strings, lists, sets and hashes.
//!
//! ## Design Decisions
//!
//! 1. **One map, tagged values**: every key holds exactly one [`Value`]; an
//!    operation against the wrong shape is a no-op that returns a sentinel
//!    (`None`, `0`, `false` or an empty collection).
//! 2. **Lazy + Active Expiry**: mutating operations physically evict an expired
//!    entry before acting on its key. Read-only operations treat expired entries
//!    as absent without touching the map. [`StorageEngine::cleanup_expired`]
//!    sweeps everything that has expired.
//! 3. **No empty collections**: a list, set or hash emptied by a removal is
//!    deleted together with its key.
//! 4. **No interior locking**: the engine is a plain owned structure. Sharing it
//!    between threads is the job of [`SharedStore`](crate::store::SharedStore).
//!
//! ## Access Pattern
//!
//! ```text
//!  operation(key)
//!       │
//!       ▼
//!  ┌──────────────┐  expired   ┌──────────────┐
//!  │ lookup entry │──────────> │ remove_entry │  (&mut only)
//!  └──────┬───────┘            └──────────────┘
//!         │ live
//!         ▼
//!  ┌──────────────┐  mismatch
//!  │ check shape  │──────────> sentinel result
//!  └──────┬───────┘
//!         ▼
//!  read / mutate ──> emptied collection? ──> remove_entry
//! ```

use crate::storage::snapshot::{Snapshot, SnapshotError};
use crate::storage::value::{deadline, Value, ValueContainer, ValueKind};
use bytes::Bytes;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// The main storage engine for Strata.
///
/// Owns every stored value. All reads hand back clones or derived values,
/// so no reference into the map outlives a single call.
///
/// # Example
///
/// ```
/// use strata::storage::StorageEngine;
/// use bytes::Bytes;
///
/// let mut engine = StorageEngine::new();
///
/// engine.set(Bytes::from("name"), Bytes::from("Ariz"), 0);
/// assert_eq!(engine.get(b"name"), Some(Bytes::from("Ariz")));
///
/// engine.rpush(Bytes::from("tasks"), vec![Bytes::from("a"), Bytes::from("b")]);
/// assert_eq!(engine.llen(b"tasks"), 2);
/// ```
pub struct StorageEngine {
    /// The actual data storage
    data: HashMap<Bytes, ValueContainer>,

    /// Statistics: read operations (bumped under a shared borrow)
    read_ops: AtomicU64,

    /// Statistics: write operations
    write_ops: u64,

    /// Statistics: expired entries physically removed
    expired: u64,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("keys", &self.data.len())
            .field("read_ops", &self.read_ops.load(Ordering::Relaxed))
            .field("write_ops", &self.write_ops)
            .field("expired", &self.expired)
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    /// Creates an empty storage engine.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty storage engine with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: HashMap::with_capacity(capacity),
            read_ops: AtomicU64::new(0),
            write_ops: 0,
            expired: 0,
        }
    }

    // ========================================================================
    // EXPIRY PRIMITIVES
    // ========================================================================

    /// Physically removes a key. Both lazy eviction and the sweep go through here.
    fn remove_entry(&mut self, key: &[u8]) -> Option<ValueContainer> {
        self.data.remove(key)
    }

    /// Removes `key` if its container has expired.
    ///
    /// # Returns
    ///
    /// Returns `true` if an expired entry was evicted.
    pub fn evict_if_expired(&mut self, key: &[u8]) -> bool {
        let expired = self.data.get(key).is_some_and(|c| c.is_expired());
        if expired {
            self.remove_entry(key);
            self.expired += 1;
            trace!(key = ?key, "Evicted expired key on access");
        }
        expired
    }

    /// Returns `true` if `key` is still in the map but has already expired.
    pub fn is_stale(&self, key: &[u8]) -> bool {
        self.data.get(key).is_some_and(|c| c.is_expired())
    }

    /// Looks up a live container for reading.
    fn live(&self, key: &[u8]) -> Option<&ValueContainer> {
        self.read_ops.fetch_add(1, Ordering::Relaxed);
        self.data.get(key).filter(|c| !c.is_expired())
    }

    /// Looks up a live container for writing, evicting it first if it has expired.
    fn live_mut(&mut self, key: &[u8]) -> Option<&mut ValueContainer> {
        self.write_ops += 1;
        self.evict_if_expired(key);
        self.data.get_mut(key)
    }

    /// Returns the live container under `key`, creating an empty `init()` value
    /// without expiry if none exists.
    fn live_or_insert(
        &mut self,
        key: Bytes,
        init: impl FnOnce() -> Value,
    ) -> &mut ValueContainer {
        self.write_ops += 1;
        self.evict_if_expired(&key);
        self.data
            .entry(key)
            .or_insert_with(|| ValueContainer::persistent(init()))
    }

    /// Deletes `key` if a removal left its collection empty.
    fn drop_if_empty(&mut self, key: &[u8]) {
        if self.data.get(key).is_some_and(|c| c.is_empty_collection()) {
            self.remove_entry(key);
        }
    }

    fn list(&self, key: &[u8]) -> Option<&VecDeque<Bytes>> {
        match &self.live(key)?.data {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    fn set_members(&self, key: &[u8]) -> Option<&HashSet<Bytes>> {
        match &self.live(key)?.data {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    fn hash(&self, key: &[u8]) -> Option<&HashMap<Bytes, Bytes>> {
        match &self.live(key)?.data {
            Value::Hash(hash) => Some(hash),
            _ => None,
        }
    }

    // ========================================================================
    // STRING OPERATIONS
    // ========================================================================

    /// Sets a string value, replacing whatever the key held before.
    ///
    /// A `ttl_secs` of zero or less stores the value without expiry.
    ///
    /// # Returns
    ///
    /// Always returns `true`; overwriting a live key of any type is a success.
    pub fn set(&mut self, key: Bytes, value: Bytes, ttl_secs: i64) -> bool {
        self.put(key, ValueContainer::new(Value::String(value), ttl_secs))
    }

    /// Sets a string value that expires after `ttl`.
    pub fn set_with_ttl(&mut self, key: Bytes, value: Bytes, ttl: Duration) -> bool {
        self.put(key, ValueContainer::with_ttl(Value::String(value), ttl))
    }

    fn put(&mut self, key: Bytes, container: ValueContainer) -> bool {
        self.write_ops += 1;
        self.evict_if_expired(&key);
        self.data.insert(key, container);
        true
    }

    /// Gets a string value.
    ///
    /// Returns `None` if the key is missing, expired, or holds another type.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        match &self.live(key)?.data {
            Value::String(value) => Some(value.clone()),
            _ => None,
        }
    }

    // ========================================================================
    // LIST OPERATIONS
    // ========================================================================

    /// Pushes values to the head of a list, creating it if needed.
    ///
    /// Values are pushed one at a time, so `LPUSH key a b c` leaves `c, b, a`
    /// in front of the old head.
    ///
    /// # Returns
    ///
    /// The length of the list after the push, or 0 if the key holds another type.
    pub fn lpush(&mut self, key: Bytes, values: Vec<Bytes>) -> usize {
        self.push(key, values, VecDeque::push_front)
    }

    /// Pushes values to the tail of a list in call order, creating it if needed.
    ///
    /// # Returns
    ///
    /// The length of the list after the push, or 0 if the key holds another type.
    pub fn rpush(&mut self, key: Bytes, values: Vec<Bytes>) -> usize {
        self.push(key, values, VecDeque::push_back)
    }

    fn push(
        &mut self,
        key: Bytes,
        values: Vec<Bytes>,
        push_one: fn(&mut VecDeque<Bytes>, Bytes),
    ) -> usize {
        // Nothing to push: never create an empty list.
        if values.is_empty() {
            return self.llen(&key);
        }

        let container = self.live_or_insert(key, || Value::List(VecDeque::new()));
        match &mut container.data {
            Value::List(list) => {
                for value in values {
                    push_one(list, value);
                }
                list.len()
            }
            _ => 0,
        }
    }

    /// Removes and returns the head of a list.
    pub fn lpop(&mut self, key: &[u8]) -> Option<Bytes> {
        self.pop(key, VecDeque::pop_front)
    }

    /// Removes and returns the tail of a list.
    pub fn rpop(&mut self, key: &[u8]) -> Option<Bytes> {
        self.pop(key, VecDeque::pop_back)
    }

    fn pop(
        &mut self,
        key: &[u8],
        pop_one: fn(&mut VecDeque<Bytes>) -> Option<Bytes>,
    ) -> Option<Bytes> {
        let value = match &mut self.live_mut(key)?.data {
            Value::List(list) => pop_one(list),
            _ => return None,
        };
        self.drop_if_empty(key);
        value
    }

    /// Returns the elements between `start` and `stop`, both inclusive.
    ///
    /// Negative indices count from the end (-1 is the last element). Both bounds
    /// are clamped into `[0, len - 1]`; a clamped start past the clamped stop
    /// yields an empty range.
    pub fn lrange(&self, key: &[u8], start: i64, stop: i64) -> Vec<Bytes> {
        let Some(list) = self.list(key) else {
            return Vec::new();
        };

        let len = list.len() as i64;
        if len == 0 {
            return Vec::new();
        }

        let resolve = |index: i64| {
            let index = if index < 0 { len + index } else { index };
            index.clamp(0, len - 1)
        };
        let start = resolve(start);
        let stop = resolve(stop);

        if start > stop {
            return Vec::new();
        }

        list.range(start as usize..=stop as usize).cloned().collect()
    }

    /// Returns the length of a list, or 0 if it is missing or not a list.
    pub fn llen(&self, key: &[u8]) -> usize {
        self.list(key).map_or(0, VecDeque::len)
    }

    // ========================================================================
    // SET OPERATIONS
    // ========================================================================

    /// Adds members to a set, creating it if needed.
    ///
    /// # Returns
    ///
    /// The number of members that were not already present.
    pub fn sadd(&mut self, key: Bytes, members: Vec<Bytes>) -> usize {
        if members.is_empty() {
            return 0;
        }

        let container = self.live_or_insert(key, || Value::Set(HashSet::new()));
        match &mut container.data {
            Value::Set(set) => members
                .into_iter()
                .filter(|member| set.insert(member.clone()))
                .count(),
            _ => 0,
        }
    }

    /// Removes members from a set, deleting the key once the set is empty.
    ///
    /// # Returns
    ///
    /// The number of members actually removed.
    pub fn srem(&mut self, key: &[u8], members: &[Bytes]) -> usize {
        let removed = match self.live_mut(key).map(|c| &mut c.data) {
            Some(Value::Set(set)) => members.iter().filter(|m| set.remove(*m)).count(),
            _ => return 0,
        };
        self.drop_if_empty(key);
        removed
    }

    /// Checks whether `member` belongs to the set at `key`.
    pub fn sismember(&self, key: &[u8], member: &[u8]) -> bool {
        self.set_members(key).is_some_and(|set| set.contains(member))
    }

    /// Returns every member of a set, in arbitrary order.
    pub fn smembers(&self, key: &[u8]) -> Vec<Bytes> {
        self.set_members(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the cardinality of a set, or 0 if it is missing or not a set.
    pub fn scard(&self, key: &[u8]) -> usize {
        self.set_members(key).map_or(0, HashSet::len)
    }

    // ========================================================================
    // HASH OPERATIONS
    // ========================================================================

    /// Sets one field of a hash, creating the hash if needed.
    ///
    /// # Returns
    ///
    /// `true` once the field is stored, `false` only if the key holds another type.
    pub fn hset(&mut self, key: Bytes, field: Bytes, value: Bytes) -> bool {
        let container = self.live_or_insert(key, || Value::Hash(HashMap::new()));
        match &mut container.data {
            Value::Hash(hash) => {
                hash.insert(field, value);
                true
            }
            _ => false,
        }
    }

    /// Gets the value of one hash field.
    pub fn hget(&self, key: &[u8], field: &[u8]) -> Option<Bytes> {
        self.hash(key)?.get(field).cloned()
    }

    /// Deletes fields from a hash, deleting the key once the hash is empty.
    ///
    /// # Returns
    ///
    /// The number of fields actually removed.
    pub fn hdel(&mut self, key: &[u8], fields: &[Bytes]) -> usize {
        let removed = match self.live_mut(key).map(|c| &mut c.data) {
            Some(Value::Hash(hash)) => fields
                .iter()
                .filter(|f| hash.remove(*f).is_some())
                .count(),
            _ => return 0,
        };
        self.drop_if_empty(key);
        removed
    }

    /// Checks whether a hash has `field`.
    pub fn hexists(&self, key: &[u8], field: &[u8]) -> bool {
        self.hash(key).is_some_and(|hash| hash.contains_key(field))
    }

    /// Returns a copy of every field and value of a hash.
    pub fn hgetall(&self, key: &[u8]) -> HashMap<Bytes, Bytes> {
        self.hash(key).cloned().unwrap_or_default()
    }

    /// Returns the number of fields in a hash, or 0 if it is missing or not a hash.
    pub fn hlen(&self, key: &[u8]) -> usize {
        self.hash(key).map_or(0, HashMap::len)
    }

    // ========================================================================
    // KEY OPERATIONS
    // ========================================================================

    /// Deletes a key whatever type it holds.
    ///
    /// # Returns
    ///
    /// Returns `true` if a live key was deleted, `false` if it was missing or expired.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        self.write_ops += 1;
        match self.remove_entry(key) {
            Some(container) if container.is_expired() => {
                self.expired += 1;
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Checks if a key exists and has not expired.
    pub fn exists(&self, key: &[u8]) -> bool {
        self.live(key).is_some()
    }

    /// Returns the type of the value at `key`, or `None` if it is missing.
    pub fn key_type(&self, key: &[u8]) -> Option<ValueKind> {
        self.live(key).map(ValueContainer::kind)
    }

    /// Sets or clears the TTL of an existing key.
    ///
    /// A positive `seconds` sets the TTL; zero or less removes it.
    ///
    /// # Returns
    ///
    /// Returns `false` if the key is missing or already expired.
    pub fn expire(&mut self, key: &[u8], seconds: i64) -> bool {
        let ttl = (seconds > 0).then(|| Duration::from_secs(seconds as u64));
        self.set_expiry(key, ttl)
    }

    /// Sets the TTL of an existing key with sub-second precision.
    pub fn expire_in(&mut self, key: &[u8], ttl: Duration) -> bool {
        self.set_expiry(key, Some(ttl))
    }

    fn set_expiry(&mut self, key: &[u8], ttl: Option<Duration>) -> bool {
        match self.live_mut(key) {
            Some(container) => {
                container.expires_at = ttl.and_then(deadline);
                true
            }
            None => false,
        }
    }

    /// Removes the expiry from a key (makes it persistent).
    ///
    /// # Returns
    ///
    /// Returns `true` if a TTL was removed, `false` if the key doesn't exist
    /// or didn't have one.
    pub fn persist(&mut self, key: &[u8]) -> bool {
        self.live_mut(key)
            .is_some_and(|container| container.expires_at.take().is_some())
    }

    /// Gets the remaining TTL for a key in whole seconds, rounded down.
    ///
    /// # Returns
    ///
    /// - `-2` if the key doesn't exist or has expired
    /// - `-1` if the key exists but has no expiry
    /// - the remaining seconds otherwise
    pub fn ttl(&self, key: &[u8]) -> i64 {
        self.remaining(key, |left| left.as_secs() as i64)
    }

    /// Gets the remaining TTL for a key in milliseconds.
    ///
    /// Uses the same sentinels as [`ttl`](Self::ttl).
    pub fn pttl(&self, key: &[u8]) -> i64 {
        self.remaining(key, |left| left.as_millis() as i64)
    }

    fn remaining(&self, key: &[u8], unit: impl FnOnce(Duration) -> i64) -> i64 {
        let now = Instant::now();
        self.read_ops.fetch_add(1, Ordering::Relaxed);
        match self.data.get(key) {
            Some(container) if !container.is_expired_at(now) => {
                container.remaining_at(now).map_or(-1, unit)
            }
            _ => -2,
        }
    }

    /// Returns the names of all unexpired keys, in arbitrary order.
    pub fn keys(&self) -> Vec<Bytes> {
        let now = Instant::now();
        self.data
            .iter()
            .filter(|(_, container)| !container.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Returns the number of unexpired keys.
    pub fn size(&self) -> usize {
        let now = Instant::now();
        self.data
            .values()
            .filter(|container| !container.is_expired_at(now))
            .count()
    }

    /// Returns true if no unexpired key is stored.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Clears all data from the store.
    pub fn clear(&mut self) {
        self.write_ops += 1;
        self.data.clear();
    }

    /// Removes every entry that has expired by now.
    ///
    /// Meant to be called periodically by whoever owns the engine; the engine
    /// itself never spawns a sweeper.
    ///
    /// # Returns
    ///
    /// Returns the number of keys that were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired: Vec<Bytes> = self
            .data
            .iter()
            .filter(|(_, container)| container.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
        }

        let removed = expired.len();
        if removed > 0 {
            self.expired += removed as u64;
            debug!(
                expired = removed,
                keys_remaining = self.data.len(),
                "Expired keys cleaned up"
            );
        }
        removed
    }

    // ========================================================================
    // SNAPSHOTS
    // ========================================================================

    /// Exports a copy of every unexpired entry, expiry instants included.
    pub fn snapshot(&self) -> Snapshot {
        let now = Instant::now();
        self.data
            .iter()
            .filter(|(_, container)| !container.is_expired_at(now))
            .map(|(key, container)| (key.clone(), container.clone()))
            .collect()
    }

    /// Replaces the whole store with the contents of `snapshot`.
    ///
    /// Entries that have expired in the meantime are skipped. If any entry
    /// holds an empty list, set or hash, the store is left untouched.
    ///
    /// # Returns
    ///
    /// The number of entries loaded.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<usize, SnapshotError> {
        snapshot.validate()?;

        let now = Instant::now();
        let total = snapshot.len();
        self.data = snapshot
            .into_iter()
            .filter(|(_, container)| !container.is_expired_at(now))
            .collect();
        self.write_ops += 1;

        debug!(
            loaded = self.data.len(),
            skipped = total - self.data.len(),
            "Snapshot restored"
        );
        Ok(self.data.len())
    }

    /// Returns engine statistics.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.data.len(),
            read_ops: self.read_ops.load(Ordering::Relaxed),
            write_ops: self.write_ops,
            expired: self.expired,
        }
    }
}

/// Engine statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    /// Entries physically present, including expired ones not yet evicted
    pub keys: usize,
    /// Total read operations
    pub read_ops: u64,
    /// Total write operations
    pub write_ops: u64,
    /// Total expired entries evicted, lazily or by a sweep
    pub expired: u64,
}
