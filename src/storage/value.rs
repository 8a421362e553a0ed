//! Value Containers
//!
//! Every key in Strata maps to exactly one [`ValueContainer`]: a tagged
//! [`Value`] (string, list, set or hash) plus an optional absolute expiry.
//!
//! The set of shapes is closed. Operations match on [`Value`] exhaustively
//! and never coerce one shape into another.

use bytes::Bytes;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};

/// The payload stored under a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Binary-safe string
    String(Bytes),

    /// Ordered sequence, duplicates allowed. A deque gives O(1) push/pop on both ends.
    List(VecDeque<Bytes>),

    /// Unordered unique members
    Set(HashSet<Bytes>),

    /// Field -> value map
    Hash(HashMap<Bytes, Bytes>),
}

impl Value {
    /// Returns the active shape of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Set(_) => ValueKind::Set,
            Value::Hash(_) => ValueKind::Hash,
        }
    }

    /// Returns true for a list, set or hash with no elements.
    ///
    /// Strings are never considered empty collections, even when zero-length.
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::String(_) => false,
            Value::List(list) => list.is_empty(),
            Value::Set(set) => set.is_empty(),
            Value::Hash(hash) => hash.is_empty(),
        }
    }
}

/// The type tag of a stored value, as reported by `TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    List,
    Set,
    Hash,
}

impl ValueKind {
    /// Returns the lowercase type name ("string", "list", "set" or "hash").
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Set => "set",
            ValueKind::Hash => "hash",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored value with optional expiry time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueContainer {
    /// The actual value stored
    pub data: Value,
    /// When this container expires (None = never expires)
    pub expires_at: Option<Instant>,
}

impl ValueContainer {
    /// Creates a container with a TTL in whole seconds.
    ///
    /// A TTL of zero or less means the value never expires.
    pub fn new(data: Value, ttl_secs: i64) -> Self {
        let expires_at = if ttl_secs > 0 {
            deadline(Duration::from_secs(ttl_secs as u64))
        } else {
            None
        };
        Self { data, expires_at }
    }

    /// Creates a container that never expires.
    pub fn persistent(data: Value) -> Self {
        Self {
            data,
            expires_at: None,
        }
    }

    /// Creates a container that expires after `ttl`.
    pub fn with_ttl(data: Value, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: deadline(ttl),
        }
    }

    /// Creates a container with an explicit absolute expiry.
    pub fn with_expiry(data: Value, expires_at: Option<Instant>) -> Self {
        Self { data, expires_at }
    }

    /// Returns the active shape of the stored value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        self.data.kind()
    }

    /// Checks whether this container had expired at `now`.
    ///
    /// A container expires strictly after its deadline, so at `now == expires_at`
    /// it is still live.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now > exp)
    }

    /// Checks if this container has expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Returns the time left before expiry, or None if the container never expires.
    ///
    /// An already expired container reports `Duration::ZERO`.
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        self.expires_at.map(|exp| exp.saturating_duration_since(now))
    }

    /// See [`Value::is_empty_collection`].
    #[inline]
    pub fn is_empty_collection(&self) -> bool {
        self.data.is_empty_collection()
    }
}

/// Converts a TTL into an absolute deadline.
///
/// A TTL too large to represent as an `Instant` never expires.
pub(crate) fn deadline(ttl: Duration) -> Option<Instant> {
    Instant::now().checked_add(ttl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(s: &'static str) -> Value {
        Value::String(Bytes::from(s))
    }

    #[test]
    fn test_kind_reports_active_shape() {
        assert_eq!(string("v").kind(), ValueKind::String);
        assert_eq!(Value::List(VecDeque::new()).kind(), ValueKind::List);
        assert_eq!(Value::Set(HashSet::new()).kind(), ValueKind::Set);
        assert_eq!(Value::Hash(HashMap::new()).kind(), ValueKind::Hash);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ValueKind::String.to_string(), "string");
        assert_eq!(ValueKind::List.as_str(), "list");
        assert_eq!(ValueKind::Set.as_str(), "set");
        assert_eq!(format!("{}", ValueKind::Hash), "hash");
    }

    #[test]
    fn test_non_positive_ttl_never_expires() {
        assert_eq!(ValueContainer::new(string("v"), 0).expires_at, None);
        assert_eq!(ValueContainer::new(string("v"), -5).expires_at, None);
        assert!(ValueContainer::new(string("v"), 10).expires_at.is_some());
    }

    #[test]
    fn test_unrepresentable_ttl_never_expires() {
        assert_eq!(ValueContainer::new(string("v"), i64::MAX).expires_at, None);
        assert_eq!(ValueContainer::with_ttl(string("v"), Duration::MAX).expires_at, None);
    }

    #[test]
    fn test_is_expired_at_is_strict() {
        let now = Instant::now();
        let container = ValueContainer::with_expiry(string("v"), Some(now));

        assert!(!container.is_expired_at(now));
        assert!(container.is_expired_at(now + Duration::from_millis(1)));
        assert!(!ValueContainer::persistent(string("v")).is_expired_at(now));
    }

    #[test]
    fn test_remaining_at() {
        let now = Instant::now();
        let container =
            ValueContainer::with_expiry(string("v"), Some(now + Duration::from_secs(5)));

        assert_eq!(container.remaining_at(now), Some(Duration::from_secs(5)));
        assert_eq!(
            container.remaining_at(now + Duration::from_secs(10)),
            Some(Duration::ZERO)
        );
        assert_eq!(ValueContainer::persistent(string("v")).remaining_at(now), None);
    }

    #[test]
    fn test_empty_collection() {
        assert!(!string("").is_empty_collection());
        assert!(Value::List(VecDeque::new()).is_empty_collection());
        assert!(Value::Set(HashSet::new()).is_empty_collection());
        assert!(Value::Hash(HashMap::new()).is_empty_collection());

        let list = Value::List(VecDeque::from(vec![Bytes::from("a")]));
        assert!(!list.is_empty_collection());
    }
}
