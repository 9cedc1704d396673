//! Pluggable in-memory maps.
//!
//! The caller owns the map; the provider only holds an `Arc` to it and
//! inserts hydrated or fetched entries. Implement [`MapBackend`] to bring
//! your own concurrent map.

use crate::key::Key;
use serde_json::Value;
use std::collections::HashMap;

/// Trait a concurrent map must satisfy to receive entries from a
/// [`Provider`](crate::Provider).
///
/// Only [`insert`](Self::insert) is used by the provider. The read methods
/// are there for callers that hold the map behind `dyn MapBackend`.
pub trait MapBackend: Send + Sync {
    /// Insert a key-value pair, returning the previous value if any.
    fn insert(&self, key: Key, value: Value) -> Option<Value>;

    /// Look up a value by key.
    fn get(&self, key: &Key) -> Option<Value>;

    /// Number of entries.
    fn map_len(&self) -> usize;

    /// Check if a key exists without cloning the value. Override for backends
    /// that can do this cheaply (most can).
    fn contains_key(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }
}

// ---- ShardMap ----------------------------------------------------------------

impl MapBackend for shardmap::ShardMap<Key, Value> {
    fn insert(&self, key: Key, value: Value) -> Option<Value> {
        shardmap::ShardMap::insert(self, key, value)
    }

    fn get(&self, key: &Key) -> Option<Value> {
        shardmap::ShardMap::get(self, key)
    }

    fn map_len(&self) -> usize {
        self.len()
    }

    // ShardMap::get returns Arc<V>, so is_some() is just an atomic refcount bump.
    fn contains_key(&self, key: &Key) -> bool {
        shardmap::ShardMap::get(self, key).is_some()
    }
}

// ---- RwLock<HashMap> ---------------------------------------------------------

impl MapBackend for parking_lot::RwLock<HashMap<Key, Value>> {
    fn insert(&self, key: Key, value: Value) -> Option<Value> {
        self.write().insert(key, value)
    }

    fn get(&self, key: &Key) -> Option<Value> {
        self.read().get(key).cloned()
    }

    fn map_len(&self) -> usize {
        self.read().len()
    }

    fn contains_key(&self, key: &Key) -> bool {
        self.read().contains_key(key)
    }
}

// ---- DashMap (feature-gated) -------------------------------------------------

#[cfg(feature = "dashmap")]
impl MapBackend for dashmap::DashMap<Key, Value> {
    fn insert(&self, key: Key, value: Value) -> Option<Value> {
        dashmap::DashMap::insert(self, key, value)
    }

    fn get(&self, key: &Key) -> Option<Value> {
        dashmap::DashMap::get(self, key).map(|r| r.value().clone())
    }

    fn map_len(&self) -> usize {
        self.len()
    }

    fn contains_key(&self, key: &Key) -> bool {
        dashmap::DashMap::contains_key(self, key)
    }
}
