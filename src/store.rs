//! EntityStore - normalized keyed storage of last-known server state.
//!
//! One entry per `"<kind>:<id>"` key holding the serialized server
//! representation. Values are immutable by replacement: a commit swaps the
//! whole entry, so previously decoded values held by consumers stay valid.
//!
//! Every commit carries the request sequence number allocated when its
//! originating round-trip was issued. The store keeps a per-key high-water
//! mark and discards commits below it, so two in-flight responses for the
//! same key resolve last-writer-wins by issue order, not arrival order. The
//! mark survives removal, which keeps a late fetch from resurrecting a
//! deleted entity.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::error::SyncError;
use crate::resource::{Resource, ResourceKind};

struct StoredEntity {
    bytes: Vec<u8>,
    seq: u64,
}

struct StoreInner {
    entries: HashMap<String, StoredEntity>,
    /// Highest request seq applied per key, kept across removals.
    applied: HashMap<String, u64>,
}

/// In-memory entity store. Clone-friendly via Arc; clones share storage.
#[derive(Clone)]
pub struct EntityStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                entries: HashMap::new(),
                applied: HashMap::new(),
            })),
        }
    }

    fn make_key(kind: ResourceKind, id: &str) -> String {
        format!("{}:{}", kind.path(), id)
    }

    /// Commit an entity under the given request seq. Returns `false` when a
    /// newer response already landed and this one was discarded.
    pub fn apply<R: Resource>(&self, entity: &R, seq: u64) -> Result<bool, SyncError> {
        let bytes = serde_json::to_vec(entity)?;
        self.apply_raw(R::KIND, entity.id(), bytes, seq)
    }

    /// Commit pre-serialized entity bytes under the given request seq.
    pub fn apply_raw(
        &self,
        kind: ResourceKind,
        id: &str,
        bytes: Vec<u8>,
        seq: u64,
    ) -> Result<bool, SyncError> {
        let key = Self::make_key(kind, id);
        let mut inner = self.write_lock();

        let high_water = inner.applied.get(&key).copied().unwrap_or(0);
        if seq <= high_water {
            debug!(key = %key, seq, high_water, "discarding stale entity commit");
            return Ok(false);
        }

        inner.applied.insert(key.clone(), seq);
        inner.entries.insert(key, StoredEntity { bytes, seq });
        Ok(true)
    }

    /// Decode the last-known representation of an entity. Returns a fresh
    /// owned value on every call.
    pub fn get<R: Resource>(&self, id: &str) -> Result<Option<R>, SyncError> {
        let key = Self::make_key(R::KIND, id);
        let inner = self.read_lock();

        match inner.entries.get(&key) {
            Some(stored) => {
                let entity: R = serde_json::from_slice(&stored.bytes)?;
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    /// Whether an entity is present, without decoding it.
    pub fn contains(&self, kind: ResourceKind, id: &str) -> bool {
        let key = Self::make_key(kind, id);
        self.read_lock().entries.contains_key(&key)
    }

    /// Decode several entities in order, skipping ids no longer present.
    pub fn get_many<R: Resource>(&self, ids: &[String]) -> Result<Vec<R>, SyncError> {
        let inner = self.read_lock();
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let key = Self::make_key(R::KIND, id);
            if let Some(stored) = inner.entries.get(&key) {
                out.push(serde_json::from_slice(&stored.bytes)?);
            }
        }
        Ok(out)
    }

    /// Remove an entity under the given request seq. The seq mark is kept so
    /// a slower in-flight response cannot re-insert the removed entry.
    /// Returns `true` if an entry was removed.
    pub fn remove(&self, kind: ResourceKind, id: &str, seq: u64) -> bool {
        let key = Self::make_key(kind, id);
        let mut inner = self.write_lock();

        let high_water = inner.applied.get(&key).copied().unwrap_or(0);
        if seq <= high_water {
            debug!(key = %key, seq, high_water, "discarding stale entity removal");
            return false;
        }

        inner.applied.insert(key.clone(), seq);
        inner.entries.remove(&key).is_some()
    }

    /// Drop every entry. Used by context disposal.
    pub fn clear(&self) {
        let mut inner = self.write_lock();
        inner.entries.clear();
        inner.applied.clear();
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}
