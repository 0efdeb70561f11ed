//! QueryCache - memoized, subscribable reads with tag invalidation.
//!
//! Each cached query holds entity references (never entity values - those
//! live in the [`EntityStore`]), its staleness flag, the tag set covering
//! it, and its subscriber registry. Mutations and real-time events report
//! affected tags through [`QueryCache::invalidate`], which marks
//! intersecting queries stale and nominates the subscribed ones for
//! refetch; unobserved queries revalidate lazily on their next subscribe.
//!
//! Fetch bookkeeping lives here too: one in-flight request per key, and a
//! per-key applied-sequence guard so a response that lost the issue-order
//! race is discarded instead of overwriting newer data.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::SyncError;
use crate::resource::{Page, PageMeta, Resource, ResourceKind};
use crate::store::EntityStore;
use crate::tag::{intersects, list_tags, Tag};

use super::key::{PageParams, QueryKey, QueryTarget};

/// How long an unsubscribed query entry is retained before the sweep drops
/// it. Matches the framework default the console originally shipped with.
const DEFAULT_RETENTION: Duration = Duration::from_secs(60);

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Snapshot of a cached read handed to consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub is_stale: bool,
}

impl<T> QueryResult<T> {
    fn empty_loading() -> Self {
        Self {
            data: None,
            is_loading: true,
            is_stale: false,
        }
    }
}

enum QueryData {
    List { ids: Vec<String>, meta: PageMeta },
    One(String),
}

struct QueryEntry {
    data: Option<QueryData>,
    stale: bool,
    tags: Vec<Tag>,
    subscribers: HashMap<u64, Callback>,
    /// Request seq of the fetch currently in flight, if any.
    inflight: Option<u64>,
    /// Highest request seq committed to this entry.
    applied_seq: u64,
    /// Set while the entry has zero subscribers; drives retention GC.
    released_at: Option<Instant>,
}

impl QueryEntry {
    fn new(key: &QueryKey) -> Self {
        let tags = match &key.target {
            QueryTarget::List(_) => vec![Tag::list(key.kind)],
            QueryTarget::One(id) => vec![Tag::id(key.kind, id.clone())],
        };
        Self {
            data: None,
            stale: false,
            tags,
            subscribers: HashMap::new(),
            inflight: None,
            applied_seq: 0,
            released_at: Some(Instant::now()),
        }
    }
}

struct CacheInner {
    entries: HashMap<QueryKey, QueryEntry>,
    next_subscriber: u64,
}

/// The process-wide query cache. Clone-friendly via Arc; clones share state.
#[derive(Clone)]
pub struct QueryCache {
    store: EntityStore,
    inner: Arc<RwLock<CacheInner>>,
    retention: Duration,
}

impl QueryCache {
    /// Create a cache over the given entity store.
    pub fn new(store: EntityStore) -> Self {
        Self {
            store,
            inner: Arc::new(RwLock::new(CacheInner {
                entries: HashMap::new(),
                next_subscriber: 1,
            })),
            retention: DEFAULT_RETENTION,
        }
    }

    /// Override the retention grace period for unsubscribed entries.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// The entity store backing this cache.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    // ---- reads ----

    /// Current state of a list query. Entity references resolve against the
    /// store at read time, so a page reflects every later entity commit.
    pub fn read_list<R: Resource>(
        &self,
        params: PageParams,
    ) -> Result<QueryResult<Page<R>>, SyncError> {
        let key = QueryKey::list(R::KIND, params);
        let (refs, stale, loading) = {
            let inner = self.read_lock();
            match inner.entries.get(&key) {
                None => return Ok(QueryResult::empty_loading()),
                Some(entry) => match &entry.data {
                    Some(QueryData::List { ids, meta }) => {
                        (Some((ids.clone(), *meta)), entry.stale, false)
                    }
                    _ => (None, entry.stale, entry.inflight.is_some() || entry.data.is_none()),
                },
            }
        };

        let data = match refs {
            Some((ids, meta)) => Some(Page {
                data: self.store.get_many::<R>(&ids)?,
                meta,
            }),
            None => None,
        };
        Ok(QueryResult {
            data,
            is_loading: loading,
            is_stale: stale,
        })
    }

    /// Current state of a single-entity query. The store is the source of
    /// truth for the value; the entry only contributes freshness flags.
    pub fn read_one<R: Resource>(&self, id: &str) -> Result<QueryResult<R>, SyncError> {
        let key = QueryKey::one(R::KIND, id);
        let (stale, inflight) = {
            let inner = self.read_lock();
            match inner.entries.get(&key) {
                Some(entry) => (entry.stale, entry.inflight.is_some()),
                None => (false, false),
            }
        };

        let data = self.store.get::<R>(id)?;
        let is_loading = data.is_none() && inflight;
        Ok(QueryResult {
            data,
            is_loading,
            is_stale: stale,
        })
    }

    // ---- subscriptions ----

    /// Register a change callback for a query. The entry is created lazily;
    /// the returned value reports whether the caller should fetch (no data
    /// yet, or stale from an invalidation that found no subscriber).
    pub fn subscribe(&self, key: QueryKey, callback: Callback) -> (Subscription, bool) {
        let mut inner = self.write_lock();
        let id = inner.next_subscriber;
        inner.next_subscriber += 1;

        let entry = inner
            .entries
            .entry(key.clone())
            .or_insert_with(|| QueryEntry::new(&key));
        entry.subscribers.insert(id, callback);
        entry.released_at = None;
        let needs_fetch = (entry.data.is_none() || entry.stale) && entry.inflight.is_none();
        drop(inner);

        self.sweep();
        (
            Subscription {
                cache: self.clone(),
                key,
                id,
                active: true,
            },
            needs_fetch,
        )
    }

    fn unsubscribe(&self, key: &QueryKey, id: u64) {
        {
            let mut inner = self.write_lock();
            if let Some(entry) = inner.entries.get_mut(key) {
                entry.subscribers.remove(&id);
                if entry.subscribers.is_empty() {
                    entry.released_at = Some(Instant::now());
                }
            }
        }
        self.sweep();
    }

    /// Number of live subscribers on a query.
    pub fn subscriber_count(&self, key: &QueryKey) -> usize {
        self.read_lock()
            .entries
            .get(key)
            .map(|e| e.subscribers.len())
            .unwrap_or(0)
    }

    /// Drop unsubscribed entries whose retention grace has elapsed.
    pub fn sweep(&self) {
        let retention = self.retention;
        let mut inner = self.write_lock();
        inner.entries.retain(|key, entry| {
            let expired = entry
                .released_at
                .map(|at| at.elapsed() >= retention)
                .unwrap_or(false);
            if expired {
                trace!(key = ?key, "evicting unsubscribed query entry");
            }
            !expired
        });
    }

    // ---- fetch bookkeeping ----

    /// Claim the in-flight slot for a key under a fresh request seq. Returns
    /// `false` when a fetch is already pending - the caller must not issue a
    /// second request for the same key.
    pub fn begin_fetch(&self, key: &QueryKey, seq: u64) -> bool {
        let mut inner = self.write_lock();
        let entry = inner
            .entries
            .entry(key.clone())
            .or_insert_with(|| QueryEntry::new(key));
        if entry.inflight.is_some() {
            trace!(key = ?key, "fetch already in flight, deduplicating");
            return false;
        }
        entry.inflight = Some(seq);
        true
    }

    /// Release the in-flight slot after a failed fetch. Prior data is left
    /// intact; the error belongs to the caller.
    pub fn fail_fetch(&self, key: &QueryKey, seq: u64) {
        let mut inner = self.write_lock();
        if let Some(entry) = inner.entries.get_mut(key) {
            if entry.inflight == Some(seq) {
                entry.inflight = None;
            }
        }
    }

    /// Commit a fetched page. Each member entity lands in the store under
    /// its own seq guard; the entry records references, page meta, and the
    /// covering tag set. Returns `false` when the response lost the
    /// issue-order race and was discarded.
    pub fn commit_list<R: Resource>(
        &self,
        params: PageParams,
        page: &Page<R>,
        seq: u64,
    ) -> Result<bool, SyncError> {
        let key = QueryKey::list(R::KIND, params);
        let ids: Vec<String> = page.data.iter().map(|e| e.id().to_string()).collect();

        {
            let mut inner = self.write_lock();
            let entry = inner
                .entries
                .entry(key.clone())
                .or_insert_with(|| QueryEntry::new(&key));
            if entry.inflight == Some(seq) {
                entry.inflight = None;
            }
            if seq <= entry.applied_seq {
                debug!(key = ?key, seq, applied = entry.applied_seq, "discarding stale list response");
                return Ok(false);
            }
            entry.applied_seq = seq;
            entry.stale = false;
            entry.tags = list_tags(R::KIND, ids.iter().cloned());
            entry.data = Some(QueryData::List {
                ids,
                meta: page.meta,
            });
        }

        for entity in &page.data {
            self.store.apply(entity, seq)?;
        }

        self.notify(&list_tags(R::KIND, page.data.iter().map(|e| e.id().to_string())));
        Ok(true)
    }

    /// Commit a fetched single entity. Returns `false` on a stale discard.
    pub fn commit_one<R: Resource>(&self, entity: &R, seq: u64) -> Result<bool, SyncError> {
        let key = QueryKey::one(R::KIND, entity.id());
        {
            let mut inner = self.write_lock();
            let entry = inner
                .entries
                .entry(key.clone())
                .or_insert_with(|| QueryEntry::new(&key));
            if entry.inflight == Some(seq) {
                entry.inflight = None;
            }
            if seq <= entry.applied_seq {
                debug!(key = ?key, seq, applied = entry.applied_seq, "discarding stale entity response");
                return Ok(false);
            }
            entry.applied_seq = seq;
            entry.stale = false;
            entry.data = Some(QueryData::One(entity.id().to_string()));
        }

        let applied = self.store.apply(entity, seq)?;
        if applied {
            self.notify(&[Tag::id(R::KIND, entity.id()), Tag::list(R::KIND)]);
        }
        Ok(applied)
    }

    // ---- writes and invalidation ----

    /// Authoritative local write: commit the entity and notify every query
    /// covering it. The single-entity query for it, if cached, is fresh
    /// afterwards.
    pub fn write<R: Resource>(&self, entity: &R, seq: u64) -> Result<(), SyncError> {
        self.store.apply(entity, seq)?;
        {
            let mut inner = self.write_lock();
            if let Some(entry) = inner.entries.get_mut(&QueryKey::one(R::KIND, entity.id())) {
                entry.stale = false;
                entry.applied_seq = entry.applied_seq.max(seq);
            }
        }
        self.notify(&[Tag::id(R::KIND, entity.id()), Tag::list(R::KIND)]);
        Ok(())
    }

    /// Remove a deleted entity: store entry dropped, its id dropped from
    /// every cached list result, its single-entity entries emptied. No
    /// dangling references survive until the refetch lands.
    pub fn drop_entity(&self, kind: ResourceKind, id: &str, seq: u64) {
        self.store.remove(kind, id, seq);

        let affected = [Tag::id(kind, id), Tag::list(kind)];
        {
            let mut inner = self.write_lock();
            for (key, entry) in inner.entries.iter_mut() {
                if key.kind != kind {
                    continue;
                }
                match (&key.target, &mut entry.data) {
                    (QueryTarget::List(_), Some(QueryData::List { ids, .. })) => {
                        ids.retain(|member| member != id);
                        entry.tags.retain(|tag| tag.entity_id() != Some(id));
                    }
                    (QueryTarget::One(_), data) => {
                        if matches!(data, Some(QueryData::One(one_id)) if one_id.as_str() == id) {
                            *data = None;
                        }
                    }
                    _ => {}
                }
            }
        }
        self.notify(&affected);
    }

    /// Mark every query whose tag set intersects `tags` stale and notify its
    /// subscribers. Returns the subscribed keys, in deterministic order, for
    /// the caller to refetch; unobserved queries stay stale until their next
    /// subscribe.
    pub fn invalidate(&self, tags: &[Tag]) -> Vec<QueryKey> {
        let mut to_refetch = Vec::new();
        let mut callbacks: Vec<Callback> = Vec::new();

        {
            let mut inner = self.write_lock();
            for (key, entry) in inner.entries.iter_mut() {
                if !intersects(&entry.tags, tags) {
                    continue;
                }
                entry.stale = true;
                callbacks.extend(entry.subscribers.values().cloned());
                if !entry.subscribers.is_empty() {
                    to_refetch.push(key.clone());
                }
            }
        }

        to_refetch.sort();
        debug!(
            affected = to_refetch.len(),
            tags = ?tags.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
            "invalidated cached queries"
        );
        for callback in callbacks {
            callback();
        }
        to_refetch
    }

    /// Whether a cached entry for this key is currently marked stale.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.read_lock()
            .entries
            .get(key)
            .map(|e| e.stale)
            .unwrap_or(false)
    }

    /// Number of cached query entries.
    pub fn len(&self) -> usize {
        self.read_lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and subscriber. Used by context disposal.
    pub fn clear(&self) {
        self.write_lock().entries.clear();
    }

    fn notify(&self, affected: &[Tag]) {
        let callbacks: Vec<Callback> = {
            let inner = self.read_lock();
            inner
                .entries
                .values()
                .filter(|entry| intersects(&entry.tags, affected))
                .flat_map(|entry| entry.subscribers.values().cloned())
                .collect()
        };
        for callback in callbacks {
            callback();
        }
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, CacheInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, CacheInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Live registration of a query subscriber. Unsubscribing (or dropping the
/// handle) stops callback delivery but does not cancel an in-flight fetch -
/// the result is still cached for the next subscriber.
pub struct Subscription {
    cache: QueryCache,
    key: QueryKey,
    id: u64,
    active: bool,
}

impl Subscription {
    /// The key this subscription observes.
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Deregister the callback.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.active {
            self.active = false;
            self.cache.unsubscribe(&self.key, self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
