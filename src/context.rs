//! SyncContext - the explicit context object wiring store, cache, and
//! transport together.
//!
//! Every component receives the context at construction instead of reaching
//! for ambient global state, so tests can run independent instances side by
//! side. Lifecycle: build with [`SyncContext::new`], tear down with
//! [`SyncContext::dispose`] - a disposed context rejects further work.
//!
//! The context owns the request-sequence allocator. A sequence number is
//! taken when a round-trip is issued, and commits are guarded by it, so of
//! two responses racing for the same key the later-issued one wins no
//! matter which arrives first.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::query::{PageParams, QueryCache, QueryKey, QueryResult, QueryTarget, Subscription};
use crate::resource::{Client, Layout, Page, Resource, ResourceKind, Sequence, Video};
use crate::store::EntityStore;
use crate::tag::Tag;
use crate::transport::{RawPage, Transport};

/// Process-wide sync state: entity store, query cache, transport handle,
/// request-sequence allocator. Clone-friendly via Arc; clones share state.
#[derive(Clone)]
pub struct SyncContext {
    cache: QueryCache,
    transport: Arc<dyn Transport>,
    seq: Arc<AtomicU64>,
    disposed: Arc<AtomicBool>,
}

impl SyncContext {
    /// Create a context over the given transport with a fresh store and
    /// cache.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_cache(transport, QueryCache::new(EntityStore::new()))
    }

    /// Create a context over a preconfigured cache (custom retention, shared
    /// store).
    pub fn with_cache(transport: Arc<dyn Transport>, cache: QueryCache) -> Self {
        Self {
            cache,
            transport,
            seq: Arc::new(AtomicU64::new(1)),
            disposed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn store(&self) -> &EntityStore {
        self.cache.store()
    }

    /// Tear down: drop every cached query, subscriber, and stored entity.
    /// Further operations fail with [`SyncError::Disposed`].
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.cache.clear();
        self.store().clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn check_live(&self) -> Result<(), SyncError> {
        if self.is_disposed() {
            Err(SyncError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Allocate the sequence number for a round-trip about to be issued.
    pub fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    // ---- reads ----

    /// Current cached state of a collection page.
    pub fn read_list<R: Resource>(
        &self,
        params: PageParams,
    ) -> Result<QueryResult<Page<R>>, SyncError> {
        self.cache.read_list::<R>(params)
    }

    /// Current cached state of a single entity.
    pub fn read_one<R: Resource>(&self, id: &str) -> Result<QueryResult<R>, SyncError> {
        self.cache.read_one::<R>(id)
    }

    /// Register a subscriber on a collection page. The second value reports
    /// whether the entry needs a fetch (missing data, or stale from a lazy
    /// invalidation) - pass it to [`SyncContext::ensure_list`].
    pub fn subscribe_list<R: Resource>(
        &self,
        params: PageParams,
        callback: Arc<dyn Fn() + Send + Sync>,
    ) -> (Subscription, bool) {
        self.cache
            .subscribe(QueryKey::list(R::KIND, params), callback)
    }

    /// Register a subscriber on a single entity.
    pub fn subscribe_one<R: Resource>(
        &self,
        id: &str,
        callback: Arc<dyn Fn() + Send + Sync>,
    ) -> (Subscription, bool) {
        self.cache.subscribe(QueryKey::one(R::KIND, id), callback)
    }

    /// Authoritative local write: commit the entity to the store and notify
    /// every query covering `{kind, id}` or `{kind, LIST}`. A read of the
    /// entity immediately afterwards returns the written value, fresh.
    pub fn write<R: Resource>(&self, entity: &R) -> Result<(), SyncError> {
        self.check_live()?;
        let seq = self.next_seq();
        self.cache.write(entity, seq)
    }

    // ---- fetches ----

    /// Fetch a collection page unless the cache already holds it fresh.
    /// Concurrent calls for the same key share one network request.
    pub async fn ensure_list<R: Resource>(&self, params: PageParams) -> Result<(), SyncError> {
        self.check_live()?;
        let snapshot = self.cache.read_list::<R>(params)?;
        if snapshot.data.is_some() && !snapshot.is_stale {
            return Ok(());
        }
        self.refetch_list::<R>(params).await
    }

    /// Fetch a single entity unless the cache already holds it fresh.
    pub async fn ensure_one<R: Resource>(&self, id: &str) -> Result<(), SyncError> {
        self.check_live()?;
        let snapshot = self.cache.read_one::<R>(id)?;
        if snapshot.data.is_some() && !snapshot.is_stale {
            return Ok(());
        }
        self.refetch_one::<R>(id).await
    }

    /// Ensure-then-read convenience for a collection page.
    pub async fn fetch_list<R: Resource>(
        &self,
        params: PageParams,
    ) -> Result<QueryResult<Page<R>>, SyncError> {
        self.ensure_list::<R>(params).await?;
        self.read_list::<R>(params)
    }

    /// Ensure-then-read convenience for a single entity.
    pub async fn fetch_one<R: Resource>(&self, id: &str) -> Result<QueryResult<R>, SyncError> {
        self.ensure_one::<R>(id).await?;
        self.read_one::<R>(id)
    }

    async fn refetch_list<R: Resource>(&self, params: PageParams) -> Result<(), SyncError> {
        let key = QueryKey::list(R::KIND, params);
        let seq = self.next_seq();
        if !self.cache.begin_fetch(&key, seq) {
            return Ok(());
        }
        debug!(kind = %R::KIND, page = params.page(), limit = params.limit(), seq, "fetching page");

        match self
            .transport
            .list(R::KIND, params.page(), params.limit())
            .await
        {
            Ok(raw) => match decode_page::<R>(raw) {
                Ok(page) => {
                    self.cache.commit_list(params, &page, seq)?;
                    Ok(())
                }
                Err(err) => {
                    self.cache.fail_fetch(&key, seq);
                    Err(err)
                }
            },
            Err(err) => {
                self.cache.fail_fetch(&key, seq);
                Err(err)
            }
        }
    }

    async fn refetch_one<R: Resource>(&self, id: &str) -> Result<(), SyncError> {
        let key = QueryKey::one(R::KIND, id);
        let seq = self.next_seq();
        if !self.cache.begin_fetch(&key, seq) {
            return Ok(());
        }
        debug!(kind = %R::KIND, id, seq, "fetching entity");

        match self.transport.get(R::KIND, id).await {
            Ok(raw) => match serde_json::from_value::<R>(raw) {
                Ok(entity) => {
                    self.cache.commit_one(&entity, seq)?;
                    Ok(())
                }
                Err(err) => {
                    self.cache.fail_fetch(&key, seq);
                    Err(err.into())
                }
            },
            Err(err) => {
                self.cache.fail_fetch(&key, seq);
                Err(err)
            }
        }
    }

    // ---- invalidation ----

    /// Mark every query intersecting `tags` stale and refetch the subscribed
    /// ones, in order. Refetch failures only log - the queries stay stale
    /// and recover on the next invalidation or subscribe.
    pub async fn invalidate(&self, tags: &[Tag]) {
        if self.is_disposed() {
            return;
        }
        let keys = self.cache.invalidate(tags);
        for key in keys {
            if let Err(err) = self.refetch_key(&key).await {
                warn!(key = ?key, %err, "refetch after invalidation failed");
            }
        }
    }

    async fn refetch_key(&self, key: &QueryKey) -> Result<(), SyncError> {
        match (key.kind, &key.target) {
            (ResourceKind::Client, QueryTarget::List(p)) => self.refetch_list::<Client>(*p).await,
            (ResourceKind::Client, QueryTarget::One(id)) => self.refetch_one::<Client>(id).await,
            (ResourceKind::Video, QueryTarget::List(p)) => self.refetch_list::<Video>(*p).await,
            (ResourceKind::Video, QueryTarget::One(id)) => self.refetch_one::<Video>(id).await,
            (ResourceKind::Sequence, QueryTarget::List(p)) => {
                self.refetch_list::<Sequence>(*p).await
            }
            (ResourceKind::Sequence, QueryTarget::One(id)) => {
                self.refetch_one::<Sequence>(id).await
            }
            (ResourceKind::Layout, QueryTarget::List(p)) => self.refetch_list::<Layout>(*p).await,
            (ResourceKind::Layout, QueryTarget::One(id)) => self.refetch_one::<Layout>(id).await,
        }
    }

    // ---- mutations ----

    /// POST a create, commit the authoritative response, then invalidate.
    /// The store is never patched before the server confirms.
    pub async fn create_entity<R: Resource>(
        &self,
        body: Value,
        tags: &[Tag],
    ) -> Result<R, SyncError> {
        self.check_live()?;
        let seq = self.next_seq();
        let raw = self.transport.create(R::KIND, body).await?;
        let entity: R = serde_json::from_value(raw)?;
        self.cache.write(&entity, seq)?;
        self.invalidate(tags).await;
        Ok(entity)
    }

    /// PATCH an update, commit the authoritative response, then invalidate.
    pub async fn update_entity<R: Resource>(
        &self,
        id: &str,
        body: Value,
        tags: &[Tag],
    ) -> Result<R, SyncError> {
        self.check_live()?;
        let seq = self.next_seq();
        let raw = self.transport.patch(R::KIND, id, body).await?;
        let entity: R = serde_json::from_value(raw)?;
        self.cache.write(&entity, seq)?;
        self.invalidate(tags).await;
        Ok(entity)
    }

    /// DELETE an entity, drop it and its query memberships, then invalidate.
    pub async fn delete_entity(
        &self,
        kind: ResourceKind,
        id: &str,
        tags: &[Tag],
    ) -> Result<(), SyncError> {
        self.check_live()?;
        let seq = self.next_seq();
        self.transport.delete(kind, id).await?;
        self.cache.drop_entity(kind, id, seq);
        self.invalidate(tags).await;
        Ok(())
    }

    /// POST a special action endpoint with its explicitly declared tag set.
    pub async fn run_action(
        &self,
        kind: ResourceKind,
        id: &str,
        action: &str,
        body: Value,
        tags: &[Tag],
    ) -> Result<Value, SyncError> {
        self.check_live()?;
        let raw = self.transport.action(kind, id, action, body).await?;
        self.invalidate(tags).await;
        Ok(raw)
    }
}

fn decode_page<R: Resource>(raw: RawPage) -> Result<Page<R>, SyncError> {
    let mut data = Vec::with_capacity(raw.data.len());
    for value in raw.data {
        data.push(serde_json::from_value(value)?);
    }
    Ok(Page {
        data,
        meta: raw.meta,
    })
}
