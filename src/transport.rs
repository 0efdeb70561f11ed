//! Transport boundary - the REST collaborator the core calls through.
//!
//! The implementation owns bearer-token attachment, refresh triggering, and
//! retries; none of that happens here. The core sees typed verbs against
//! `/admin/{kind}` and plain [`SyncError`] results - a 401 surfaces as
//! [`SyncError::Authentication`] and is never retried by the cache layer.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SyncError;
use crate::resource::{PageMeta, ResourceKind};

/// A page of raw entity payloads plus pagination metadata, exactly the
/// `{data, meta}` envelope the server returns.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub data: Vec<Value>,
    pub meta: PageMeta,
}

/// REST transport the core consumes. Object-safe so contexts can hold
/// `Arc<dyn Transport>`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET /admin/{kind}?page&limit`
    async fn list(&self, kind: ResourceKind, page: u32, limit: u32) -> Result<RawPage, SyncError>;

    /// `GET /admin/{kind}/{id}`
    async fn get(&self, kind: ResourceKind, id: &str) -> Result<Value, SyncError>;

    /// `POST /admin/{kind}`
    async fn create(&self, kind: ResourceKind, body: Value) -> Result<Value, SyncError>;

    /// `PATCH /admin/{kind}/{id}`
    async fn patch(&self, kind: ResourceKind, id: &str, body: Value) -> Result<Value, SyncError>;

    /// `DELETE /admin/{kind}/{id}` (expects 204)
    async fn delete(&self, kind: ResourceKind, id: &str) -> Result<(), SyncError>;

    /// `POST /admin/{kind}/{id}/{action}` - special action endpoints.
    async fn action(
        &self,
        kind: ResourceKind,
        id: &str,
        action: &str,
        body: Value,
    ) -> Result<Value, SyncError>;
}

/// Request path for a collection, as the transport builds it.
pub fn list_path(kind: ResourceKind, page: u32, limit: u32) -> String {
    format!("/admin/{}?page={}&limit={}", kind.path(), page, limit)
}

/// Request path for a single entity.
pub fn entity_path(kind: ResourceKind, id: &str) -> String {
    format!("/admin/{}/{}", kind.path(), id)
}

/// Request path for a special action endpoint.
pub fn action_path(kind: ResourceKind, id: &str, action: &str) -> String {
    format!("/admin/{}/{}/{}", kind.path(), id, action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths() {
        assert_eq!(
            list_path(ResourceKind::Client, 2, 25),
            "/admin/clients?page=2&limit=25"
        );
        assert_eq!(entity_path(ResourceKind::Video, "v1"), "/admin/videos/v1");
        assert_eq!(
            action_path(ResourceKind::Sequence, "s1", "assign"),
            "/admin/sequences/s1/assign"
        );
        assert_eq!(
            action_path(ResourceKind::Client, "c1", "refresh"),
            "/admin/clients/c1/refresh"
        );
    }
}
