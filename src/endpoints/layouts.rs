//! Layout endpoints.

use serde::Serialize;

use crate::context::SyncContext;
use crate::error::SyncError;
use crate::query::{PageParams, QueryResult};
use crate::resource::{Layout, LayoutKind, Page, ResourceKind};
use crate::tag::Tag;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLayout {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<LayoutKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

impl CreateLayout {
    fn validate(&self) -> Result<(), SyncError> {
        if self.name.trim().is_empty() {
            return Err(SyncError::Validation("name is required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLayout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<LayoutKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

impl UpdateLayout {
    fn validate(&self) -> Result<(), SyncError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(SyncError::Validation("name is required".into()));
            }
        }
        Ok(())
    }
}

/// Fetch a page of layouts.
pub async fn list_layouts(
    ctx: &SyncContext,
    page: Option<u32>,
    limit: Option<u32>,
) -> Result<QueryResult<Page<Layout>>, SyncError> {
    ctx.fetch_list::<Layout>(PageParams::new(page, limit)).await
}

/// Fetch a single layout.
pub async fn get_layout(ctx: &SyncContext, id: &str) -> Result<QueryResult<Layout>, SyncError> {
    ctx.fetch_one::<Layout>(id).await
}

pub async fn create_layout(ctx: &SyncContext, req: CreateLayout) -> Result<Layout, SyncError> {
    req.validate()?;
    ctx.create_entity(
        serde_json::to_value(&req)?,
        &[Tag::list(ResourceKind::Layout)],
    )
    .await
}

pub async fn update_layout(
    ctx: &SyncContext,
    id: &str,
    req: UpdateLayout,
) -> Result<Layout, SyncError> {
    req.validate()?;
    ctx.update_entity(
        id,
        serde_json::to_value(&req)?,
        &[
            Tag::id(ResourceKind::Layout, id),
            Tag::list(ResourceKind::Layout),
        ],
    )
    .await
}

pub async fn delete_layout(ctx: &SyncContext, id: &str) -> Result<(), SyncError> {
    ctx.delete_entity(ResourceKind::Layout, id, &[Tag::list(ResourceKind::Layout)])
        .await
}
