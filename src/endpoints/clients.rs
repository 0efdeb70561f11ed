//! Client endpoints - device CRUD plus the force-refresh action.

use serde::Serialize;
use serde_json::json;

use crate::context::SyncContext;
use crate::error::SyncError;
use crate::query::{PageParams, QueryResult};
use crate::resource::{Client, Page, ResourceKind};
use crate::tag::Tag;

/// Payload for registering a new device. The device account credentials
/// (`login_id`/`password`) are created alongside it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClient {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub login_id: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<String>,
}

impl CreateClient {
    fn validate(&self) -> Result<(), SyncError> {
        if self.name.trim().is_empty() {
            return Err(SyncError::Validation("name is required".into()));
        }
        if self.login_id.trim().is_empty() {
            return Err(SyncError::Validation("login id is required".into()));
        }
        if self.password.len() < 6 {
            return Err(SyncError::Validation(
                "password must be at least 6 characters".into(),
            ));
        }
        Ok(())
    }
}

/// Partial update; only supplied fields are sent. `is_online` is absent on
/// purpose - it belongs to the realtime channel and refetches.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<String>,
}

impl UpdateClient {
    fn validate(&self) -> Result<(), SyncError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(SyncError::Validation("name is required".into()));
            }
        }
        if let Some(password) = &self.password {
            if password.len() < 6 {
                return Err(SyncError::Validation(
                    "password must be at least 6 characters".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Fetch a page of clients.
pub async fn list_clients(
    ctx: &SyncContext,
    page: Option<u32>,
    limit: Option<u32>,
) -> Result<QueryResult<Page<Client>>, SyncError> {
    ctx.fetch_list::<Client>(PageParams::new(page, limit)).await
}

/// Fetch a single client.
pub async fn get_client(ctx: &SyncContext, id: &str) -> Result<QueryResult<Client>, SyncError> {
    ctx.fetch_one::<Client>(id).await
}

pub async fn create_client(ctx: &SyncContext, req: CreateClient) -> Result<Client, SyncError> {
    req.validate()?;
    ctx.create_entity(
        serde_json::to_value(&req)?,
        &[Tag::list(ResourceKind::Client)],
    )
    .await
}

pub async fn update_client(
    ctx: &SyncContext,
    id: &str,
    req: UpdateClient,
) -> Result<Client, SyncError> {
    req.validate()?;
    ctx.update_entity(
        id,
        serde_json::to_value(&req)?,
        &[
            Tag::id(ResourceKind::Client, id),
            Tag::list(ResourceKind::Client),
        ],
    )
    .await
}

pub async fn delete_client(ctx: &SyncContext, id: &str) -> Result<(), SyncError> {
    ctx.delete_entity(
        ResourceKind::Client,
        id,
        &[Tag::list(ResourceKind::Client)],
    )
    .await
}

/// Command the device to reload its content immediately. The device's
/// status may move as a result, so the client collection is invalidated.
pub async fn force_refresh_client(ctx: &SyncContext, id: &str) -> Result<(), SyncError> {
    ctx.run_action(
        ResourceKind::Client,
        id,
        "refresh",
        json!({}),
        &[Tag::list(ResourceKind::Client)],
    )
    .await?;
    Ok(())
}
