//! Video endpoints.

use serde::Serialize;

use crate::context::SyncContext;
use crate::error::SyncError;
use crate::query::{PageParams, QueryResult};
use crate::resource::{detect_video_source, is_valid_video_url, Page, ResourceKind, Video,
    VideoSource};
use crate::tag::Tag;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideo {
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Detected from the URL when not supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<VideoSource>,
}

impl CreateVideo {
    fn validate(&self) -> Result<(), SyncError> {
        if !is_valid_video_url(&self.url) {
            return Err(SyncError::Validation("invalid video url".into()));
        }
        if self.title.trim().is_empty() {
            return Err(SyncError::Validation("title is required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<VideoSource>,
}

impl UpdateVideo {
    fn validate(&self) -> Result<(), SyncError> {
        if let Some(url) = &self.url {
            if !is_valid_video_url(url) {
                return Err(SyncError::Validation("invalid video url".into()));
            }
        }
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(SyncError::Validation("title is required".into()));
            }
        }
        Ok(())
    }
}

/// Fetch a page of videos.
pub async fn list_videos(
    ctx: &SyncContext,
    page: Option<u32>,
    limit: Option<u32>,
) -> Result<QueryResult<Page<Video>>, SyncError> {
    ctx.fetch_list::<Video>(PageParams::new(page, limit)).await
}

/// Fetch a single video.
pub async fn get_video(ctx: &SyncContext, id: &str) -> Result<QueryResult<Video>, SyncError> {
    ctx.fetch_one::<Video>(id).await
}

pub async fn create_video(ctx: &SyncContext, mut req: CreateVideo) -> Result<Video, SyncError> {
    req.validate()?;
    if req.source.is_none() {
        req.source = Some(detect_video_source(&req.url));
    }
    ctx.create_entity(
        serde_json::to_value(&req)?,
        &[Tag::list(ResourceKind::Video)],
    )
    .await
}

pub async fn update_video(
    ctx: &SyncContext,
    id: &str,
    req: UpdateVideo,
) -> Result<Video, SyncError> {
    req.validate()?;
    ctx.update_entity(
        id,
        serde_json::to_value(&req)?,
        &[
            Tag::id(ResourceKind::Video, id),
            Tag::list(ResourceKind::Video),
        ],
    )
    .await
}

pub async fn delete_video(ctx: &SyncContext, id: &str) -> Result<(), SyncError> {
    ctx.delete_entity(ResourceKind::Video, id, &[Tag::list(ResourceKind::Video)])
        .await
}
