//! Resource types - the entity kinds managed by the console.
//!
//! Each kind implements [`Resource`], which ties the serde representation to
//! its store collection and identifier. Entities are immutable by
//! replacement: a successful mutation or refetch commits a whole new value,
//! never an in-place patch.

mod client;
mod layout;
mod sequence;
mod video;

use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub use client::{Client, ClientUser};
pub use layout::{Layout, LayoutKind};
pub use sequence::{Sequence, SequenceClient};
pub use video::{
    detect_video_source, extract_youtube_video_id, format_duration, is_valid_video_url,
    youtube_thumbnail, Video, VideoSource,
};

/// The resource kinds the console manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Client,
    Video,
    Sequence,
    Layout,
}

impl ResourceKind {
    /// The collection path segment used in `/admin/{kind}` endpoints and as
    /// the store key prefix.
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Client => "clients",
            ResourceKind::Video => "videos",
            ResourceKind::Sequence => "sequences",
            ResourceKind::Layout => "layouts",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Trait for entity types held in the store and served by the query cache.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The resource kind this type represents.
    const KIND: ResourceKind;

    /// The unique identifier of this entity instance.
    fn id(&self) -> &str;
}

/// Pagination metadata returned alongside every collection response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

/// A page of entities as returned by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}
