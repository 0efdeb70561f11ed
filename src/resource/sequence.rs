//! Sequence - an ordered playlist of videos assignable to clients.

use serde::{Deserialize, Serialize};

use super::{Resource, ResourceKind, Video};

/// A playlist. `video_ids` is the canonical wire form of playback order: a
/// JSON array of video identifiers, each present at most once. The rich
/// in-editor representation lives in [`crate::playlist::Playlist`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub video_ids: String,
    pub is_active: bool,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub active_hours: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Clients the sequence is assigned to, populated by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<SequenceClient>>,
    /// Full video payloads in playlist order, populated by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<Video>>,
}

/// Backend-populated summary of an assigned client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceClient {
    pub id: String,
    pub name: String,
}

impl Resource for Sequence {
    const KIND: ResourceKind = ResourceKind::Sequence;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_server_payload() {
        let json = r#"{
            "id": "s1",
            "name": "Morning loop",
            "description": "Plays before noon",
            "videoIds": "[\"v1\",\"v2\"]",
            "isActive": true,
            "startDate": null,
            "endDate": null,
            "activeHours": "08:00-12:00",
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-02T00:00:00Z",
            "clients": [{"id": "c1", "name": "Lobby"}]
        }"#;

        let seq: Sequence = serde_json::from_str(json).unwrap();
        assert_eq!(seq.id(), "s1");
        assert_eq!(seq.video_ids, r#"["v1","v2"]"#);
        assert_eq!(seq.active_hours.as_deref(), Some("08:00-12:00"));
        assert_eq!(seq.clients.as_ref().unwrap()[0].name, "Lobby");
        assert!(seq.videos.is_none());
    }
}
