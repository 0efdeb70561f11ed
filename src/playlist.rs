//! Playlist - the ordered, de-duplicated editing model behind a sequence.
//!
//! A sequence travels over the wire as a JSON array of video identifiers
//! (`video_ids`). The editor works on the rich ordered collection and
//! flattens back to the wire form only at save time. Round-trip invariant:
//! deserialize → edit → serialize reproduces exactly the identifiers
//! present, in the new order, with no duplicates introduced.

use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::resource::Video;

/// Ordered, de-duplicated list of videos composing a sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Playlist {
    entries: Vec<Video>,
}

impl Playlist {
    /// Create an empty playlist.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The videos in playback order.
    pub fn videos(&self) -> &[Video] {
        &self.entries
    }

    /// The identifiers in playback order.
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|v| v.id.as_str()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|v| v.id == id)
    }

    /// Append a video. No-op when its identifier is already present.
    /// Returns whether the playlist changed.
    pub fn add(&mut self, video: Video) -> bool {
        if self.contains(&video.id) {
            return false;
        }
        self.entries.push(video);
        true
    }

    /// Remove every entry with the given identifier. Returns whether the
    /// playlist changed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|v| v.id != id);
        self.entries.len() != before
    }

    /// Move the entry at `from` to `to`, shifting the entries between them.
    /// No-op when `from == to` or either index is out of bounds. Returns
    /// whether the playlist changed.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from == to || from >= self.entries.len() || to >= self.entries.len() {
            return false;
        }
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        true
    }

    /// Flatten to the canonical wire form: a JSON array of identifiers only.
    pub fn serialize(&self) -> Result<String, SyncError> {
        let ids: Vec<&str> = self.ids();
        Ok(serde_json::to_string(&ids)?)
    }

    /// Rebuild a playlist from the wire form, resolving each identifier
    /// through `lookup`. Identifiers that no longer resolve (a video deleted
    /// elsewhere) are silently dropped; relative order of the remainder is
    /// preserved; duplicate identifiers in malformed input are collapsed to
    /// their first occurrence.
    pub fn deserialize<F>(wire: &str, lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<Video>,
    {
        let ids: Vec<String> = serde_json::from_str(wire)?;
        let mut playlist = Playlist::new();
        for id in &ids {
            if let Some(video) = lookup(id) {
                playlist.add(video);
            }
        }
        Ok(playlist)
    }
}

/// Editor state for a sequence, converted into a save request only after the
/// local validation policy passes.
#[derive(Debug, Clone, Default)]
pub struct SequenceDraft {
    pub name: String,
    pub description: Option<String>,
    pub playlist: Playlist,
    pub is_active: bool,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub active_hours: Option<String>,
}

/// The validated wire payload of a sequence save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencePayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub video_ids: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_hours: Option<String>,
}

impl SequenceDraft {
    /// Enforce the save policy and flatten to the wire payload. Rejected
    /// drafts never reach the transport.
    pub fn into_payload(self) -> Result<SequencePayload, SyncError> {
        if self.name.trim().is_empty() {
            return Err(SyncError::Validation("sequence name is required".into()));
        }
        if self.playlist.is_empty() {
            return Err(SyncError::Validation(
                "sequence needs at least one video".into(),
            ));
        }

        let video_ids = self.playlist.serialize()?;
        Ok(SequencePayload {
            name: self.name,
            description: self.description.filter(|d| !d.is_empty()),
            video_ids,
            is_active: self.is_active,
            start_date: self.start_date.filter(|d| !d.is_empty()),
            end_date: self.end_date.filter(|d| !d.is_empty()),
            active_hours: self.active_hours.filter(|h| !h.is_empty()),
        })
    }
}
