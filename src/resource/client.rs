//! Client - an unattended display device registered with the console.

use serde::{Deserialize, Serialize};

use super::{Resource, ResourceKind};

/// A display device. `is_online` and `last_seen` are owned by the real-time
/// channel and by refetches; no edit DTO carries them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub is_online: bool,
    #[serde(default)]
    pub last_seen: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub layout_id: Option<String>,
    #[serde(default)]
    pub sequence_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Login summary of the device account, populated by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ClientUser>,
}

/// Backend-populated summary of the device's login account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientUser {
    #[serde(default)]
    pub login_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Resource for Client {
    const KIND: ResourceKind = ResourceKind::Client;

    fn id(&self) -> &str {
        &self.id
    }
}
