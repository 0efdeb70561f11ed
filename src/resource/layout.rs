//! Layout - a visual template describing how a client renders its content.

use serde::{Deserialize, Serialize};

use super::{Resource, ResourceKind};

/// How a client's screen is divided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutKind {
    Fullscreen,
    SplitHorizontal,
    SplitVertical,
    Pip,
}

/// A visual template. `config` is a serialized blob whose shape depends on
/// `kind` and is interpreted by the rendering device, not by the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LayoutKind,
    pub config: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Resource for Layout {
    const KIND: ResourceKind = ResourceKind::Layout;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_uses_type_field() {
        let json = r#"{
            "id": "l1",
            "name": "Side by side",
            "type": "SPLIT_VERTICAL",
            "config": "{\"ratio\":0.5}",
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-01T00:00:00Z"
        }"#;

        let layout: Layout = serde_json::from_str(json).unwrap();
        assert_eq!(layout.kind, LayoutKind::SplitVertical);

        let back = serde_json::to_string(&layout).unwrap();
        assert!(back.contains("\"type\":\"SPLIT_VERTICAL\""));
    }
}
