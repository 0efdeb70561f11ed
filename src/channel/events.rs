//! Wire events delivered over the reconciliation channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resource::ResourceKind;
use crate::tag::Tag;

/// Event name for a device coming online.
pub const CLIENT_ONLINE: &str = "client-online";
/// Event name for a device going offline.
pub const CLIENT_OFFLINE: &str = "client-offline";

/// A named event as received from the channel transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEvent {
    pub name: String,
    pub payload: Value,
}

impl ChannelEvent {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientStatusPayload {
    #[serde(alias = "id")]
    client_id: String,
}

/// A recognized realtime event, mapped to the tag set it affects.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    ClientOnline { client_id: String },
    ClientOffline { client_id: String },
}

impl RealtimeEvent {
    /// Parse a wire event. Unknown names and malformed payloads yield
    /// `None` - future event kinds must not break existing consoles.
    pub fn parse(event: &ChannelEvent) -> Option<Self> {
        let payload: ClientStatusPayload =
            serde_json::from_value(event.payload.clone()).ok()?;
        match event.name.as_str() {
            CLIENT_ONLINE => Some(RealtimeEvent::ClientOnline {
                client_id: payload.client_id,
            }),
            CLIENT_OFFLINE => Some(RealtimeEvent::ClientOffline {
                client_id: payload.client_id,
            }),
            _ => None,
        }
    }

    /// The tag set this event invalidates: the client collection, plus the
    /// specific client the event identifies. An identifier no cached query
    /// covers makes the invalidation a no-op, not an error.
    pub fn tags(&self) -> Vec<Tag> {
        match self {
            RealtimeEvent::ClientOnline { client_id }
            | RealtimeEvent::ClientOffline { client_id } => vec![
                Tag::id(ResourceKind::Client, client_id.clone()),
                Tag::list(ResourceKind::Client),
            ],
        }
    }
}
