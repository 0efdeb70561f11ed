mod channel;
mod context;
mod endpoints;
mod error;
mod playlist;
mod query;
mod resource;
mod store;
mod tag;
mod transport;

pub use channel::{
    ChannelConnection, ChannelEvent, ChannelStatus, ChannelTransport, RealtimeEvent,
    ReconciliationChannel, CLIENT_OFFLINE, CLIENT_ONLINE,
};
pub use context::SyncContext;
pub use endpoints::{
    assign_sequence, create_client, create_layout, create_sequence, create_video, delete_client,
    delete_layout, delete_sequence, delete_video, force_refresh_client, get_client, get_layout,
    get_sequence, get_video, list_clients, list_layouts, list_sequences, list_videos,
    update_client, update_layout, update_sequence, update_video, AssignSequence, CreateClient,
    CreateLayout, CreateVideo, UpdateClient, UpdateLayout, UpdateVideo,
};
pub use error::SyncError;
pub use playlist::{Playlist, SequenceDraft, SequencePayload};
pub use query::{PageParams, QueryCache, QueryKey, QueryResult, QueryTarget, Subscription};
pub use resource::{
    detect_video_source, extract_youtube_video_id, format_duration, is_valid_video_url,
    youtube_thumbnail, Client, ClientUser, Layout, LayoutKind, Page, PageMeta, Resource,
    ResourceKind, Sequence, SequenceClient, Video, VideoSource,
};
pub use store::EntityStore;
pub use tag::{intersects, list_tags, Tag};
pub use transport::{action_path, entity_path, list_path, RawPage, Transport};

// Re-export the EventEmitter backing the channel's listener registry.
pub use event_emitter_rs::EventEmitter;
