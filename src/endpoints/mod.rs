//! Per-resource API surface - typed requests, client-side validation, and
//! the tag sets each mutation declares.
//!
//! One submodule per resource kind. Queries share the generic cache paths
//! on [`crate::context::SyncContext`]; what lives here is the typed
//! request shapes, the validation policy enforced before anything touches
//! the network, and the declared invalidation tags:
//!
//! - create       → `{kind, LIST}`
//! - update       → `{kind, id}` + `{kind, LIST}`
//! - delete       → `{kind, LIST}` (the entity and its list memberships are
//!                  also dropped eagerly)
//! - client force refresh → `{Client, LIST}`
//! - sequence assign      → `{Sequence, id}` + `{Client, LIST}`

mod clients;
mod layouts;
mod sequences;
mod videos;

pub use clients::{
    create_client, delete_client, force_refresh_client, get_client, list_clients, update_client,
    CreateClient, UpdateClient,
};
pub use layouts::{
    create_layout, delete_layout, get_layout, list_layouts, update_layout, CreateLayout,
    UpdateLayout,
};
pub use sequences::{
    assign_sequence, create_sequence, delete_sequence, get_sequence, list_sequences,
    update_sequence, AssignSequence,
};
pub use videos::{
    create_video, delete_video, get_video, list_videos, update_video, CreateVideo, UpdateVideo,
};
