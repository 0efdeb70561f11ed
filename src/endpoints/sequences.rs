//! Sequence endpoints - playlist CRUD plus client assignment.
//!
//! Saves go through [`SequenceDraft`], which enforces the local policy
//! (non-empty name, at least one video) before the wire payload exists, so
//! a rejected draft never produces a network call.

use serde::Serialize;

use crate::context::SyncContext;
use crate::error::SyncError;
use crate::playlist::SequenceDraft;
use crate::query::{PageParams, QueryResult};
use crate::resource::{Page, ResourceKind, Sequence};
use crate::tag::Tag;

/// Payload for assigning a sequence to a set of clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignSequence {
    pub client_ids: Vec<String>,
}

/// Fetch a page of sequences.
pub async fn list_sequences(
    ctx: &SyncContext,
    page: Option<u32>,
    limit: Option<u32>,
) -> Result<QueryResult<Page<Sequence>>, SyncError> {
    ctx.fetch_list::<Sequence>(PageParams::new(page, limit))
        .await
}

/// Fetch a single sequence.
pub async fn get_sequence(ctx: &SyncContext, id: &str) -> Result<QueryResult<Sequence>, SyncError> {
    ctx.fetch_one::<Sequence>(id).await
}

pub async fn create_sequence(
    ctx: &SyncContext,
    draft: SequenceDraft,
) -> Result<Sequence, SyncError> {
    let payload = draft.into_payload()?;
    ctx.create_entity(
        serde_json::to_value(&payload)?,
        &[Tag::list(ResourceKind::Sequence)],
    )
    .await
}

pub async fn update_sequence(
    ctx: &SyncContext,
    id: &str,
    draft: SequenceDraft,
) -> Result<Sequence, SyncError> {
    let payload = draft.into_payload()?;
    ctx.update_entity(
        id,
        serde_json::to_value(&payload)?,
        &[
            Tag::id(ResourceKind::Sequence, id),
            Tag::list(ResourceKind::Sequence),
        ],
    )
    .await
}

pub async fn delete_sequence(ctx: &SyncContext, id: &str) -> Result<(), SyncError> {
    ctx.delete_entity(
        ResourceKind::Sequence,
        id,
        &[Tag::list(ResourceKind::Sequence)],
    )
    .await
}

/// Assign the sequence to the given clients. Affects the sequence itself
/// (its assigned-client list) and the client collection (their
/// `sequence_id`s), hence the declared tag set.
pub async fn assign_sequence(
    ctx: &SyncContext,
    id: &str,
    req: AssignSequence,
) -> Result<(), SyncError> {
    ctx.run_action(
        ResourceKind::Sequence,
        id,
        "assign",
        serde_json::to_value(&req)?,
        &[
            Tag::id(ResourceKind::Sequence, id),
            Tag::list(ResourceKind::Client),
        ],
    )
    .await?;
    Ok(())
}
