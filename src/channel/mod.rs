//! Real-time reconciliation channel.
//!
//! A persistent push connection delivers out-of-band device transitions
//! (`client-online`, `client-offline`) that no local mutation can account
//! for. The channel's sole job on receipt is to drive the same tag
//! invalidation path a mutation would - it never writes entity fields
//! directly, so invalidation bookkeeping has a single source of truth.
//!
//! Connection lifecycle is a tagged state machine
//! (`Disconnected → Connecting → Connected → Reconnecting | Disconnected`)
//! with a bounded retry budget and fixed backoff; exhausting the budget
//! surfaces only as a persistent `Disconnected` status, never as an error
//! to callers.

mod events;
mod reconcile;

pub use events::{ChannelEvent, RealtimeEvent, CLIENT_OFFLINE, CLIENT_ONLINE};
pub use reconcile::{ChannelConnection, ChannelStatus, ChannelTransport, ReconciliationChannel};
