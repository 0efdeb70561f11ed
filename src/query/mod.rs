//! Query layer - normalized keys, the memoized query cache, subscriptions,
//! and the tag invalidation engine.

mod cache;
mod key;

pub use cache::{QueryCache, QueryResult, Subscription};
pub use key::{PageParams, QueryKey, QueryTarget};
