//! Query keys - normalized identity of a cached read.
//!
//! Parameters are normalized before use as a cache key so equivalent
//! requests share one entry: page and limit get their defaults filled in and
//! are clamped to the ranges the server accepts.

use crate::resource::ResourceKind;

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

/// Normalized pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageParams {
    page: u32,
    limit: u32,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageParams {
    /// Normalize raw parameters: defaults filled in, page floored at 1,
    /// limit clamped to 1..=100.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// What a query targets: a page of a collection or a single entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueryTarget {
    List(PageParams),
    One(String),
}

/// Cache key: resource kind plus normalized target.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryKey {
    pub kind: ResourceKind,
    pub target: QueryTarget,
}

impl QueryKey {
    pub fn list(kind: ResourceKind, params: PageParams) -> Self {
        Self {
            kind,
            target: QueryTarget::List(params),
        }
    }

    pub fn one(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            target: QueryTarget::One(id.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(PageParams::new(None, None), PageParams::default());
        assert_eq!(PageParams::default().page(), 1);
        assert_eq!(PageParams::default().limit(), 10);
    }

    #[test]
    fn equivalent_params_share_a_key() {
        let explicit = QueryKey::list(ResourceKind::Client, PageParams::new(Some(1), Some(10)));
        let defaulted = QueryKey::list(ResourceKind::Client, PageParams::new(None, None));
        assert_eq!(explicit, defaulted);
    }

    #[test]
    fn clamping() {
        assert_eq!(PageParams::new(Some(0), None).page(), 1);
        assert_eq!(PageParams::new(None, Some(0)).limit(), 1);
        assert_eq!(PageParams::new(None, Some(500)).limit(), 100);
    }

    #[test]
    fn list_and_one_keys_differ() {
        let list = QueryKey::list(ResourceKind::Video, PageParams::default());
        let one = QueryKey::one(ResourceKind::Video, "v1");
        assert_ne!(list, one);
    }
}
