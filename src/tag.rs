//! Cache tags - associate cached query results with the entities that
//! determine their content.
//!
//! Every cached list result is covered by `{kind, LIST}` plus one
//! `{kind, id}` per member; a single-entity result is covered by
//! `{kind, id}`. Mutations declare the tags they affect, and the
//! invalidation engine marks every query whose tag set intersects them.

use std::fmt;

use crate::resource::ResourceKind;

/// A cache tag: a resource kind plus either a specific identifier or the
/// whole-collection marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    kind: ResourceKind,
    scope: TagScope,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TagScope {
    /// Covers any collection result for the kind.
    List,
    /// Covers the entity with this identifier.
    Id(String),
}

impl Tag {
    /// The `{kind, LIST}` tag covering every collection result of a kind.
    pub fn list(kind: ResourceKind) -> Self {
        Tag {
            kind,
            scope: TagScope::List,
        }
    }

    /// The `{kind, id}` tag covering one entity.
    pub fn id(kind: ResourceKind, id: impl Into<String>) -> Self {
        Tag {
            kind,
            scope: TagScope::Id(id.into()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn is_list(&self) -> bool {
        matches!(self.scope, TagScope::List)
    }

    /// The identifier this tag covers, if it is not a LIST tag.
    pub fn entity_id(&self) -> Option<&str> {
        match &self.scope {
            TagScope::List => None,
            TagScope::Id(id) => Some(id),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            TagScope::List => write!(f, "{}:LIST", self.kind),
            TagScope::Id(id) => write!(f, "{}:{}", self.kind, id),
        }
    }
}

/// The tag set covering a list result: `{kind, LIST}` plus `{kind, id}` per
/// member, so creates invalidate the collection and updates invalidate
/// exactly the affected members.
pub fn list_tags<I, S>(kind: ResourceKind, ids: I) -> Vec<Tag>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut tags: Vec<Tag> = ids.into_iter().map(|id| Tag::id(kind, id)).collect();
    tags.push(Tag::list(kind));
    tags
}

/// Whether two tag sets share at least one tag.
pub fn intersects(covered: &[Tag], affected: &[Tag]) -> bool {
    covered.iter().any(|tag| affected.contains(tag))
}
