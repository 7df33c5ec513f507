//! Materialized-path locations for the collection tree.
//!
//! A location is the ordered chain of ancestor ids above a collection,
//! root-first. It is exchanged and persisted as a slash-delimited string
//! ("/" for a root-level collection, "/1/4/" for a grandchild of 1), but
//! held in memory as the id sequence so depth and prefix arithmetic never
//! re-parse strings.

use crate::error::{CollectionsError, Result};
use crate::types::ids::CollectionId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Ancestor chain of a collection, root-first. Never contains the
/// collection's own id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Location(Vec<CollectionId>);

impl Location {
    /// The empty chain: a collection sitting directly under the root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a location from an explicit ancestor chain.
    pub fn from_ids(ids: Vec<CollectionId>) -> Self {
        Self(ids)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of ancestors above the collection.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The ancestor ids, outermost first.
    pub fn ancestor_ids(&self) -> &[CollectionId] {
        &self.0
    }

    /// The immediate parent, if any.
    pub fn parent_id(&self) -> Option<CollectionId> {
        self.0.last().copied()
    }

    /// The location of children of the collection `id` sitting at `self`.
    pub fn child_location(&self, id: CollectionId) -> Location {
        let mut ids = self.0.clone();
        ids.push(id);
        Location(ids)
    }

    /// Whether `prefix` is an ancestor chain prefix of this location.
    /// Every location starts with the root prefix.
    pub fn starts_with(&self, prefix: &Location) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// Whether `id` appears anywhere in the chain.
    pub fn contains(&self, id: CollectionId) -> bool {
        self.0.contains(&id)
    }

    /// Rewrite the leading `old_prefix` to `new_prefix`, preserving the
    /// remainder of the chain. Fails with a conflict when the location does
    /// not actually start with `old_prefix`.
    pub fn rebase(&self, old_prefix: &Location, new_prefix: &Location) -> Result<Location> {
        if !self.starts_with(old_prefix) {
            return Err(CollectionsError::conflict(format!(
                "location {self} does not start with {old_prefix}"
            )));
        }
        let mut ids = new_prefix.0.clone();
        ids.extend_from_slice(&self.0[old_prefix.0.len()..]);
        Ok(Location(ids))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/")?;
        for id in &self.0 {
            write!(f, "{id}/")?;
        }
        Ok(())
    }
}

impl FromStr for Location {
    type Err = CollectionsError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "/" {
            return Ok(Self::root());
        }
        let inner = s
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
            .ok_or_else(|| {
                CollectionsError::validation(format!(
                    "location must start and end with '/', got {s:?}"
                ))
            })?;
        let mut ids = Vec::new();
        for segment in inner.split('/') {
            if segment.is_empty() {
                return Err(CollectionsError::validation(format!(
                    "location {s:?} contains an empty segment"
                )));
            }
            ids.push(segment.parse::<CollectionId>().map_err(|_| {
                CollectionsError::validation(format!(
                    "location {s:?} contains invalid segment {segment:?}"
                ))
            })?);
        }
        Ok(Self(ids))
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
