//! ID wrapper types for type-safe identifiers.
//!
//! This module provides strongly typed ID wrappers around the numeric
//! identifiers the store hands out, to prevent mixing up collections,
//! permission groups, and contained items.

use crate::error::{CollectionsError, Result};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Collection identifier. Always positive; allocated by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionId(i64);

impl CollectionId {
    /// Wrap a raw id, rejecting non-positive values.
    pub fn new(raw: i64) -> Result<Self> {
        if raw <= 0 {
            return Err(CollectionsError::validation(format!(
                "collection id must be positive, got {raw}"
            )));
        }
        Ok(Self(raw))
    }

    /// Wrap an id the catalog itself allocated.
    pub(crate) fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for CollectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CollectionId {
    type Err = CollectionsError;

    fn from_str(s: &str) -> Result<Self> {
        let raw: i64 = s
            .parse()
            .map_err(|_| CollectionsError::validation(format!("invalid collection id: {s:?}")))?;
        Self::new(raw)
    }
}

/// Permission group identifier. Always positive; groups are owned by the
/// surrounding application, the engine only references them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(i64);

impl GroupId {
    /// Wrap a raw id, rejecting non-positive values.
    pub fn new(raw: i64) -> Result<Self> {
        if raw <= 0 {
            return Err(CollectionsError::validation(format!(
                "group id must be positive, got {raw}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for GroupId {
    type Err = CollectionsError;

    fn from_str(s: &str) -> Result<Self> {
        let raw: i64 = s
            .parse()
            .map_err(|_| CollectionsError::validation(format!("invalid group id: {s:?}")))?;
        Self::new(raw)
    }
}

/// Identifier of an item (card, dashboard, pulse) living inside a collection.
/// Items belong to an external store; ids pass through the engine opaquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(i64);

impl ItemId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Activity log entry identifier, time-sortable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityEntryId(Ulid);

impl ActivityEntryId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl std::fmt::Display for ActivityEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ActivityEntryId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for ActivityEntryId {
    fn default() -> Self {
        Self::new()
    }
}
