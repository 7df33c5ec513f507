//! Permission levels and the group-by-collection permission graph.
//!
//! The stored form is sparse: one row per (group, collection-or-root) pair
//! holding a level above `none`. The snapshot handed to callers is dense,
//! with an explicit level for every known group and every collection plus
//! the root column.

use crate::error::{CollectionsError, Result};
use crate::types::ids::{CollectionId, GroupId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Access level a group holds on a collection. Totally ordered; `Write`
/// implies everything `Read` allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    None,
    Read,
    Write,
}

impl PermissionLevel {
    /// Decode an external token. Returns `None` for anything outside the
    /// closed set, callers attach the offending context to the error.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "none" => Some(Self::None),
            "read" => Some(Self::Read),
            "write" => Some(Self::Write),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column in the permission graph: a concrete collection, or the root
/// pseudo-collection that has no stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    Root,
    Id(CollectionId),
}

impl CollectionKey {
    /// Human-readable target for permission-denied messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Root => "the root collection".to_string(),
            Self::Id(id) => format!("collection {id}"),
        }
    }
}

impl From<CollectionId> for CollectionKey {
    fn from(id: CollectionId) -> Self {
        Self::Id(id)
    }
}

impl From<crate::types::ParentRef> for CollectionKey {
    fn from(parent: crate::types::ParentRef) -> Self {
        match parent {
            crate::types::ParentRef::Root => Self::Root,
            crate::types::ParentRef::Collection(id) => Self::Id(id),
        }
    }
}

impl Ord for CollectionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Root, Self::Root) => Ordering::Equal,
            (Self::Root, Self::Id(_)) => Ordering::Less,
            (Self::Id(_), Self::Root) => Ordering::Greater,
            (Self::Id(a), Self::Id(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for CollectionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for CollectionKey {
    type Err = CollectionsError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "root" {
            return Ok(Self::Root);
        }
        Ok(Self::Id(s.parse().map_err(|_| {
            CollectionsError::validation(format!(
                "collection key must be \"root\" or a positive id, got {s:?}"
            ))
        })?))
    }
}

impl Serialize for CollectionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CollectionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One stored permission row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub group: GroupId,
    pub collection: CollectionKey,
    pub level: PermissionLevel,
}

/// The persisted permission graph: a revision counter and the sparse rows.
/// Pairs without a row sit at `none`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDoc {
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub grants: Vec<Grant>,
}

impl GraphDoc {
    /// Level stored for a (group, key) pair. Duplicate rows should not
    /// occur, the highest one wins if they do.
    pub fn level_for(&self, group: GroupId, key: CollectionKey) -> PermissionLevel {
        self.grants
            .iter()
            .filter(|g| g.group == group && g.collection == key)
            .map(|g| g.level)
            .max()
            .unwrap_or(PermissionLevel::None)
    }

    /// The groups the graph knows about.
    pub fn groups(&self) -> BTreeSet<GroupId> {
        self.grants.iter().map(|g| g.group).collect()
    }

    /// Materialize the dense snapshot over the given collection ids. Every
    /// known group gets a column for the root and for each collection.
    pub fn dense(&self, collection_ids: &[CollectionId]) -> PermissionGraph {
        let mut groups = BTreeMap::new();
        for group in self.groups() {
            let mut columns = BTreeMap::new();
            columns.insert(CollectionKey::Root, self.level_for(group, CollectionKey::Root));
            for &id in collection_ids {
                let key = CollectionKey::Id(id);
                columns.insert(key, self.level_for(group, key));
            }
            groups.insert(group, columns);
        }
        PermissionGraph {
            revision: self.revision,
            groups,
        }
    }
}

/// Dense snapshot of the permission graph at one revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionGraph {
    pub revision: u64,
    pub groups: BTreeMap<GroupId, BTreeMap<CollectionKey, PermissionLevel>>,
}

impl PermissionGraph {
    pub fn level(&self, group: GroupId, key: CollectionKey) -> PermissionLevel {
        self.groups
            .get(&group)
            .and_then(|columns| columns.get(&key))
            .copied()
            .unwrap_or(PermissionLevel::None)
    }
}

/// Wholesale replacement payload for the permission graph, still in external
/// string form. Ids and level tokens are decoded and validated in one pass
/// before anything is written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphUpdate {
    /// Revision the caller based the update on. When present, a mismatch
    /// with the stored revision aborts the replacement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
    /// group id -> (collection key -> level token), all as strings.
    #[serde(default)]
    pub groups: BTreeMap<String, BTreeMap<String, String>>,
}

impl GraphUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = Some(revision);
        self
    }

    /// Add one entry in external form.
    pub fn grant(mut self, group: GroupId, key: CollectionKey, level: PermissionLevel) -> Self {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), level.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(raw: i64) -> CollectionId {
        CollectionId::new(raw).unwrap()
    }

    fn gid(raw: i64) -> GroupId {
        GroupId::new(raw).unwrap()
    }

    #[test]
    fn test_level_total_order() {
        assert!(PermissionLevel::None < PermissionLevel::Read);
        assert!(PermissionLevel::Read < PermissionLevel::Write);
        assert!(PermissionLevel::Write >= PermissionLevel::Read);
    }

    #[test]
    fn test_level_tokens() {
        assert_eq!(PermissionLevel::from_token("write"), Some(PermissionLevel::Write));
        assert_eq!(PermissionLevel::from_token("admin"), None);
        assert_eq!(PermissionLevel::from_token("Read"), None);
        assert_eq!(PermissionLevel::Read.to_string(), "read");
    }

    #[test]
    fn test_collection_key_parse_and_display() {
        assert_eq!("root".parse::<CollectionKey>().unwrap(), CollectionKey::Root);
        assert_eq!(
            "9".parse::<CollectionKey>().unwrap(),
            CollectionKey::Id(cid(9))
        );
        assert!("rootz".parse::<CollectionKey>().is_err());
        assert!("0".parse::<CollectionKey>().is_err());
        assert_eq!(CollectionKey::Root.to_string(), "root");
    }

    #[test]
    fn test_collection_key_orders_root_first() {
        let mut keys = vec![
            CollectionKey::Id(cid(2)),
            CollectionKey::Root,
            CollectionKey::Id(cid(1)),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                CollectionKey::Root,
                CollectionKey::Id(cid(1)),
                CollectionKey::Id(cid(2)),
            ]
        );
    }

    #[test]
    fn test_graph_doc_level_for() {
        let doc = GraphDoc {
            revision: 1,
            grants: vec![Grant {
                group: gid(1),
                collection: CollectionKey::Id(cid(4)),
                level: PermissionLevel::Read,
            }],
        };
        assert_eq!(
            doc.level_for(gid(1), CollectionKey::Id(cid(4))),
            PermissionLevel::Read
        );
        assert_eq!(
            doc.level_for(gid(1), CollectionKey::Root),
            PermissionLevel::None
        );
        assert_eq!(
            doc.level_for(gid(2), CollectionKey::Id(cid(4))),
            PermissionLevel::None
        );
    }

    #[test]
    fn test_dense_snapshot_covers_all_columns() {
        let doc = GraphDoc {
            revision: 3,
            grants: vec![Grant {
                group: gid(1),
                collection: CollectionKey::Root,
                level: PermissionLevel::Write,
            }],
        };
        let dense = doc.dense(&[cid(1), cid(2)]);
        assert_eq!(dense.revision, 3);
        let columns = &dense.groups[&gid(1)];
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[&CollectionKey::Root], PermissionLevel::Write);
        assert_eq!(columns[&CollectionKey::Id(cid(1))], PermissionLevel::None);
        assert_eq!(columns[&CollectionKey::Id(cid(2))], PermissionLevel::None);
    }

    #[test]
    fn test_graph_update_builder() {
        let update = GraphUpdate::new()
            .with_revision(2)
            .grant(gid(1), CollectionKey::Root, PermissionLevel::Write)
            .grant(gid(1), CollectionKey::Id(cid(4)), PermissionLevel::Read);
        assert_eq!(update.revision, Some(2));
        assert_eq!(update.groups["1"]["root"], "write");
        assert_eq!(update.groups["1"]["4"], "read");
    }

    #[test]
    fn test_collection_key_as_map_key_serde() {
        let mut columns = BTreeMap::new();
        columns.insert(CollectionKey::Root, PermissionLevel::Write);
        columns.insert(CollectionKey::Id(cid(4)), PermissionLevel::Read);
        let json = serde_json::to_string(&columns).unwrap();
        assert_eq!(json, "{\"root\":\"write\",\"4\":\"read\"}");
        let back: BTreeMap<CollectionKey, PermissionLevel> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, columns);
    }
}
