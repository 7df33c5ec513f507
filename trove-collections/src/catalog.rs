//! The persisted collection catalog.
//!
//! One YAML document holds every collection record keyed by id, plus the
//! id allocator. Commands load it, mutate in memory, and write it back
//! whole; the single atomic rename is what makes multi-record rewrites
//! (a subtree move) all-or-nothing.

use crate::error::{CollectionsError, Result};
use crate::types::{
    validate_color, validate_name, Collection, CollectionId, CollectionPatch, Location,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All collection records plus the id allocator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Highest id handed out so far.
    #[serde(default)]
    last_id: i64,
    #[serde(default)]
    collections: BTreeMap<CollectionId, Collection>,
}

impl Catalog {
    /// Hand out the next collection id.
    pub fn allocate_id(&mut self) -> CollectionId {
        self.last_id += 1;
        CollectionId::from_raw(self.last_id)
    }

    /// Insert or replace a record, keyed by its id.
    pub fn put(&mut self, collection: Collection) {
        self.last_id = self.last_id.max(collection.id.as_i64());
        self.collections.insert(collection.id, collection);
    }

    /// Look up a record.
    pub fn get(&self, id: CollectionId) -> Result<&Collection> {
        self.collections
            .get(&id)
            .ok_or_else(|| CollectionsError::not_found(id.as_i64()))
    }

    pub fn contains(&self, id: CollectionId) -> bool {
        self.collections.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// All records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    /// All ids in ascending order.
    pub fn collection_ids(&self) -> Vec<CollectionId> {
        self.collections.keys().copied().collect()
    }

    /// Records sitting exactly at `location`, ordered case-insensitively
    /// by name (id breaks ties).
    pub fn children_of(&self, location: &Location) -> Vec<&Collection> {
        let mut children: Vec<&Collection> = self
            .collections
            .values()
            .filter(|c| c.location == *location)
            .collect();
        children.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.id.cmp(&b.id))
        });
        children
    }

    /// Records anywhere under `prefix`, in id order.
    pub fn descendants_of(&self, prefix: &Location) -> Vec<&Collection> {
        self.collections
            .values()
            .filter(|c| c.location.starts_with(prefix))
            .collect()
    }

    /// Apply a partial update to one record, validating the supplied
    /// fields. Untouched fields keep their values.
    pub fn apply(&mut self, id: CollectionId, patch: &CollectionPatch) -> Result<&Collection> {
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if let Some(color) = &patch.color {
            validate_color(color)?;
        }

        let record = self
            .collections
            .get_mut(&id)
            .ok_or_else(|| CollectionsError::not_found(id.as_i64()))?;

        if let Some(name) = &patch.name {
            record.rename(name.clone());
        }
        if let Some(color) = &patch.color {
            record.color = color.clone();
        }
        if let Some(description) = &patch.description {
            record.description = description.clone();
        }
        if let Some(archived) = patch.archived {
            record.archived = archived;
        }
        if let Some(position) = patch.position {
            record.position = position;
        }

        self.collections
            .get(&id)
            .ok_or_else(|| CollectionsError::not_found(id.as_i64()))
    }

    /// Move the collection `id` (and its whole subtree) so that `id` sits
    /// at `new_location`. Every descendant's ancestor prefix is rewritten
    /// in the same pass; nothing is applied unless every rewrite succeeds.
    ///
    /// `expected_location` is the location the caller planned the move
    /// against. If the record has moved in the meantime the whole rebase
    /// aborts with a conflict.
    ///
    /// Returns the number of records whose location changed.
    pub fn rebase_subtree(
        &mut self,
        id: CollectionId,
        expected_location: &Location,
        new_location: &Location,
    ) -> Result<usize> {
        if new_location.contains(id) {
            return Err(CollectionsError::validation(format!(
                "collection {id} cannot be located under itself"
            )));
        }

        let current = self.collections.get(&id).ok_or_else(|| {
            CollectionsError::conflict(format!("collection {id} vanished during subtree rewrite"))
        })?;
        if current.location != *expected_location {
            return Err(CollectionsError::conflict(format!(
                "collection {id} moved from {expected_location} to {} during subtree rewrite",
                current.location
            )));
        }

        let old_prefix = expected_location.child_location(id);
        let new_prefix = new_location.child_location(id);

        // Stage every rewrite before touching any record.
        let mut staged = vec![(id, new_location.clone())];
        for record in self.collections.values() {
            if record.id != id && record.location.starts_with(&old_prefix) {
                staged.push((record.id, record.location.rebase(&old_prefix, &new_prefix)?));
            }
        }

        let count = staged.len();
        for (record_id, location) in staged {
            if let Some(record) = self.collections.get_mut(&record_id) {
                record.location = location;
            }
        }

        Ok(count)
    }

    /// Check each record's inline id against its map key after
    /// deserialization and resync the allocator so it never re-issues an
    /// existing id. A divergent inline id means the file was corrupted or
    /// hand-edited inconsistently; loading rejects it outright instead of
    /// guessing which id was meant.
    pub(crate) fn verify_ids(&mut self) -> Result<()> {
        for (id, record) in &self.collections {
            if record.id != *id {
                return Err(CollectionsError::validation(format!(
                    "catalog record under key {id} carries id {}",
                    record.id
                )));
            }
            self.last_id = self.last_id.max(id.as_i64());
        }
        Ok(())
    }
}
