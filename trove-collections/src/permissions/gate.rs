//! Read/write capability checks derived from the permission graph.

use crate::error::{CollectionsError, Result};
use crate::types::{Actor, CollectionKey, GraphDoc, PermissionLevel};
use std::collections::BTreeMap;

/// One actor's effective access, folded out of the graph once so the
/// per-collection checks are plain map lookups.
///
/// An actor's level on a collection is the highest level any of their
/// groups holds there. Superusers bypass the graph entirely. Writes to
/// the root pseudo-collection come from the superuser flag alone; the
/// graph's root column only governs reads.
#[derive(Debug)]
pub struct AccessGate {
    superuser: bool,
    levels: BTreeMap<CollectionKey, PermissionLevel>,
}

impl AccessGate {
    /// Fold the graph down to the actor's effective levels.
    pub fn new(doc: &GraphDoc, actor: &Actor) -> Self {
        let mut levels: BTreeMap<CollectionKey, PermissionLevel> = BTreeMap::new();
        for grant in &doc.grants {
            if !actor.in_group(grant.group) {
                continue;
            }
            let level = levels
                .entry(grant.collection)
                .or_insert(PermissionLevel::None);
            if grant.level > *level {
                *level = grant.level;
            }
        }
        Self {
            superuser: actor.superuser,
            levels,
        }
    }

    fn level(&self, key: CollectionKey) -> PermissionLevel {
        self.levels
            .get(&key)
            .copied()
            .unwrap_or(PermissionLevel::None)
    }

    pub fn can_read(&self, key: CollectionKey) -> bool {
        self.superuser || self.level(key) >= PermissionLevel::Read
    }

    pub fn can_write(&self, key: CollectionKey) -> bool {
        if self.superuser {
            return true;
        }
        if key == CollectionKey::Root {
            return false;
        }
        self.level(key) >= PermissionLevel::Write
    }

    /// Fail with a permission-denied error unless the actor can read `key`.
    pub fn require_read(&self, key: CollectionKey) -> Result<()> {
        if self.can_read(key) {
            Ok(())
        } else {
            Err(CollectionsError::permission_denied("read", key.describe()))
        }
    }

    /// Fail with a permission-denied error unless the actor can write `key`.
    pub fn require_write(&self, key: CollectionKey) -> Result<()> {
        if self.can_write(key) {
            Ok(())
        } else {
            Err(CollectionsError::permission_denied("write", key.describe()))
        }
    }
}
