//! MoveCollection command

use crate::context::CollectionsContext;
use crate::error::{CollectionsError, Result};
use crate::ops::Execute;
use crate::permissions::AccessGate;
use crate::types::{ActivityEntry, Actor, Collection, CollectionId, Location, ParentRef};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Move a collection (and its whole subtree) under a new parent
///
/// Moving needs write permission on both ends: the collection's current
/// parent and the new one. Both checks run before anything is touched; a
/// failure on either side leaves every record exactly as it was. The
/// descendants' ancestor prefixes are rewritten in the same catalog
/// write, so readers never observe a half-moved subtree.
#[derive(Debug, Serialize, Deserialize)]
pub struct MoveCollection {
    /// The collection to move
    pub id: CollectionId,
    /// Where it goes; the root by default
    #[serde(default)]
    pub new_parent: ParentRef,
}

impl MoveCollection {
    /// Create a MoveCollection command targeting the root
    pub fn new(id: CollectionId) -> Self {
        Self {
            id,
            new_parent: ParentRef::Root,
        }
    }

    /// Set the new parent
    pub fn with_parent(mut self, parent: ParentRef) -> Self {
        self.new_parent = parent;
        self
    }
}

#[async_trait]
impl Execute for MoveCollection {
    type Output = Collection;

    async fn execute(&self, ctx: &CollectionsContext, actor: &Actor) -> Result<Collection> {
        let started = Instant::now();

        let _lock = ctx.lock().await?;
        let mut catalog = ctx.read_catalog().await?;
        let graph = ctx.read_graph().await?;

        let current = catalog.get(self.id)?.clone();

        let new_location = match self.new_parent {
            ParentRef::Root => Location::root(),
            ParentRef::Collection(parent_id) => {
                if parent_id == self.id {
                    return Err(CollectionsError::validation(format!(
                        "collection {parent_id} cannot be its own parent"
                    )));
                }
                let parent = catalog.get(parent_id)?;
                parent.location.child_location(parent_id)
            }
        };

        // Already there: nothing to rewrite and nothing to check.
        if new_location == current.location {
            return Ok(current);
        }

        if new_location.contains(self.id) {
            return Err(CollectionsError::validation(format!(
                "collection {} cannot be moved under its own descendant",
                self.id
            )));
        }
        if let ParentRef::Collection(parent_id) = self.new_parent {
            if catalog.get(parent_id)?.archived {
                return Err(CollectionsError::validation(format!(
                    "cannot move a collection under archived collection {parent_id}"
                )));
            }
        }

        let gate = AccessGate::new(&graph, actor);
        gate.require_write(current.parent().into())?;
        gate.require_write(self.new_parent.into())?;

        let rewritten = catalog.rebase_subtree(self.id, &current.location, &new_location)?;
        ctx.write_catalog(&catalog).await?;
        debug!(
            "moved collection {} from {} to {new_location}, {rewritten} records rewritten",
            self.id, current.location
        );

        let moved = catalog.get(self.id)?.clone();
        let entry = ActivityEntry::new(
            "move collection",
            serde_json::to_value(self)?,
            serde_json::to_value(&moved)?,
            started.elapsed().as_millis() as u64,
        )
        .with_actor(actor.name.clone());
        ctx.append_activity(&entry).await?;

        Ok(moved)
    }
}
