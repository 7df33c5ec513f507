//! UpdateCollection command

use crate::collection::archive::cascade_archive;
use crate::context::CollectionsContext;
use crate::error::Result;
use crate::ops::Execute;
use crate::permissions::AccessGate;
use crate::types::{
    ActivityEntry, Actor, Collection, CollectionId, CollectionKey, CollectionPatch,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

/// Update fields on a collection
///
/// Only the supplied fields change. `description` and `position` use a
/// nested option: `Some(None)` clears the field, `None` leaves it alone.
/// Setting `archived` to true archives the collection's items the same
/// way ArchiveCollection does; sub-collections stay untouched.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCollection {
    pub id: CollectionId,
    pub name: Option<String>,
    pub color: Option<String>,
    pub description: Option<Option<String>>,
    pub archived: Option<bool>,
    pub position: Option<Option<i32>>,
}

impl UpdateCollection {
    /// Create an empty update for the given collection
    pub fn new(id: CollectionId) -> Self {
        Self {
            id,
            name: None,
            color: None,
            description: None,
            archived: None,
            position: None,
        }
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set or clear the description
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Set the archived flag
    pub fn with_archived(mut self, archived: bool) -> Self {
        self.archived = Some(archived);
        self
    }

    /// Set or clear the position hint
    pub fn with_position(mut self, position: Option<i32>) -> Self {
        self.position = Some(position);
        self
    }

    fn patch(&self) -> CollectionPatch {
        CollectionPatch {
            name: self.name.clone(),
            color: self.color.clone(),
            description: self.description.clone(),
            archived: self.archived,
            position: self.position,
        }
    }
}

#[async_trait]
impl Execute for UpdateCollection {
    type Output = Collection;

    async fn execute(&self, ctx: &CollectionsContext, actor: &Actor) -> Result<Collection> {
        let started = Instant::now();
        let patch = self.patch();

        let (updated, was_archived) = {
            let _lock = ctx.lock().await?;
            let mut catalog = ctx.read_catalog().await?;
            let graph = ctx.read_graph().await?;

            let current = catalog.get(self.id)?.clone();
            AccessGate::new(&graph, actor).require_write(CollectionKey::Id(self.id))?;

            if patch.is_empty() {
                return Ok(current);
            }

            let updated = catalog.apply(self.id, &patch)?.clone();
            ctx.write_catalog(&catalog).await?;

            let entry = ActivityEntry::new(
                "update collection",
                serde_json::to_value(self)?,
                serde_json::to_value(&updated)?,
                started.elapsed().as_millis() as u64,
            )
            .with_actor(actor.name.clone());
            ctx.append_activity(&entry).await?;

            (updated, current.archived)
        };

        // Archiving through an update cascades onto the collection's items
        // exactly like ArchiveCollection, once, on the transition.
        if self.archived == Some(true) && !was_archived {
            let cascade = cascade_archive(ctx, self.id).await;
            for failure in &cascade.failures {
                warn!("archive side effect failed for collection {}: {failure}", self.id);
            }
        }

        Ok(updated)
    }
}
