//! GetPermissionGraph and ReplacePermissionGraph commands
//!
//! The graph is read and replaced wholesale, never patched row by row.
//! Replacement validates every entry before any write and bumps the
//! revision counter; callers that pass the revision they read get a
//! conflict instead of clobbering a graph someone else changed.

use crate::context::CollectionsContext;
use crate::error::{CollectionsError, Result};
use crate::ops::Execute;
use crate::types::{
    ActivityEntry, Actor, CollectionKey, Grant, GraphDoc, GraphUpdate, PermissionGraph,
    PermissionLevel,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;

fn require_superuser(actor: &Actor, action: &str) -> Result<()> {
    if actor.superuser {
        Ok(())
    } else {
        Err(CollectionsError::permission_denied(
            action,
            "the permission graph",
        ))
    }
}

/// Fetch the dense permission graph snapshot
#[derive(Debug, Default, Deserialize)]
pub struct GetPermissionGraph {}

impl GetPermissionGraph {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl Execute for GetPermissionGraph {
    type Output = PermissionGraph;

    async fn execute(&self, ctx: &CollectionsContext, actor: &Actor) -> Result<PermissionGraph> {
        require_superuser(actor, "read")?;

        let doc = ctx.read_graph().await?;
        let catalog = ctx.read_catalog().await?;
        Ok(doc.dense(&catalog.collection_ids()))
    }
}

/// Replace the whole permission graph
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct ReplacePermissionGraph {
    pub update: GraphUpdate,
}

impl ReplacePermissionGraph {
    pub fn new(update: GraphUpdate) -> Self {
        Self { update }
    }
}

#[async_trait]
impl Execute for ReplacePermissionGraph {
    type Output = PermissionGraph;

    async fn execute(&self, ctx: &CollectionsContext, actor: &Actor) -> Result<PermissionGraph> {
        let started = Instant::now();
        require_superuser(actor, "replace")?;

        let _lock = ctx.lock().await?;
        let current = ctx.read_graph().await?;
        let catalog = ctx.read_catalog().await?;

        if let Some(expected) = self.update.revision {
            if expected != current.revision {
                return Err(CollectionsError::conflict(format!(
                    "permission graph revision {expected} is stale, current revision is {}",
                    current.revision
                )));
            }
        }

        // Decode and validate every entry before writing anything.
        let mut grants = Vec::new();
        for (group_token, columns) in &self.update.groups {
            let group = group_token.parse().map_err(|_| {
                CollectionsError::validation(format!(
                    "invalid group id {group_token:?} in permission graph"
                ))
            })?;
            for (key_token, level_token) in columns {
                let key: CollectionKey = key_token.parse().map_err(|_| {
                    CollectionsError::validation(format!(
                        "invalid collection key {key_token:?} for group {group_token}"
                    ))
                })?;
                if let CollectionKey::Id(id) = key {
                    if !catalog.contains(id) {
                        return Err(CollectionsError::validation(format!(
                            "unknown collection {id} for group {group_token}"
                        )));
                    }
                }
                let level = PermissionLevel::from_token(level_token).ok_or_else(|| {
                    CollectionsError::validation(format!(
                        "unrecognized permission level {level_token:?} for group {group_token} on {key_token:?}"
                    ))
                })?;
                // The stored form is sparse, `none` rows are dropped.
                if level != PermissionLevel::None {
                    grants.push(Grant {
                        group,
                        collection: key,
                        level,
                    });
                }
            }
        }
        grants.sort_by_key(|g| (g.group, g.collection));

        let doc = GraphDoc {
            revision: current.revision + 1,
            grants,
        };
        ctx.write_graph(&doc).await?;

        let entry = ActivityEntry::new(
            "replace permission graph",
            serde_json::to_value(&self.update)?,
            serde_json::json!({
                "revision": doc.revision,
                "grants": doc.grants.len(),
            }),
            started.elapsed().as_millis() as u64,
        )
        .with_actor(actor.name.clone());
        ctx.append_activity(&entry).await?;

        Ok(doc.dense(&catalog.collection_ids()))
    }
}
