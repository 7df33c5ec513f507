//! ListCollections command

use crate::context::CollectionsContext;
use crate::error::Result;
use crate::ops::Execute;
use crate::permissions::AccessGate;
use crate::types::{Actor, Collection, CollectionKey};
use async_trait::async_trait;
use serde::Deserialize;

fn default_archived() -> Option<bool> {
    Some(false)
}

/// List every collection the actor can read, anywhere in the tree,
/// ordered case-insensitively by name
#[derive(Debug, Deserialize)]
pub struct ListCollections {
    /// Filter on the archived flag. Defaults to live collections only,
    /// whether built or deserialized; an explicit null lists archived
    /// and live collections alike.
    #[serde(default = "default_archived")]
    pub archived: Option<bool>,
}

impl ListCollections {
    /// List non-archived collections
    pub fn new() -> Self {
        Self {
            archived: Some(false),
        }
    }

    /// Set the archived filter
    pub fn with_archived(mut self, archived: Option<bool>) -> Self {
        self.archived = archived;
        self
    }
}

impl Default for ListCollections {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Execute for ListCollections {
    type Output = Vec<Collection>;

    async fn execute(&self, ctx: &CollectionsContext, actor: &Actor) -> Result<Vec<Collection>> {
        let catalog = ctx.read_catalog().await?;
        let graph = ctx.read_graph().await?;
        let gate = AccessGate::new(&graph, actor);

        let mut collections: Vec<Collection> = catalog
            .iter()
            .filter(|c| self.archived.map(|a| c.archived == a).unwrap_or(true))
            .filter(|c| gate.can_read(CollectionKey::Id(c.id)))
            .cloned()
            .collect();
        collections.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.id.cmp(&b.id))
        });
        Ok(collections)
    }
}
