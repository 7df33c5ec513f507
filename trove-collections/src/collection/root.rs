//! GetRootCollection command

use crate::context::CollectionsContext;
use crate::error::Result;
use crate::ops::Execute;
use crate::permissions::AccessGate;
use crate::types::{Actor, Collection, CollectionKey, Location};
use async_trait::async_trait;
use serde::Deserialize;

/// Fetch the children of the root pseudo-collection
///
/// The root has no stored record; this returns the non-archived,
/// root-level collections the actor can read, ordered by name.
#[derive(Debug, Default, Deserialize)]
pub struct GetRootCollection {}

impl GetRootCollection {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl Execute for GetRootCollection {
    type Output = Vec<Collection>;

    async fn execute(&self, ctx: &CollectionsContext, actor: &Actor) -> Result<Vec<Collection>> {
        let catalog = ctx.read_catalog().await?;
        let graph = ctx.read_graph().await?;
        let gate = AccessGate::new(&graph, actor);

        Ok(catalog
            .children_of(&Location::root())
            .into_iter()
            .filter(|c| !c.archived && gate.can_read(CollectionKey::Id(c.id)))
            .cloned()
            .collect())
    }
}
