//! GetCollection command

use crate::context::CollectionsContext;
use crate::error::Result;
use crate::items::ItemModel;
use crate::ops::Execute;
use crate::permissions::AccessGate;
use crate::types::{Actor, Collection, CollectionId, CollectionKey, ItemId, Location};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A collection together with what the acting user can see around it:
/// the readable ancestors, the readable children, and the contained items.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionView {
    pub collection: Collection,
    /// Readable ancestors, outermost first. Ancestors the actor cannot
    /// read are omitted, so the chain telescopes rather than leaking
    /// names the actor has no access to.
    pub effective_ancestors: Vec<Collection>,
    /// Location rebuilt from the readable ancestors only.
    pub effective_location: Location,
    /// Direct, non-archived children the actor can read, ordered by name.
    pub children: Vec<Collection>,
    pub cards: Vec<ItemId>,
    pub dashboards: Vec<ItemId>,
    pub pulses: Vec<ItemId>,
}

/// Fetch one collection with its effective ancestors, children, and items
#[derive(Debug, Serialize, Deserialize)]
pub struct GetCollection {
    pub id: CollectionId,
}

impl GetCollection {
    pub fn new(id: CollectionId) -> Self {
        Self { id }
    }
}

#[async_trait]
impl Execute for GetCollection {
    type Output = CollectionView;

    async fn execute(&self, ctx: &CollectionsContext, actor: &Actor) -> Result<CollectionView> {
        let catalog = ctx.read_catalog().await?;
        let graph = ctx.read_graph().await?;
        let gate = AccessGate::new(&graph, actor);

        let collection = catalog.get(self.id)?.clone();
        gate.require_read(CollectionKey::Id(self.id))?;

        let mut effective_ancestors = Vec::new();
        for &ancestor_id in collection.location.ancestor_ids() {
            match catalog.get(ancestor_id) {
                Ok(ancestor) => {
                    if gate.can_read(CollectionKey::Id(ancestor_id)) {
                        effective_ancestors.push(ancestor.clone());
                    }
                }
                Err(_) => {
                    warn!(
                        "ancestor {} of collection {} is missing from the catalog",
                        ancestor_id, self.id
                    );
                }
            }
        }
        let effective_location =
            Location::from_ids(effective_ancestors.iter().map(|a| a.id).collect());

        let children: Vec<Collection> = catalog
            .children_of(&collection.location.child_location(self.id))
            .into_iter()
            .filter(|c| !c.archived && gate.can_read(CollectionKey::Id(c.id)))
            .cloned()
            .collect();

        let cards = ctx
            .items()
            .list_by_collection(ItemModel::Card, self.id)
            .await?;
        let dashboards = ctx
            .items()
            .list_by_collection(ItemModel::Dashboard, self.id)
            .await?;
        let pulses = ctx
            .items()
            .list_by_collection(ItemModel::Pulse, self.id)
            .await?;

        Ok(CollectionView {
            collection,
            effective_ancestors,
            effective_location,
            children,
            cards,
            dashboards,
            pulses,
        })
    }
}
