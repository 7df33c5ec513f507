//! ArchiveCollection command

use crate::context::CollectionsContext;
use crate::error::Result;
use crate::items::{CancelledAlert, ItemModel};
use crate::ops::Execute;
use crate::permissions::AccessGate;
use crate::types::{
    ActivityEntry, Actor, Collection, CollectionId, CollectionKey, CollectionPatch, ItemId,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

/// What archiving a collection did, including the best-effort side effects.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveOutcome {
    pub collection: Collection,
    pub archived_cards: Vec<ItemId>,
    pub archived_dashboards: Vec<ItemId>,
    pub archived_pulses: Vec<ItemId>,
    pub cancelled_alerts: Vec<CancelledAlert>,
    /// Side effects that failed. The archive itself stands regardless.
    pub side_effect_failures: Vec<String>,
}

impl ArchiveOutcome {
    fn unchanged(collection: Collection) -> Self {
        Self {
            collection,
            archived_cards: Vec::new(),
            archived_dashboards: Vec::new(),
            archived_pulses: Vec::new(),
            cancelled_alerts: Vec::new(),
            side_effect_failures: Vec::new(),
        }
    }
}

/// Flag a collection archived and archive the items filed inside it
///
/// Sub-collections are left alone: archiving does not cascade downward
/// through the tree, only onto the collection's own items. Item archival
/// and alert cancellation are best-effort; their failures are reported in
/// the outcome but never roll back the archive.
#[derive(Debug, Serialize, Deserialize)]
pub struct ArchiveCollection {
    pub id: CollectionId,
}

impl ArchiveCollection {
    pub fn new(id: CollectionId) -> Self {
        Self { id }
    }
}

#[async_trait]
impl Execute for ArchiveCollection {
    type Output = ArchiveOutcome;

    async fn execute(&self, ctx: &CollectionsContext, actor: &Actor) -> Result<ArchiveOutcome> {
        let started = Instant::now();

        let collection = {
            let _lock = ctx.lock().await?;
            let mut catalog = ctx.read_catalog().await?;
            let graph = ctx.read_graph().await?;

            let collection = catalog.get(self.id)?.clone();
            AccessGate::new(&graph, actor).require_write(CollectionKey::Id(self.id))?;

            if collection.archived {
                // Already archived, nothing to flip and nothing to cascade.
                return Ok(ArchiveOutcome::unchanged(collection));
            }

            let patch = CollectionPatch {
                archived: Some(true),
                ..Default::default()
            };
            let archived = catalog.apply(self.id, &patch)?.clone();
            ctx.write_catalog(&catalog).await?;

            let entry = ActivityEntry::new(
                "archive collection",
                serde_json::to_value(self)?,
                serde_json::to_value(&archived)?,
                started.elapsed().as_millis() as u64,
            )
            .with_actor(actor.name.clone());
            ctx.append_activity(&entry).await?;

            archived
        };

        let cascade = cascade_archive(ctx, self.id).await;
        Ok(ArchiveOutcome {
            collection,
            archived_cards: cascade.cards,
            archived_dashboards: cascade.dashboards,
            archived_pulses: cascade.pulses,
            cancelled_alerts: cascade.cancelled_alerts,
            side_effect_failures: cascade.failures,
        })
    }
}

/// Item-side effects of archiving one collection.
pub(crate) struct ArchiveCascade {
    pub cards: Vec<ItemId>,
    pub dashboards: Vec<ItemId>,
    pub pulses: Vec<ItemId>,
    pub cancelled_alerts: Vec<CancelledAlert>,
    pub failures: Vec<String>,
}

/// Archive the items filed in `id` and cancel alerts on its cards.
/// Every step is best-effort; failures are collected, not propagated.
pub(crate) async fn cascade_archive(ctx: &CollectionsContext, id: CollectionId) -> ArchiveCascade {
    let mut cascade = ArchiveCascade {
        cards: Vec::new(),
        dashboards: Vec::new(),
        pulses: Vec::new(),
        cancelled_alerts: Vec::new(),
        failures: Vec::new(),
    };

    for model in ItemModel::ALL {
        let ids = match ctx.items().list_by_collection(model, id).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("listing {model}s in collection {id} failed: {e}");
                cascade.failures.push(format!("list {model}s: {e}"));
                continue;
            }
        };
        if ids.is_empty() {
            continue;
        }
        if let Err(e) = ctx.items().mark_archived(model, &ids).await {
            warn!("archiving {model}s in collection {id} failed: {e}");
            cascade.failures.push(format!("archive {model}s: {e}"));
            continue;
        }
        match model {
            ItemModel::Card => cascade.cards = ids,
            ItemModel::Dashboard => cascade.dashboards = ids,
            ItemModel::Pulse => cascade.pulses = ids,
        }
    }

    if !cascade.cards.is_empty() {
        match ctx.alerts().cancel_alerts_for_cards(&cascade.cards).await {
            Ok(cancelled) => cascade.cancelled_alerts = cancelled,
            Err(e) => {
                warn!("cancelling alerts for collection {id} failed: {e}");
                cascade.failures.push(format!("cancel alerts: {e}"));
            }
        }
    }

    cascade
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CreateCollection;
    use crate::error::CollectionsError;
    use crate::items::{InMemoryItemStore, RecordingAlertNotifier};
    use crate::types::{GroupId, ParentRef};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        ctx: CollectionsContext,
        items: Arc<InMemoryItemStore>,
        alerts: Arc<RecordingAlertNotifier>,
    }

    async fn setup() -> Fixture {
        let temp = TempDir::new().unwrap();
        let items = Arc::new(InMemoryItemStore::new());
        let alerts = Arc::new(RecordingAlertNotifier::new());
        let ctx = CollectionsContext::new(temp.path().join(".trove"))
            .with_item_store(items.clone())
            .with_alert_notifier(alerts.clone());
        ctx.create_directories().await.unwrap();
        Fixture {
            _temp: temp,
            ctx,
            items,
            alerts,
        }
    }

    #[tokio::test]
    async fn test_archive_flips_flag_and_persists() {
        let f = setup().await;
        let admin = Actor::superuser();

        let collection = CreateCollection::new("Old Stuff", "509EE3")
            .execute(&f.ctx, &admin)
            .await
            .unwrap();
        let outcome = ArchiveCollection::new(collection.id)
            .execute(&f.ctx, &admin)
            .await
            .unwrap();
        assert!(outcome.collection.archived);

        let catalog = f.ctx.read_catalog().await.unwrap();
        assert!(catalog.get(collection.id).unwrap().archived);
    }

    #[tokio::test]
    async fn test_archive_cascades_to_items_not_subcollections() {
        let f = setup().await;
        let admin = Actor::superuser();

        let parent = CreateCollection::new("Parent", "509EE3")
            .execute(&f.ctx, &admin)
            .await
            .unwrap();
        let child = CreateCollection::new("Child", "509EE3")
            .with_parent(ParentRef::Collection(parent.id))
            .execute(&f.ctx, &admin)
            .await
            .unwrap();

        f.items.seed(ItemModel::Card, ItemId::new(10), parent.id).await;
        f.items
            .seed(ItemModel::Dashboard, ItemId::new(20), parent.id)
            .await;
        f.items.seed(ItemModel::Pulse, ItemId::new(30), parent.id).await;
        // An item in the child collection stays untouched.
        f.items.seed(ItemModel::Card, ItemId::new(11), child.id).await;

        let outcome = ArchiveCollection::new(parent.id)
            .execute(&f.ctx, &admin)
            .await
            .unwrap();

        assert_eq!(outcome.archived_cards, vec![ItemId::new(10)]);
        assert_eq!(outcome.archived_dashboards, vec![ItemId::new(20)]);
        assert_eq!(outcome.archived_pulses, vec![ItemId::new(30)]);
        assert!(outcome.side_effect_failures.is_empty());

        assert!(f.items.is_archived(ItemModel::Card, ItemId::new(10)).await);
        assert!(!f.items.is_archived(ItemModel::Card, ItemId::new(11)).await);

        // The sub-collection is still live.
        let catalog = f.ctx.read_catalog().await.unwrap();
        assert!(!catalog.get(child.id).unwrap().archived);
        assert!(catalog.get(parent.id).unwrap().archived);
    }

    #[tokio::test]
    async fn test_archive_cancels_alerts_on_cards() {
        let f = setup().await;
        let admin = Actor::superuser();

        let collection = CreateCollection::new("Metrics", "509EE3")
            .execute(&f.ctx, &admin)
            .await
            .unwrap();
        f.items
            .seed(ItemModel::Card, ItemId::new(10), collection.id)
            .await;
        f.alerts.seed_alert(ItemId::new(10), "alice").await;
        f.alerts.seed_alert(ItemId::new(10), "bob").await;

        let outcome = ArchiveCollection::new(collection.id)
            .execute(&f.ctx, &admin)
            .await
            .unwrap();

        let owners: Vec<&str> = outcome
            .cancelled_alerts
            .iter()
            .map(|a| a.owner.as_str())
            .collect();
        assert_eq!(owners, vec!["alice", "bob"]);
        assert_eq!(f.alerts.cancelled().await.len(), 2);
    }

    #[tokio::test]
    async fn test_archive_is_idempotent() {
        let f = setup().await;
        let admin = Actor::superuser();

        let collection = CreateCollection::new("Once", "509EE3")
            .execute(&f.ctx, &admin)
            .await
            .unwrap();
        f.items
            .seed(ItemModel::Card, ItemId::new(10), collection.id)
            .await;
        f.alerts.seed_alert(ItemId::new(10), "alice").await;

        let first = ArchiveCollection::new(collection.id)
            .execute(&f.ctx, &admin)
            .await
            .unwrap();
        assert_eq!(first.cancelled_alerts.len(), 1);

        let second = ArchiveCollection::new(collection.id)
            .execute(&f.ctx, &admin)
            .await
            .unwrap();
        assert!(second.collection.archived);
        assert!(second.archived_cards.is_empty());
        assert!(second.cancelled_alerts.is_empty());

        // The cascade did not run twice.
        assert_eq!(f.alerts.cancelled().await.len(), 1);
    }

    #[tokio::test]
    async fn test_archive_requires_write() {
        let f = setup().await;
        let collection = CreateCollection::new("Guarded", "509EE3")
            .execute(&f.ctx, &Actor::superuser())
            .await
            .unwrap();

        let err = ArchiveCollection::new(collection.id)
            .execute(&f.ctx, &Actor::with_groups([GroupId::new(1).unwrap()]))
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionsError::PermissionDenied { .. }));

        let catalog = f.ctx.read_catalog().await.unwrap();
        assert!(!catalog.get(collection.id).unwrap().archived);
    }

    #[tokio::test]
    async fn test_archive_unknown_collection() {
        let f = setup().await;
        let err = ArchiveCollection::new(CollectionId::new(404).unwrap())
            .execute(&f.ctx, &Actor::superuser())
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionsError::NotFound { id: 404 }));
    }
}
