//! Collaborator seams for the items living inside collections.
//!
//! Cards, dashboards, and pulses are owned by surrounding stores; the
//! engine only needs to enumerate them by collection and flag them archived
//! when their collection is archived. Alerts hang off cards; archiving a
//! card cancels its alerts and notifies the owners. Both seams are traits
//! so embedders plug in their real stores; the in-memory implementations
//! back tests and small deployments.

use crate::error::Result;
use crate::types::{CollectionId, ItemId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// The kinds of items a collection can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemModel {
    Card,
    Dashboard,
    Pulse,
}

impl ItemModel {
    pub const ALL: [ItemModel; 3] = [ItemModel::Card, ItemModel::Dashboard, ItemModel::Pulse];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Dashboard => "dashboard",
            Self::Pulse => "pulse",
        }
    }
}

impl std::fmt::Display for ItemModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An alert cancelled as a side effect of archiving, with the owner that
/// was notified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelledAlert {
    pub card: ItemId,
    pub owner: String,
}

/// Lookup and archival of the items inside collections.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Ids of all items of one model currently filed in the collection.
    async fn list_by_collection(
        &self,
        model: ItemModel,
        collection: CollectionId,
    ) -> Result<Vec<ItemId>>;

    /// Flag the given items archived. Unknown ids are ignored.
    async fn mark_archived(&self, model: ItemModel, items: &[ItemId]) -> Result<()>;
}

/// Cancellation of alerts attached to archived cards.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// Cancel every alert on the given cards and notify the owners.
    /// Returns one record per cancelled alert.
    async fn cancel_alerts_for_cards(&self, cards: &[ItemId]) -> Result<Vec<CancelledAlert>>;
}

#[derive(Debug, Clone)]
struct StoredItem {
    id: ItemId,
    collection: CollectionId,
    archived: bool,
}

/// Item store backed by process memory. Used by tests and by embedders
/// that have no durable item storage of their own.
#[derive(Default)]
pub struct InMemoryItemStore {
    items: Mutex<BTreeMap<ItemModel, Vec<StoredItem>>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// File an item into a collection.
    pub async fn seed(&self, model: ItemModel, id: ItemId, collection: CollectionId) {
        self.items
            .lock()
            .await
            .entry(model)
            .or_default()
            .push(StoredItem {
                id,
                collection,
                archived: false,
            });
    }

    /// Whether the given item has been flagged archived.
    pub async fn is_archived(&self, model: ItemModel, id: ItemId) -> bool {
        self.items
            .lock()
            .await
            .get(&model)
            .map(|items| items.iter().any(|i| i.id == id && i.archived))
            .unwrap_or(false)
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn list_by_collection(
        &self,
        model: ItemModel,
        collection: CollectionId,
    ) -> Result<Vec<ItemId>> {
        Ok(self
            .items
            .lock()
            .await
            .get(&model)
            .map(|items| {
                items
                    .iter()
                    .filter(|i| i.collection == collection)
                    .map(|i| i.id)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn mark_archived(&self, model: ItemModel, to_archive: &[ItemId]) -> Result<()> {
        if let Some(items) = self.items.lock().await.get_mut(&model) {
            for item in items.iter_mut() {
                if to_archive.contains(&item.id) {
                    item.archived = true;
                }
            }
        }
        Ok(())
    }
}

/// Alert notifier backed by process memory. Records the cancellations it
/// performed so tests can assert on them.
#[derive(Default)]
pub struct RecordingAlertNotifier {
    alerts: Mutex<BTreeMap<ItemId, Vec<String>>>,
    cancelled: Mutex<Vec<CancelledAlert>>,
}

impl RecordingAlertNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an alert owned by `owner` on the given card.
    pub async fn seed_alert(&self, card: ItemId, owner: impl Into<String>) {
        self.alerts
            .lock()
            .await
            .entry(card)
            .or_default()
            .push(owner.into());
    }

    /// All cancellations performed so far.
    pub async fn cancelled(&self) -> Vec<CancelledAlert> {
        self.cancelled.lock().await.clone()
    }
}

#[async_trait]
impl AlertNotifier for RecordingAlertNotifier {
    async fn cancel_alerts_for_cards(&self, cards: &[ItemId]) -> Result<Vec<CancelledAlert>> {
        let mut alerts = self.alerts.lock().await;
        let mut batch = Vec::new();
        for card in cards {
            if let Some(owners) = alerts.remove(card) {
                for owner in owners {
                    batch.push(CancelledAlert {
                        card: *card,
                        owner,
                    });
                }
            }
        }
        self.cancelled.lock().await.extend(batch.iter().cloned());
        Ok(batch)
    }
}
