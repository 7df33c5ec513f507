//! CreateCollection command

use crate::context::CollectionsContext;
use crate::error::{CollectionsError, Result};
use crate::ops::Execute;
use crate::permissions::AccessGate;
use crate::types::{
    validate_color, validate_name, ActivityEntry, Actor, Collection, Location, ParentRef,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Create a new collection under the root or under another collection
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCollection {
    /// The collection name (required, non-blank)
    pub name: String,
    /// Display color, six hex digits with an optional leading '#'
    pub color: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// Where to create the collection; defaults to the root
    #[serde(default)]
    pub parent: ParentRef,
    /// Ordering hint among siblings
    pub position: Option<i32>,
}

impl CreateCollection {
    /// Create a new CreateCollection command at the root
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            description: None,
            parent: ParentRef::Root,
            position: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the parent
    pub fn with_parent(mut self, parent: ParentRef) -> Self {
        self.parent = parent;
        self
    }

    /// Set the position hint
    pub fn with_position(mut self, position: i32) -> Self {
        self.position = Some(position);
        self
    }
}

#[async_trait]
impl Execute for CreateCollection {
    type Output = Collection;

    async fn execute(&self, ctx: &CollectionsContext, actor: &Actor) -> Result<Collection> {
        let started = Instant::now();

        validate_name(&self.name)?;
        validate_color(&self.color)?;

        let _lock = ctx.lock().await?;
        let mut catalog = ctx.read_catalog().await?;
        let graph = ctx.read_graph().await?;

        let gate = AccessGate::new(&graph, actor);
        gate.require_write(self.parent.into())?;

        let location = match self.parent {
            ParentRef::Root => Location::root(),
            ParentRef::Collection(parent_id) => {
                let parent = catalog.get(parent_id)?;
                if parent.archived {
                    return Err(CollectionsError::validation(format!(
                        "cannot create a collection under archived collection {parent_id}"
                    )));
                }
                parent.location.child_location(parent_id)
            }
        };

        let id = catalog.allocate_id();
        let collection = Collection::new(id, &self.name, &self.color, location)
            .with_description(self.description.clone())
            .with_position(self.position);
        catalog.put(collection.clone());
        ctx.write_catalog(&catalog).await?;

        let entry = ActivityEntry::new(
            "create collection",
            serde_json::to_value(self)?,
            serde_json::to_value(&collection)?,
            started.elapsed().as_millis() as u64,
        )
        .with_actor(actor.name.clone());
        ctx.append_activity(&entry).await?;

        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CollectionKey, Grant, GraphDoc, GroupId, PermissionLevel};
    use tempfile::TempDir;

    async fn setup() -> (TempDir, CollectionsContext) {
        let temp = TempDir::new().unwrap();
        let ctx = CollectionsContext::new(temp.path().join(".trove"));
        ctx.create_directories().await.unwrap();
        (temp, ctx)
    }

    fn gid(raw: i64) -> GroupId {
        GroupId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn test_create_at_root() {
        let (_temp, ctx) = setup().await;

        let collection = CreateCollection::new("Quarterly Reports", "#509EE3")
            .with_description("Finance dashboards")
            .execute(&ctx, &Actor::superuser())
            .await
            .unwrap();

        assert_eq!(collection.id.as_i64(), 1);
        assert_eq!(collection.slug, "quarterly_reports");
        assert!(collection.location.is_root());
        assert_eq!(collection.description.as_deref(), Some("Finance dashboards"));

        // Persisted and visible to a fresh read
        let catalog = ctx.read_catalog().await.unwrap();
        assert_eq!(catalog.get(collection.id).unwrap().name, "Quarterly Reports");

        // Activity recorded
        let activity = ctx.read_activity(None).await.unwrap();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].op, "create collection");
    }

    #[tokio::test]
    async fn test_root_create_requires_superuser() {
        let (_temp, ctx) = setup().await;

        let err = CreateCollection::new("Nope", "509EE3")
            .execute(&ctx, &Actor::with_groups([gid(1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionsError::PermissionDenied { .. }));

        let catalog = ctx.read_catalog().await.unwrap();
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_create_nested_extends_location() {
        let (_temp, ctx) = setup().await;
        let admin = Actor::superuser();

        let parent = CreateCollection::new("Parent", "509EE3")
            .execute(&ctx, &admin)
            .await
            .unwrap();
        let child = CreateCollection::new("Child", "509EE3")
            .with_parent(ParentRef::Collection(parent.id))
            .execute(&ctx, &admin)
            .await
            .unwrap();

        assert_eq!(child.location.to_string(), format!("/{}/", parent.id));
        assert_eq!(child.parent(), ParentRef::Collection(parent.id));
    }

    #[tokio::test]
    async fn test_member_creates_under_writable_parent() {
        let (_temp, ctx) = setup().await;
        let admin = Actor::superuser();

        let parent = CreateCollection::new("Team Space", "509EE3")
            .execute(&ctx, &admin)
            .await
            .unwrap();
        ctx.write_graph(&GraphDoc {
            revision: 1,
            grants: vec![Grant {
                group: gid(1),
                collection: CollectionKey::Id(parent.id),
                level: PermissionLevel::Write,
            }],
        })
        .await
        .unwrap();

        let member = Actor::with_groups([gid(1)]);
        let child = CreateCollection::new("Sprint 12", "509EE3")
            .with_parent(ParentRef::Collection(parent.id))
            .execute(&ctx, &member)
            .await
            .unwrap();
        assert_eq!(child.location.parent_id(), Some(parent.id));

        // Read access on the parent is not enough to create inside it.
        ctx.write_graph(&GraphDoc {
            revision: 2,
            grants: vec![Grant {
                group: gid(2),
                collection: CollectionKey::Id(parent.id),
                level: PermissionLevel::Read,
            }],
        })
        .await
        .unwrap();
        let reader = Actor::with_groups([gid(2)]);
        let err = CreateCollection::new("Sprint 13", "509EE3")
            .with_parent(ParentRef::Collection(parent.id))
            .execute(&ctx, &reader)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionsError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_validation_failures() {
        let (_temp, ctx) = setup().await;
        let admin = Actor::superuser();

        assert!(CreateCollection::new("  ", "509EE3")
            .execute(&ctx, &admin)
            .await
            .is_err());
        assert!(CreateCollection::new("Name", "teal")
            .execute(&ctx, &admin)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_missing_parent_is_not_found() {
        let (_temp, ctx) = setup().await;

        let err = CreateCollection::new("Orphan", "509EE3")
            .with_parent(ParentRef::Collection(
                crate::types::CollectionId::new(99).unwrap(),
            ))
            .execute(&ctx, &Actor::superuser())
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionsError::NotFound { id: 99 }));
    }

    #[tokio::test]
    async fn test_archived_parent_rejected() {
        let (_temp, ctx) = setup().await;
        let admin = Actor::superuser();

        let parent = CreateCollection::new("Old", "509EE3")
            .execute(&ctx, &admin)
            .await
            .unwrap();
        let mut catalog = ctx.read_catalog().await.unwrap();
        catalog
            .apply(
                parent.id,
                &crate::types::CollectionPatch {
                    archived: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        ctx.write_catalog(&catalog).await.unwrap();

        let err = CreateCollection::new("Child", "509EE3")
            .with_parent(ParentRef::Collection(parent.id))
            .execute(&ctx, &admin)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionsError::Validation { .. }));
    }
}
