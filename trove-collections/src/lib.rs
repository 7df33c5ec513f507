//! Collection hierarchy engine with file-backed storage
//!
//! This crate manages a tree of named, permissioned collections that hold
//! cards, dashboards, and pulses. State lives as YAML files in a `.trove`
//! directory: the whole catalog in one document, so multi-record rewrites
//! (moving a subtree) commit in a single atomic rename.
//!
//! ## Overview
//!
//! - **Materialized paths** - Each record stores its ancestor chain, so
//!   reads never recurse; a move rewrites the subtree's prefixes in one pass
//! - **Permission graph** - Per-group levels (`none` < `read` < `write`)
//!   over collections plus the root pseudo-collection, replaced wholesale
//! - **Explicit actors** - Every command takes the acting identity as a
//!   parameter; there is no ambient current user
//! - **Single mutation path** - Writers serialize through an advisory file
//!   lock; readers go straight to the state files
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use trove_collections::{
//!     Actor, CollectionsContext, CreateCollection, Execute, MoveCollection, ParentRef,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = CollectionsContext::new("/path/to/repo/.trove");
//! let admin = Actor::superuser().named("admin");
//!
//! let reports = CreateCollection::new("Reports", "509EE3")
//!     .with_description("Quarterly numbers")
//!     .execute(&ctx, &admin)
//!     .await?;
//!
//! let q3 = CreateCollection::new("Q3", "509EE3")
//!     .with_parent(ParentRef::Collection(reports.id))
//!     .execute(&ctx, &admin)
//!     .await?;
//!
//! // Promote Q3 to the top level; any children follow along.
//! MoveCollection::new(q3.id).execute(&ctx, &admin).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Storage Structure
//!
//! ```text
//! repo/
//! └── .trove/
//!     ├── catalog.yaml         # All collection records + id allocator
//!     ├── permissions.yaml     # Sparse permission rows + revision
//!     ├── .lock                # Advisory lock serializing mutations
//!     └── activity/
//!         └── current.jsonl    # Operation log (one JSON object per line)
//! ```

mod catalog;
mod context;
mod error;
mod ops;
pub mod types;

// Command modules
pub mod collection;
pub mod permissions;

// Collaborator seams
pub mod items;

pub use catalog::Catalog;
pub use context::{CollectionsContext, CollectionsLock};
pub use error::{CollectionsError, Result};
pub use ops::Execute;

// Re-export commonly used types
pub use collection::{
    ArchiveCollection, ArchiveOutcome, CollectionView, CreateCollection, GetCollection,
    GetRootCollection, ListCollections, MoveCollection, UpdateCollection,
};
pub use items::{
    AlertNotifier, CancelledAlert, InMemoryItemStore, ItemModel, ItemStore, RecordingAlertNotifier,
};
pub use permissions::{AccessGate, GetPermissionGraph, ReplacePermissionGraph};
pub use types::{
    ActivityEntry, Actor, Collection, CollectionId, CollectionKey, CollectionPatch, Grant,
    GraphDoc, GraphUpdate, GroupId, ItemId, Location, ParentRef, PermissionGraph, PermissionLevel,
};
