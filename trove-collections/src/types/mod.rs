//! Core types for the collections engine

mod actor;
mod collection;
mod ids;
mod location;
mod log;
mod permission;

// Re-export all types
pub use actor::Actor;
pub use collection::{
    slugify, validate_color, validate_name, Collection, CollectionPatch, ParentRef,
};
pub use ids::{ActivityEntryId, CollectionId, GroupId, ItemId};
pub use location::Location;
pub use log::ActivityEntry;
pub use permission::{
    CollectionKey, Grant, GraphDoc, GraphUpdate, PermissionGraph, PermissionLevel,
};
