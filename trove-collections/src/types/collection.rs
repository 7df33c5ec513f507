//! Collection records and parent references.

use crate::error::{CollectionsError, Result};
use crate::types::ids::CollectionId;
use crate::types::location::Location;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A named, permissioned container for cards, dashboards, and pulses.
///
/// Collections form a tree; each record carries its ancestor chain in
/// `location`. Records are never deleted, archiving flags them instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    /// URL-friendly form of the name, refreshed on rename.
    pub slug: String,
    /// Display color, six hex digits with an optional leading '#'.
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub location: Location,
    #[serde(default)]
    pub archived: bool,
    /// Ordering hint among siblings; listings still sort by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
}

impl Collection {
    /// Build a fresh record. The id comes from the catalog's allocator.
    pub(crate) fn new(
        id: CollectionId,
        name: impl Into<String>,
        color: impl Into<String>,
        location: Location,
    ) -> Self {
        let name = name.into();
        Self {
            id,
            slug: slugify(&name),
            name,
            color: color.into(),
            description: None,
            location,
            archived: false,
            position: None,
        }
    }

    pub(crate) fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub(crate) fn with_position(mut self, position: Option<i32>) -> Self {
        self.position = position;
        self
    }

    /// The parent this collection sits under.
    pub fn parent(&self) -> ParentRef {
        match self.location.parent_id() {
            Some(id) => ParentRef::Collection(id),
            None => ParentRef::Root,
        }
    }

    /// Rename, keeping the slug in sync.
    pub(crate) fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.slug = slugify(&self.name);
    }
}

/// Where a collection hangs: directly under the root, or under another
/// collection. Serialized as a nullable collection id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParentRef {
    #[default]
    Root,
    Collection(CollectionId),
}

impl ParentRef {
    pub fn as_option(&self) -> Option<CollectionId> {
        match self {
            Self::Root => None,
            Self::Collection(id) => Some(*id),
        }
    }
}

impl From<Option<CollectionId>> for ParentRef {
    fn from(id: Option<CollectionId>) -> Self {
        match id {
            Some(id) => Self::Collection(id),
            None => Self::Root,
        }
    }
}

impl Serialize for ParentRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.as_option().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ParentRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Option::<CollectionId>::deserialize(deserializer)?.into())
    }
}

/// Partial update for a collection. `None` leaves a field untouched; the
/// nested options distinguish "clear" from "don't change".
#[derive(Debug, Clone, Default)]
pub struct CollectionPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub description: Option<Option<String>>,
    pub archived: Option<bool>,
    pub position: Option<Option<i32>>,
}

impl CollectionPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.color.is_none()
            && self.description.is_none()
            && self.archived.is_none()
            && self.position.is_none()
    }
}

/// Validate a collection name: non-blank after trimming.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CollectionsError::validation(
            "collection name must not be blank",
        ));
    }
    Ok(())
}

/// Validate a display color: six hex digits, optional leading '#'.
pub fn validate_color(color: &str) -> Result<()> {
    let digits = color.strip_prefix('#').unwrap_or(color);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CollectionsError::validation(format!(
            "color must be 6 hex digits with an optional leading '#', got {color:?}"
        )));
    }
    Ok(())
}

/// Derive the URL slug for a name: lowercase alphanumeric runs joined by
/// single underscores.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_separator = true;
        }
    }
    slug
}
