//! The acting identity every operation receives explicitly.

use crate::types::ids::GroupId;
use std::collections::BTreeSet;

/// Who is performing an operation: group memberships plus the superuser
/// flag. Superusers bypass the permission graph entirely. There is no
/// ambient actor; callers pass one to every command.
#[derive(Debug, Clone, Default)]
pub struct Actor {
    /// Display label recorded in the activity log.
    pub name: Option<String>,
    pub groups: BTreeSet<GroupId>,
    pub superuser: bool,
}

impl Actor {
    /// An actor with the given group memberships and no special powers.
    pub fn with_groups(groups: impl IntoIterator<Item = GroupId>) -> Self {
        Self {
            name: None,
            groups: groups.into_iter().collect(),
            superuser: false,
        }
    }

    /// An actor that bypasses all permission checks.
    pub fn superuser() -> Self {
        Self {
            name: None,
            groups: BTreeSet::new(),
            superuser: true,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn in_group(&self, group: GroupId) -> bool {
        self.groups.contains(&group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_groups() {
        let g1 = GroupId::new(1).unwrap();
        let g2 = GroupId::new(2).unwrap();
        let actor = Actor::with_groups([g1, g2]).named("alice");
        assert!(actor.in_group(g1));
        assert!(!actor.superuser);
        assert_eq!(actor.name.as_deref(), Some("alice"));
    }

    #[test]
    fn test_superuser() {
        let actor = Actor::superuser();
        assert!(actor.superuser);
        assert!(actor.groups.is_empty());
    }
}
