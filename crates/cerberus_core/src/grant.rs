//! Authorization grants (whitelist entries).

use crate::{ActionKind, GuildRef, Principal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The action kinds a grant exempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrantScope {
    /// Exempt from enforcement for every action kind.
    All,
    /// Exempt for a non-empty set of action kinds.
    Actions(BTreeSet<ActionKind>),
}

impl GrantScope {
    /// Build a scope from a list of kinds.
    ///
    /// Returns `None` for an empty list; a grant must cover something.
    pub fn from_kinds(kinds: impl IntoIterator<Item = ActionKind>) -> Option<Self> {
        let set: BTreeSet<ActionKind> = kinds.into_iter().collect();
        if set.is_empty() { None } else { Some(Self::Actions(set)) }
    }

    /// Whether this scope covers the given action kind.
    pub fn covers(&self, kind: ActionKind) -> bool {
        match self {
            Self::All => true,
            Self::Actions(set) => set.contains(&kind),
        }
    }

    /// Union with another scope.
    ///
    /// Merging is always explicit: re-granting replaces a scope, and callers
    /// that want to widen an existing grant call this first.
    pub fn union(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::All, _) | (_, Self::All) => Self::All,
            (Self::Actions(a), Self::Actions(b)) => Self::Actions(a.union(b).copied().collect()),
        }
    }
}

/// A scoped exemption for a principal within a guild.
///
/// At most one grant exists per (guild, principal); setting a new grant
/// replaces the previous scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationGrant {
    /// Guild the grant is scoped to.
    pub guild: GuildRef,
    /// Exempted principal.
    pub principal: Principal,
    /// Action kinds the grant covers.
    pub scope: GrantScope,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scope_is_rejected() {
        assert!(GrantScope::from_kinds([]).is_none());
    }

    #[test]
    fn all_covers_everything() {
        assert!(GrantScope::All.covers(ActionKind::Ban));
        assert!(GrantScope::All.covers(ActionKind::Link));
    }

    #[test]
    fn action_scope_covers_only_its_kinds() {
        let scope = GrantScope::from_kinds([ActionKind::Channel, ActionKind::Role]).unwrap();
        assert!(scope.covers(ActionKind::Channel));
        assert!(!scope.covers(ActionKind::Ban));
    }

    #[test]
    fn union_widens() {
        let a = GrantScope::from_kinds([ActionKind::Channel]).unwrap();
        let b = GrantScope::from_kinds([ActionKind::Ban]).unwrap();
        let merged = a.union(&b);
        assert!(merged.covers(ActionKind::Channel));
        assert!(merged.covers(ActionKind::Ban));
        assert_eq!(a.union(&GrantScope::All), GrantScope::All);
    }
}
