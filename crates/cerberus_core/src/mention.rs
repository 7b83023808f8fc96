//! Limited mention targets.

use crate::RoleRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A mention that members below the authorization threshold may not invoke.
///
/// Covers concrete roles and the synthetic `@everyone`/`@here` targets,
/// which have no role id of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionTarget {
    /// The `@everyone` mention.
    Everyone,
    /// The `@here` mention.
    Here,
    /// A specific role mention.
    Role(RoleRef),
}

impl fmt::Display for MentionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Everyone => write!(f, "@everyone"),
            Self::Here => write!(f, "@here"),
            Self::Role(role) => write!(f, "role {role}"),
        }
    }
}
