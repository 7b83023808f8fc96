//! Authorization resolution.

use cerberus_core::{ActionKind, GuildRef, Principal};
use cerberus_store::GuardStore;
use std::sync::Arc;

/// Decides whether a principal is exempt from enforcement.
///
/// Pure reads against the store; no side effects, safe to call many times
/// per event.
#[derive(Debug, Clone)]
pub struct AuthorizationResolver {
    store: Arc<GuardStore>,
}

impl AuthorizationResolver {
    /// A resolver over the given store.
    pub fn new(store: Arc<GuardStore>) -> Self {
        Self { store }
    }

    /// Whether `principal` is exempt for `kind` within `guild`.
    ///
    /// Trusted operators (global or guild-scoped) are exempt from
    /// everything. Otherwise a grant must exist whose scope is all actions
    /// or contains `kind`. With `kind` omitted, any grant at all counts;
    /// that form serves listing commands, and enforcement call sites always
    /// pass the kind.
    pub fn is_exempt(
        &self,
        guild: GuildRef,
        principal: Principal,
        kind: Option<ActionKind>,
    ) -> bool {
        if self.store.is_operator(principal) || self.store.is_guild_operator(guild, principal) {
            return true;
        }
        match self.store.grant(guild, principal) {
            Some(grant) => match kind {
                Some(kind) => grant.scope.covers(kind),
                None => true,
            },
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cerberus_core::{AuthorizationGrant, GrantScope};

    const GUILD: GuildRef = GuildRef(10);
    const ACTOR: Principal = Principal(20);

    fn resolver(store: GuardStore) -> AuthorizationResolver {
        AuthorizationResolver::new(Arc::new(store))
    }

    #[test]
    fn operators_are_exempt_from_everything() {
        let store = GuardStore::seeded();
        store.add_operator(ACTOR).unwrap();
        let resolver = resolver(store);
        assert!(resolver.is_exempt(GUILD, ACTOR, Some(ActionKind::Ban)));
        assert!(resolver.is_exempt(GuildRef(99), ACTOR, Some(ActionKind::Link)));
        assert!(resolver.is_exempt(GUILD, ACTOR, None));
    }

    #[test]
    fn guild_operator_is_exempt_only_in_that_guild() {
        let store = GuardStore::seeded();
        store.add_guild_operator(GUILD, ACTOR).unwrap();
        let resolver = resolver(store);
        assert!(resolver.is_exempt(GUILD, ACTOR, Some(ActionKind::Ban)));
        assert!(!resolver.is_exempt(GuildRef(99), ACTOR, Some(ActionKind::Ban)));
    }

    #[test]
    fn grant_scope_gates_by_kind() {
        let store = GuardStore::seeded();
        store
            .set_grant(AuthorizationGrant {
                guild: GUILD,
                principal: ACTOR,
                scope: GrantScope::from_kinds([ActionKind::Channel]).unwrap(),
            })
            .unwrap();
        let resolver = resolver(store);
        assert!(resolver.is_exempt(GUILD, ACTOR, Some(ActionKind::Channel)));
        assert!(!resolver.is_exempt(GUILD, ACTOR, Some(ActionKind::Ban)));
        // Any grant satisfies the kind-less form.
        assert!(resolver.is_exempt(GUILD, ACTOR, None));
    }

    #[test]
    fn no_grant_means_no_exemption() {
        let resolver = resolver(GuardStore::seeded());
        assert!(!resolver.is_exempt(GUILD, ACTOR, Some(ActionKind::Ban)));
        assert!(!resolver.is_exempt(GUILD, ACTOR, None));
    }
}
