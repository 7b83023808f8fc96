//! Tests for the configuration store.

use cerberus_core::{
    ActionKind, AuthorizationGrant, ChannelRef, DurationToken, GrantScope, GuildRef, GuildSnapshot,
    MentionTarget, Principal, RoleRef, Sanction, SanctionPolicy, ThresholdPolicy,
};
use cerberus_store::{GuardStore, ReportStream, StoreDocument};
use chrono::{Duration, Utc};

fn guild() -> GuildRef {
    GuildRef(100)
}

fn principal() -> Principal {
    Principal(7)
}

#[test]
fn seeded_defaults_cover_the_rate_limited_kinds() {
    let store = GuardStore::seeded();
    for kind in [
        ActionKind::VoiceDisconnect,
        ActionKind::Ban,
        ActionKind::Role,
        ActionKind::Channel,
        ActionKind::Ping,
        ActionKind::Profile,
    ] {
        assert!(store.threshold(guild(), kind).is_some(), "kind {kind}");
        assert!(store.sanction(kind).is_some(), "kind {kind}");
    }
    // Link and bot-add carry sanctions but no rate threshold.
    assert!(store.threshold(guild(), ActionKind::Link).is_none());
    assert_eq!(
        store.sanction(ActionKind::Ban).map(|p| p.sanction),
        Some(Sanction::Ban)
    );
    assert_eq!(
        store.sanction(ActionKind::BotAdd).map(|p| p.sanction),
        Some(Sanction::Kick)
    );
}

#[test]
fn regrant_replaces_scope() {
    let store = GuardStore::seeded();
    let first = AuthorizationGrant {
        guild: guild(),
        principal: principal(),
        scope: GrantScope::from_kinds([ActionKind::Channel]).unwrap(),
    };
    let second = AuthorizationGrant {
        guild: guild(),
        principal: principal(),
        scope: GrantScope::from_kinds([ActionKind::Ban]).unwrap(),
    };
    store.set_grant(first).unwrap();
    store.set_grant(second.clone()).unwrap();

    let held = store.grant(guild(), principal()).unwrap();
    assert_eq!(held, second);
    assert!(!held.scope.covers(ActionKind::Channel));
}

#[test]
fn widen_grant_unions_scopes() {
    let store = GuardStore::seeded();
    store
        .set_grant(AuthorizationGrant {
            guild: guild(),
            principal: principal(),
            scope: GrantScope::from_kinds([ActionKind::Channel]).unwrap(),
        })
        .unwrap();
    store
        .widen_grant(
            guild(),
            principal(),
            GrantScope::from_kinds([ActionKind::Ban]).unwrap(),
        )
        .unwrap();

    let held = store.grant(guild(), principal()).unwrap();
    assert!(held.scope.covers(ActionKind::Channel));
    assert!(held.scope.covers(ActionKind::Ban));
}

#[test]
fn guild_threshold_overrides_global() {
    let store = GuardStore::seeded();
    let tight = ThresholdPolicy::new(1, DurationToken::parse("5s").unwrap()).unwrap();
    store
        .set_threshold(Some(guild()), ActionKind::Channel, tight)
        .unwrap();

    assert_eq!(store.threshold(guild(), ActionKind::Channel), Some(tight));
    // Other guilds still see the global default.
    let other = GuildRef(200);
    assert_ne!(store.threshold(other, ActionKind::Channel), Some(tight));

    store
        .clear_threshold(Some(guild()), ActionKind::Channel)
        .unwrap();
    assert_eq!(
        store.threshold(guild(), ActionKind::Channel),
        store.threshold(other, ActionKind::Channel)
    );
}

#[test]
fn clearing_global_threshold_disables_escalation() {
    let store = GuardStore::seeded();
    store.clear_threshold(None, ActionKind::Ban).unwrap();
    assert!(store.threshold(guild(), ActionKind::Ban).is_none());
}

#[test]
fn module_switch_grace_rule() {
    let store = GuardStore::seeded();
    let grace = Duration::seconds(60);
    let now = Utc::now();

    assert!(!store.module_active(ActionKind::Ban, grace, now));
    store.enable_module(ActionKind::Ban).unwrap();
    assert!(store.module_active(ActionKind::Ban, grace, now));

    store.disable_module(ActionKind::Ban, now).unwrap();
    assert!(!store.module_active(ActionKind::Ban, grace, now));
    assert!(store.module_active(ActionKind::Ban, grace, now + Duration::seconds(61)));
}

#[test]
fn capture_is_idempotent_in_value() {
    let store = GuardStore::seeded();
    let snapshot = GuildSnapshot::builder()
        .guild(guild())
        .name("Alpha")
        .verification_level(2)
        .captured_at(Utc::now())
        .build();

    store.capture(snapshot.clone()).unwrap();
    store.capture(snapshot.clone()).unwrap();
    assert_eq!(store.snapshot(guild()), Some(snapshot));
}

#[test]
fn export_then_import_reproduces_the_record_set() {
    let store = GuardStore::seeded();
    store
        .set_grant(AuthorizationGrant {
            guild: guild(),
            principal: principal(),
            scope: GrantScope::All,
        })
        .unwrap();
    store.add_operator(Principal(1)).unwrap();
    store.add_guild_operator(guild(), Principal(2)).unwrap();
    store.add_limited_role(RoleRef(55), "staff").unwrap();
    store.add_limited_mention(MentionTarget::Everyone).unwrap();
    store
        .add_limited_mention(MentionTarget::Role(RoleRef(55)))
        .unwrap();
    store
        .set_sanction(ActionKind::Link, SanctionPolicy::of(Sanction::Kick))
        .unwrap();
    store
        .set_report_channel(guild(), ReportStream::Moderation, ChannelRef(900))
        .unwrap();
    store.enable_module(ActionKind::Link).unwrap();

    let exported = store.export();

    let fresh = GuardStore::seeded();
    fresh.import(exported.clone()).unwrap();
    assert_eq!(fresh.export(), exported);

    // Import fully replaces prior state, not merges.
    let empty = GuardStore::from_document(StoreDocument::default());
    assert!(empty.grant(guild(), principal()).is_none());
    empty.import(exported).unwrap();
    assert!(empty.grant(guild(), principal()).is_some());
    assert!(empty.is_limited_role(RoleRef(55)));
    assert_eq!(
        empty.report_channel(guild(), ReportStream::Moderation),
        Some(ChannelRef(900))
    );
}

#[test]
fn document_survives_json_round_trip() {
    let store = GuardStore::seeded();
    store
        .set_grant(AuthorizationGrant {
            guild: guild(),
            principal: principal(),
            scope: GrantScope::from_kinds([ActionKind::Profile]).unwrap(),
        })
        .unwrap();
    store
        .set_report_channel(guild(), ReportStream::Operator, ChannelRef(901))
        .unwrap();

    let exported = store.export();
    let raw = serde_json::to_string(&exported).unwrap();
    let parsed: StoreDocument = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed, exported);
}

#[test]
fn open_persists_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("guard.json");

    {
        let store = GuardStore::open(&path).unwrap();
        store.add_operator(Principal(42)).unwrap();
        store
            .add_limited_mention(MentionTarget::Here)
            .unwrap();
    }

    let reopened = GuardStore::open(&path).unwrap();
    assert!(reopened.is_operator(Principal(42)));
    assert!(reopened.is_limited_mention(MentionTarget::Here));
}
