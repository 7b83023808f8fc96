//! Pipeline tests against mock collaborators.
//!
//! Each mock records what the engine asked of it; no live platform
//! connection is involved.

use async_trait::async_trait;
use cerberus_core::{
    ActionKind, AssetSlot, AuthorizationGrant, ChannelRef, DurationToken, GrantScope, GuildRef,
    MessageRef, MentionTarget, Principal, RoleRef, Sanction, SanctionPolicy, ThresholdPolicy,
};
use cerberus_engine::{
    AssetStore, AuditEntry, AuditProbe, AuditQuery, ChannelState, EnforcementReport, GuardEngine,
    GuardOptions, LiveProfile, MessageEvent, MutationApi, Notifier, ProfileRestore,
};
use cerberus_error::{EngineError, EngineErrorKind, EngineResult};
use cerberus_store::{GuardStore, ReportStream};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const GUILD: GuildRef = GuildRef(1000);
const ACTOR: Principal = Principal(77);

/// One platform call the engine issued.
#[derive(Debug, Clone, PartialEq)]
enum Call {
    DeleteChannel(ChannelRef),
    DeleteRole(RoleRef),
    EditChannel(ChannelRef, ChannelState),
    EditRolePermissions(RoleRef, u64),
    EditGuild(ProfileRestore),
    Kick(Principal),
    Ban(Principal),
    Timeout(Principal, Duration),
    StripRoles(Principal),
    RemoveRole(Principal, RoleRef),
    DeleteMessage(MessageRef),
    Notice(ChannelRef),
}

#[derive(Default)]
struct MockMutations {
    calls: Mutex<Vec<Call>>,
    reject: Mutex<bool>,
}

impl MockMutations {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn reject_everything(&self) {
        *self.reject.lock() = true;
    }

    fn push(&self, call: Call) -> EngineResult<()> {
        self.calls.lock().push(call);
        if *self.reject.lock() {
            return Err(EngineError::new(EngineErrorKind::MutationRejected {
                operation: "mock".into(),
                reason: "rejected by test".into(),
            }));
        }
        Ok(())
    }
}

#[async_trait]
impl MutationApi for MockMutations {
    async fn delete_channel(
        &self,
        _guild: GuildRef,
        channel: ChannelRef,
        _reason: &str,
    ) -> EngineResult<()> {
        self.push(Call::DeleteChannel(channel))
    }

    async fn delete_role(
        &self,
        _guild: GuildRef,
        role: RoleRef,
        _reason: &str,
    ) -> EngineResult<()> {
        self.push(Call::DeleteRole(role))
    }

    async fn edit_channel(
        &self,
        _guild: GuildRef,
        channel: ChannelRef,
        state: &ChannelState,
    ) -> EngineResult<()> {
        self.push(Call::EditChannel(channel, state.clone()))
    }

    async fn edit_role_permissions(
        &self,
        _guild: GuildRef,
        role: RoleRef,
        permissions: u64,
    ) -> EngineResult<()> {
        self.push(Call::EditRolePermissions(role, permissions))
    }

    async fn edit_guild(&self, _guild: GuildRef, restore: &ProfileRestore) -> EngineResult<()> {
        self.push(Call::EditGuild(restore.clone()))
    }

    async fn kick_member(
        &self,
        _guild: GuildRef,
        principal: Principal,
        _reason: &str,
    ) -> EngineResult<()> {
        self.push(Call::Kick(principal))
    }

    async fn ban_member(
        &self,
        _guild: GuildRef,
        principal: Principal,
        _reason: &str,
    ) -> EngineResult<()> {
        self.push(Call::Ban(principal))
    }

    async fn timeout_member(
        &self,
        _guild: GuildRef,
        principal: Principal,
        duration: Duration,
        _reason: &str,
    ) -> EngineResult<()> {
        self.push(Call::Timeout(principal, duration))
    }

    async fn strip_roles(
        &self,
        _guild: GuildRef,
        principal: Principal,
        _reason: &str,
    ) -> EngineResult<()> {
        self.push(Call::StripRoles(principal))
    }

    async fn remove_role(
        &self,
        _guild: GuildRef,
        principal: Principal,
        role: RoleRef,
        _reason: &str,
    ) -> EngineResult<()> {
        self.push(Call::RemoveRole(principal, role))
    }

    async fn delete_message(
        &self,
        _channel: ChannelRef,
        message: MessageRef,
    ) -> EngineResult<()> {
        self.push(Call::DeleteMessage(message))
    }

    async fn send_channel_notice(&self, channel: ChannelRef, _text: &str) -> EngineResult<()> {
        self.push(Call::Notice(channel))
    }
}

#[derive(Default)]
struct MockAudit {
    entries: Mutex<HashMap<AuditProbe, Vec<AuditEntry>>>,
}

impl MockAudit {
    fn set(&self, probe: AuditProbe, actor: Principal, target: Option<u64>) {
        self.entries.lock().insert(
            probe,
            vec![AuditEntry {
                actor,
                target,
                observed_at: Utc::now(),
            }],
        );
    }
}

#[async_trait]
impl AuditQuery for MockAudit {
    async fn query(
        &self,
        _guild: GuildRef,
        probe: AuditProbe,
        _limit: u8,
    ) -> EngineResult<Vec<AuditEntry>> {
        Ok(self.entries.lock().get(&probe).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct MockAssets {
    blobs: Mutex<HashMap<(GuildRef, AssetSlot), Vec<u8>>>,
}

#[async_trait]
impl AssetStore for MockAssets {
    async fn backup(&self, guild: GuildRef, slot: AssetSlot, url: &str) -> EngineResult<()> {
        self.blobs
            .lock()
            .insert((guild, slot), url.as_bytes().to_vec());
        Ok(())
    }

    async fn retrieve(&self, guild: GuildRef, slot: AssetSlot) -> EngineResult<Option<Vec<u8>>> {
        Ok(self.blobs.lock().get(&(guild, slot)).cloned())
    }
}

#[derive(Default)]
struct MockNotifier {
    dms: Mutex<Vec<String>>,
    reports: Mutex<Vec<(ReportStream, EnforcementReport)>>,
}

impl MockNotifier {
    fn reports(&self) -> Vec<(ReportStream, EnforcementReport)> {
        self.reports.lock().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify_operators(&self, text: &str) {
        self.dms.lock().push(text.to_string());
    }

    async fn report(&self, stream: ReportStream, report: &EnforcementReport) {
        self.reports.lock().push((stream, report.clone()));
    }
}

struct Harness {
    store: Arc<GuardStore>,
    audit: Arc<MockAudit>,
    mutations: Arc<MockMutations>,
    notifier: Arc<MockNotifier>,
    engine: GuardEngine,
}

fn harness() -> Harness {
    let store = Arc::new(GuardStore::seeded());
    let audit = Arc::new(MockAudit::default());
    let mutations = Arc::new(MockMutations::default());
    let assets = Arc::new(MockAssets::default());
    let notifier = Arc::new(MockNotifier::default());
    let engine = GuardEngine::new(
        Arc::clone(&store),
        Arc::clone(&audit) as Arc<dyn AuditQuery>,
        Arc::clone(&mutations) as Arc<dyn MutationApi>,
        assets as Arc<dyn AssetStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        GuardOptions::default(),
    );
    Harness {
        store,
        audit,
        mutations,
        notifier,
        engine,
    }
}

fn message(content: &str) -> MessageEvent {
    MessageEvent {
        guild: GUILD,
        channel: ChannelRef(5),
        message: MessageRef(6),
        author: ACTOR,
        author_is_bot: false,
        content: content.to_string(),
        mentions_everyone: false,
        role_mentions: Vec::new(),
    }
}

/// Scenario A: first unauthorized channel creation is deleted immediately
/// but not yet sanctioned under a threshold of two.
#[tokio::test]
async fn first_unauthorized_channel_creation_is_deleted_without_sanction() {
    let h = harness();
    h.store.enable_module(ActionKind::Channel).unwrap();
    h.audit
        .set(AuditProbe::ChannelCreate, ACTOR, Some(42));

    h.engine.on_channel_created(GUILD, ChannelRef(42), "raid").await;

    assert_eq!(h.mutations.calls(), vec![Call::DeleteChannel(ChannelRef(42))]);
    assert!(h.notifier.reports().is_empty());
}

/// Scenario B: the second creation within the window meets the default
/// threshold of two and strips the creator's roles.
#[tokio::test]
async fn second_unauthorized_channel_creation_escalates() {
    let h = harness();
    h.store.enable_module(ActionKind::Channel).unwrap();
    h.audit.set(AuditProbe::ChannelCreate, ACTOR, Some(42));
    h.engine.on_channel_created(GUILD, ChannelRef(42), "raid").await;

    h.audit.set(AuditProbe::ChannelCreate, ACTOR, Some(43));
    h.engine.on_channel_created(GUILD, ChannelRef(43), "raid-2").await;

    assert_eq!(
        h.mutations.calls(),
        vec![
            Call::DeleteChannel(ChannelRef(42)),
            Call::DeleteChannel(ChannelRef(43)),
            Call::StripRoles(ACTOR),
        ]
    );

    let reports = h.notifier.reports();
    assert_eq!(reports.len(), 1);
    let (stream, report) = &reports[0];
    assert_eq!(*stream, ReportStream::Operator);
    assert_eq!(*report.action(), ActionKind::Channel);
    assert_eq!(*report.sanction(), Some(Sanction::StripRoles));
    assert_eq!(*report.count(), Some(2));
}

/// Exempt principals are never reverted or sanctioned, regardless of rate.
#[tokio::test]
async fn granted_principal_is_left_alone() {
    let h = harness();
    h.store.enable_module(ActionKind::Channel).unwrap();
    h.store
        .set_grant(AuthorizationGrant {
            guild: GUILD,
            principal: ACTOR,
            scope: GrantScope::from_kinds([ActionKind::Channel]).unwrap(),
        })
        .unwrap();
    h.audit.set(AuditProbe::ChannelCreate, ACTOR, Some(42));

    for id in [42, 43, 44] {
        h.audit.set(AuditProbe::ChannelCreate, ACTOR, Some(id));
        h.engine.on_channel_created(GUILD, ChannelRef(id), "ok").await;
    }

    assert!(h.mutations.calls().is_empty());
    assert!(h.notifier.reports().is_empty());
}

/// Scenario C: a profile edit with a snapshot on record restores the
/// snapshot values field by field.
#[tokio::test]
async fn profile_edit_rolls_back_to_snapshot() {
    let h = harness();
    h.store.enable_module(ActionKind::Profile).unwrap();

    let original = LiveProfile {
        guild: GUILD,
        name: "Alpha".into(),
        icon_url: None,
        banner_url: None,
        vanity_code: None,
        verification_level: 2,
    };
    h.engine.on_guild_seen(original).await;

    h.audit.set(AuditProbe::GuildUpdate, ACTOR, None);
    let edited = LiveProfile {
        guild: GUILD,
        name: "Evil".into(),
        icon_url: None,
        banner_url: None,
        vanity_code: None,
        verification_level: 0,
    };
    h.engine.on_guild_updated(edited).await;

    let calls = h.mutations.calls();
    assert_eq!(calls.len(), 1);
    let Call::EditGuild(restore) = &calls[0] else {
        panic!("expected a guild edit, got {calls:?}");
    };
    assert_eq!(restore.name.as_deref(), Some("Alpha"));
    assert_eq!(restore.verification_level, Some(2));
    // The snapshot itself is untouched by the rollback.
    assert_eq!(h.store.snapshot(GUILD).unwrap().name(), "Alpha");
    // Operators hear about the edit.
    assert!(h.notifier.dms.lock().iter().any(|dm| dm.contains("name")));
}

/// Scenario C, first sighting: with no snapshot the post-edit state is
/// captured and nothing is reverted.
#[tokio::test]
async fn profile_edit_without_snapshot_captures_and_skips_revert() {
    let h = harness();
    h.store.enable_module(ActionKind::Profile).unwrap();
    h.audit.set(AuditProbe::GuildUpdate, ACTOR, None);

    let edited = LiveProfile {
        guild: GUILD,
        name: "Evil".into(),
        icon_url: None,
        banner_url: None,
        vanity_code: None,
        verification_level: 0,
    };
    h.engine.on_guild_updated(edited).await;

    assert!(h.mutations.calls().is_empty());
    assert_eq!(h.store.snapshot(GUILD).unwrap().name(), "Evil");
}

/// Scenario D: a warn-class link policy deletes the message but removes
/// nobody; a kick policy also removes the author.
#[tokio::test]
async fn link_guard_honors_warn_versus_kick() {
    let h = harness();
    h.store.enable_module(ActionKind::Link).unwrap();

    h.engine
        .on_message(message("join us https://discord.gg/raidparty"))
        .await;
    assert_eq!(
        h.mutations.calls(),
        vec![Call::DeleteMessage(MessageRef(6)), Call::Notice(ChannelRef(5))]
    );

    h.mutations.calls.lock().clear();
    h.store
        .set_sanction(ActionKind::Link, SanctionPolicy::of(Sanction::Kick))
        .unwrap();
    h.engine
        .on_message(message("discord.gg/raidparty again"))
        .await;
    assert_eq!(
        h.mutations.calls(),
        vec![
            Call::DeleteMessage(MessageRef(6)),
            Call::Notice(ChannelRef(5)),
            Call::Kick(ACTOR),
        ]
    );
}

/// Plain messages pass the link guard untouched.
#[tokio::test]
async fn link_guard_ignores_ordinary_messages() {
    let h = harness();
    h.store.enable_module(ActionKind::Link).unwrap();
    h.engine.on_message(message("nothing to see here")).await;
    assert!(h.mutations.calls().is_empty());
}

/// Scenario E: a ban with no audit entry is not enforced and leaves no
/// trace.
#[tokio::test(start_paused = true)]
async fn unattributed_ban_is_skipped() {
    let h = harness();
    h.store.enable_module(ActionKind::Ban).unwrap();

    h.engine.on_ban(GUILD, Principal(5)).await;

    assert!(h.mutations.calls().is_empty());
    assert!(h.notifier.reports().is_empty());

    // A later attributed ban sees a window count of one, not two: the
    // unattributed event was recorded nowhere.
    h.audit.set(AuditProbe::BanAdd, ACTOR, Some(5));
    h.engine.on_ban(GUILD, Principal(5)).await;
    let reports = h.notifier.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(*reports[0].1.count(), Some(1));
}

/// The default ban threshold of one escalates on the first unauthorized
/// ban, with the configured ban sanction.
#[tokio::test]
async fn unauthorized_ban_escalates_immediately() {
    let h = harness();
    h.store.enable_module(ActionKind::Ban).unwrap();
    h.audit.set(AuditProbe::BanAdd, ACTOR, Some(5));

    h.engine.on_ban(GUILD, Principal(5)).await;

    assert_eq!(h.mutations.calls(), vec![Call::Ban(ACTOR)]);
}

/// Voice-disconnect attribution checks the disconnect probe before the
/// forced-move probe.
#[tokio::test]
async fn voice_drop_prefers_disconnect_attribution() {
    let h = harness();
    h.store.enable_module(ActionKind::VoiceDisconnect).unwrap();
    // Both probes have entries; the disconnect one must win.
    h.audit.set(AuditProbe::MemberDisconnect, ACTOR, Some(9));
    h.audit.set(AuditProbe::MemberMove, Principal(404), Some(9));

    // Threshold for voice-disconnect is three; drive three events.
    for _ in 0..3 {
        h.engine.on_voice_drop(GUILD, Principal(9)).await;
    }

    let reports = h.notifier.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(*reports[0].1.principal(), ACTOR);
    assert!(reports[0].1.deed().contains("disconnected"));
}

/// Channel attribute edits are restored unconditionally, before any
/// threshold is met.
#[tokio::test]
async fn channel_edit_is_restored_unconditionally() {
    let h = harness();
    h.store.enable_module(ActionKind::Channel).unwrap();
    h.audit.set(AuditProbe::ChannelUpdate, ACTOR, Some(42));

    let before = ChannelState {
        name: "general".into(),
        category: None,
        overwrites: Vec::new(),
    };
    let after = ChannelState {
        name: "pwned".into(),
        category: None,
        overwrites: Vec::new(),
    };
    h.engine
        .on_channel_updated(GUILD, ChannelRef(42), before.clone(), after)
        .await;

    assert_eq!(
        h.mutations.calls(),
        vec![Call::EditChannel(ChannelRef(42), before)]
    );
}

/// Role permission edits are restored to the prior bitset.
#[tokio::test]
async fn role_permission_edit_is_restored() {
    let h = harness();
    h.store.enable_module(ActionKind::Role).unwrap();
    h.audit.set(AuditProbe::RoleUpdate, ACTOR, Some(7));

    h.engine
        .on_role_updated(GUILD, RoleRef(7), "mods", 0x0400, 0x8)
        .await;

    assert_eq!(
        h.mutations.calls()[0],
        Call::EditRolePermissions(RoleRef(7), 0x0400)
    );
}

/// A rejected sanction is reported as not applied and aborts nothing.
#[tokio::test]
async fn rejected_sanction_is_reported_not_retried() {
    let h = harness();
    h.store.enable_module(ActionKind::Ban).unwrap();
    h.audit.set(AuditProbe::BanAdd, ACTOR, Some(5));
    h.mutations.reject_everything();

    h.engine.on_ban(GUILD, Principal(5)).await;

    // One attempt only.
    assert_eq!(h.mutations.calls(), vec![Call::Ban(ACTOR)]);
    let reports = h.notifier.reports();
    assert_eq!(reports.len(), 1);
    assert!(!report_applied(&reports[0].1));
}

fn report_applied(report: &EnforcementReport) -> bool {
    *report.sanction_applied()
}

/// Limited roles are taken straight back off non-exempt members.
#[tokio::test]
async fn limited_role_is_removed_from_non_exempt_member() {
    let h = harness();
    h.store.add_limited_role(RoleRef(55), "staff").unwrap();

    h.engine
        .on_member_roles_added(GUILD, ACTOR, &[RoleRef(55), RoleRef(56)])
        .await;

    assert_eq!(
        h.mutations.calls(),
        vec![Call::RemoveRole(ACTOR, RoleRef(55))]
    );
}

/// Any grant at all satisfies the kind-less exemption used for limited
/// roles.
#[tokio::test]
async fn any_grant_allows_holding_limited_roles() {
    let h = harness();
    h.store.add_limited_role(RoleRef(55), "staff").unwrap();
    h.store
        .set_grant(AuthorizationGrant {
            guild: GUILD,
            principal: ACTOR,
            scope: GrantScope::from_kinds([ActionKind::Link]).unwrap(),
        })
        .unwrap();

    h.engine
        .on_member_roles_added(GUILD, ACTOR, &[RoleRef(55)])
        .await;

    assert!(h.mutations.calls().is_empty());
}

/// Mention-guard escalation fires when the window count reaches the ping
/// threshold.
#[tokio::test]
async fn limited_mention_escalates_at_threshold() {
    let h = harness();
    h.store.enable_module(ActionKind::Ping).unwrap();
    h.store.add_limited_mention(MentionTarget::Everyone).unwrap();
    let tight = ThresholdPolicy::new(2, DurationToken::parse("10s").unwrap()).unwrap();
    h.store.set_threshold(None, ActionKind::Ping, tight).unwrap();
    h.store
        .set_sanction(ActionKind::Ping, SanctionPolicy::timed_mute(DurationToken::parse("5m").unwrap()))
        .unwrap();

    for _ in 0..2 {
        let mut event = message("@everyone raid now");
        event.mentions_everyone = true;
        h.engine.on_message(event).await;
    }

    let calls = h.mutations.calls();
    assert!(calls.contains(&Call::Timeout(ACTOR, Duration::from_secs(300))));
}

/// A disarmed module enforces nothing.
#[tokio::test]
async fn disarmed_module_is_inert() {
    let h = harness();
    h.audit.set(AuditProbe::ChannelCreate, ACTOR, Some(42));
    h.engine.on_channel_created(GUILD, ChannelRef(42), "raid").await;
    assert!(h.mutations.calls().is_empty());
}
