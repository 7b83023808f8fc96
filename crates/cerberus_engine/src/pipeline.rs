//! The per-event enforcement pipeline.
//!
//! Every entry point follows the same linear sequence: attribute the
//! mutation, check exemption, revert what must not persist, record the
//! action, compare the window count to the threshold, sanction past it, and
//! report the outcome. The sequence must not be reordered; the sanction
//! decision reads the count that includes the just-recorded event.
//!
//! Entry points take `&self` and hold no lock across an await, so events
//! for different guilds proceed independently; a slow platform call in one
//! guild cannot stall another.

use crate::attribution::{AttributionLookup, AuditProbe, AuditQuery};
use crate::authorize::AuthorizationResolver;
use crate::escalate::PunishmentEscalator;
use crate::notify::{EnforcementReport, Notifier};
use crate::platform::{ChannelState, LiveProfile, MutationApi};
use crate::revert::RevertEngine;
use crate::snapshot::{AssetStore, SnapshotKeeper};
use crate::tracker::ActionTracker;
use cerberus_core::{
    ActionKind, ChannelRef, GuildRef, MentionTarget, MessageRef, Principal, RoleRef, Sanction,
};
use cerberus_store::{GuardStore, ReportStream};
use chrono::Utc;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, instrument, warn};

/// Invite-style links the link guard deletes.
static INVITE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:https?://)?(?:www\.)?(?:discord\.(?:gg|io|me|com)|discordapp\.com/invite)/[A-Za-z0-9]+",
    )
    .expect("static invite pattern")
});

/// Tunables for the engine.
#[derive(Debug, Clone, Copy)]
pub struct GuardOptions {
    /// How long a module disable request is honored before reverting.
    pub module_grace: chrono::Duration,
    /// Bounded history per (guild, principal) rate-accounting key.
    pub tracker_capacity: usize,
}

impl Default for GuardOptions {
    fn default() -> Self {
        Self {
            module_grace: chrono::Duration::seconds(60),
            tracker_capacity: crate::tracker::DEFAULT_CAPACITY,
        }
    }
}

/// A posted message, as the pipeline sees it.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    /// Guild the message was posted in.
    pub guild: GuildRef,
    /// Channel the message was posted in.
    pub channel: ChannelRef,
    /// The message id.
    pub message: MessageRef,
    /// The author.
    pub author: Principal,
    /// Whether the author is a bot account.
    pub author_is_bot: bool,
    /// Raw message content.
    pub content: String,
    /// Whether the message mentions `@everyone`/`@here`.
    pub mentions_everyone: bool,
    /// Roles the message mentions.
    pub role_mentions: Vec<RoleRef>,
}

/// The abuse-detection and response engine.
///
/// One instance guards every guild the process can see. Construction wires
/// the internal components to the external collaborator traits; everything
/// else is driven by the event entry points.
#[derive(Clone)]
pub struct GuardEngine {
    store: Arc<GuardStore>,
    resolver: AuthorizationResolver,
    tracker: Arc<ActionTracker>,
    attribution: AttributionLookup,
    revert: RevertEngine,
    escalator: PunishmentEscalator,
    snapshots: SnapshotKeeper,
    mutations: Arc<dyn MutationApi>,
    notifier: Arc<dyn Notifier>,
    options: GuardOptions,
}

impl GuardEngine {
    /// Wire an engine to its collaborators.
    pub fn new(
        store: Arc<GuardStore>,
        audit: Arc<dyn AuditQuery>,
        mutations: Arc<dyn MutationApi>,
        assets: Arc<dyn AssetStore>,
        notifier: Arc<dyn Notifier>,
        options: GuardOptions,
    ) -> Self {
        Self {
            resolver: AuthorizationResolver::new(Arc::clone(&store)),
            tracker: Arc::new(ActionTracker::new(options.tracker_capacity)),
            attribution: AttributionLookup::new(audit),
            revert: RevertEngine::new(Arc::clone(&mutations)),
            escalator: PunishmentEscalator::new(
                Arc::clone(&store),
                Arc::clone(&mutations),
                Arc::clone(&notifier),
            ),
            snapshots: SnapshotKeeper::new(Arc::clone(&store), assets),
            store,
            mutations,
            notifier,
            options,
        }
    }

    /// The configuration store the engine reads.
    pub fn store(&self) -> &Arc<GuardStore> {
        &self.store
    }

    /// The engine's tunables.
    pub fn options(&self) -> GuardOptions {
        self.options
    }

    fn module_active(&self, kind: ActionKind) -> bool {
        self.store
            .module_active(kind, self.options.module_grace, Utc::now())
    }

    fn stream_for(kind: ActionKind) -> ReportStream {
        match kind {
            ActionKind::Link | ActionKind::Ping | ActionKind::VoiceDisconnect => {
                ReportStream::Moderation
            }
            _ => ReportStream::Operator,
        }
    }

    async fn try_call(
        &self,
        operation: &str,
        call: impl Future<Output = cerberus_error::EngineResult<()>>,
    ) -> bool {
        match call.await {
            Ok(()) => true,
            Err(e) => {
                warn!(operation, error = %e, "Platform call rejected");
                false
            }
        }
    }

    /// Record the event, compare against the threshold, and sanction past
    /// it. With no threshold policy the event is still recorded but
    /// escalation is disabled for the kind.
    async fn enforce_rate(
        &self,
        guild: GuildRef,
        principal: Principal,
        kind: ActionKind,
        deed: &str,
        detail: Option<String>,
    ) {
        let Some(policy) = self.store.threshold(guild, kind) else {
            self.tracker.record(guild, principal, kind);
            debug!(%kind, "No threshold policy; recorded without escalation");
            return;
        };

        let count =
            self.tracker
                .record_and_count(guild, principal, kind, policy.window().as_duration())
                as u32;
        if count < policy.max_count() {
            return;
        }

        let reason = format!("{kind} guard: {deed}");
        let outcome = self
            .escalator
            .on_violation(guild, principal, kind, count, &reason)
            .await;

        let report = EnforcementReport::builder()
            .guild(guild)
            .principal(principal)
            .action(kind)
            .deed(deed)
            .sanction(outcome.map(|(sanction, _)| sanction))
            .sanction_applied(outcome.is_none_or(|(_, applied)| applied))
            .count(Some(count))
            .window(Some(policy.window()))
            .detail(detail)
            .build();
        self.notifier.report(Self::stream_for(kind), &report).await;
    }

    async fn delete_message_with_notice(&self, event: &MessageEvent, notice: &str) {
        self.try_call(
            "delete-message",
            self.mutations.delete_message(event.channel, event.message),
        )
        .await;
        self.try_call(
            "channel-notice",
            self.mutations
                .send_channel_notice(event.channel, &format!("<@{}> {notice}", event.author)),
        )
        .await;
    }

    /// A message was posted: run the link and mention guards.
    #[instrument(skip(self, event), fields(guild = %event.guild, author = %event.author))]
    pub async fn on_message(&self, event: MessageEvent) {
        if event.author_is_bot {
            return;
        }

        if self.module_active(ActionKind::Link)
            && INVITE_PATTERN.is_match(&event.content)
            && !self
                .resolver
                .is_exempt(event.guild, event.author, Some(ActionKind::Link))
        {
            self.delete_message_with_notice(&event, "you are not allowed to post invite links")
                .await;

            // Warn-class policy deletes only; kick and ban also remove the
            // author.
            let sanction = self.store.sanction(ActionKind::Link).map(|p| p.sanction);
            let applied = match sanction {
                Some(Sanction::Kick) => {
                    self.try_call(
                        "kick",
                        self.mutations
                            .kick_member(event.guild, event.author, "Posted an invite link"),
                    )
                    .await
                }
                Some(Sanction::Ban) => {
                    self.try_call(
                        "ban",
                        self.mutations
                            .ban_member(event.guild, event.author, "Posted an invite link"),
                    )
                    .await
                }
                _ => true,
            };

            let report = EnforcementReport::builder()
                .guild(event.guild)
                .principal(event.author)
                .action(ActionKind::Link)
                .deed("posted an invite link")
                .sanction(sanction)
                .sanction_applied(applied)
                .build();
            self.notifier
                .report(ReportStream::Moderation, &report)
                .await;
        }

        if self.module_active(ActionKind::Ping)
            && !self
                .resolver
                .is_exempt(event.guild, event.author, Some(ActionKind::Ping))
        {
            if event.mentions_everyone
                && (self.store.is_limited_mention(MentionTarget::Everyone)
                    || self.store.is_limited_mention(MentionTarget::Here))
            {
                self.delete_message_with_notice(&event, "you are not allowed to mention @everyone")
                    .await;
                self.enforce_rate(
                    event.guild,
                    event.author,
                    ActionKind::Ping,
                    "mentioned @everyone",
                    None,
                )
                .await;
            } else if let Some(role) = event
                .role_mentions
                .iter()
                .copied()
                .find(|role| self.store.is_limited_mention(MentionTarget::Role(*role)))
            {
                self.delete_message_with_notice(
                    &event,
                    "you are not allowed to mention that role",
                )
                .await;
                self.enforce_rate(
                    event.guild,
                    event.author,
                    ActionKind::Ping,
                    "mentioned a limited role",
                    Some(format!("role {role}")),
                )
                .await;
            }
        }
    }

    /// A bot account joined: attribute the addition and sanction an
    /// unauthorized inviter.
    #[instrument(skip(self), fields(guild = %guild, bot = %bot))]
    pub async fn on_bot_added(&self, guild: GuildRef, bot: Principal, bot_name: &str) {
        self.notifier
            .notify_operators(&format!("Bot {bot_name} was added to guild {guild}"))
            .await;

        if !self.module_active(ActionKind::BotAdd) {
            return;
        }
        let Some(attribution) = self
            .attribution
            .attribute(guild, Some(bot.0), &[AuditProbe::BotAdd])
            .await
        else {
            return;
        };
        let inviter = attribution.actor;
        if self
            .resolver
            .is_exempt(guild, inviter, Some(ActionKind::BotAdd))
        {
            return;
        }

        let sanction = self.store.sanction(ActionKind::BotAdd).map(|p| p.sanction);
        let applied = match sanction {
            Some(Sanction::Kick) => {
                let ok = self
                    .try_call(
                        "kick",
                        self.mutations
                            .kick_member(guild, inviter, "Added a bot without authorization"),
                    )
                    .await;
                self.try_call("kick", self.mutations.kick_member(guild, bot, "Unauthorized bot"))
                    .await;
                ok
            }
            Some(Sanction::Ban) => {
                let ok = self
                    .try_call(
                        "ban",
                        self.mutations
                            .ban_member(guild, inviter, "Added a bot without authorization"),
                    )
                    .await;
                self.try_call("ban", self.mutations.ban_member(guild, bot, "Unauthorized bot"))
                    .await;
                ok
            }
            Some(Sanction::StripRoles) => {
                let ok = self
                    .try_call(
                        "strip-roles",
                        self.mutations
                            .strip_roles(guild, inviter, "Added a bot without authorization"),
                    )
                    .await;
                self.try_call("kick", self.mutations.kick_member(guild, bot, "Unauthorized bot"))
                    .await;
                ok
            }
            _ => true,
        };

        let report = EnforcementReport::builder()
            .guild(guild)
            .principal(inviter)
            .action(ActionKind::BotAdd)
            .deed("added a bot")
            .sanction(sanction)
            .sanction_applied(applied)
            .detail(Some(format!("bot {bot_name}")))
            .build();
        self.notifier.report(ReportStream::Operator, &report).await;
    }

    /// A member was banned: attribute the ban and rate-account the banner.
    #[instrument(skip(self), fields(guild = %guild, target = %target))]
    pub async fn on_ban(&self, guild: GuildRef, target: Principal) {
        if !self.module_active(ActionKind::Ban) {
            return;
        }
        let Some(attribution) = self
            .attribution
            .attribute(guild, Some(target.0), &[AuditProbe::BanAdd])
            .await
        else {
            // No named principal: no sanction, no record.
            return;
        };
        if self
            .resolver
            .is_exempt(guild, attribution.actor, Some(ActionKind::Ban))
        {
            return;
        }
        self.enforce_rate(
            guild,
            attribution.actor,
            ActionKind::Ban,
            "banned a member",
            Some(format!("member {target}")),
        )
        .await;
    }

    /// A member dropped out of voice: attribute the disconnect or forced
    /// move and rate-account the moderator behind it.
    #[instrument(skip(self), fields(guild = %guild, member = %member))]
    pub async fn on_voice_drop(&self, guild: GuildRef, member: Principal) {
        if !self.module_active(ActionKind::VoiceDisconnect) {
            return;
        }
        // Disconnect outranks forced move; the first probe that matches
        // wins.
        let Some(attribution) = self
            .attribution
            .attribute(
                guild,
                Some(member.0),
                &[AuditProbe::MemberDisconnect, AuditProbe::MemberMove],
            )
            .await
        else {
            return;
        };
        if self
            .resolver
            .is_exempt(guild, attribution.actor, Some(ActionKind::VoiceDisconnect))
        {
            return;
        }
        let deed = match attribution.probe {
            AuditProbe::MemberMove => "force-moved a member between voice channels",
            _ => "disconnected a member from voice",
        };
        self.enforce_rate(
            guild,
            attribution.actor,
            ActionKind::VoiceDisconnect,
            deed,
            Some(format!("member {member}")),
        )
        .await;
    }

    /// A channel was created: delete it when unauthorized, then
    /// rate-account the creator.
    ///
    /// The deletion is not gated by the threshold; unauthorized creations
    /// never persist, and the rate limiter only governs whether the creator
    /// is additionally sanctioned.
    #[instrument(skip(self, name), fields(guild = %guild, channel = %channel))]
    pub async fn on_channel_created(&self, guild: GuildRef, channel: ChannelRef, name: &str) {
        if !self.module_active(ActionKind::Channel) {
            return;
        }
        let Some(attribution) = self
            .attribution
            .attribute(guild, Some(channel.0), &[AuditProbe::ChannelCreate])
            .await
        else {
            return;
        };
        if self
            .resolver
            .is_exempt(guild, attribution.actor, Some(ActionKind::Channel))
        {
            return;
        }

        self.revert
            .delete_created_channel(guild, channel, "Unauthorized channel creation")
            .await;
        self.enforce_rate(
            guild,
            attribution.actor,
            ActionKind::Channel,
            "created a channel",
            Some(format!("channel {name}")),
        )
        .await;
    }

    /// A channel was deleted: rate-account the deleter. There is nothing to
    /// revert.
    #[instrument(skip(self, name), fields(guild = %guild, channel = %channel))]
    pub async fn on_channel_deleted(&self, guild: GuildRef, channel: ChannelRef, name: &str) {
        if !self.module_active(ActionKind::Channel) {
            return;
        }
        let Some(attribution) = self
            .attribution
            .attribute(guild, Some(channel.0), &[AuditProbe::ChannelDelete])
            .await
        else {
            return;
        };
        if self
            .resolver
            .is_exempt(guild, attribution.actor, Some(ActionKind::Channel))
        {
            return;
        }
        self.enforce_rate(
            guild,
            attribution.actor,
            ActionKind::Channel,
            "deleted a channel",
            Some(format!("channel {name}")),
        )
        .await;
    }

    /// A channel was edited: restore its prior attributes unconditionally,
    /// then rate-account the editor.
    #[instrument(skip(self, before, after), fields(guild = %guild, channel = %channel))]
    pub async fn on_channel_updated(
        &self,
        guild: GuildRef,
        channel: ChannelRef,
        before: ChannelState,
        after: ChannelState,
    ) {
        if !self.module_active(ActionKind::Channel) || before == after {
            return;
        }
        let Some(attribution) = self
            .attribution
            .attribute(guild, Some(channel.0), &[AuditProbe::ChannelUpdate])
            .await
        else {
            return;
        };
        if self
            .resolver
            .is_exempt(guild, attribution.actor, Some(ActionKind::Channel))
        {
            return;
        }

        self.revert.restore_channel(guild, channel, &before).await;
        self.enforce_rate(
            guild,
            attribution.actor,
            ActionKind::Channel,
            "edited a channel",
            Some(format!("channel {}", after.name)),
        )
        .await;
    }

    /// A role was created: delete it when unauthorized, then rate-account
    /// the creator.
    #[instrument(skip(self, name), fields(guild = %guild, role = %role))]
    pub async fn on_role_created(&self, guild: GuildRef, role: RoleRef, name: &str) {
        if !self.module_active(ActionKind::Role) {
            return;
        }
        let Some(attribution) = self
            .attribution
            .attribute(guild, Some(role.0), &[AuditProbe::RoleCreate])
            .await
        else {
            return;
        };
        if self
            .resolver
            .is_exempt(guild, attribution.actor, Some(ActionKind::Role))
        {
            return;
        }

        self.revert
            .delete_created_role(guild, role, "Unauthorized role creation")
            .await;
        self.enforce_rate(
            guild,
            attribution.actor,
            ActionKind::Role,
            "created a role",
            Some(format!("role {name}")),
        )
        .await;
    }

    /// A role was deleted: rate-account the deleter.
    #[instrument(skip(self, name), fields(guild = %guild, role = %role))]
    pub async fn on_role_deleted(&self, guild: GuildRef, role: RoleRef, name: &str) {
        if !self.module_active(ActionKind::Role) {
            return;
        }
        let Some(attribution) = self
            .attribution
            .attribute(guild, Some(role.0), &[AuditProbe::RoleDelete])
            .await
        else {
            return;
        };
        if self
            .resolver
            .is_exempt(guild, attribution.actor, Some(ActionKind::Role))
        {
            return;
        }
        self.enforce_rate(
            guild,
            attribution.actor,
            ActionKind::Role,
            "deleted a role",
            Some(format!("role {name}")),
        )
        .await;
    }

    /// A role's permission bitset changed: restore it unconditionally, then
    /// rate-account the editor.
    #[instrument(skip(self, name), fields(guild = %guild, role = %role))]
    pub async fn on_role_updated(
        &self,
        guild: GuildRef,
        role: RoleRef,
        name: &str,
        before_permissions: u64,
        after_permissions: u64,
    ) {
        if !self.module_active(ActionKind::Role) || before_permissions == after_permissions {
            return;
        }
        let Some(attribution) = self
            .attribution
            .attribute(guild, Some(role.0), &[AuditProbe::RoleUpdate])
            .await
        else {
            return;
        };
        if self
            .resolver
            .is_exempt(guild, attribution.actor, Some(ActionKind::Role))
        {
            return;
        }

        self.revert
            .restore_role_permissions(guild, role, before_permissions)
            .await;
        self.enforce_rate(
            guild,
            attribution.actor,
            ActionKind::Role,
            "edited a role",
            Some(format!("role {name}")),
        )
        .await;
    }

    /// The guild profile changed: roll unauthorized edits back to the
    /// snapshot. A guild seen here for the first time is snapshotted from
    /// the post-edit state; there is nothing to roll back to yet.
    #[instrument(skip(self, observed), fields(guild = %observed.guild))]
    pub async fn on_guild_updated(&self, observed: LiveProfile) {
        if !self.module_active(ActionKind::Profile) {
            return;
        }
        let Some(snapshot) = self.snapshots.get(observed.guild) else {
            if let Err(e) = self.snapshots.capture(&observed).await {
                warn!(error = %e, "First-sighting snapshot failed");
            }
            return;
        };

        let Some(attribution) = self
            .attribution
            .attribute(observed.guild, None, &[AuditProbe::GuildUpdate])
            .await
        else {
            return;
        };
        if self
            .resolver
            .is_exempt(observed.guild, attribution.actor, Some(ActionKind::Profile))
        {
            return;
        }

        let (changed, _applied) = self
            .revert
            .rollback_profile(&self.snapshots, &snapshot, &observed)
            .await;
        if changed.is_empty() {
            return;
        }

        let fields = changed
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.notifier
            .notify_operators(&format!(
                "{} edited the profile of guild {} ({fields})",
                attribution.actor, observed.guild
            ))
            .await;
        self.enforce_rate(
            observed.guild,
            attribution.actor,
            ActionKind::Profile,
            "edited the guild profile",
            Some(fields),
        )
        .await;
    }

    /// A member gained roles: take limited roles straight back off members
    /// below the authorization threshold.
    #[instrument(skip(self, added), fields(guild = %guild, member = %member))]
    pub async fn on_member_roles_added(
        &self,
        guild: GuildRef,
        member: Principal,
        added: &[RoleRef],
    ) {
        for &role in added {
            if self.store.is_limited_role(role) && !self.resolver.is_exempt(guild, member, None) {
                self.try_call(
                    "remove-role",
                    self.mutations
                        .remove_role(guild, member, role, "Limited role"),
                )
                .await;
            }
        }
    }

    /// A guild became visible (startup or join): capture its current
    /// profile as the known-good snapshot.
    #[instrument(skip(self, profile), fields(guild = %profile.guild))]
    pub async fn on_guild_seen(&self, profile: LiveProfile) {
        if let Err(e) = self.snapshots.capture(&profile).await {
            warn!(error = %e, "Guild snapshot capture failed");
        }
    }

    /// The process was invited into a guild.
    #[instrument(skip(self, name), fields(guild = %guild))]
    pub async fn on_guild_joined(&self, guild: GuildRef, name: &str) {
        self.notifier
            .notify_operators(&format!("I was added to guild {name} ({guild})"))
            .await;
    }

    /// The process was removed from a guild.
    #[instrument(skip(self), fields(guild = %guild))]
    pub async fn on_guild_left(&self, guild: GuildRef) {
        self.notifier
            .notify_operators(&format!("I was removed from guild {guild}"))
            .await;
    }
}
