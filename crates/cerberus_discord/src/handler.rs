//! Gateway event handler.
//!
//! Translates Serenity gateway events into engine pipeline calls. Serenity
//! dispatches each event on its own task, so a slow platform call while
//! handling one guild's event does not stall another's.

use crate::commands::CommandHub;
use cerberus_core::{ChannelRef, GuildRef, MessageRef, Principal, RoleRef};
use cerberus_engine::{
    ChannelState, GuardEngine, LiveProfile, MessageEvent, OverwriteKind, PermissionOverwrite,
};
use serenity::async_trait;
use serenity::model::application::{Command, Interaction};
use serenity::model::channel::{GuildChannel, Message, PermissionOverwriteType};
use serenity::model::event::GuildMemberUpdateEvent;
use serenity::model::gateway::Ready;
use serenity::model::guild::{Guild, Member, PartialGuild, Role, UnavailableGuild};
use serenity::model::id::{GuildId, RoleId};
use serenity::model::user::User;
use serenity::model::voice::VoiceState;
use serenity::prelude::{Context, EventHandler};
use tracing::{debug, error, info, instrument};

/// The gateway-facing half of the guard.
pub struct GuardHandler {
    engine: GuardEngine,
    commands: CommandHub,
}

impl GuardHandler {
    /// A handler feeding the given engine and command hub.
    pub fn new(engine: GuardEngine, commands: CommandHub) -> Self {
        Self { engine, commands }
    }

    fn channel_state(channel: &GuildChannel) -> ChannelState {
        ChannelState {
            name: channel.name.clone(),
            category: channel.parent_id.map(|id| ChannelRef(id.get())),
            overwrites: channel
                .permission_overwrites
                .iter()
                .map(|o| {
                    let (target, kind) = match o.kind {
                        PermissionOverwriteType::Role(id) => (id.get(), OverwriteKind::Role),
                        PermissionOverwriteType::Member(id) => (id.get(), OverwriteKind::Member),
                        _ => (0, OverwriteKind::Role),
                    };
                    PermissionOverwrite {
                        target,
                        kind,
                        allow: o.allow.bits(),
                        deny: o.deny.bits(),
                    }
                })
                .collect(),
        }
    }

    fn profile_of_guild(guild: &Guild) -> LiveProfile {
        LiveProfile {
            guild: GuildRef(guild.id.get()),
            name: guild.name.clone(),
            icon_url: guild.icon_url(),
            banner_url: guild.banner_url(),
            vanity_code: guild.vanity_url_code.clone(),
            verification_level: u8::from(guild.verification_level),
        }
    }

    fn profile_of_partial(guild: &PartialGuild) -> LiveProfile {
        LiveProfile {
            guild: GuildRef(guild.id.get()),
            name: guild.name.clone(),
            icon_url: guild.icon_url(),
            banner_url: guild.banner_url(),
            vanity_code: guild.vanity_url_code.clone(),
            verification_level: u8::from(guild.verification_level),
        }
    }
}

#[async_trait]
impl EventHandler for GuardHandler {
    #[instrument(skip(self, ctx, ready), fields(bot = %ready.user.name))]
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(guilds = ready.guilds.len(), "Gateway session ready");
        match Command::set_global_commands(&ctx.http, self.commands.definitions()).await {
            Ok(commands) => debug!(count = commands.len(), "Registered slash commands"),
            Err(e) => error!(error = %e, "Slash command registration failed"),
        }
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let Some(guild_id) = msg.guild_id else {
            return;
        };
        let event = MessageEvent {
            guild: GuildRef(guild_id.get()),
            channel: ChannelRef(msg.channel_id.get()),
            message: MessageRef(msg.id.get()),
            author: Principal(msg.author.id.get()),
            author_is_bot: msg.author.bot,
            content: msg.content.clone(),
            mentions_everyone: msg.mention_everyone,
            role_mentions: msg.mention_roles.iter().map(|id| RoleRef(id.get())).collect(),
        };
        self.engine.on_message(event).await;
    }

    async fn guild_member_addition(&self, _ctx: Context, member: Member) {
        if member.user.bot {
            self.engine
                .on_bot_added(
                    GuildRef(member.guild_id.get()),
                    Principal(member.user.id.get()),
                    &member.user.name,
                )
                .await;
        }
    }

    async fn guild_ban_addition(&self, _ctx: Context, guild_id: GuildId, banned_user: User) {
        self.engine
            .on_ban(GuildRef(guild_id.get()), Principal(banned_user.id.get()))
            .await;
    }

    async fn voice_state_update(&self, _ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let Some(old) = old else {
            return;
        };
        let Some(guild_id) = new.guild_id.or(old.guild_id) else {
            return;
        };
        let left_or_moved = old.channel_id.is_some()
            && (new.channel_id.is_none() || new.channel_id != old.channel_id);
        if left_or_moved {
            self.engine
                .on_voice_drop(GuildRef(guild_id.get()), Principal(new.user_id.get()))
                .await;
        }
    }

    async fn channel_create(&self, _ctx: Context, channel: GuildChannel) {
        self.engine
            .on_channel_created(
                GuildRef(channel.guild_id.get()),
                ChannelRef(channel.id.get()),
                &channel.name,
            )
            .await;
    }

    async fn channel_delete(
        &self,
        _ctx: Context,
        channel: GuildChannel,
        _messages: Option<Vec<Message>>,
    ) {
        self.engine
            .on_channel_deleted(
                GuildRef(channel.guild_id.get()),
                ChannelRef(channel.id.get()),
                &channel.name,
            )
            .await;
    }

    async fn channel_update(&self, _ctx: Context, old: Option<GuildChannel>, new: GuildChannel) {
        let Some(old) = old else {
            // No prior state cached; nothing to restore from.
            debug!(channel = %new.id, "Channel update without cached prior state");
            return;
        };
        self.engine
            .on_channel_updated(
                GuildRef(new.guild_id.get()),
                ChannelRef(new.id.get()),
                Self::channel_state(&old),
                Self::channel_state(&new),
            )
            .await;
    }

    async fn guild_role_create(&self, _ctx: Context, new: Role) {
        self.engine
            .on_role_created(GuildRef(new.guild_id.get()), RoleRef(new.id.get()), &new.name)
            .await;
    }

    async fn guild_role_delete(
        &self,
        _ctx: Context,
        guild_id: GuildId,
        removed_role_id: RoleId,
        removed_role_data: Option<Role>,
    ) {
        let name = removed_role_data
            .map(|role| role.name)
            .unwrap_or_else(|| "unknown".to_string());
        self.engine
            .on_role_deleted(GuildRef(guild_id.get()), RoleRef(removed_role_id.get()), &name)
            .await;
    }

    async fn guild_role_update(&self, _ctx: Context, old: Option<Role>, new: Role) {
        let Some(old) = old else {
            debug!(role = %new.id, "Role update without cached prior state");
            return;
        };
        self.engine
            .on_role_updated(
                GuildRef(new.guild_id.get()),
                RoleRef(new.id.get()),
                &new.name,
                old.permissions.bits(),
                new.permissions.bits(),
            )
            .await;
    }

    async fn guild_update(&self, _ctx: Context, _old: Option<Guild>, new: PartialGuild) {
        self.engine
            .on_guild_updated(Self::profile_of_partial(&new))
            .await;
    }

    async fn guild_member_update(
        &self,
        _ctx: Context,
        old: Option<Member>,
        _new: Option<Member>,
        event: GuildMemberUpdateEvent,
    ) {
        let Some(old) = old else {
            return;
        };
        let added: Vec<RoleRef> = event
            .roles
            .iter()
            .filter(|id| !old.roles.contains(id))
            .map(|id| RoleRef(id.get()))
            .collect();
        if !added.is_empty() {
            self.engine
                .on_member_roles_added(
                    GuildRef(event.guild_id.get()),
                    Principal(event.user.id.get()),
                    &added,
                )
                .await;
        }
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, is_new: Option<bool>) {
        self.engine.on_guild_seen(Self::profile_of_guild(&guild)).await;
        if is_new == Some(true) {
            self.engine
                .on_guild_joined(GuildRef(guild.id.get()), &guild.name)
                .await;
        }
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        self.engine.on_guild_left(GuildRef(incomplete.id.get())).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            self.commands.dispatch(&ctx, &command).await;
        }
    }
}
