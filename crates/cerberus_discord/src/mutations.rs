//! The engine's mutation API over Serenity's HTTP client.
//!
//! One REST attempt per call; every failure is mapped to
//! [`EngineErrorKind::MutationRejected`] and left to the engine to report.

use async_trait::async_trait;
use cerberus_core::{ChannelRef, GuildRef, MessageRef, Principal, RoleRef};
use cerberus_engine::{ChannelState, MutationApi, OverwriteKind, ProfileRestore};
use cerberus_error::{EngineError, EngineErrorKind, EngineResult};
use serenity::builder::{CreateAttachment, CreateMessage, EditChannel, EditGuild, EditMember, EditRole};
use serenity::http::Http;
use serenity::model::channel::{PermissionOverwrite, PermissionOverwriteType};
use serenity::model::guild::VerificationLevel;
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};
use serenity::model::permissions::Permissions;
use serenity::model::Timestamp;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

fn rejected(operation: &str, err: impl std::fmt::Display) -> EngineError {
    EngineError::new(EngineErrorKind::MutationRejected {
        operation: operation.to_string(),
        reason: err.to_string(),
    })
}

/// Mutation calls issued through a shared Serenity HTTP client.
///
/// Sharing the client with the gateway bot coordinates rate limits and
/// keeps one connection pool.
pub struct HttpMutationApi {
    http: Arc<Http>,
}

impl HttpMutationApi {
    /// A mutation API over the given HTTP client.
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn overwrites(state: &ChannelState) -> Vec<PermissionOverwrite> {
        state
            .overwrites
            .iter()
            .map(|o| PermissionOverwrite {
                allow: Permissions::from_bits_truncate(o.allow),
                deny: Permissions::from_bits_truncate(o.deny),
                kind: match o.kind {
                    OverwriteKind::Role => PermissionOverwriteType::Role(RoleId::new(o.target)),
                    OverwriteKind::Member => {
                        PermissionOverwriteType::Member(UserId::new(o.target))
                    }
                },
            })
            .collect()
    }
}

#[async_trait]
impl MutationApi for HttpMutationApi {
    #[instrument(skip(self))]
    async fn delete_channel(
        &self,
        _guild: GuildRef,
        channel: ChannelRef,
        reason: &str,
    ) -> EngineResult<()> {
        self.http
            .delete_channel(ChannelId::new(channel.0), Some(reason))
            .await
            .map(|_| ())
            .map_err(|e| rejected("delete-channel", e))
    }

    #[instrument(skip(self))]
    async fn delete_role(&self, guild: GuildRef, role: RoleRef, reason: &str) -> EngineResult<()> {
        self.http
            .delete_role(GuildId::new(guild.0), RoleId::new(role.0), Some(reason))
            .await
            .map_err(|e| rejected("delete-role", e))
    }

    #[instrument(skip(self, state))]
    async fn edit_channel(
        &self,
        _guild: GuildRef,
        channel: ChannelRef,
        state: &ChannelState,
    ) -> EngineResult<()> {
        let mut edit = EditChannel::new()
            .name(&state.name)
            .permissions(Self::overwrites(state))
            .audit_log_reason("Restoring channel attributes");
        edit = match state.category {
            Some(category) => edit.category(Some(ChannelId::new(category.0))),
            None => edit.category(None),
        };
        ChannelId::new(channel.0)
            .edit(&self.http, edit)
            .await
            .map(|_| ())
            .map_err(|e| rejected("edit-channel", e))
    }

    #[instrument(skip(self))]
    async fn edit_role_permissions(
        &self,
        guild: GuildRef,
        role: RoleRef,
        permissions: u64,
    ) -> EngineResult<()> {
        GuildId::new(guild.0)
            .edit_role(
                &self.http,
                RoleId::new(role.0),
                EditRole::new()
                    .permissions(Permissions::from_bits_truncate(permissions))
                    .audit_log_reason("Restoring role permissions"),
            )
            .await
            .map(|_| ())
            .map_err(|e| rejected("edit-role", e))
    }

    #[instrument(skip(self, restore))]
    async fn edit_guild(&self, guild: GuildRef, restore: &ProfileRestore) -> EngineResult<()> {
        let mut edit = EditGuild::new().audit_log_reason("Restoring guild profile");
        if let Some(name) = &restore.name {
            edit = edit.name(name);
        }
        let icon = restore
            .icon
            .as_ref()
            .map(|bytes| CreateAttachment::bytes(bytes.clone(), "icon.png"));
        if let Some(attachment) = &icon {
            edit = edit.icon(Some(attachment));
        }
        let banner = restore
            .banner
            .as_ref()
            .map(|bytes| CreateAttachment::bytes(bytes.clone(), "banner.png"));
        if let Some(attachment) = &banner {
            edit = edit.banner(Some(attachment.to_base64()));
        }
        if let Some(level) = restore.verification_level {
            edit = edit.verification_level(VerificationLevel::from(level));
        }
        GuildId::new(guild.0)
            .edit(&self.http, edit)
            .await
            .map(|_| ())
            .map_err(|e| rejected("edit-guild", e))
    }

    #[instrument(skip(self))]
    async fn kick_member(
        &self,
        guild: GuildRef,
        principal: Principal,
        reason: &str,
    ) -> EngineResult<()> {
        GuildId::new(guild.0)
            .kick_with_reason(&self.http, UserId::new(principal.0), reason)
            .await
            .map_err(|e| rejected("kick-member", e))
    }

    #[instrument(skip(self))]
    async fn ban_member(
        &self,
        guild: GuildRef,
        principal: Principal,
        reason: &str,
    ) -> EngineResult<()> {
        GuildId::new(guild.0)
            .ban_with_reason(&self.http, UserId::new(principal.0), 0, reason)
            .await
            .map_err(|e| rejected("ban-member", e))
    }

    #[instrument(skip(self))]
    async fn timeout_member(
        &self,
        guild: GuildRef,
        principal: Principal,
        duration: Duration,
        reason: &str,
    ) -> EngineResult<()> {
        let until = Timestamp::from_unix_timestamp(
            chrono::Utc::now().timestamp() + duration.as_secs() as i64,
        )
        .map_err(|e| rejected("timeout-member", e))?;
        GuildId::new(guild.0)
            .edit_member(
                &self.http,
                UserId::new(principal.0),
                EditMember::new()
                    .disable_communication_until_datetime(until)
                    .audit_log_reason(reason),
            )
            .await
            .map(|_| ())
            .map_err(|e| rejected("timeout-member", e))
    }

    #[instrument(skip(self))]
    async fn strip_roles(
        &self,
        guild: GuildRef,
        principal: Principal,
        reason: &str,
    ) -> EngineResult<()> {
        GuildId::new(guild.0)
            .edit_member(
                &self.http,
                UserId::new(principal.0),
                EditMember::new()
                    .roles(Vec::<RoleId>::new())
                    .audit_log_reason(reason),
            )
            .await
            .map(|_| ())
            .map_err(|e| rejected("strip-roles", e))
    }

    #[instrument(skip(self))]
    async fn remove_role(
        &self,
        guild: GuildRef,
        principal: Principal,
        role: RoleRef,
        reason: &str,
    ) -> EngineResult<()> {
        self.http
            .remove_member_role(
                GuildId::new(guild.0),
                UserId::new(principal.0),
                RoleId::new(role.0),
                Some(reason),
            )
            .await
            .map_err(|e| rejected("remove-role", e))
    }

    #[instrument(skip(self))]
    async fn delete_message(&self, channel: ChannelRef, message: MessageRef) -> EngineResult<()> {
        self.http
            .delete_message(
                ChannelId::new(channel.0),
                MessageId::new(message.0),
                Some("Enforcement"),
            )
            .await
            .map_err(|e| rejected("delete-message", e))
    }

    #[instrument(skip(self, text))]
    async fn send_channel_notice(&self, channel: ChannelRef, text: &str) -> EngineResult<()> {
        ChannelId::new(channel.0)
            .send_message(&self.http, CreateMessage::new().content(text))
            .await
            .map(|_| ())
            .map_err(|e| rejected("send-channel-notice", e))
    }
}
