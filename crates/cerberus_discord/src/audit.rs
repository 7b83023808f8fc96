//! Audit-trail queries over Serenity's HTTP client.

use async_trait::async_trait;
use cerberus_core::{GuildRef, Principal};
use cerberus_engine::{AuditEntry, AuditProbe, AuditQuery};
use cerberus_error::{EngineError, EngineErrorKind, EngineResult};
use chrono::{DateTime, Utc};
use serenity::http::Http;
use serenity::model::guild::audit_log::{Action, ChannelAction, MemberAction, RoleAction};
use serenity::model::id::GuildId;
use std::sync::Arc;
use tracing::instrument;

fn probe_action(probe: AuditProbe) -> Action {
    match probe {
        AuditProbe::ChannelCreate => Action::Channel(ChannelAction::Create),
        AuditProbe::ChannelDelete => Action::Channel(ChannelAction::Delete),
        AuditProbe::ChannelUpdate => Action::Channel(ChannelAction::Update),
        AuditProbe::RoleCreate => Action::Role(RoleAction::Create),
        AuditProbe::RoleDelete => Action::Role(RoleAction::Delete),
        AuditProbe::RoleUpdate => Action::Role(RoleAction::Update),
        AuditProbe::BanAdd => Action::Member(MemberAction::BanAdd),
        AuditProbe::BotAdd => Action::Member(MemberAction::BotAdd),
        AuditProbe::MemberDisconnect => Action::Member(MemberAction::MemberDisconnect),
        AuditProbe::MemberMove => Action::Member(MemberAction::MemberMove),
        AuditProbe::GuildUpdate => Action::GuildUpdate,
    }
}

/// Audit-trail access through the Discord REST API.
///
/// The trail is Discord's own best-effort record of who performed a
/// mutation; entries can lag the gateway event they explain. The engine's
/// attribution lookup owns the retry schedule; this type is a thin query.
pub struct HttpAuditQuery {
    http: Arc<Http>,
}

impl HttpAuditQuery {
    /// An audit query over the given HTTP client.
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AuditQuery for HttpAuditQuery {
    #[instrument(skip(self), fields(guild = %guild, probe = %probe))]
    async fn query(
        &self,
        guild: GuildRef,
        probe: AuditProbe,
        limit: u8,
    ) -> EngineResult<Vec<AuditEntry>> {
        let logs = GuildId::new(guild.0)
            .audit_logs(
                &self.http,
                Some(probe_action(probe)),
                None,
                None,
                Some(limit),
            )
            .await
            .map_err(|e| {
                EngineError::new(EngineErrorKind::AttributionMissing {
                    guild: guild.0,
                    action: format!("{probe}: {e}"),
                })
            })?;

        Ok(logs
            .entries
            .iter()
            .map(|entry| AuditEntry {
                actor: Principal(entry.user_id.get()),
                target: entry.target_id.map(|t| t.get()),
                observed_at: DateTime::<Utc>::from_timestamp(
                    entry.id.created_at().unix_timestamp(),
                    0,
                )
                .unwrap_or_default(),
            })
            .collect())
    }
}
