//! Attribution of observed mutations to acting principals.
//!
//! Most destructive events do not name the hand that caused them; the
//! platform's audit trail is queried after the fact. The trail is
//! eventually consistent, so the lookup retries with a short backoff before
//! concluding that no entry exists. A missing attribution is a signalled
//! outcome, not an error: callers skip both revert and escalation for the
//! event (fail open on attribution, fail closed on authorization).

use async_trait::async_trait;
use cerberus_core::{GuildRef, Principal};
use cerberus_error::EngineResult;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// An audit-trail action kind the lookup can probe for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum AuditProbe {
    /// Channel created.
    ChannelCreate,
    /// Channel deleted.
    ChannelDelete,
    /// Channel edited.
    ChannelUpdate,
    /// Role created.
    RoleCreate,
    /// Role deleted.
    RoleDelete,
    /// Role edited.
    RoleUpdate,
    /// Member banned.
    BanAdd,
    /// Bot added to the guild.
    BotAdd,
    /// Member disconnected from voice.
    MemberDisconnect,
    /// Member force-moved between voice channels.
    MemberMove,
    /// Guild profile edited.
    GuildUpdate,
}

/// One audit-trail entry, most-recent-first in query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditEntry {
    /// Who performed the mutation.
    pub actor: Principal,
    /// The mutated object, when the trail records one.
    pub target: Option<u64>,
    /// When the trail recorded the entry.
    pub observed_at: DateTime<Utc>,
}

/// Query access to the platform's audit trail.
#[async_trait]
pub trait AuditQuery: Send + Sync {
    /// The most recent entries for an action kind, newest first.
    async fn query(
        &self,
        guild: GuildRef,
        probe: AuditProbe,
        limit: u8,
    ) -> EngineResult<Vec<AuditEntry>>;
}

/// A resolved attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribution {
    /// The acting principal.
    pub actor: Principal,
    /// Which probe produced the match.
    pub probe: AuditProbe,
    /// When the trail recorded the entry.
    pub observed_at: DateTime<Utc>,
}

/// Retry schedule for trail propagation lag.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: usize,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(300),
        }
    }
}

/// Maps an observed mutation to the principal who caused it.
#[derive(Clone)]
pub struct AttributionLookup {
    audit: Arc<dyn AuditQuery>,
    retry: RetryConfig,
}

impl AttributionLookup {
    /// A lookup over the given audit trail with the default retry schedule.
    pub fn new(audit: Arc<dyn AuditQuery>) -> Self {
        Self {
            audit,
            retry: RetryConfig::default(),
        }
    }

    /// Override the retry schedule.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Resolve the principal behind a mutation of `target`.
    ///
    /// Probes are tried in the given priority order and the first matching
    /// entry wins; voice disconnects pass `[MemberDisconnect, MemberMove]`
    /// here. Only the single most recent matching entry is used; concurrent
    /// identical mutations by different actors are not disambiguated.
    /// `None` means the trail had no matching entry after the retry
    /// schedule ran out.
    #[instrument(skip(self), fields(guild = %guild))]
    pub async fn attribute(
        &self,
        guild: GuildRef,
        target: Option<u64>,
        probes: &[AuditProbe],
    ) -> Option<Attribution> {
        for attempt in 1..=self.retry.max_attempts {
            for &probe in probes {
                match self.audit.query(guild, probe, 5).await {
                    Ok(entries) => {
                        let matched = entries
                            .iter()
                            .find(|e| target.is_none() || e.target == target);
                        if let Some(entry) = matched {
                            debug!(actor = %entry.actor, %probe, attempt, "Attributed mutation");
                            return Some(Attribution {
                                actor: entry.actor,
                                probe,
                                observed_at: entry.observed_at,
                            });
                        }
                    }
                    Err(e) => {
                        warn!(%probe, attempt, error = %e, "Audit trail query failed");
                    }
                }
            }
            if attempt < self.retry.max_attempts {
                tokio::time::sleep(self.retry.backoff).await;
            }
        }
        debug!(?target, "No audit entry matched; attribution missing");
        None
    }
}
