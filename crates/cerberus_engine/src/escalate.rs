//! Sanction selection and application.

use crate::notify::Notifier;
use crate::platform::MutationApi;
use cerberus_core::{ActionKind, GuildRef, Principal, Sanction};
use cerberus_store::GuardStore;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Applies the configured sanction when a violation meets its threshold.
///
/// Sanction application is wrapped so platform-side failures (permission
/// hierarchy, principal already gone) are swallowed; the decision to
/// sanction is not retried.
#[derive(Clone)]
pub struct PunishmentEscalator {
    store: Arc<GuardStore>,
    mutations: Arc<dyn MutationApi>,
    notifier: Arc<dyn Notifier>,
}

impl PunishmentEscalator {
    /// An escalator over the given store, mutation API, and notifier.
    pub fn new(
        store: Arc<GuardStore>,
        mutations: Arc<dyn MutationApi>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            mutations,
            notifier,
        }
    }

    /// Sanction `principal` for a violation of `kind`.
    ///
    /// Returns the selected sanction and whether the platform accepted it,
    /// or `None` when no policy is configured, the policy is `none`, or a
    /// timed mute carries no usable duration. `Warn` selects no punitive
    /// call here; warn-class enforcement is message deletion only.
    #[instrument(skip(self), fields(guild = %guild, principal = %principal, kind = %kind))]
    pub async fn on_violation(
        &self,
        guild: GuildRef,
        principal: Principal,
        kind: ActionKind,
        window_count: u32,
        reason: &str,
    ) -> Option<(Sanction, bool)> {
        let Some(policy) = self.store.sanction(kind) else {
            debug!("No sanction policy; escalation disabled for this kind");
            return None;
        };

        let applied = match policy.sanction {
            Sanction::None => return None,
            Sanction::Warn => true,
            Sanction::StripRoles => self
                .attempt(
                    "strip-roles",
                    self.mutations.strip_roles(guild, principal, reason),
                )
                .await,
            Sanction::TimedMute => {
                let Some(duration) = policy.duration else {
                    debug!("Timed mute with no duration; treating as no sanction");
                    return None;
                };
                self.attempt(
                    "timeout",
                    self.mutations
                        .timeout_member(guild, principal, duration.as_duration(), reason),
                )
                .await
            }
            Sanction::Kick => {
                let applied = self
                    .attempt("kick", self.mutations.kick_member(guild, principal, reason))
                    .await;
                if applied {
                    self.notifier
                        .notify_operators(&format!(
                            "Kicked {principal} from guild {guild}: {reason}"
                        ))
                        .await;
                }
                applied
            }
            Sanction::Ban => self
                .attempt("ban", self.mutations.ban_member(guild, principal, reason))
                .await,
        };

        info!(
            sanction = %policy.sanction,
            window_count,
            applied,
            "Escalated violation"
        );
        Some((policy.sanction, applied))
    }

    async fn attempt(
        &self,
        operation: &str,
        call: impl Future<Output = cerberus_error::EngineResult<()>>,
    ) -> bool {
        match call.await {
            Ok(()) => true,
            Err(e) => {
                warn!(operation, error = %e, "Sanction rejected by platform");
                false
            }
        }
    }
}
