//! Best-effort outcome reporting.

use async_trait::async_trait;
use cerberus_core::{ActionKind, DurationToken, GuildRef, Principal, Sanction};
use cerberus_store::ReportStream;
use derive_getters::Getters;
use typed_builder::TypedBuilder;

/// A structured report of one enforcement action.
#[derive(Debug, Clone, PartialEq, Eq, Getters, TypedBuilder)]
pub struct EnforcementReport {
    /// Guild the event occurred in.
    guild: GuildRef,
    /// The offending principal.
    principal: Principal,
    /// The monitored action kind.
    action: ActionKind,
    /// Past-tense description of what the principal did.
    #[builder(setter(into))]
    deed: String,
    /// Sanction selected by policy, if any.
    #[builder(default)]
    sanction: Option<Sanction>,
    /// Whether the sanction was applied without a platform rejection.
    #[builder(default = true)]
    sanction_applied: bool,
    /// Window count that triggered escalation, when rate-driven.
    #[builder(default)]
    count: Option<u32>,
    /// The window the count was taken over.
    #[builder(default)]
    window: Option<DurationToken>,
    /// Free-form detail (object name, member name).
    #[builder(default)]
    detail: Option<String>,
}

/// Side-channel reporting to operators and configured report channels.
///
/// Strictly an observer: every method is best-effort and must swallow
/// delivery failures. An unrouted report stream is silence, not an error.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Direct-message every operator.
    async fn notify_operators(&self, text: &str);

    /// Post a structured report to the guild's routed channel for `stream`.
    async fn report(&self, stream: ReportStream, report: &EnforcementReport);
}
