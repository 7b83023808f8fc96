//! Operator notifications and report-channel embeds.

use async_trait::async_trait;
use cerberus_core::{Principal, Sanction};
use cerberus_engine::{EnforcementReport, Notifier};
use cerberus_store::{GuardStore, ReportStream};
use serenity::builder::{CreateEmbed, CreateMessage};
use serenity::http::Http;
use serenity::model::Colour;
use serenity::model::id::{ChannelId, UserId};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Best-effort reporting through Discord.
///
/// Operators get direct messages; guilds with a routed report channel get a
/// structured embed per enforcement action. Delivery failures are logged
/// and swallowed; an unrouted stream is silence.
pub struct DiscordNotifier {
    http: Arc<Http>,
    store: Arc<GuardStore>,
    operators: Vec<Principal>,
}

impl DiscordNotifier {
    /// A notifier messaging the given operators and reading channel routing
    /// from the store.
    pub fn new(http: Arc<Http>, store: Arc<GuardStore>, operators: Vec<Principal>) -> Self {
        Self {
            http,
            store,
            operators,
        }
    }

    fn describe(report: &EnforcementReport) -> String {
        let who = format!("<@{}>", report.principal());
        let mut text = match (report.count(), report.window()) {
            (Some(count), Some(window)) => {
                format!("{who} {} {count} times within {window}.", report.deed())
            }
            _ => format!("{who} {}.", report.deed()),
        };
        match report.sanction() {
            Some(sanction @ (Sanction::StripRoles | Sanction::TimedMute | Sanction::Kick | Sanction::Ban)) => {
                if *report.sanction_applied() {
                    text.push_str(&format!(" Applied {sanction}."));
                } else {
                    text.push_str(&format!(
                        " Tried to apply {sanction}, but the platform refused."
                    ));
                }
            }
            _ => {}
        }
        text
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    #[instrument(skip(self, text))]
    async fn notify_operators(&self, text: &str) {
        for operator in &self.operators {
            let channel = match UserId::new(operator.0).create_dm_channel(&self.http).await {
                Ok(channel) => channel,
                Err(e) => {
                    warn!(operator = %operator, error = %e, "Could not open operator DM");
                    continue;
                }
            };
            if let Err(e) = channel.id.say(&self.http, text).await {
                warn!(operator = %operator, error = %e, "Operator DM failed");
            }
        }
    }

    #[instrument(skip(self, report), fields(guild = %report.guild()))]
    async fn report(&self, stream: ReportStream, report: &EnforcementReport) {
        let Some(channel) = self.store.report_channel(*report.guild(), stream) else {
            debug!(%stream, "No report channel routed");
            return;
        };

        let mut embed = CreateEmbed::new()
            .title(report.deed().to_uppercase())
            .description(Self::describe(report))
            .colour(Colour(0xFFFFFF));
        if let Some(detail) = report.detail() {
            embed = embed.field("Details", detail, false);
        }

        if let Err(e) = ChannelId::new(channel.0)
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await
        {
            warn!(channel = %channel, error = %e, "Report delivery failed");
        }
    }
}
