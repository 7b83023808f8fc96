//! The slash-command surface.
//!
//! Operators configure the guard entirely through application commands:
//! thresholds, sanctions, module switches, grants, trusted operators,
//! limited roles and mentions, report routing, and configuration
//! export/import. Command gating mirrors the enforcement tiers: operators
//! configure, trusted principals manage grants, granted principals may list.

use cerberus_core::{
    ActionKind, AuthorizationGrant, ChannelRef, DurationToken, GrantScope, GuildRef, MentionTarget,
    Principal, RoleRef, Sanction, SanctionPolicy, ThresholdPolicy,
};
use cerberus_engine::Notifier;
use cerberus_store::{GuardStore, ReportStream, StoreDocument};
use chrono::Utc;
use serenity::builder::{
    CreateAttachment, CreateCommand, CreateCommandOption, CreateEmbed,
    CreateInteractionResponse, CreateInteractionResponseMessage,
};
use serenity::model::Colour;
use serenity::model::application::{
    CommandInteraction, CommandOptionType, ResolvedOption, ResolvedValue,
};
use serenity::model::id::UserId;
use serenity::prelude::Context;
use std::str::FromStr;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{error, info, instrument};

const EMBED_COLOUR: Colour = Colour(0xFFFFFF);

/// Builds command definitions and dispatches invocations.
pub struct CommandHub {
    store: Arc<GuardStore>,
    notifier: Arc<dyn Notifier>,
    operators: Vec<Principal>,
    module_grace: chrono::Duration,
}

impl CommandHub {
    /// A hub over the given store and notifier. `operators` come from the
    /// process configuration and hold the highest tier.
    pub fn new(
        store: Arc<GuardStore>,
        notifier: Arc<dyn Notifier>,
        operators: Vec<Principal>,
        module_grace: chrono::Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            operators,
            module_grace,
        }
    }

    // --- gating tiers ---

    fn is_operator(&self, user: Principal) -> bool {
        self.operators.contains(&user) || self.store.is_operator(user)
    }

    fn is_trusted(&self, guild: GuildRef, user: Principal) -> bool {
        self.is_operator(user) || self.store.is_guild_operator(guild, user)
    }

    fn is_privileged(&self, guild: GuildRef, user: Principal) -> bool {
        self.is_trusted(guild, user) || self.store.grant(guild, user).is_some()
    }

    // --- definitions ---

    fn action_option() -> CreateCommandOption {
        let mut option =
            CreateCommandOption::new(CommandOptionType::String, "action", "Monitored action kind")
                .required(true);
        for kind in ActionKind::iter() {
            let label = kind.to_string();
            option = option.add_string_choice(label.clone(), label);
        }
        option
    }

    /// The command set registered at startup.
    pub fn definitions(&self) -> Vec<CreateCommand> {
        let mut grant_add = CreateCommand::new("grant-add")
            .description("Grant a member an enforcement exemption")
            .add_option(
                CreateCommandOption::new(CommandOptionType::User, "user", "Member to exempt")
                    .required(true),
            )
            .add_option(CreateCommandOption::new(
                CommandOptionType::Boolean,
                "all",
                "Exempt from every action kind",
            ));
        for kind in ActionKind::iter() {
            let label = kind.to_string();
            grant_add = grant_add.add_option(CreateCommandOption::new(
                CommandOptionType::Boolean,
                label.clone(),
                format!("Exempt from {label} enforcement"),
            ));
        }

        vec![
            CreateCommand::new("secur").description("Show guard status"),
            CreateCommand::new("set-limit")
                .description("Configure a rate threshold")
                .add_option(Self::action_option())
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::Integer,
                        "count",
                        "Events allowed within the window",
                    )
                    .required(true),
                )
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "window",
                        "Window token (10s, 5m, 1h, 2d)",
                    )
                    .required(true),
                ),
            CreateCommand::new("set-sanction")
                .description("Configure the sanction for an action kind")
                .add_option(Self::action_option())
                .add_option(
                    CreateCommandOption::new(CommandOptionType::String, "sanction", "Sanction")
                        .required(true)
                        .add_string_choice("none", "none")
                        .add_string_choice("warn", "warn")
                        .add_string_choice("strip-roles", "strip-roles")
                        .add_string_choice("timed-mute", "timed-mute")
                        .add_string_choice("kick", "kick")
                        .add_string_choice("ban", "ban"),
                )
                .add_option(CreateCommandOption::new(
                    CommandOptionType::String,
                    "duration",
                    "Mute duration token (for timed-mute)",
                )),
            CreateCommand::new("module")
                .description("Arm or disarm an enforcement module")
                .add_option(Self::action_option())
                .add_option(
                    CreateCommandOption::new(CommandOptionType::String, "status", "On or off")
                        .required(true)
                        .add_string_choice("on", "on")
                        .add_string_choice("off", "off"),
                ),
            grant_add,
            CreateCommand::new("grant-remove")
                .description("Remove a member's exemption")
                .add_option(
                    CreateCommandOption::new(CommandOptionType::User, "user", "Member")
                        .required(true),
                ),
            CreateCommand::new("grant-list").description("List exemptions in this guild"),
            CreateCommand::new("trust-add")
                .description("Make a member a trusted operator in this guild")
                .add_option(
                    CreateCommandOption::new(CommandOptionType::User, "user", "Member")
                        .required(true),
                ),
            CreateCommand::new("trust-remove")
                .description("Revoke a member's trusted-operator flag")
                .add_option(
                    CreateCommandOption::new(CommandOptionType::User, "user", "Member")
                        .required(true),
                ),
            CreateCommand::new("trust-list").description("List trusted operators in this guild"),
            CreateCommand::new("limit-role")
                .description("Add or remove a limited role")
                .add_option(
                    CreateCommandOption::new(CommandOptionType::String, "mode", "Add or remove")
                        .required(true)
                        .add_string_choice("add", "add")
                        .add_string_choice("remove", "remove"),
                )
                .add_option(
                    CreateCommandOption::new(CommandOptionType::Role, "role", "Role")
                        .required(true),
                ),
            CreateCommand::new("limit-role-list").description("List limited roles"),
            CreateCommand::new("limit-ping")
                .description("Add or remove a limited mention target")
                .add_option(
                    CreateCommandOption::new(CommandOptionType::String, "mode", "Add or remove")
                        .required(true)
                        .add_string_choice("add", "add")
                        .add_string_choice("remove", "remove"),
                )
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "target",
                        "@everyone, @here, or a role mention/id",
                    )
                    .required(true),
                ),
            CreateCommand::new("limit-ping-list").description("List limited mention targets"),
            CreateCommand::new("report-channel")
                .description("Route a report stream to a channel")
                .add_option(
                    CreateCommandOption::new(CommandOptionType::String, "stream", "Report stream")
                        .required(true)
                        .add_string_choice("moderation", "moderation")
                        .add_string_choice("operator", "operator"),
                )
                .add_option(CreateCommandOption::new(
                    CommandOptionType::Channel,
                    "channel",
                    "Destination channel (omit to disable)",
                )),
            CreateCommand::new("export-config")
                .description("Export the guard configuration as JSON"),
            CreateCommand::new("import-config")
                .description("Replace the guard configuration from a JSON export")
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::Attachment,
                        "file",
                        "A previous export",
                    )
                    .required(true),
                ),
        ]
    }

    // --- option parsing ---

    fn opt_str<'a>(options: &'a [ResolvedOption<'a>], name: &str) -> Option<&'a str> {
        options.iter().find_map(|o| match (o.name, &o.value) {
            (n, ResolvedValue::String(s)) if n == name => Some(*s),
            _ => None,
        })
    }

    fn opt_int(options: &[ResolvedOption<'_>], name: &str) -> Option<i64> {
        options.iter().find_map(|o| match (o.name, &o.value) {
            (n, ResolvedValue::Integer(i)) if n == name => Some(*i),
            _ => None,
        })
    }

    fn opt_bool(options: &[ResolvedOption<'_>], name: &str) -> Option<bool> {
        options.iter().find_map(|o| match (o.name, &o.value) {
            (n, ResolvedValue::Boolean(b)) if n == name => Some(*b),
            _ => None,
        })
    }

    fn opt_user(options: &[ResolvedOption<'_>], name: &str) -> Option<UserId> {
        options.iter().find_map(|o| match (o.name, &o.value) {
            (n, ResolvedValue::User(user, _)) if n == name => Some(user.id),
            _ => None,
        })
    }

    fn parse_mention_target(raw: &str) -> Option<MentionTarget> {
        match raw.trim().trim_start_matches('@').to_lowercase().as_str() {
            "everyone" => Some(MentionTarget::Everyone),
            "here" => Some(MentionTarget::Here),
            trimmed => trimmed
                .trim_start_matches("<@&")
                .trim_end_matches('>')
                .parse::<u64>()
                .ok()
                .map(|id| MentionTarget::Role(RoleRef(id))),
        }
    }

    fn embed(title: &str, description: impl Into<String>) -> CreateEmbed {
        CreateEmbed::new()
            .title(title)
            .description(description.into())
            .colour(EMBED_COLOUR)
    }

    fn message(title: &str, description: impl Into<String>) -> CreateInteractionResponseMessage {
        CreateInteractionResponseMessage::new().embed(Self::embed(title, description))
    }

    fn denied() -> CreateInteractionResponseMessage {
        Self::message("Permission denied", "You are not allowed to use this command")
            .ephemeral(true)
    }

    // --- dispatch ---

    /// Handle one command invocation.
    #[instrument(skip(self, ctx, command), fields(command = %command.data.name, user = %command.user.id))]
    pub async fn dispatch(&self, ctx: &Context, command: &CommandInteraction) {
        let Some(guild_id) = command.guild_id else {
            return;
        };
        let guild = GuildRef(guild_id.get());
        let user = Principal(command.user.id.get());
        let options = command.data.options();

        let reply = match command.data.name.as_str() {
            "secur" if self.is_privileged(guild, user) => self.status(guild),
            "set-limit" if self.is_operator(user) => self.set_limit(&options),
            "set-sanction" if self.is_operator(user) => self.set_sanction(&options),
            "module" if self.is_operator(user) => self.toggle_module(&options).await,
            "grant-add" if self.is_trusted(guild, user) => self.grant_add(guild, &options),
            "grant-remove" if self.is_trusted(guild, user) => self.grant_remove(guild, &options),
            "grant-list" if self.is_trusted(guild, user) => self.grant_list(guild),
            "trust-add" if self.is_operator(user) => self.trust_add(guild, &options),
            "trust-remove" if self.is_operator(user) => self.trust_remove(guild, &options),
            "trust-list" if self.is_trusted(guild, user) => self.trust_list(guild),
            "limit-role" if self.is_operator(user) => self.limit_role(&options),
            "limit-role-list" if self.is_privileged(guild, user) => self.limit_role_list(),
            "limit-ping" if self.is_operator(user) => self.limit_ping(&options),
            "limit-ping-list" if self.is_privileged(guild, user) => self.limit_ping_list(),
            "report-channel" if self.is_operator(user) => self.report_channel(guild, &options),
            "export-config" if self.is_operator(user) => self.export_config(),
            "import-config" if self.is_operator(user) => self.import_config(&options).await,
            _ => Self::denied(),
        };

        if let Err(e) = command
            .create_response(&ctx.http, CreateInteractionResponse::Message(reply))
            .await
        {
            error!(error = %e, "Interaction response failed");
        }
    }

    fn status(&self, guild: GuildRef) -> CreateInteractionResponseMessage {
        let now = Utc::now();
        let mut lines = String::new();
        for kind in ActionKind::iter() {
            let armed = self
                .store
                .module_active(kind, self.module_grace, now);
            let state = if armed { "on" } else { "off" };
            let sanction = self
                .store
                .sanction(kind)
                .map(|p| p.sanction.to_string())
                .unwrap_or_else(|| "none".to_string());
            match self.store.threshold(guild, kind) {
                Some(policy) => lines.push_str(&format!(
                    "**{kind}**: {state} {}/{} - {sanction}\n",
                    policy.max_count(),
                    policy.window()
                )),
                None => lines.push_str(&format!("**{kind}**: {state} - {sanction}\n")),
            }
        }
        Self::message("Guard status", lines)
    }

    fn set_limit(&self, options: &[ResolvedOption<'_>]) -> CreateInteractionResponseMessage {
        let Some(kind) = Self::opt_str(options, "action").and_then(|s| ActionKind::from_str(s).ok())
        else {
            return Self::message("Error", "Unknown action kind").ephemeral(true);
        };
        let count = Self::opt_int(options, "count").unwrap_or(0);
        let Some(window) = Self::opt_str(options, "window").and_then(DurationToken::parse) else {
            return Self::message("Error", "Window must be a token like 10s, 5m, 1h").ephemeral(true);
        };
        let Some(policy) = u32::try_from(count)
            .ok()
            .and_then(|n| ThresholdPolicy::new(n, window))
        else {
            return Self::message("Error", "Count must be at least 1").ephemeral(true);
        };
        if let Err(e) = self.store.set_threshold(None, kind, policy) {
            error!(error = %e, "Threshold write failed");
            return Self::message("Error", "Could not persist the threshold").ephemeral(true);
        }
        info!(%kind, count = policy.max_count(), window = %policy.window(), "Threshold configured");
        Self::message(
            "Threshold configured",
            format!("**{kind}**: {}/{}", policy.max_count(), policy.window()),
        )
    }

    fn set_sanction(&self, options: &[ResolvedOption<'_>]) -> CreateInteractionResponseMessage {
        let Some(kind) = Self::opt_str(options, "action").and_then(|s| ActionKind::from_str(s).ok())
        else {
            return Self::message("Error", "Unknown action kind").ephemeral(true);
        };
        let Some(sanction) =
            Self::opt_str(options, "sanction").and_then(|s| Sanction::from_str(s).ok())
        else {
            return Self::message("Error", "Unknown sanction").ephemeral(true);
        };
        let duration = Self::opt_str(options, "duration").and_then(DurationToken::parse);
        let policy = SanctionPolicy { sanction, duration };
        if let Err(e) = self.store.set_sanction(kind, policy) {
            error!(error = %e, "Sanction write failed");
            return Self::message("Error", "Could not persist the sanction").ephemeral(true);
        }
        let suffix = match (sanction, duration) {
            (Sanction::TimedMute, Some(d)) => format!(" ({d})"),
            (Sanction::TimedMute, None) => " (no duration: mute degrades to no sanction)".into(),
            _ => String::new(),
        };
        Self::message("Sanction configured", format!("**{kind}**: {sanction}{suffix}"))
    }

    async fn toggle_module(&self, options: &[ResolvedOption<'_>]) -> CreateInteractionResponseMessage {
        let Some(kind) = Self::opt_str(options, "action").and_then(|s| ActionKind::from_str(s).ok())
        else {
            return Self::message("Error", "Unknown action kind").ephemeral(true);
        };
        let turning_on = Self::opt_str(options, "status") == Some("on");

        let result = if turning_on {
            self.store.enable_module(kind)
        } else {
            self.store.disable_module(kind, Utc::now())
        };
        if let Err(e) = result {
            error!(error = %e, "Module write failed");
            return Self::message("Error", "Could not persist the switch").ephemeral(true);
        }

        self.notifier
            .notify_operators(&format!(
                "Module {kind} was switched {}",
                if turning_on { "on" } else { "off" }
            ))
            .await;

        if turning_on {
            Self::message("Module configured", format!("**{kind}** is armed"))
        } else {
            Self::message(
                "Module configured",
                format!(
                    "**{kind}** is disarmed; it re-arms automatically after {}s",
                    self.module_grace.num_seconds()
                ),
            )
        }
    }

    fn grant_add(
        &self,
        guild: GuildRef,
        options: &[ResolvedOption<'_>],
    ) -> CreateInteractionResponseMessage {
        let Some(user) = Self::opt_user(options, "user") else {
            return Self::message("Error", "Missing user").ephemeral(true);
        };
        let scope = if Self::opt_bool(options, "all") == Some(true) {
            Some(GrantScope::All)
        } else {
            GrantScope::from_kinds(
                ActionKind::iter()
                    .filter(|kind| Self::opt_bool(options, &kind.to_string()) == Some(true)),
            )
        };
        let Some(scope) = scope else {
            return Self::message("Error", "Select at least one action kind").ephemeral(true);
        };

        let grant = AuthorizationGrant {
            guild,
            principal: Principal(user.get()),
            scope: scope.clone(),
        };
        if let Err(e) = self.store.set_grant(grant) {
            error!(error = %e, "Grant write failed");
            return Self::message("Error", "Could not persist the grant").ephemeral(true);
        }
        let covered = match scope {
            GrantScope::All => "all actions".to_string(),
            GrantScope::Actions(kinds) => kinds
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        };
        Self::message("Grant set", format!("<@{user}> is exempt for: **{covered}**"))
    }

    fn grant_remove(
        &self,
        guild: GuildRef,
        options: &[ResolvedOption<'_>],
    ) -> CreateInteractionResponseMessage {
        let Some(user) = Self::opt_user(options, "user") else {
            return Self::message("Error", "Missing user").ephemeral(true);
        };
        if let Err(e) = self.store.remove_grant(guild, Principal(user.get())) {
            error!(error = %e, "Grant removal failed");
            return Self::message("Error", "Could not persist the removal").ephemeral(true);
        }
        Self::message("Grant removed", format!("<@{user}> is no longer exempt"))
    }

    fn grant_list(&self, guild: GuildRef) -> CreateInteractionResponseMessage {
        let grants = self.store.grants(guild);
        if grants.is_empty() {
            return Self::message("Grants", "No exemptions in this guild");
        }
        let mut lines = String::new();
        for (index, grant) in grants.iter().enumerate() {
            let covered = match &grant.scope {
                GrantScope::All => "all".to_string(),
                GrantScope::Actions(kinds) => kinds
                    .iter()
                    .map(|k| k.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            };
            lines.push_str(&format!(
                "`{}` <@{}> - {covered}\n",
                index + 1,
                grant.principal
            ));
        }
        Self::message("Grants", lines)
    }

    fn trust_add(
        &self,
        guild: GuildRef,
        options: &[ResolvedOption<'_>],
    ) -> CreateInteractionResponseMessage {
        let Some(user) = Self::opt_user(options, "user") else {
            return Self::message("Error", "Missing user").ephemeral(true);
        };
        if let Err(e) = self.store.add_guild_operator(guild, Principal(user.get())) {
            error!(error = %e, "Trust write failed");
            return Self::message("Error", "Could not persist the flag").ephemeral(true);
        }
        Self::message("Trusted operator", format!("<@{user}> is now trusted here"))
    }

    fn trust_remove(
        &self,
        guild: GuildRef,
        options: &[ResolvedOption<'_>],
    ) -> CreateInteractionResponseMessage {
        let Some(user) = Self::opt_user(options, "user") else {
            return Self::message("Error", "Missing user").ephemeral(true);
        };
        if let Err(e) = self
            .store
            .remove_guild_operator(guild, Principal(user.get()))
        {
            error!(error = %e, "Trust removal failed");
            return Self::message("Error", "Could not persist the removal").ephemeral(true);
        }
        Self::message(
            "Trusted operator",
            format!("<@{user}> is no longer trusted here"),
        )
    }

    fn trust_list(&self, guild: GuildRef) -> CreateInteractionResponseMessage {
        let mut lines: Vec<String> = self
            .operators
            .iter()
            .map(|p| format!("<@{p}> (process operator)"))
            .collect();
        lines.extend(
            self.store
                .operators()
                .iter()
                .map(|p| format!("<@{p}> (global)")),
        );
        let state = self.store.export();
        if let Some(set) = state.guild_operators.get(&guild) {
            lines.extend(set.iter().map(|p| format!("<@{p}>")));
        }
        Self::message("Trusted operators", lines.join("\n"))
    }

    fn limit_role(&self, options: &[ResolvedOption<'_>]) -> CreateInteractionResponseMessage {
        let adding = Self::opt_str(options, "mode") == Some("add");
        let role = options.iter().find_map(|o| match (o.name, &o.value) {
            ("role", ResolvedValue::Role(role)) => Some((*role).clone()),
            _ => None,
        });
        let Some(role) = role else {
            return Self::message("Error", "Missing role").ephemeral(true);
        };

        let result = if adding {
            self.store
                .add_limited_role(RoleRef(role.id.get()), role.name.clone())
        } else {
            self.store.remove_limited_role(RoleRef(role.id.get()))
        };
        if let Err(e) = result {
            error!(error = %e, "Limited role write failed");
            return Self::message("Error", "Could not persist the change").ephemeral(true);
        }
        Self::message(
            "Limited roles",
            if adding {
                format!("<@&{}> is now a limited role", role.id)
            } else {
                format!("<@&{}> is no longer a limited role", role.id)
            },
        )
    }

    fn limit_role_list(&self) -> CreateInteractionResponseMessage {
        let roles = self.store.limited_roles();
        if roles.is_empty() {
            return Self::message("Limited roles", "No limited roles");
        }
        let lines: Vec<String> = roles
            .iter()
            .map(|(role, name)| format!("<@&{role}> ({name})"))
            .collect();
        Self::message("Limited roles", lines.join("\n"))
    }

    fn limit_ping(&self, options: &[ResolvedOption<'_>]) -> CreateInteractionResponseMessage {
        let adding = Self::opt_str(options, "mode") == Some("add");
        let Some(target) =
            Self::opt_str(options, "target").and_then(Self::parse_mention_target)
        else {
            return Self::message("Error", "Target must be @everyone, @here, or a role")
                .ephemeral(true);
        };

        let result = if adding {
            self.store.add_limited_mention(target)
        } else {
            self.store.remove_limited_mention(target)
        };
        if let Err(e) = result {
            error!(error = %e, "Limited mention write failed");
            return Self::message("Error", "Could not persist the change").ephemeral(true);
        }
        Self::message(
            "Limited mentions",
            if adding {
                format!("{target} is now a limited mention")
            } else {
                format!("{target} is no longer a limited mention")
            },
        )
    }

    fn limit_ping_list(&self) -> CreateInteractionResponseMessage {
        let targets = self.store.limited_mentions();
        if targets.is_empty() {
            return Self::message("Limited mentions", "No limited mentions");
        }
        let lines: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
        Self::message("Limited mentions", lines.join("\n"))
    }

    fn report_channel(
        &self,
        guild: GuildRef,
        options: &[ResolvedOption<'_>],
    ) -> CreateInteractionResponseMessage {
        let Some(stream) =
            Self::opt_str(options, "stream").and_then(|s| ReportStream::from_str(s).ok())
        else {
            return Self::message("Error", "Unknown report stream").ephemeral(true);
        };
        let channel = options.iter().find_map(|o| match (o.name, &o.value) {
            ("channel", ResolvedValue::Channel(channel)) => Some(channel.id),
            _ => None,
        });

        let (result, description) = match channel {
            Some(channel) => (
                self.store
                    .set_report_channel(guild, stream, ChannelRef(channel.get())),
                format!("{stream} reports go to <#{channel}>"),
            ),
            None => (
                self.store.clear_report_channel(guild, stream),
                format!("{stream} reports disabled"),
            ),
        };
        if let Err(e) = result {
            error!(error = %e, "Report routing write failed");
            return Self::message("Error", "Could not persist the routing").ephemeral(true);
        }
        Self::message("Report routing", description)
    }

    fn export_config(&self) -> CreateInteractionResponseMessage {
        match serde_json::to_vec_pretty(&self.store.export()) {
            Ok(bytes) => CreateInteractionResponseMessage::new()
                .embed(Self::embed("Export", "Current guard configuration attached"))
                .add_file(CreateAttachment::bytes(bytes, "cerberus-config.json")),
            Err(e) => {
                error!(error = %e, "Export serialization failed");
                Self::message("Error", "Could not serialize the configuration").ephemeral(true)
            }
        }
    }

    async fn import_config(
        &self,
        options: &[ResolvedOption<'_>],
    ) -> CreateInteractionResponseMessage {
        let attachment = options.iter().find_map(|o| match (o.name, &o.value) {
            ("file", ResolvedValue::Attachment(attachment)) => Some(*attachment),
            _ => None,
        });
        let Some(attachment) = attachment else {
            return Self::message("Error", "Missing file").ephemeral(true);
        };
        if !attachment.filename.ends_with(".json") {
            return Self::message("Error", "The export must be a JSON file").ephemeral(true);
        }

        let bytes = match attachment.download().await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, "Attachment download failed");
                return Self::message("Error", "Could not download the file").ephemeral(true);
            }
        };
        let document: StoreDocument = match serde_json::from_slice(&bytes) {
            Ok(document) => document,
            Err(e) => {
                return Self::message("Error", format!("Invalid export: {e}")).ephemeral(true);
            }
        };
        if let Err(e) = self.store.import(document) {
            error!(error = %e, "Import failed");
            return Self::message("Error", "Import rejected; prior state kept").ephemeral(true);
        }
        info!("Configuration replaced from import");
        Self::message("Import", "Configuration restored")
    }
}
