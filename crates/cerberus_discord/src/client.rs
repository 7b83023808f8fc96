//! Gateway client assembly.

use crate::error::{DiscordError, DiscordResult};
use crate::handler::GuardHandler;
use serenity::http::Http;
use serenity::prelude::{Client, GatewayIntents};
use std::sync::Arc;
use tracing::{info, instrument};

/// The running guard bot: a Serenity gateway client wired to the engine.
pub struct Sentinel {
    client: Client,
}

impl Sentinel {
    /// The gateway intents the guard needs: guild structure, members,
    /// moderation events, message content, and voice state.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MEMBERS
            | GatewayIntents::GUILD_MODERATION
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_VOICE_STATES
    }

    /// A standalone HTTP client for the REST-facing collaborators.
    ///
    /// The engine's mutation, audit, and notification calls run through
    /// this client; the gateway connection manages its own.
    pub fn shared_http(token: impl AsRef<str>) -> Arc<Http> {
        Arc::new(Http::new(token.as_ref()))
    }

    /// Build the gateway client around the given handler.
    #[instrument(skip(token, handler), fields(token_len = token.as_ref().len()))]
    pub async fn new(token: impl AsRef<str>, handler: GuardHandler) -> DiscordResult<Self> {
        info!("Building gateway client");
        let client = Client::builder(token.as_ref(), Self::intents())
            .event_handler(handler)
            .await
            .map_err(DiscordError::from)?;
        Ok(Self { client })
    }

    /// Connect to the gateway and process events until shutdown.
    pub async fn start(&mut self) -> DiscordResult<()> {
        info!("Connecting to the gateway");
        self.client.start().await.map_err(DiscordError::from)
    }
}
