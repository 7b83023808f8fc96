//! Cerberus: a guard process for Discord guilds.
//!
//! Wires the configuration store, the abuse-detection engine, and the
//! Discord collaborators together, then hands control to the gateway
//! client.

mod config;

use cerberus_core::Principal;
use cerberus_discord::{
    CommandHub, DiscordNotifier, FileAssetStore, GuardHandler, HttpAuditQuery, HttpMutationApi,
    Sentinel,
};
use cerberus_engine::{GuardEngine, GuardOptions};
use cerberus_store::GuardStore;
use config::CerberusConfig;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config_path =
        std::env::var("CERBERUS_CONFIG").unwrap_or_else(|_| "cerberus.toml".to_string());
    let config = CerberusConfig::load_or_default(&config_path)?;
    let token = std::env::var("DISCORD_TOKEN")
        .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN is not set"))?;

    let store = Arc::new(GuardStore::open(config.store_path())?);
    let operators: Vec<Principal> = config.operators().iter().copied().map(Principal).collect();
    let module_grace = chrono::Duration::seconds(*config.module_grace_secs() as i64);

    let http = Sentinel::shared_http(&token);
    let notifier = Arc::new(DiscordNotifier::new(
        Arc::clone(&http),
        Arc::clone(&store),
        operators.clone(),
    ));

    let engine = GuardEngine::new(
        Arc::clone(&store),
        Arc::new(HttpAuditQuery::new(Arc::clone(&http))),
        Arc::new(HttpMutationApi::new(Arc::clone(&http))),
        Arc::new(FileAssetStore::new(config.asset_dir())),
        notifier.clone(),
        GuardOptions {
            module_grace,
            tracker_capacity: *config.tracker_capacity(),
        },
    );
    let commands = CommandHub::new(Arc::clone(&store), notifier, operators, module_grace);

    info!(config = %config_path, "Starting Cerberus");
    let mut bot = Sentinel::new(&token, GuardHandler::new(engine, commands)).await?;
    bot.start().await?;
    Ok(())
}
