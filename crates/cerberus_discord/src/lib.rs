//! Discord integration for the Cerberus guild guard.
//!
//! Implements the engine's collaborator traits against Discord: mutation
//! calls and audit-trail queries over Serenity's HTTP client, a
//! filesystem-backed asset store fed from the CDN, operator notifications
//! and report embeds, plus the gateway event handler and the slash-command
//! surface.

#![warn(missing_docs)]

mod assets;
mod audit;
mod client;
mod commands;
mod error;
mod handler;
mod mutations;
mod notify;

pub use assets::FileAssetStore;
pub use audit::HttpAuditQuery;
pub use client::Sentinel;
pub use commands::CommandHub;
pub use error::{DiscordError, DiscordErrorKind, DiscordResult};
pub use handler::GuardHandler;
pub use mutations::HttpMutationApi;
pub use notify::DiscordNotifier;
