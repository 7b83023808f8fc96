//! Domain types for the Cerberus guild guard.
//!
//! This crate defines the platform-independent vocabulary of the
//! abuse-detection engine: the monitored action kinds, the sanction ladder,
//! authorization grants, rate-threshold and sanction policies, guild
//! snapshots, and the module enable switches. Nothing here talks to the
//! platform; the engine and the Discord layer build on these types.

#![warn(missing_docs)]

mod action;
mod duration;
mod grant;
mod ids;
mod mention;
mod module;
mod policy;
mod sanction;
mod snapshot;

pub use action::ActionKind;
pub use duration::{DurationToken, DurationUnit};
pub use grant::{AuthorizationGrant, GrantScope};
pub use ids::{ChannelRef, GuildRef, MessageRef, Principal, RoleRef};
pub use mention::MentionTarget;
pub use module::ModuleSwitch;
pub use policy::ThresholdPolicy;
pub use sanction::{Sanction, SanctionPolicy};
pub use snapshot::{AssetSlot, GuildSnapshot};
