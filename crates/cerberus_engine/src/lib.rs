//! Abuse-detection and response engine for the Cerberus guild guard.
//!
//! The engine watches administrative mutations flowing in from the platform
//! layer and decides, per event, what to undo and whom to punish. Every
//! event runs the same linear pipeline:
//!
//! 1. Attribute the mutation to the acting principal
//! 2. Check whether that principal is exempt
//! 3. Revert or delete what policy says must not persist
//! 4. Record the action in the sliding rate window
//! 5. Escalate to a sanction when the window count meets the threshold
//! 6. Report the outcome to operators and the configured report channel
//!
//! The stage order is load-bearing: the sanction decision reads the count
//! that includes the just-recorded event. External collaborators (mutation
//! calls, audit trail, asset blobs, notifications) sit behind traits so the
//! pipeline is testable without a live platform connection.

#![warn(missing_docs)]

mod attribution;
mod authorize;
mod escalate;
mod notify;
mod pipeline;
mod platform;
mod revert;
mod snapshot;
mod tracker;

pub use attribution::{Attribution, AttributionLookup, AuditEntry, AuditProbe, AuditQuery, RetryConfig};
pub use authorize::AuthorizationResolver;
pub use escalate::PunishmentEscalator;
pub use notify::{EnforcementReport, Notifier};
pub use pipeline::{GuardEngine, GuardOptions, MessageEvent};
pub use platform::{
    ChannelState, LiveProfile, MutationApi, OverwriteKind, PermissionOverwrite, ProfileField,
    ProfileRestore,
};
pub use revert::RevertEngine;
pub use snapshot::{AssetStore, SnapshotKeeper};
pub use tracker::ActionTracker;
