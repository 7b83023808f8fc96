//! Enforcement engine error types.

use std::fmt;

/// Engine error variants.
///
/// Represents the failure taxonomy of the abuse-detection engine. Most of
/// these are policy outcomes rather than faults: attribution can legitimately
/// be missing, and a rejected mutation is reported but never retried.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EngineErrorKind {
    /// The audit trail had no entry matching the observed mutation.
    ///
    /// Enforcement skips the event: no sanction without a named principal.
    AttributionMissing {
        /// Guild where the mutation was observed.
        guild: u64,
        /// Action label that could not be attributed.
        action: String,
    },

    /// A compensating or punitive platform call failed.
    ///
    /// Caught at the call site and reported; never aborts sibling steps.
    MutationRejected {
        /// The mutation that was attempted (e.g. "delete-channel").
        operation: String,
        /// Platform-supplied failure reason.
        reason: String,
    },

    /// No threshold or sanction policy is configured for an action kind.
    ///
    /// Treated as "feature disabled for that kind", not a fault.
    PolicyMissing(String),

    /// A snapshot restore was requested for a guild with no snapshot.
    SnapshotMissing(u64),

    /// The asset blob store had no bytes for the requested slot.
    AssetMissing {
        /// Guild whose asset was requested.
        guild: u64,
        /// Asset slot label ("icon" or "banner").
        slot: String,
    },
}

impl fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttributionMissing { guild, action } => {
                write!(f, "No audit entry attributes {action} in guild {guild}")
            }
            Self::MutationRejected { operation, reason } => {
                write!(f, "Mutation {operation} rejected: {reason}")
            }
            Self::PolicyMissing(action) => write!(f, "No policy configured for {action}"),
            Self::SnapshotMissing(guild) => write!(f, "No snapshot held for guild {guild}"),
            Self::AssetMissing { guild, slot } => {
                write!(f, "No {slot} backup held for guild {guild}")
            }
        }
    }
}

/// Engine error with source location tracking.
#[derive(Debug, Clone)]
pub struct EngineError {
    /// The error variant.
    pub kind: EngineErrorKind,
    /// Line number where the error occurred.
    pub line: u32,
    /// File where the error occurred.
    pub file: &'static str,
}

impl EngineError {
    /// Create a new EngineError with automatic location tracking.
    ///
    /// # Example
    /// ```
    /// use cerberus_error::{EngineError, EngineErrorKind};
    ///
    /// let err = EngineError::new(EngineErrorKind::PolicyMissing("ban".into()));
    /// assert!(err.to_string().contains("ban"));
    /// ```
    #[track_caller]
    pub fn new(kind: EngineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Engine Error: {} at line {} in {}",
            self.kind, self.line, self.file
        )
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
