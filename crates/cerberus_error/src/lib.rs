//! Error types for the Cerberus guild guard.
//!
//! This crate provides the foundation error types used throughout the
//! Cerberus workspace. Each domain error captures the source location of
//! its construction site via `#[track_caller]`, so a log line points at the
//! call that failed rather than at the error module.

#![warn(missing_docs)]

mod config;
mod engine;
mod store;

pub use config::ConfigError;
pub use engine::{EngineError, EngineErrorKind, EngineResult};
pub use store::{StoreError, StoreErrorKind, StoreResult};

/// Top-level error for the Cerberus workspace.
///
/// Wraps the domain errors so facade code can use a single result type.
#[derive(Debug)]
pub enum CerberusError {
    /// Enforcement engine error.
    Engine(EngineError),
    /// Configuration store error.
    Store(StoreError),
    /// Configuration file error.
    Config(ConfigError),
}

impl std::fmt::Display for CerberusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engine(e) => write!(f, "{e}"),
            Self::Store(e) => write!(f, "{e}"),
            Self::Config(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CerberusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

impl From<EngineError> for CerberusError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

impl From<StoreError> for CerberusError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<ConfigError> for CerberusError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Result type for Cerberus operations.
pub type CerberusResult<T> = Result<T, CerberusError>;
