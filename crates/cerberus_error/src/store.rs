//! Configuration store error types.

use std::fmt;

/// Store error variants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StoreErrorKind {
    /// Reading or writing the backing file failed.
    Io(String),

    /// The store document failed to serialize or deserialize.
    Serialization(String),

    /// An import document was rejected before any state was replaced.
    ImportRejected(String),
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "Store I/O error: {msg}"),
            Self::Serialization(msg) => write!(f, "Store serialization error: {msg}"),
            Self::ImportRejected(msg) => write!(f, "Import rejected: {msg}"),
        }
    }
}

/// Store error with source location tracking.
#[derive(Debug, Clone)]
pub struct StoreError {
    /// The error variant.
    pub kind: StoreErrorKind,
    /// Line number where the error occurred.
    pub line: u32,
    /// File where the error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Create a new StoreError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Store Error: {} at line {} in {}",
            self.kind, self.line, self.file
        )
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl From<serde_json::Error> for StoreError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        StoreError::new(StoreErrorKind::Serialization(err.to_string()))
    }
}

impl From<std::io::Error> for StoreError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        StoreError::new(StoreErrorKind::Io(err.to_string()))
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
