//! Discord-specific error types.

use std::fmt;

/// Discord error variants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiscordErrorKind {
    /// Serenity API error (HTTP error, gateway error, rate limit).
    SerenityError(String),

    /// Connection to the Discord gateway failed.
    ConnectionFailed(String),

    /// Bot token is invalid or missing.
    InvalidToken,

    /// Asset download from the CDN failed.
    AssetDownloadFailed(String),

    /// Asset file I/O failed.
    AssetIoFailed(String),

    /// An interaction (slash command) failed.
    InteractionFailed(String),

    /// Configuration error (missing env vars, invalid settings).
    ConfigurationError(String),
}

impl fmt::Display for DiscordErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SerenityError(msg) => write!(f, "Serenity API error: {msg}"),
            Self::ConnectionFailed(msg) => write!(f, "Connection failed: {msg}"),
            Self::InvalidToken => write!(f, "Invalid or missing bot token"),
            Self::AssetDownloadFailed(msg) => write!(f, "Asset download failed: {msg}"),
            Self::AssetIoFailed(msg) => write!(f, "Asset I/O failed: {msg}"),
            Self::InteractionFailed(msg) => write!(f, "Interaction failed: {msg}"),
            Self::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

/// Discord error with source location tracking.
#[derive(Debug, Clone)]
pub struct DiscordError {
    /// The error variant.
    pub kind: DiscordErrorKind,
    /// Line number where the error occurred.
    pub line: u32,
    /// File where the error occurred.
    pub file: &'static str,
}

impl DiscordError {
    /// Create a new DiscordError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DiscordErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl fmt::Display for DiscordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Discord Error: {} at line {} in {}",
            self.kind, self.line, self.file
        )
    }
}

impl std::error::Error for DiscordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// Result type for Discord operations.
pub type DiscordResult<T> = Result<T, DiscordError>;

impl From<serenity::Error> for DiscordError {
    #[track_caller]
    fn from(err: serenity::Error) -> Self {
        DiscordError::new(DiscordErrorKind::SerenityError(err.to_string()))
    }
}
