//! Error types for cainiao-tracker.
//!
//! Follows the thiserror pattern. Not-found conditions inside the list state
//! manager are deliberately absent here: those are silent no-ops. Everything
//! else is contained to the operation that produced it and surfaced once.

use thiserror::Error;

/// Primary error type for cainiao-tracker operations.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Persisted list could not be decoded and the store is configured to fail.
    #[error("Stored list '{key}' is corrupt: {message}")]
    CorruptStore {
        /// Store key holding the corrupt value.
        key: String,
        /// Decoder message.
        message: String,
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// The store file is not a JSON object of strings and the store is
    /// configured to fail.
    #[error("Store file {} is corrupt: {message}", path.display())]
    CorruptStoreFile {
        /// Path of the store file.
        path: std::path::PathBuf,
        /// Decoder message.
        message: String,
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// A CLI selector matched no tracked item.
    #[error("No tracked parcel matches '{selector}'")]
    ItemNotFound {
        /// Selector as typed by the user.
        selector: String,
    },

    /// A CLI selector matched more than one item.
    #[error("Selector '{selector}' is ambiguous ({count} matches)")]
    AmbiguousSelector {
        /// Selector as typed by the user.
        selector: String,
        /// Number of matching items.
        count: usize,
    },

    /// Release API returned a non-success status.
    #[error("Connection error: HTTP {status} from {url}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// Transport-level failure talking to the release host.
    #[error("Network error: {context}")]
    Network {
        /// What was being attempted.
        context: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The release was found but no asset matched the package suffix.
    #[error("No '{suffix}' asset found in release {tag}")]
    MissingAsset {
        /// Release tag.
        tag: String,
        /// Package suffix searched for.
        suffix: String,
    },

    /// Download finished without producing a usable file.
    #[error("Download failed: {message}")]
    Download {
        /// Human-readable error message.
        message: String,
    },

    /// A version string could not be parsed.
    #[error("Invalid version string '{version}'")]
    InvalidVersion {
        /// The offending version string.
        version: String,
    },

    /// I/O error.
    #[error("I/O error: {context}")]
    IoError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {context}")]
    SerializationError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Human-readable error message.
        message: String,
    },

    /// Invalid argument.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// Name of the invalid argument.
        name: String,
        /// Reason why the argument is invalid.
        reason: String,
    },

    /// A URL could not be built or opened.
    #[error("Cannot open {url}: {reason}")]
    Browser {
        /// URL the browser was asked to open.
        url: String,
        /// Reason the request failed.
        reason: String,
    },

    /// TUI error.
    #[error("TUI error: {message}")]
    TuiError {
        /// Human-readable error message.
        message: String,
    },

    /// Unsupported operation or feature.
    #[error("Unsupported: {feature}")]
    Unsupported {
        /// Name of the unsupported feature.
        feature: String,
    },

    /// Interrupted operation.
    #[error("Operation interrupted")]
    Interrupted,
}

impl TrackerError {
    /// Create a new I/O error with context.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            context: context.into(),
            source,
        }
    }

    /// Create a new network error with context.
    #[must_use]
    pub fn network(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            context: context.into(),
            source,
        }
    }

    /// Create a new invalid-argument error.
    #[must_use]
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a new download error.
    #[must_use]
    pub fn download(message: impl Into<String>) -> Self {
        Self::Download {
            message: message.into(),
        }
    }

    /// Create a new unsupported error.
    #[must_use]
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::CorruptStore { .. } | Self::CorruptStoreFile { .. } => {
                exit_codes::EXIT_DATA_ERROR
            }
            Self::ItemNotFound { .. } => exit_codes::EXIT_NOT_FOUND,
            Self::AmbiguousSelector { .. } | Self::InvalidArgument { .. } => {
                exit_codes::EXIT_USAGE_ERROR
            }
            Self::InvalidConfig { .. } => exit_codes::EXIT_CONFIG_ERROR,
            Self::Http { .. }
            | Self::Network { .. }
            | Self::MissingAsset { .. }
            | Self::Download { .. } => exit_codes::EXIT_NETWORK_ERROR,
            Self::Interrupted => exit_codes::EXIT_INTERRUPTED,
            Self::IoError { .. } => exit_codes::EXIT_IO_ERROR,
            _ => exit_codes::EXIT_GENERAL_ERROR,
        }
    }

    /// Whether the user can simply try again (nothing is retried automatically).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Network { .. } | Self::Download { .. })
    }
}

/// Result type alias for cainiao-tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            context: "I/O operation failed".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            context: "JSON operation failed".to_string(),
            source: err,
        }
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            context: "HTTP request failed".to_string(),
            source: err,
        }
    }
}

/// Exit codes for CLI operations.
pub mod exit_codes {
    /// Operation completed successfully.
    pub const EXIT_SUCCESS: i32 = 0;
    /// General/unspecified error.
    pub const EXIT_GENERAL_ERROR: i32 = 1;
    /// Selector or file not found.
    pub const EXIT_NOT_FOUND: i32 = 3;
    /// Invalid configuration.
    pub const EXIT_CONFIG_ERROR: i32 = 5;
    /// Release check or download failed.
    pub const EXIT_NETWORK_ERROR: i32 = 8;
    /// Invalid command-line usage (BSD standard).
    pub const EXIT_USAGE_ERROR: i32 = 64;
    /// Input data format error (BSD standard).
    pub const EXIT_DATA_ERROR: i32 = 65;
    /// I/O error (BSD standard).
    pub const EXIT_IO_ERROR: i32 = 74;
    /// Terminated by Ctrl+C (128 + SIGINT).
    pub const EXIT_INTERRUPTED: i32 = 130;
}
