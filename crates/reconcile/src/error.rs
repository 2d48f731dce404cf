//! Error types for reconciliation operations.
//!
//! Errors are categorized so callers can tell fatal problems (bad
//! configuration, broken transport, unreadable local files) apart from
//! per-item remote failures that are counted and, unless stop-on-error is
//! set, absorbed.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::types::Summary;

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of reconciliation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid caller input detected before any I/O.
    Config,
    /// Client construction, authentication or connectivity.
    Transport,
    /// Malformed local file content.
    Decode,
    /// A single remote create/update/delete/get failed.
    Remote,
    /// The remote object does not exist.
    NotFound,
    /// The operation was interrupted.
    Cancelled,
    /// Local filesystem errors.
    Io,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Config => "Invalid configuration",
            Self::Transport => "Could not reach the server",
            Self::Decode => "Invalid local resource file",
            Self::Remote => "Remote operation failed",
            Self::NotFound => "Resource not found",
            Self::Cancelled => "Operation cancelled",
            Self::Io => "Filesystem error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Config => "Check the selectors, output format and context settings",
            Self::Transport => "Check the server URL, token and network connectivity",
            Self::Decode => "Fix the reported file and run the command again",
            Self::Remote => "Check the server logs or retry with --stop-on-error for details",
            Self::NotFound => "Verify the resource name or UID",
            Self::Cancelled => "Run the command again to finish reconciling",
            Self::Io => "Check directory permissions and available disk space",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while reconciling resources.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Requested output format is not supported by the operation.
    #[error("{operation} only supports -o json or -o yaml (got {format:?})")]
    UnsupportedFormat {
        /// Operation that rejected the format.
        operation: &'static str,
        /// Requested format.
        format: String,
    },

    /// Selector did not resolve to any known kind.
    #[error("unknown resource selector: {0:?}")]
    UnknownSelector(String),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code, if a response was received.
        status: Option<u16>,
    },

    /// The remote object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Local file could not be decoded.
    #[error("parse error in '{}': {message}", path.display())]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },

    /// Object is missing required identity fields.
    #[error("invalid object: {0}")]
    InvalidObject(String),

    /// Alert rule has no UID, even after the file-name fallback.
    #[error("alert rule is missing uid")]
    MissingUid,

    /// No descriptor is registered for the object's kind.
    #[error("no descriptor registered for kind {0}")]
    UnknownKind(String),

    /// The operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// IO error during file operations.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// Create a decode error for a local file.
    pub fn parse(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnsupportedFormat { .. } | Error::UnknownSelector(_) | Error::Config(_) => {
                ErrorCategory::Config
            }
            Error::Http { status: None, .. } => ErrorCategory::Transport,
            Error::Http {
                status: Some(401 | 403),
                ..
            } => ErrorCategory::Transport,
            Error::Http { .. } => ErrorCategory::Remote,
            Error::NotFound(_) => ErrorCategory::NotFound,
            Error::Parse { .. } | Error::InvalidObject(_) => ErrorCategory::Decode,
            Error::MissingUid | Error::UnknownKind(_) => ErrorCategory::Remote,
            Error::Cancelled => ErrorCategory::Cancelled,
            Error::Io { .. } => ErrorCategory::Io,
        }
    }

    /// Whether the remote reported that the object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::Http {
                    status: Some(404),
                    ..
                }
        )
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(404) => Self::NotFound("HTTP 404".to_string()),
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::http(format!("invalid API response: {err}"), None)
    }
}

/// An operation that stopped early, with the counts it reached.
///
/// Every operation that can partially succeed reports its tally even when it
/// fails, so callers can tell "nothing happened" from "N succeeded before the
/// failure".
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct Aborted {
    /// Work completed before the abort.
    pub summary: Summary,
    /// The error that stopped the operation; also its message.
    pub error: Error,
}

impl Aborted {
    pub fn new(summary: Summary, error: Error) -> Self {
        Self { summary, error }
    }
}

impl From<Error> for Aborted {
    fn from(error: Error) -> Self {
        Self {
            summary: Summary::default(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_category() {
        assert_eq!(
            Error::http("connection refused", None).category(),
            ErrorCategory::Transport
        );
        assert_eq!(
            Error::http("HTTP 401", Some(401)).category(),
            ErrorCategory::Transport
        );
        assert_eq!(
            Error::http("HTTP 500", Some(500)).category(),
            ErrorCategory::Remote
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound("dashboards/a".into()).is_not_found());
        assert!(Error::http("HTTP 404", Some(404)).is_not_found());
        assert!(!Error::http("HTTP 409", Some(409)).is_not_found());
        assert!(!Error::MissingUid.is_not_found());
    }

    #[test]
    fn test_ureq_status_mapping() {
        assert!(Error::from(ureq::Error::StatusCode(404)).is_not_found());
        let err = Error::from(ureq::Error::StatusCode(500));
        assert!(matches!(
            err,
            Error::Http {
                status: Some(500),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_error_mentions_path() {
        let err = Error::parse("/tmp/Alerts/rule.json", "expected value");
        assert_eq!(
            err.to_string(),
            "parse error in '/tmp/Alerts/rule.json': expected value"
        );
        assert_eq!(err.category(), ErrorCategory::Decode);
    }

    #[test]
    fn test_aborted_from_error_has_zero_summary() {
        let aborted = Aborted::from(Error::MissingUid);
        assert_eq!(aborted.summary, Summary::default());
        assert_eq!(aborted.to_string(), "alert rule is missing uid");
    }
}
