//! Error types for folio_core operations.

use thiserror::Error;

/// Core error type for folio_core operations.
#[derive(Error, Debug)]
pub enum FolioError {
    /// Nothing is stored at the given path.
    #[error("not found: {0}")]
    NotFound(String),

    /// An unconditional create hit an occupied path.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The supplied version token is not the store's current one.
    #[error("conflict at {path}: expected version {expected} is stale")]
    Conflict {
        /// Path of the contested blob
        path: String,
        /// The version token the caller presented
        expected: String,
    },

    /// Input rejected before any store round-trip.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A header marker was present but the header could not be decoded.
    #[error("malformed document{}: {reason}", at_path(path))]
    MalformedDocument {
        /// Path of the document, when known
        path: Option<String>,
        /// What failed to decode
        reason: String,
    },

    /// The store or the access gate refused the caller.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Network failure, rate limit or timeout. Safe to retry verbatim.
    #[error("transient store error: {0}")]
    Transient(String),

    /// A blob operation targeted a directory.
    #[error("is a directory: {0}")]
    IsDirectory(String),

    /// Configuration error (loading, parsing, invalid values).
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// I/O error during local file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding of a header or API payload failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

fn at_path(path: &Option<String>) -> String {
    match path {
        Some(p) => format!(" at {}", p),
        None => String::new(),
    }
}

impl FolioError {
    /// Returns true for failures that are safe to retry without re-reading.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Attaches a path to a `MalformedDocument` error that does not carry one yet.
    pub(crate) fn at(self, path: &str) -> Self {
        match self {
            Self::MalformedDocument { path: None, reason } => Self::MalformedDocument {
                path: Some(path.to_string()),
                reason,
            },
            other => other,
        }
    }

    /// Returns a user-friendly recovery suggestion for the error, if available.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Conflict { .. } => Some(
                "Someone else changed this document. Reload it with 'folio show' and reapply your edit with the new hash.",
            ),
            Self::AlreadyExists(_) => {
                Some("A document with this date and title exists. Choose a different title.")
            }
            Self::AccessDenied(_) => {
                Some("Check the identity passed with --as and the [access] allow list, or the store token.")
            }
            Self::Transient(_) => Some("The store is unreachable or rate limited. Try again later."),
            Self::MalformedDocument { .. } => {
                Some("Fix the front matter of this document by hand; it is not valid YAML.")
            }
            Self::ConfigError(_) => Some("Run 'folio init' to write a default folio.toml."),
            _ => None,
        }
    }
}

/// Convenience Result type for folio_core operations.
pub type Result<T> = std::result::Result<T, FolioError>;
