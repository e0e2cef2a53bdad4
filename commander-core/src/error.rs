//! src/error.rs
//! ============================================================================
//! # `CoreError`: Unified Error Type for the Commander Core
//!
//! Every fallible operation in the crate returns `CoreResult<T>`. Variants carry
//! the offending path or hash, and `kind()` collapses them onto the small
//! taxonomy the UI layer reacts to.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::fs::entry::EntryHash;

/// Convenient alias carrying our unified error type
pub type CoreResult<T> = Result<T, CoreError>;

/// Coarse classification of failures, stable across variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing path or permission denied.
    PathNotAccessible,

    /// Navigation target exists but is not a directory.
    NotADirectory,

    /// Creation target already exists.
    AlreadyExists,

    /// No handler for the request (e.g. no default application).
    OperationNotSupported,

    /// Hash does not resolve in the pane's current listing.
    UnknownItem,

    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s: &str = match self {
            Self::PathNotAccessible => "path_not_accessible",
            Self::NotADirectory => "not_a_directory",
            Self::AlreadyExists => "already_exists",
            Self::OperationNotSupported => "operation_not_supported",
            Self::UnknownItem => "unknown_item",
            Self::Unknown => "unknown",
        };

        write!(f, "{s}")
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    /// Path is missing or cannot be read.
    #[error("Path not accessible: {path:?}: {reason}")]
    PathNotAccessible { path: PathBuf, reason: String },

    /// Navigation target is a file.
    #[error("Not a directory: {0:?}")]
    NotADirectory(PathBuf),

    /// Creation conflicts with an existing object.
    #[error("Already exists: {0:?}")]
    AlreadyExists(PathBuf),

    #[error("Operation not supported: {operation} on {path:?}: {reason}")]
    OperationNotSupported {
        operation: String,
        path: PathBuf,
        reason: String,
    },

    /// Hash from a stale or foreign listing.
    #[error("Item {hash} is not present in listing generation {generation}")]
    UnknownItem { hash: EntryHash, generation: u64 },

    /// Index past the end of a listing or volume list.
    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Standard IO error that fits no other variant.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unexpected error: {0}")]
    Other(String),
}

impl CoreError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::PathNotAccessible { .. } => ErrorKind::PathNotAccessible,
            Self::NotADirectory(_) => ErrorKind::NotADirectory,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::OperationNotSupported { .. } => ErrorKind::OperationNotSupported,
            Self::UnknownItem { .. } | Self::IndexOutOfRange { .. } => ErrorKind::UnknownItem,
            Self::Io(_) | Self::Other(_) => ErrorKind::Unknown,
        }
    }

    /// Classify an IO failure that happened while touching `path`.
    pub fn from_io<P: Into<PathBuf>>(path: P, err: io::Error) -> Self {
        let path: PathBuf = path.into();

        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => Self::PathNotAccessible {
                path,
                reason: err.to_string(),
            },
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(path),
            io::ErrorKind::NotADirectory => Self::NotADirectory(path),
            _ => Self::Io(err),
        }
    }

    /// Create an operation-not-supported error
    pub fn not_supported<S1, P, S2>(operation: S1, path: P, reason: S2) -> Self
    where
        S1: Into<String>,
        P: Into<PathBuf>,
        S2: Into<String>,
    {
        Self::OperationNotSupported {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(e: anyhow::Error) -> Self {
        Self::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_classified() {
        let missing = CoreError::from_io("/nope", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(missing.kind(), ErrorKind::PathNotAccessible);

        let denied = CoreError::from_io("/root", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(denied.kind(), ErrorKind::PathNotAccessible);

        let exists = CoreError::from_io("/tmp", io::Error::from(io::ErrorKind::AlreadyExists));
        assert_eq!(exists.kind(), ErrorKind::AlreadyExists);

        let other = CoreError::from_io("/tmp", io::Error::other("boom"));
        assert_eq!(other.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn pathless_io_errors_stay_io() {
        let err: CoreError = io::Error::from(io::ErrorKind::NotFound).into();

        assert!(matches!(err, CoreError::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }
}
