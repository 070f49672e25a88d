//! fs::error
//!
//! Error taxonomy for filesystem operations.

use std::io;

use thiserror::Error;

use crate::core::paths::PathError;
use crate::core::types::Oid;
use crate::forge::ForgeError;

/// Errors from filesystem operations.
///
/// Every error is surfaced to the caller immediately; nothing in the stack
/// retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    /// No entry exists at the path.
    #[error("no such file or directory: '{0}'")]
    NotFound(String),

    /// An entry already occupies the path.
    #[error("file exists: '{0}'")]
    FileExists(String),

    /// The parent directory of the path does not exist.
    #[error("parent directory of '{0}' does not exist")]
    MissingParent(String),

    /// The branch moved since it was last observed. Reload and reissue.
    #[error("branch head moved: expected {expected}, found {actual}")]
    Conflict {
        /// Head the session last observed.
        expected: Oid,
        /// Head the remote reported.
        actual: Oid,
    },

    /// A remote call failed.
    #[error(transparent)]
    Remote(#[from] ForgeError),

    /// Malformed path or an operation that makes no sense for the target.
    #[error("invalid argument: {0}")]
    Invalid(String),
}

impl From<PathError> for FsError {
    fn from(e: PathError) -> Self {
        FsError::Invalid(e.to_string())
    }
}

impl From<FsError> for io::Error {
    fn from(e: FsError) -> Self {
        let kind = match &e {
            FsError::NotFound(_) | FsError::MissingParent(_) => io::ErrorKind::NotFound,
            FsError::FileExists(_) => io::ErrorKind::AlreadyExists,
            FsError::Invalid(_) => io::ErrorKind::InvalidInput,
            FsError::Conflict { .. } | FsError::Remote(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_kinds() {
        let cases = [
            (FsError::NotFound("a".into()), io::ErrorKind::NotFound),
            (FsError::MissingParent("a/b".into()), io::ErrorKind::NotFound),
            (FsError::FileExists("a".into()), io::ErrorKind::AlreadyExists),
            (FsError::Invalid("bad".into()), io::ErrorKind::InvalidInput),
            (
                FsError::Remote(ForgeError::RateLimited),
                io::ErrorKind::Other,
            ),
        ];
        for (err, kind) in cases {
            assert_eq!(io::Error::from(err).kind(), kind);
        }
    }

    #[test]
    fn path_errors_are_invalid() {
        let err: FsError = crate::core::paths::normalize("a/../b").unwrap_err().into();
        assert!(matches!(err, FsError::Invalid(_)));
    }

    #[test]
    fn conflict_display() {
        let err = FsError::Conflict {
            expected: Oid::new("a".repeat(40)).unwrap(),
            actual: Oid::new("b".repeat(40)).unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("branch head moved"));
        assert!(msg.contains(&"b".repeat(40)));
    }

    #[test]
    fn remote_is_transparent() {
        let err = FsError::from(ForgeError::RateLimited);
        assert_eq!(err.to_string(), "rate limited");
    }
}
