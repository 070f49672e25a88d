//! forge::traits
//!
//! Forge trait definition: the Git data operations the filesystem consumes.
//!
//! # Design
//!
//! The `Forge` trait is async because every operation is a network round
//! trip. A forge instance is bound to one repository at construction, so
//! owner and repo never appear in method signatures.
//!
//! Implementations never retry. Every failure, including a rejected ref
//! update, is returned to the caller as-is.
//!
//! # Example
//!
//! ```ignore
//! use ghfs::forge::Forge;
//! use ghfs::core::types::BranchName;
//!
//! async fn head(forge: &dyn Forge) -> Result<(), ForgeError> {
//!     let branch = forge.get_branch(&BranchName::new("main")?).await?;
//!     let entries = forge.get_tree(&branch.head_tree, true).await?;
//!     println!("{} entries at {}", entries.len(), branch.head_commit.short(7));
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use base64::Engine;
use thiserror::Error;

use crate::core::types::{BranchName, BranchState, Entry, EntryKind, FileMode, Oid};

/// Errors from forge operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForgeError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested object, path or branch was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// A non-forced ref update was rejected because the ref moved.
    #[error("ref update rejected: {0}")]
    RefConflict(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// A response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The remote returned only part of a recursive tree listing.
    #[error("tree {0} is too large to list in one request")]
    TruncatedTree(Oid),
}

/// How blob content is encoded in transit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobEncoding {
    /// Standard base64, possibly wrapped across lines.
    Base64,
    /// Plain UTF-8 text.
    Utf8,
}

/// Blob content as returned by the remote, still transport-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// Encoded content.
    pub content: String,
    /// Encoding of `content`.
    pub encoding: BlobEncoding,
}

impl Blob {
    /// Wrap raw bytes as a base64 blob.
    pub fn encode(bytes: &[u8]) -> Self {
        Self {
            content: base64::engine::general_purpose::STANDARD.encode(bytes),
            encoding: BlobEncoding::Base64,
        }
    }

    /// Decode the transport encoding into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `ForgeError::Decode` for malformed base64.
    pub fn decode(&self) -> Result<Vec<u8>, ForgeError> {
        match self.encoding {
            BlobEncoding::Utf8 => Ok(self.content.clone().into_bytes()),
            BlobEncoding::Base64 => {
                // GitHub wraps base64 payloads at 60 columns.
                let compact: String = self
                    .content
                    .chars()
                    .filter(|c| !c.is_ascii_whitespace())
                    .collect();
                base64::engine::general_purpose::STANDARD
                    .decode(compact)
                    .map_err(|e| ForgeError::Decode(format!("invalid base64 blob: {}", e)))
            }
        }
    }
}

/// One entry submitted to `create_tree`.
///
/// `path` may contain separators, in which case the remote places the entry
/// inside the named subtree, overriding what a tree entry for that subtree
/// would otherwise contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    /// Path relative to the tree being created.
    pub path: String,
    /// Git mode.
    pub mode: FileMode,
    /// Blob or tree.
    pub kind: EntryKind,
    /// Object the entry points at.
    pub oid: Oid,
}

impl TreeItem {
    /// Build an item from a materialized entry, relative to `path`.
    ///
    /// Returns `None` for entries without a content reference, which the
    /// remote cannot represent.
    pub fn from_entry(entry: &Entry, path: impl Into<String>) -> Option<Self> {
        entry.oid.clone().map(|oid| Self {
            path: path.into(),
            mode: entry.mode,
            kind: entry.kind,
            oid,
        })
    }
}

/// Result of a single-path delete transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Commit created by the delete.
    pub commit: Oid,
    /// Root tree of that commit.
    pub tree: Oid,
}

/// The Forge trait: Git data operations against one remote repository.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a filesystem session can be
/// shared across tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, ForgeError>`. Callers should handle:
/// - `RefConflict`: the branch moved; reload before trying again
/// - `NotFound`: object, path or branch doesn't exist
/// - `AuthRequired` / `AuthFailed`: supply a valid token
/// - `RateLimited`: back off and retry
#[async_trait]
pub trait Forge: Send + Sync {
    /// Get the forge name (e.g., "github", "mock").
    fn name(&self) -> &'static str;

    /// Read the current head of a branch.
    async fn get_branch(&self, branch: &BranchName) -> Result<BranchState, ForgeError>;

    /// List a tree. With `recursive`, every nested entry is returned with its
    /// full path; directories appear as tree entries alongside their contents.
    async fn get_tree(&self, tree: &Oid, recursive: bool) -> Result<Vec<Entry>, ForgeError>;

    /// Fetch a blob's transport-encoded content.
    async fn get_blob(&self, blob: &Oid) -> Result<Blob, ForgeError>;

    /// Store raw bytes as a blob.
    async fn create_blob(&self, content: &[u8]) -> Result<Oid, ForgeError>;

    /// Create a tree object from the given items.
    async fn create_tree(&self, items: &[TreeItem]) -> Result<Oid, ForgeError>;

    /// Create a commit with a single parent.
    async fn create_commit(&self, message: &str, tree: &Oid, parent: &Oid)
        -> Result<Oid, ForgeError>;

    /// Point a branch at a commit. Without `force`, the update must be a
    /// fast-forward or `ForgeError::RefConflict` is returned.
    async fn update_ref(
        &self,
        branch: &BranchName,
        commit: &Oid,
        force: bool,
    ) -> Result<(), ForgeError>;

    /// Delete one file in its own commit on `branch`. `blob` must be the
    /// file's current content reference.
    async fn delete_path(
        &self,
        path: &str,
        blob: &Oid,
        branch: &BranchName,
        message: &str,
    ) -> Result<DeleteResult, ForgeError>;
}
