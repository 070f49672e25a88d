//! core::types
//!
//! Strong types for the flat tree model.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`Oid`] - Git object identifier (content reference)
//! - [`EntryKind`] / [`FileMode`] - Blob or tree, and the Git mode it carries
//! - [`Entry`] - One record of the flat tree
//! - [`BranchState`] - Snapshot of a branch head used for optimistic concurrency
//!
//! # Validation
//!
//! Names and object ids are validated at construction time, so a value of
//! these types is always something the remote will accept.
//!
//! # Examples
//!
//! ```
//! use ghfs::core::types::{BranchName, Entry, Oid};
//!
//! let branch = BranchName::new("main").unwrap();
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! let entry = Entry::blob("docs/readme.md", oid);
//!
//! assert_eq!(branch.as_str(), "main");
//! assert_eq!(entry.name(), "readme.md");
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::paths;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("unknown entry type: {0}")]
    UnknownEntryKind(String),

    #[error("unknown file mode: {0}")]
    UnknownFileMode(String),
}

/// A validated Git branch name.
///
/// Branch names must conform to Git's refname rules (see `git check-ref-format`):
/// - Cannot be empty or exactly `@`
/// - Cannot start with `.` or `-`
/// - Cannot end with `.lock` or `/`
/// - Cannot contain `..`, `@{`, `//`, or ASCII control characters
/// - Cannot contain spaces, `~`, `^`, `:`, `\`, `?`, `*`, `[`
///
/// # Example
///
/// ```
/// use ghfs::core::types::BranchName;
///
/// let name = BranchName::new("feature/site").unwrap();
/// assert_eq!(name.as_str(), "feature/site");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        let invalid = |msg: &str| Err(TypeError::InvalidBranchName(msg.to_string()));

        if name.is_empty() {
            return invalid("branch name cannot be empty");
        }
        if name == "@" {
            return invalid("branch name cannot be '@' (reserved)");
        }
        if name.starts_with('.') || name.starts_with('-') {
            return invalid("branch name cannot start with '.' or '-'");
        }
        if name.ends_with(".lock") || name.ends_with('/') {
            return invalid("branch name cannot end with '.lock' or '/'");
        }
        for bad in ["..", "@{", "//"] {
            if name.contains(bad) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{bad}'"
                )));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(TypeError::InvalidBranchName(format!(
                "branch name cannot contain '{c}'"
            )));
        }
        if name.chars().any(|c| c.is_ascii_control()) {
            return invalid("branch name cannot contain control characters");
        }

        if name
            .split('/')
            .any(|component| component.starts_with('.') || component.ends_with(".lock"))
        {
            return invalid("path component cannot start with '.' or end with '.lock'");
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Git object identifier (SHA-1 or SHA-256), used as a content reference
/// for blobs, trees and commits.
///
/// OIDs are normalized to lowercase.
///
/// ```
/// use ghfs::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a 40 or 64
    /// character hex string.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    /// Get an abbreviated form of the OID.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    fn validate(oid: &str) -> Result<(), TypeError> {
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of object an entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A file.
    Blob,
    /// A directory.
    Tree,
}

impl EntryKind {
    /// Wire name used by the Git data API.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Blob => "blob",
            EntryKind::Tree => "tree",
        }
    }

    /// Mode given to entries of this kind that the filesystem creates.
    pub fn mode(&self) -> FileMode {
        match self {
            EntryKind::Blob => FileMode::File,
            EntryKind::Tree => FileMode::Directory,
        }
    }
}

impl std::str::FromStr for EntryKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(EntryKind::Blob),
            "tree" => Ok(EntryKind::Tree),
            other => Err(TypeError::UnknownEntryKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Git file mode.
///
/// The filesystem only creates `File` and `Directory` entries. The other
/// modes are carried through unchanged for entries that already exist on
/// the remote, so a commit never rewrites what the caller did not touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileMode {
    /// `100644`
    File,
    /// `100755`
    Executable,
    /// `120000`
    Symlink,
    /// `040000`
    Directory,
}

impl FileMode {
    /// Octal mode string as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileMode::File => "100644",
            FileMode::Executable => "100755",
            FileMode::Symlink => "120000",
            FileMode::Directory => "040000",
        }
    }

    /// Unix permission bits, including the file type flag.
    pub fn bits(&self) -> u32 {
        match self {
            FileMode::File => 0o100644,
            FileMode::Executable => 0o100755,
            FileMode::Symlink => 0o120000,
            FileMode::Directory => 0o040000,
        }
    }
}

impl std::str::FromStr for FileMode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "100644" => Ok(FileMode::File),
            "100755" => Ok(FileMode::Executable),
            "120000" => Ok(FileMode::Symlink),
            "040000" | "40000" => Ok(FileMode::Directory),
            other => Err(TypeError::UnknownFileMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for FileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record of the flat tree.
///
/// `oid` is the content reference; it is `None` for directories created
/// locally that have not been materialized by a rebuild yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Slash-separated path relative to the repository root.
    pub path: String,
    /// Blob or tree.
    pub kind: EntryKind,
    /// Git mode.
    pub mode: FileMode,
    /// Content reference, if flushed.
    pub oid: Option<Oid>,
    /// Blob size in bytes, when known.
    pub size: Option<u64>,
}

impl Entry {
    /// A file entry pointing at an existing blob.
    pub fn blob(path: impl Into<String>, oid: Oid) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Blob,
            mode: FileMode::File,
            oid: Some(oid),
            size: None,
        }
    }

    /// A directory entry with no content reference yet.
    pub fn pending_tree(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Tree,
            mode: FileMode::Directory,
            oid: None,
            size: None,
        }
    }

    /// Whether this entry is a directory.
    pub fn is_tree(&self) -> bool {
        self.kind == EntryKind::Tree
    }

    /// Whether this entry is a file.
    pub fn is_blob(&self) -> bool {
        self.kind == EntryKind::Blob
    }

    /// Final path component.
    pub fn name(&self) -> &str {
        paths::file_name(&self.path)
    }
}

/// Snapshot of a remote branch, captured at the last successful sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchState {
    /// Branch the filesystem is bound to.
    pub name: BranchName,
    /// Commit the branch pointed at when last observed.
    pub head_commit: Oid,
    /// Root tree of that commit.
    pub head_tree: Oid,
}
