//! fs::options
//!
//! Open flags and file metadata.

use crate::core::types::{Entry, EntryKind, FileMode, Oid};

/// Options for [`GitHubFs::open_with`](super::GitHubFs::open_with).
///
/// ```
/// use ghfs::fs::OpenOptions;
///
/// let mut options = OpenOptions::new();
/// options.create(true).append(true);
/// assert!(options.is_create());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    create: bool,
    append: bool,
    truncate: bool,
}

impl OpenOptions {
    /// All flags off: open an existing entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the file if it does not exist.
    pub fn create(&mut self, create: bool) -> &mut Self {
        self.create = create;
        self
    }

    /// Position the cursor at the end of the file before writing.
    pub fn append(&mut self, append: bool) -> &mut Self {
        self.append = append;
        self
    }

    /// Discard existing content on open.
    pub fn truncate(&mut self, truncate: bool) -> &mut Self {
        self.truncate = truncate;
        self
    }

    pub fn is_create(&self) -> bool {
        self.create
    }

    pub fn is_append(&self) -> bool {
        self.append
    }

    pub fn is_truncate(&self) -> bool {
        self.truncate
    }

    /// Whether any flag implies writing.
    pub(crate) fn wants_write(&self) -> bool {
        self.append || self.truncate
    }
}

/// Metadata for one path, as returned by `stat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Final path component; empty for the root.
    pub name: String,
    /// Full path; empty for the root.
    pub path: String,
    /// Blob or tree.
    pub kind: EntryKind,
    /// Git mode.
    pub mode: FileMode,
    /// Content reference, if materialized.
    pub oid: Option<Oid>,
    /// Blob size, when known.
    pub size: Option<u64>,
}

impl Metadata {
    pub(crate) fn from_entry(entry: &Entry) -> Self {
        Self {
            name: entry.name().to_string(),
            path: entry.path.clone(),
            kind: entry.kind,
            mode: entry.mode,
            oid: entry.oid.clone(),
            size: entry.size,
        }
    }

    pub(crate) fn root(tree: &Oid) -> Self {
        Self {
            name: String::new(),
            path: String::new(),
            kind: EntryKind::Tree,
            mode: FileMode::Directory,
            oid: Some(tree.clone()),
            size: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Tree
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::Blob
    }

    /// Size in bytes; zero for directories and unknown sizes.
    pub fn len_bytes(&self) -> u64 {
        self.size.unwrap_or(0)
    }
}
