//! fs::listing
//!
//! Directory listings derived from the flat entry set.
//!
//! A listing is never stored. Every call filters the live entries for those
//! exactly one segment below the directory, so a view always reflects the
//! tree as it was when it was built.

use crate::core::paths;
use crate::core::types::{Entry, EntryKind, FileMode, Oid};

/// One child in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name relative to the listed directory.
    pub name: String,
    /// Full path of the child.
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

impl DirEntry {
    fn from_entry(entry: &Entry, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: entry.path.clone(),
            kind: entry.kind,
            mode: entry.mode,
            oid: entry.oid.clone(),
            size: entry.size,
        }
    }

    /// Whether the child is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Tree
    }
}

/// Immediate children of `dir`, sorted by name.
pub fn list_children(entries: &[Entry], dir: &str) -> Vec<DirEntry> {
    let mut children: Vec<DirEntry> = entries
        .iter()
        .filter_map(|e| paths::child_name(&e.path, dir).map(|name| DirEntry::from_entry(e, name)))
        .collect();
    children.sort_by(|a, b| a.name.cmp(&b.name));
    children
}

/// A read-only snapshot of one directory, produced by opening a tree path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryView {
    path: String,
    children: Vec<DirEntry>,
}

impl DirectoryView {
    /// Synthesize the view of `dir` from the current entries.
    pub fn synthesize(entries: &[Entry], dir: &str) -> Self {
        Self {
            path: dir.to_string(),
            children: list_children(entries, dir),
        }
    }

    /// Path of the directory; empty for the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Final path component; empty for the root.
    pub fn name(&self) -> &str {
        paths::file_name(&self.path)
    }

    /// Children sorted by name.
    pub fn entries(&self) -> &[DirEntry] {
        &self.children
    }

    /// Child names sorted.
    pub fn names(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the directory has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl IntoIterator for DirectoryView {
    type Item = DirEntry;
    type IntoIter = std::vec::IntoIter<DirEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.into_iter()
    }
}
