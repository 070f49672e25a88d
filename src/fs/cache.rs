//! fs::cache
//!
//! The session's view of the remote branch: the head snapshot plus the flat
//! entry set, and exact-match path resolution against it.
//!
//! # Design
//!
//! The hierarchy is a flat list of [`Entry`] records keyed by full path.
//! There are no directory nodes; everything structural is derived from path
//! strings. Lookups are linear scans, which is fine for the tree sizes a
//! branch-backed filesystem is used with.
//!
//! # Invariants
//!
//! - Paths are unique across the entry set
//! - Every entry's parent is either the root or a tree entry
//! - `branch` is the head observed at the last successful sync

use tracing::debug;

use super::FsError;
use crate::core::paths;
use crate::core::types::{BranchName, BranchState, Entry, Oid};
use crate::forge::{Forge, ForgeError};

/// Cached branch head and working entry set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTreeCache {
    branch: BranchState,
    entries: Vec<Entry>,
}

impl RemoteTreeCache {
    /// Build a cache from an already-fetched head and listing.
    pub fn new(branch: BranchState, entries: Vec<Entry>) -> Self {
        Self { branch, entries }
    }

    /// Fetch the branch head and its full recursive tree.
    pub async fn load(forge: &dyn Forge, branch: &BranchName) -> Result<Self, ForgeError> {
        let state = forge.get_branch(branch).await?;
        let entries = forge.get_tree(&state.head_tree, true).await?;
        debug!(
            branch = %branch,
            head = state.head_commit.short(7),
            entries = entries.len(),
            "loaded branch"
        );
        Ok(Self::new(state, entries))
    }

    /// Head snapshot from the last sync.
    pub fn branch(&self) -> &BranchState {
        &self.branch
    }

    /// Commit the session believes the branch points at.
    pub fn head(&self) -> &Oid {
        &self.branch.head_commit
    }

    /// Every entry in the working tree.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Exact-match lookup. Leading separators are ignored.
    pub fn lookup(&self, path: &str) -> Option<&Entry> {
        let path = path.trim_start_matches(paths::SEPARATOR);
        self.entries.iter().find(|e| e.path == path)
    }

    /// Mutable exact-match lookup.
    pub fn lookup_mut(&mut self, path: &str) -> Option<&mut Entry> {
        let path = path.trim_start_matches(paths::SEPARATOR);
        self.entries.iter_mut().find(|e| e.path == path)
    }

    /// Lookup that fails with `NotFound`.
    pub fn require(&self, path: &str) -> Result<&Entry, FsError> {
        self.lookup(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))
    }

    /// Whether `path` names a directory. The root always does.
    pub fn is_dir(&self, path: &str) -> bool {
        paths::is_root(path) || self.lookup(path).is_some_and(Entry::is_tree)
    }

    /// Require the parent of `path` to be a directory.
    ///
    /// # Errors
    ///
    /// `MissingParent` if the parent is absent or is a file.
    pub fn ensure_parent(&self, path: &str) -> Result<(), FsError> {
        if self.is_dir(paths::parent(path)) {
            Ok(())
        } else {
            Err(FsError::MissingParent(path.to_string()))
        }
    }

    /// Whether any file lives below `dir`.
    pub fn has_files_under(&self, dir: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.is_blob() && paths::is_descendant(&e.path, dir))
    }

    /// Add an entry. The caller has already checked the path is free.
    pub fn insert(&mut self, entry: Entry) {
        debug_assert!(self.lookup(&entry.path).is_none(), "duplicate path {}", entry.path);
        self.entries.push(entry);
    }

    /// Drop the entry at `path` and everything below it.
    pub fn remove_subtree(&mut self, path: &str) {
        self.entries
            .retain(|e| e.path != path && !paths::is_descendant(&e.path, path));
    }

    /// Move the entry at `from` and every descendant under `to`.
    pub fn rebase_subtree(&mut self, from: &str, to: &str) {
        for entry in &mut self.entries {
            if let Some(moved) = paths::rebase(&entry.path, from, to) {
                entry.path = moved;
            }
        }
    }

    /// Replace the working tree with a fresh remote listing.
    ///
    /// Local directories that were never materialized cannot exist
    /// remotely, so they are carried over when the listing lacks them.
    pub fn replace(&mut self, branch: BranchState, entries: Vec<Entry>) {
        let mut pending: Vec<Entry> = self
            .entries
            .drain(..)
            .filter(|e| e.is_tree() && e.oid.is_none())
            .collect();
        // parents sort before their children
        pending.sort_by(|a, b| a.path.cmp(&b.path));

        self.branch = branch;
        self.entries = entries;
        for dir in pending {
            if self.lookup(&dir.path).is_none() && self.is_dir(paths::parent(&dir.path)) {
                self.entries.push(dir);
            }
        }
    }

    /// Fetch the listing for `branch.head_tree` and replace the working
    /// tree with it.
    pub async fn refresh(&mut self, forge: &dyn Forge, branch: BranchState) -> Result<(), ForgeError> {
        let entries = forge.get_tree(&branch.head_tree, true).await?;
        debug!(
            head = branch.head_commit.short(7),
            entries = entries.len(),
            "refreshed tree"
        );
        self.replace(branch, entries);
        Ok(())
    }
}
