//! fs::rebuild
//!
//! Bottom-up regeneration of tree objects after a leaf changes.
//!
//! # Algorithm
//!
//! Starting at a path, the rebuilder walks toward the root one level at a
//! time. At each directory level whose content reference is unset (or on the
//! first level when forced), the direct children are submitted as a new tree
//! object and the returned reference is written back onto the directory
//! entry. Before moving up, the parent's reference is cleared, which forces
//! the parent to be rebuilt on the next step. The walk stops at the root;
//! the root tree is produced by the commit.
//!
//! Siblings are never visited, so untouched subtrees keep their references.
//! Each mutated leaf needs its own walk; the rebuilder does not look for
//! other stale branches.

use tracing::debug;

use super::cache::RemoteTreeCache;
use super::FsError;
use crate::core::paths;
use crate::core::types::Entry;
use crate::forge::{Forge, TreeItem};

/// Regenerates enclosing tree objects through a forge.
pub struct TreeRebuilder<'a> {
    forge: &'a dyn Forge,
}

impl<'a> TreeRebuilder<'a> {
    /// Create a rebuilder that submits trees to `forge`.
    pub fn new(forge: &'a dyn Forge) -> Self {
        Self { forge }
    }

    /// Rebuild `path` (if it is a stale or forced directory) and every
    /// directory above it.
    ///
    /// A file path is treated as an already-flushed leaf: the walk starts
    /// at its parent.
    ///
    /// # Errors
    ///
    /// `NotFound` if a level of the walk has no entry, or `Remote` if a tree
    /// cannot be created. Levels rebuilt before the failure keep their new
    /// references.
    pub async fn rebuild(
        &self,
        cache: &mut RemoteTreeCache,
        path: &str,
        force: bool,
    ) -> Result<(), FsError> {
        let mut current = path.to_string();
        let mut force = force;

        while !paths::is_root(&current) {
            let needs_build = {
                let entry = cache.require(&current)?;
                entry.is_tree() && (force || entry.oid.is_none())
            };

            if needs_build {
                let items = direct_children(cache.entries(), &current);
                // The remote cannot hold an empty tree; an empty directory
                // stays local until something is written inside it.
                let oid = if items.is_empty() {
                    None
                } else {
                    Some(self.forge.create_tree(&items).await?)
                };
                debug!(
                    path = %current,
                    children = items.len(),
                    oid = ?oid.as_ref().map(|o| o.short(7)),
                    "rebuilt tree"
                );
                if let Some(entry) = cache.lookup_mut(&current) {
                    entry.oid = oid;
                }
            }

            let parent = paths::parent(&current).to_string();
            if let Some(entry) = cache.lookup_mut(&parent) {
                entry.oid = None;
            }
            current = parent;
            force = false;
        }

        Ok(())
    }
}

/// Materialized entries exactly one level below `dir`, named relative to it.
pub fn direct_children(entries: &[Entry], dir: &str) -> Vec<TreeItem> {
    entries
        .iter()
        .filter_map(|e| {
            let name = paths::child_name(&e.path, dir)?;
            TreeItem::from_entry(e, name)
        })
        .collect()
}
