//! fs::commit
//!
//! Optimistic-concurrency commit of the working tree.
//!
//! # Protocol
//!
//! 1. Fetch the live branch head.
//! 2. If it differs from the cached head, fail with `Conflict`. Nothing in
//!    the cache is touched.
//! 3. Submit every materialized entry as one tree object.
//! 4. Create a commit on top of the head with that tree.
//! 5. Move the branch without force. A rejection means another writer got
//!    in between steps 1 and 5 and is reported as `Conflict` too.
//! 6. Refresh the cache from the new head.
//!
//! There is no merge and no retry. Callers that want to retry reload the
//! session and reissue their operation.

use tracing::{debug, info};

use super::cache::RemoteTreeCache;
use super::FsError;
use crate::core::types::{BranchState, Oid};
use crate::forge::{Forge, ForgeError, TreeItem};

/// Message recorded on every commit the filesystem makes.
pub const COMMIT_MESSAGE: &str = "automatic commit from ghfs";

/// Commits the working tree of a cache through a forge.
pub struct CommitCoordinator<'a> {
    forge: &'a dyn Forge,
    message: &'a str,
}

impl<'a> CommitCoordinator<'a> {
    /// Create a coordinator using the fixed [`COMMIT_MESSAGE`].
    pub fn new(forge: &'a dyn Forge) -> Self {
        Self {
            forge,
            message: COMMIT_MESSAGE,
        }
    }

    /// Check that the remote head still matches the cached head.
    ///
    /// Returns the live branch state on success.
    ///
    /// # Errors
    ///
    /// `Conflict` if the branch moved, `Remote` if it could not be read.
    pub async fn check_head(&self, cache: &RemoteTreeCache) -> Result<BranchState, FsError> {
        let live = self.forge.get_branch(&cache.branch().name).await?;
        if &live.head_commit != cache.head() {
            return Err(FsError::Conflict {
                expected: cache.head().clone(),
                actual: live.head_commit,
            });
        }
        Ok(live)
    }

    /// Commit the cache's working tree and move the branch to it.
    ///
    /// Returns the new head commit.
    pub async fn commit(&self, cache: &mut RemoteTreeCache) -> Result<Oid, FsError> {
        let live = self.check_head(cache).await?;

        let items: Vec<TreeItem> = cache
            .entries()
            .iter()
            .filter_map(|e| TreeItem::from_entry(e, e.path.clone()))
            .collect();
        let tree = self.forge.create_tree(&items).await?;
        let commit = self
            .forge
            .create_commit(self.message, &tree, &live.head_commit)
            .await?;

        match self.forge.update_ref(&live.name, &commit, false).await {
            Ok(()) => {}
            Err(ForgeError::RefConflict(reason)) => {
                debug!(%reason, "ref update rejected");
                let moved = self.forge.get_branch(&live.name).await?;
                return Err(FsError::Conflict {
                    expected: live.head_commit,
                    actual: moved.head_commit,
                });
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            branch = %live.name,
            commit = commit.short(7),
            parent = live.head_commit.short(7),
            "committed"
        );

        let state = BranchState {
            name: live.name,
            head_commit: commit.clone(),
            head_tree: tree,
        };
        cache.refresh(self.forge, state).await?;
        Ok(commit)
    }
}
