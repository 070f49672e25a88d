//! fs
//!
//! A filesystem view over one branch of a remote repository.
//!
//! # Architecture
//!
//! [`GitHubFs`] is the session object. It owns a forge handle and a
//! [`RemoteTreeCache`] behind one async mutex; every operation that reads
//! and then decides against the cache runs inside that critical section, so
//! local callers see single-threaded semantics.
//!
//! Mutations flow through the same pipeline:
//!
//! ```text
//! resolve path -> mutate entries -> TreeRebuilder -> CommitCoordinator -> refresh
//! ```
//!
//! `remove` is the exception: each removal is its own remote delete
//! transaction, after which the cache is refreshed from the returned tree.
//!
//! # Invariants
//!
//! - Every successful mutation is one commit with [`COMMIT_MESSAGE`]
//! - Directories exist as entries before anything is created inside them
//! - Directory listings are derived from entries on every call
//! - Nothing retries; `Conflict` means reload and reissue
//!
//! # Example
//!
//! ```
//! use std::io::{Read, Write};
//! use std::sync::Arc;
//! use ghfs::core::types::BranchName;
//! use ghfs::forge::mock::MockForge;
//! use ghfs::fs::GitHubFs;
//!
//! # tokio_test::block_on(async {
//! let forge = Arc::new(MockForge::new());
//! let fs = GitHubFs::mount(forge, BranchName::new("main").unwrap()).await.unwrap();
//!
//! fs.mkdir("notes").await.unwrap();
//! let mut file = fs.create("notes/today.md").await.unwrap();
//! file.write_all(b"# Today").unwrap();
//! file.close().await.unwrap();
//!
//! let mut file = fs.open("notes/today.md").await.unwrap().into_file().unwrap();
//! let mut text = String::new();
//! file.read_to_string(&mut text).unwrap();
//! assert_eq!(text, "# Today");
//! # });
//! ```

pub mod cache;
pub mod commit;
mod error;
pub mod handle;
pub mod listing;
mod options;
pub mod rebuild;

pub use cache::RemoteTreeCache;
pub use commit::{CommitCoordinator, COMMIT_MESSAGE};
pub use error::FsError;
pub use handle::FileHandle;
pub use listing::{DirEntry, DirectoryView};
pub use options::{Metadata, OpenOptions};
pub use rebuild::TreeRebuilder;

use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::core::paths;
use crate::core::types::{BranchName, BranchState, Entry, Oid};
use crate::forge::Forge;

/// Name reported by [`GitHubFs::name`].
pub const NAME: &str = "github-api";

/// Result of opening a path.
#[derive(Debug)]
pub enum Node {
    /// A file, buffered for reading and writing.
    File(FileHandle),
    /// A read-only directory listing.
    Dir(DirectoryView),
}

impl Node {
    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Dir(_))
    }

    /// The file handle, or `Invalid` for a directory.
    pub fn into_file(self) -> Result<FileHandle, FsError> {
        match self {
            Node::File(file) => Ok(file),
            Node::Dir(dir) => Err(FsError::Invalid(format!(
                "'{}' is a directory",
                dir.path()
            ))),
        }
    }

    /// The directory view, or `Invalid` for a file.
    pub fn into_dir(self) -> Result<DirectoryView, FsError> {
        match self {
            Node::Dir(dir) => Ok(dir),
            Node::File(file) => Err(FsError::Invalid(format!(
                "'{}' is not a directory",
                file.path()
            ))),
        }
    }
}

struct Session {
    forge: Arc<dyn Forge>,
    cache: Mutex<RemoteTreeCache>,
}

/// A mounted branch. Clones share the session.
#[derive(Clone)]
pub struct GitHubFs {
    inner: Arc<Session>,
}

impl std::fmt::Debug for GitHubFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubFs")
            .field("forge", &self.inner.forge.name())
            .finish_non_exhaustive()
    }
}

impl GitHubFs {
    /// Load `branch` from `forge` and mount it.
    ///
    /// Fetches the branch head and its full recursive tree once. File
    /// contents are fetched lazily on open.
    pub async fn mount(forge: Arc<dyn Forge>, branch: BranchName) -> Result<Self, FsError> {
        let cache = RemoteTreeCache::load(forge.as_ref(), &branch).await?;
        Ok(Self {
            inner: Arc::new(Session {
                forge,
                cache: Mutex::new(cache),
            }),
        })
    }

    fn forge(&self) -> &dyn Forge {
        self.inner.forge.as_ref()
    }

    /// Name of this filesystem.
    pub fn name(&self) -> &'static str {
        NAME
    }

    /// Head snapshot from the last sync.
    pub async fn branch(&self) -> BranchState {
        self.inner.cache.lock().await.branch().clone()
    }

    /// A copy of every entry in the working tree.
    pub async fn entries(&self) -> Vec<Entry> {
        self.inner.cache.lock().await.entries().to_vec()
    }

    /// The entry at `path`.
    pub async fn lookup(&self, path: &str) -> Result<Entry, FsError> {
        let path = paths::normalize(path)?;
        let cache = self.inner.cache.lock().await;
        cache.require(&path).cloned()
    }

    /// Discard the cached view and load the branch again.
    ///
    /// This is how a caller recovers from `Conflict`. Local directories
    /// that were never materialized are kept.
    #[instrument(skip(self))]
    pub async fn reload(&self) -> Result<(), FsError> {
        let mut cache = self.inner.cache.lock().await;
        let name = cache.branch().name.clone();
        let state = self.forge().get_branch(&name).await?;
        cache.refresh(self.forge(), state).await?;
        Ok(())
    }

    /// Commit the working tree as it stands.
    ///
    /// Only needed to retry after a failed mutation left local entries
    /// ahead of the remote.
    #[instrument(skip(self))]
    pub async fn commit(&self) -> Result<Oid, FsError> {
        let mut cache = self.inner.cache.lock().await;
        CommitCoordinator::new(self.forge()).commit(&mut cache).await
    }

    /// Create an empty file and commit it.
    ///
    /// # Errors
    ///
    /// `FileExists` if the path is taken, `MissingParent` if its directory
    /// does not exist.
    #[instrument(skip(self))]
    pub async fn create(&self, path: &str) -> Result<FileHandle, FsError> {
        let path = paths::normalize(path)?;
        let mut cache = self.inner.cache.lock().await;
        self.create_locked(&mut cache, &path).await?;
        Ok(FileHandle::new(self.clone(), path, Vec::new()))
    }

    async fn create_locked(&self, cache: &mut RemoteTreeCache, path: &str) -> Result<(), FsError> {
        if paths::is_root(path) || cache.lookup(path).is_some() {
            return Err(FsError::FileExists(path.to_string()));
        }
        cache.ensure_parent(path)?;

        let oid = self.forge().create_blob(&[]).await?;
        let mut entry = Entry::blob(path, oid);
        entry.size = Some(0);
        cache.insert(entry);

        TreeRebuilder::new(self.forge())
            .rebuild(cache, path, true)
            .await?;
        CommitCoordinator::new(self.forge()).commit(cache).await?;
        Ok(())
    }

    /// Add an empty directory.
    ///
    /// The directory is local until a file is written inside it; the
    /// remote cannot store empty trees. No commit is made.
    pub async fn mkdir(&self, path: &str) -> Result<(), FsError> {
        let path = paths::normalize(path)?;
        let mut cache = self.inner.cache.lock().await;
        if paths::is_root(&path) || cache.lookup(&path).is_some() {
            return Err(FsError::FileExists(path));
        }
        cache.ensure_parent(&path)?;
        cache.insert(Entry::pending_tree(path));
        Ok(())
    }

    /// Add a directory and every missing ancestor, from the top down.
    ///
    /// Succeeds if the directory already exists. Fails `FileExists` if any
    /// component is a file.
    pub async fn mkdir_all(&self, path: &str) -> Result<(), FsError> {
        let path = paths::normalize(path)?;
        let mut cache = self.inner.cache.lock().await;

        let mut levels = paths::ancestors(&path);
        if !paths::is_root(&path) {
            levels.push(&path);
        }
        for level in levels {
            match cache.lookup(level) {
                Some(entry) if entry.is_tree() => {}
                Some(_) => return Err(FsError::FileExists(level.to_string())),
                None => cache.insert(Entry::pending_tree(level)),
            }
        }
        Ok(())
    }

    /// Open a file for reading and writing, or a directory for listing.
    pub async fn open(&self, path: &str) -> Result<Node, FsError> {
        self.open_with(path, &OpenOptions::new()).await
    }

    /// Open with explicit flags.
    ///
    /// With `create`, a missing file is created (and committed) first.
    /// `append` positions the cursor at the end; `truncate` empties the
    /// buffer. Neither makes sense for a directory.
    #[instrument(skip(self))]
    pub async fn open_with(&self, path: &str, options: &OpenOptions) -> Result<Node, FsError> {
        let path = paths::normalize(path)?;
        let mut cache = self.inner.cache.lock().await;

        if cache.is_dir(&path) {
            if options.wants_write() {
                return Err(FsError::Invalid(format!("'{}' is a directory", path)));
            }
            return Ok(Node::Dir(DirectoryView::synthesize(cache.entries(), &path)));
        }

        let content = match cache.lookup(&path) {
            Some(entry) => {
                let oid = entry.oid.clone().ok_or_else(|| {
                    FsError::Invalid(format!("'{}' has no content reference", path))
                })?;
                let blob = self.forge().get_blob(&oid).await?;
                blob.decode()?
            }
            None if options.is_create() => {
                self.create_locked(&mut cache, &path).await?;
                Vec::new()
            }
            None => return Err(FsError::NotFound(path)),
        };
        debug!(path = %path, bytes = content.len(), "opened file");

        let mut file = FileHandle::new(self.clone(), path, content);
        if options.is_truncate() {
            file.truncate();
        }
        if options.is_append() {
            file.seek_end();
        }
        Ok(Node::File(file))
    }

    /// List a directory.
    pub async fn read_dir(&self, path: &str) -> Result<DirectoryView, FsError> {
        let path = paths::normalize(path)?;
        let cache = self.inner.cache.lock().await;
        if cache.is_dir(&path) {
            Ok(DirectoryView::synthesize(cache.entries(), &path))
        } else if cache.lookup(&path).is_some() {
            Err(FsError::Invalid(format!("'{}' is not a directory", path)))
        } else {
            Err(FsError::NotFound(path))
        }
    }

    /// Upload `content` as the new blob for `path`, then rebuild and commit.
    pub(crate) async fn flush_file(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        let mut cache = self.inner.cache.lock().await;
        if !cache.lookup(path).is_some_and(Entry::is_blob) {
            return Err(FsError::NotFound(path.to_string()));
        }

        let oid = self.forge().create_blob(content).await?;
        if let Some(entry) = cache.lookup_mut(path) {
            entry.oid = Some(oid);
            entry.size = Some(content.len() as u64);
        }

        TreeRebuilder::new(self.forge())
            .rebuild(&mut cache, path, true)
            .await?;
        CommitCoordinator::new(self.forge()).commit(&mut cache).await?;
        Ok(())
    }

    /// Remove a file, or an empty directory.
    ///
    /// A file removal is its own remote transaction; the cache is refreshed
    /// from the tree it returns. The file's directories stay in place
    /// locally even if the removal emptied them.
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing is at `path`, `Invalid` for the root or a
    /// directory that still contains files.
    #[instrument(skip(self))]
    pub async fn remove(&self, path: &str) -> Result<(), FsError> {
        let path = paths::normalize(path)?;
        let mut cache = self.inner.cache.lock().await;
        self.remove_locked(&mut cache, &path).await
    }

    async fn remove_locked(&self, cache: &mut RemoteTreeCache, path: &str) -> Result<(), FsError> {
        if paths::is_root(path) {
            return Err(FsError::Invalid("cannot remove the root".to_string()));
        }
        let entry = cache.require(path)?.clone();

        if entry.is_tree() {
            if cache.has_files_under(path) {
                return Err(FsError::Invalid(format!("directory not empty: '{}'", path)));
            }
            cache.remove_subtree(path);
            return Ok(());
        }

        let blob = entry
            .oid
            .ok_or_else(|| FsError::Invalid(format!("'{}' has no content reference", path)))?;
        let branch = cache.branch().name.clone();
        let result = self
            .forge()
            .delete_path(path, &blob, &branch, COMMIT_MESSAGE)
            .await?;
        debug!(path, commit = result.commit.short(7), "deleted");

        let keep: Vec<String> = paths::ancestors(path)
            .into_iter()
            .map(str::to_string)
            .collect();
        let state = BranchState {
            name: branch,
            head_commit: result.commit,
            head_tree: result.tree,
        };
        cache.refresh(self.forge(), state).await?;
        for dir in keep {
            if cache.lookup(&dir).is_none() {
                cache.insert(Entry::pending_tree(dir));
            }
        }
        Ok(())
    }

    /// Remove a path and everything below it.
    ///
    /// Each file below a directory is removed in its own transaction, one
    /// commit per file. A missing path is not an error.
    #[instrument(skip(self))]
    pub async fn remove_all(&self, path: &str) -> Result<(), FsError> {
        let path = paths::normalize(path)?;
        if paths::is_root(&path) {
            return Err(FsError::Invalid("cannot remove the root".to_string()));
        }
        let mut cache = self.inner.cache.lock().await;

        let is_tree = match cache.lookup(&path) {
            None => return Ok(()),
            Some(entry) => entry.is_tree(),
        };
        if !is_tree {
            return self.remove_locked(&mut cache, &path).await;
        }

        let files: Vec<String> = cache
            .entries()
            .iter()
            .filter(|e| e.is_blob() && paths::is_descendant(&e.path, &path))
            .map(|e| e.path.clone())
            .collect();
        debug!(path = %path, files = files.len(), "removing directory");
        for file in files {
            self.remove_locked(&mut cache, &file).await?;
        }
        cache.remove_subtree(&path);
        Ok(())
    }

    /// Move a file or directory, with everything below it, and commit.
    ///
    /// # Errors
    ///
    /// `Invalid` if either path is the root or `new` lies inside `old`,
    /// `NotFound` if `old` is absent, `FileExists` if `new` is taken,
    /// `MissingParent` if `new`'s directory does not exist.
    #[instrument(skip(self))]
    pub async fn rename(&self, old: &str, new: &str) -> Result<(), FsError> {
        let old = paths::normalize(old)?;
        let new = paths::normalize(new)?;
        if paths::is_root(&old) || paths::is_root(&new) {
            return Err(FsError::Invalid("cannot rename the root".to_string()));
        }
        if paths::is_descendant(&new, &old) {
            return Err(FsError::Invalid(format!(
                "cannot move '{}' inside itself",
                old
            )));
        }

        let mut cache = self.inner.cache.lock().await;
        cache.require(&old)?;
        if old == new {
            return Ok(());
        }
        if cache.lookup(&new).is_some() {
            return Err(FsError::FileExists(new));
        }
        cache.ensure_parent(&new)?;

        cache.rebase_subtree(&old, &new);

        let rebuilder = TreeRebuilder::new(self.forge());
        let old_parent = paths::parent(&old);
        rebuilder.rebuild(&mut cache, old_parent, true).await?;
        if paths::parent(&new) != old_parent {
            rebuilder.rebuild(&mut cache, &new, false).await?;
        }
        CommitCoordinator::new(self.forge()).commit(&mut cache).await?;
        Ok(())
    }

    /// Metadata for `path`. The root reports the head tree.
    pub async fn stat(&self, path: &str) -> Result<Metadata, FsError> {
        let path = paths::normalize(path)?;
        let cache = self.inner.cache.lock().await;
        if paths::is_root(&path) {
            return Ok(Metadata::root(&cache.branch().head_tree));
        }
        cache.require(&path).map(Metadata::from_entry)
    }

    /// Modes are fixed; this does nothing.
    pub async fn chmod(&self, path: &str, _mode: u32) -> Result<(), FsError> {
        paths::normalize(path)?;
        Ok(())
    }

    /// Timestamps are not tracked; this does nothing.
    pub async fn chtimes(
        &self,
        path: &str,
        _atime: SystemTime,
        _mtime: SystemTime,
    ) -> Result<(), FsError> {
        paths::normalize(path)?;
        Ok(())
    }
}
