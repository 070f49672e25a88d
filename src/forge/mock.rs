//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge is a small content-addressed object store held in memory:
//! blobs, trees and commits are keyed by the SHA-256 of their content, and
//! branches point at commits. It enforces the same rules the real remote
//! does where the filesystem depends on them:
//!
//! - objects referenced by a tree or commit must exist
//! - non-forced ref updates must fast-forward
//! - deletes must name the file's current blob
//! - empty directories cannot be represented
//!
//! Failures can be injected per operation, and every call is recorded.
//!
//! # Example
//!
//! ```
//! use ghfs::forge::mock::MockForge;
//! use ghfs::forge::Forge;
//! use ghfs::core::types::BranchName;
//!
//! # tokio_test::block_on(async {
//! let forge = MockForge::with_files(&[("a/b.txt", b"hello".as_slice())]);
//! let main = BranchName::new("main").unwrap();
//!
//! let head = forge.get_branch(&main).await.unwrap();
//! let entries = forge.get_tree(&head.head_tree, true).await.unwrap();
//! assert_eq!(entries.len(), 2); // "a" and "a/b.txt"
//! assert_eq!(forge.read_file("main", "a/b.txt").unwrap(), b"hello");
//! # });
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::traits::{Blob, DeleteResult, Forge, ForgeError, TreeItem};
use crate::core::paths;
use crate::core::types::{BranchName, BranchState, Entry, EntryKind, FileMode, Oid};

/// Branch created by the constructors.
pub const DEFAULT_BRANCH: &str = "main";

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state,
/// which lets a test keep a handle while the filesystem owns another.
#[derive(Debug, Clone)]
pub struct MockForge {
    inner: Arc<Mutex<MockForgeInner>>,
}

#[derive(Debug, Default)]
struct MockForgeInner {
    blobs: HashMap<Oid, Vec<u8>>,
    trees: HashMap<Oid, BTreeMap<String, TreeNode>>,
    commits: HashMap<Oid, MockCommit>,
    branches: HashMap<String, Oid>,
    /// Bumped per commit so identical trees still yield distinct commits.
    commit_counter: u64,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

/// One direct child of a stored tree.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TreeNode {
    kind: EntryKind,
    mode: FileMode,
    oid: Oid,
}

#[derive(Debug, Clone)]
struct MockCommit {
    tree: Oid,
    parent: Option<Oid>,
    message: String,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    GetBranch(ForgeError),
    GetTree(ForgeError),
    GetBlob(ForgeError),
    CreateBlob(ForgeError),
    CreateTree(ForgeError),
    CreateCommit(ForgeError),
    UpdateRef(ForgeError),
    DeletePath(ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    GetBranch {
        branch: String,
    },
    GetTree {
        tree: Oid,
        recursive: bool,
    },
    GetBlob {
        blob: Oid,
    },
    CreateBlob {
        len: usize,
    },
    CreateTree {
        paths: Vec<String>,
    },
    CreateCommit {
        message: String,
        tree: Oid,
        parent: Oid,
    },
    UpdateRef {
        branch: String,
        commit: Oid,
        force: bool,
    },
    DeletePath {
        path: String,
        branch: String,
        message: String,
    },
}

/// Pending node while assembling a tree from possibly-nested item paths.
enum Pending {
    Leaf(TreeNode),
    Dir {
        base: Option<Oid>,
        nested: Vec<(String, TreeNode)>,
    },
}

fn digest(kind: &str, bytes: &[u8]) -> Oid {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(b"\0");
    hasher.update(bytes);
    // A hex-encoded SHA-256 digest is always a valid 64-character oid.
    Oid::new(hex::encode(hasher.finalize())).expect("sha256 hex is a valid oid")
}

fn bad_object(what: &str, oid: &Oid) -> ForgeError {
    ForgeError::ApiError {
        status: 422,
        message: format!("{} {} does not exist", what, oid),
    }
}

impl MockForgeInner {
    fn put_blob(&mut self, content: &[u8]) -> Oid {
        let oid = digest("blob", content);
        self.blobs.entry(oid.clone()).or_insert_with(|| content.to_vec());
        oid
    }

    fn put_tree(&mut self, children: BTreeMap<String, TreeNode>) -> Oid {
        let mut canonical = String::new();
        for (name, node) in &children {
            canonical.push_str(&format!("{} {} {} {}\n", node.mode, node.kind, node.oid, name));
        }
        let oid = digest("tree", canonical.as_bytes());
        self.trees.entry(oid.clone()).or_insert(children);
        oid
    }

    fn put_commit(&mut self, message: &str, tree: Oid, parent: Option<Oid>) -> Oid {
        self.commit_counter += 1;
        let canonical = format!(
            "{}\n{}\n{}\n{}",
            tree,
            parent.as_ref().map(Oid::as_str).unwrap_or(""),
            self.commit_counter,
            message
        );
        let oid = digest("commit", canonical.as_bytes());
        self.commits.insert(
            oid.clone(),
            MockCommit {
                tree,
                parent,
                message: message.to_string(),
            },
        );
        oid
    }

    fn check_exists(&self, node: &TreeNode) -> Result<(), ForgeError> {
        let exists = match node.kind {
            EntryKind::Blob => self.blobs.contains_key(&node.oid),
            EntryKind::Tree => self.trees.contains_key(&node.oid),
        };
        if exists {
            Ok(())
        } else {
            Err(bad_object(node.kind.as_str(), &node.oid))
        }
    }

    /// Assemble a tree from items whose paths may be nested. A nested item
    /// overrides whatever the enclosing tree item would have contained at
    /// that name.
    fn build_tree(&mut self, items: Vec<(String, TreeNode)>) -> Result<Oid, ForgeError> {
        let mut pending: BTreeMap<String, Pending> = BTreeMap::new();

        for (path, node) in items {
            self.check_exists(&node)?;
            match path.split_once('/') {
                None if node.kind == EntryKind::Tree => match pending.get_mut(&path) {
                    Some(Pending::Dir { base, .. }) => *base = Some(node.oid),
                    _ => {
                        pending.insert(
                            path,
                            Pending::Dir {
                                base: Some(node.oid),
                                nested: Vec::new(),
                            },
                        );
                    }
                },
                None => {
                    pending.insert(path, Pending::Leaf(node));
                }
                Some((head, rest)) => {
                    let slot = pending.entry(head.to_string()).or_insert(Pending::Dir {
                        base: None,
                        nested: Vec::new(),
                    });
                    if let Pending::Leaf(_) = slot {
                        *slot = Pending::Dir {
                            base: None,
                            nested: Vec::new(),
                        };
                    }
                    if let Pending::Dir { nested, .. } = slot {
                        nested.push((rest.to_string(), node));
                    }
                }
            }
        }

        let mut children = BTreeMap::new();
        for (name, slot) in pending {
            let node = match slot {
                Pending::Leaf(node) => node,
                Pending::Dir { base, nested } if nested.is_empty() => TreeNode {
                    kind: EntryKind::Tree,
                    mode: FileMode::Directory,
                    oid: base.ok_or_else(|| ForgeError::ApiError {
                        status: 422,
                        message: format!("tree entry '{}' has no sha", name),
                    })?,
                },
                Pending::Dir { base, nested } => {
                    let mut items: Vec<(String, TreeNode)> = match base {
                        Some(base) => self
                            .trees
                            .get(&base)
                            .ok_or_else(|| bad_object("tree", &base))?
                            .iter()
                            .map(|(n, node)| (n.clone(), node.clone()))
                            .collect(),
                        None => Vec::new(),
                    };
                    items.extend(nested);
                    TreeNode {
                        kind: EntryKind::Tree,
                        mode: FileMode::Directory,
                        oid: self.build_tree(items)?,
                    }
                }
            };
            children.insert(name, node);
        }

        Ok(self.put_tree(children))
    }

    fn flatten(&self, tree: &Oid, prefix: &str, recursive: bool, out: &mut Vec<Entry>) {
        let Some(children) = self.trees.get(tree) else {
            return;
        };
        for (name, node) in children {
            let path = paths::join(prefix, name);
            let size = match node.kind {
                EntryKind::Blob => self.blobs.get(&node.oid).map(|b| b.len() as u64),
                EntryKind::Tree => None,
            };
            out.push(Entry {
                path: path.clone(),
                kind: node.kind,
                mode: node.mode,
                oid: Some(node.oid.clone()),
                size,
            });
            if recursive && node.kind == EntryKind::Tree {
                self.flatten(&node.oid, &path, recursive, out);
            }
        }
    }

    fn head(&self, branch: &str) -> Result<(Oid, Oid), ForgeError> {
        let commit = self
            .branches
            .get(branch)
            .ok_or_else(|| ForgeError::NotFound(format!("Branch not found: {}", branch)))?;
        let tree = self.commits[commit].tree.clone();
        Ok((commit.clone(), tree))
    }

    fn blob_items(&self, tree: &Oid) -> Vec<(String, TreeNode)> {
        let mut flat = Vec::new();
        self.flatten(tree, paths::ROOT, true, &mut flat);
        flat.into_iter()
            .filter(|e| e.is_blob())
            .filter_map(|e| {
                let oid = e.oid?;
                Some((
                    e.path,
                    TreeNode {
                        kind: e.kind,
                        mode: e.mode,
                        oid,
                    },
                ))
            })
            .collect()
    }

    fn is_ancestor(&self, ancestor: &Oid, mut commit: Oid) -> bool {
        loop {
            if &commit == ancestor {
                return true;
            }
            match self.commits.get(&commit).and_then(|c| c.parent.clone()) {
                Some(parent) => commit = parent,
                None => return false,
            }
        }
    }

    /// Commit a full set of blob items on top of the branch head.
    fn commit_files(
        &mut self,
        branch: &str,
        items: Vec<(String, TreeNode)>,
        message: &str,
    ) -> Result<(Oid, Oid), ForgeError> {
        let parent = self.branches.get(branch).cloned();
        let tree = self.build_tree(items)?;
        let commit = self.put_commit(message, tree.clone(), parent);
        self.branches.insert(branch.to_string(), commit.clone());
        Ok((commit, tree))
    }
}

impl MockForge {
    /// Create a mock forge whose `main` branch holds one empty commit.
    pub fn new() -> Self {
        Self::with_files(&[])
    }

    /// Create a mock forge whose `main` branch holds the given files.
    ///
    /// Intermediate directories are implied by the paths.
    pub fn with_files(files: &[(&str, &[u8])]) -> Self {
        let files: Vec<(&str, &[u8], FileMode)> = files
            .iter()
            .map(|(path, content)| (*path, *content, FileMode::File))
            .collect();
        Self::with_modes(&files)
    }

    /// Like [`MockForge::with_files`], with an explicit mode per file.
    pub fn with_modes(files: &[(&str, &[u8], FileMode)]) -> Self {
        let mut inner = MockForgeInner::default();
        let items = files
            .iter()
            .map(|(path, content, mode)| {
                let oid = inner.put_blob(content);
                (
                    path.to_string(),
                    TreeNode {
                        kind: EntryKind::Blob,
                        mode: *mode,
                        oid,
                    },
                )
            })
            .collect();
        inner
            .commit_files(DEFAULT_BRANCH, items, "initial commit")
            .expect("seed objects exist");

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// ```
    /// use ghfs::forge::mock::{FailOn, MockForge};
    /// use ghfs::forge::ForgeError;
    ///
    /// let forge = MockForge::new().fail_on(FailOn::CreateBlob(ForgeError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.set_fail_on(fail_on);
        self
    }

    /// Configure a failure on a shared handle.
    pub fn set_fail_on(&self, fail_on: FailOn) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = Some(fail_on);
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.clear();
    }

    /// Count recorded delete transactions.
    pub fn delete_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, MockOperation::DeletePath { .. }))
            .count()
    }

    /// Count recorded ref updates.
    pub fn ref_update_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, MockOperation::UpdateRef { .. }))
            .count()
    }

    /// Current head commit of a branch.
    pub fn head(&self, branch: &str) -> Option<Oid> {
        let inner = self.inner.lock().unwrap();
        inner.branches.get(branch).cloned()
    }

    /// Message of a commit.
    pub fn commit_message(&self, commit: &Oid) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.commits.get(commit).map(|c| c.message.clone())
    }

    /// Number of commits reachable from a branch head, including the root.
    pub fn history_len(&self, branch: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        let mut next = inner.branches.get(branch).cloned();
        let mut len = 0;
        while let Some(commit) = next {
            len += 1;
            next = inner.commits.get(&commit).and_then(|c| c.parent.clone());
        }
        len
    }

    /// Every file path at the branch head, sorted.
    pub fn file_paths(&self, branch: &str) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        let Ok((_, tree)) = inner.head(branch) else {
            return Vec::new();
        };
        inner.blob_items(&tree).into_iter().map(|(p, _)| p).collect()
    }

    /// Every directory path at the branch head, sorted.
    pub fn dir_paths(&self, branch: &str) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        let Ok((_, tree)) = inner.head(branch) else {
            return Vec::new();
        };
        let mut flat = Vec::new();
        inner.flatten(&tree, paths::ROOT, true, &mut flat);
        flat.into_iter().filter(|e| e.is_tree()).map(|e| e.path).collect()
    }

    /// Content of a file at the branch head.
    pub fn read_file(&self, branch: &str, path: &str) -> Option<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        let (_, tree) = inner.head(branch).ok()?;
        let (_, node) = inner
            .blob_items(&tree)
            .into_iter()
            .find(|(p, _)| p == path)?;
        inner.blobs.get(&node.oid).cloned()
    }

    /// Simulate an external writer: commit `content` at `path` directly on
    /// top of the branch head.
    pub fn external_write(&self, branch: &str, path: &str, content: &[u8]) -> Oid {
        let mut inner = self.inner.lock().unwrap();
        let (_, tree) = inner.head(branch).expect("branch exists");
        let oid = inner.put_blob(content);
        let mut items = inner.blob_items(&tree);
        items.retain(|(p, _)| p != path);
        items.push((
            path.to_string(),
            TreeNode {
                kind: EntryKind::Blob,
                mode: FileMode::File,
                oid,
            },
        ));
        let (commit, _) = inner
            .commit_files(branch, items, "external commit")
            .expect("objects exist");
        commit
    }

    fn record(&self, op: MockOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }

    fn check_fail(&self, expected: &str) -> Result<(), ForgeError> {
        let inner = self.inner.lock().unwrap();
        let error = match &inner.fail_on {
            Some(FailOn::GetBranch(e)) if expected == "get_branch" => e,
            Some(FailOn::GetTree(e)) if expected == "get_tree" => e,
            Some(FailOn::GetBlob(e)) if expected == "get_blob" => e,
            Some(FailOn::CreateBlob(e)) if expected == "create_blob" => e,
            Some(FailOn::CreateTree(e)) if expected == "create_tree" => e,
            Some(FailOn::CreateCommit(e)) if expected == "create_commit" => e,
            Some(FailOn::UpdateRef(e)) if expected == "update_ref" => e,
            Some(FailOn::DeletePath(e)) if expected == "delete_path" => e,
            _ => return Ok(()),
        };
        Err(error.clone())
    }
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get_branch(&self, branch: &BranchName) -> Result<BranchState, ForgeError> {
        self.record(MockOperation::GetBranch {
            branch: branch.to_string(),
        });
        self.check_fail("get_branch")?;

        let inner = self.inner.lock().unwrap();
        let (head_commit, head_tree) = inner.head(branch.as_str())?;
        Ok(BranchState {
            name: branch.clone(),
            head_commit,
            head_tree,
        })
    }

    async fn get_tree(&self, tree: &Oid, recursive: bool) -> Result<Vec<Entry>, ForgeError> {
        self.record(MockOperation::GetTree {
            tree: tree.clone(),
            recursive,
        });
        self.check_fail("get_tree")?;

        let inner = self.inner.lock().unwrap();
        if !inner.trees.contains_key(tree) {
            return Err(ForgeError::NotFound(format!("tree {}", tree)));
        }
        let mut out = Vec::new();
        inner.flatten(tree, paths::ROOT, recursive, &mut out);
        Ok(out)
    }

    async fn get_blob(&self, blob: &Oid) -> Result<Blob, ForgeError> {
        self.record(MockOperation::GetBlob { blob: blob.clone() });
        self.check_fail("get_blob")?;

        let inner = self.inner.lock().unwrap();
        inner
            .blobs
            .get(blob)
            .map(|bytes| Blob::encode(bytes))
            .ok_or_else(|| ForgeError::NotFound(format!("blob {}", blob)))
    }

    async fn create_blob(&self, content: &[u8]) -> Result<Oid, ForgeError> {
        self.record(MockOperation::CreateBlob { len: content.len() });
        self.check_fail("create_blob")?;

        let mut inner = self.inner.lock().unwrap();
        Ok(inner.put_blob(content))
    }

    async fn create_tree(&self, items: &[TreeItem]) -> Result<Oid, ForgeError> {
        self.record(MockOperation::CreateTree {
            paths: items.iter().map(|i| i.path.clone()).collect(),
        });
        self.check_fail("create_tree")?;

        let mut inner = self.inner.lock().unwrap();
        let items = items
            .iter()
            .map(|item| {
                (
                    item.path.clone(),
                    TreeNode {
                        kind: item.kind,
                        mode: item.mode,
                        oid: item.oid.clone(),
                    },
                )
            })
            .collect();
        inner.build_tree(items)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree: &Oid,
        parent: &Oid,
    ) -> Result<Oid, ForgeError> {
        self.record(MockOperation::CreateCommit {
            message: message.to_string(),
            tree: tree.clone(),
            parent: parent.clone(),
        });
        self.check_fail("create_commit")?;

        let mut inner = self.inner.lock().unwrap();
        if !inner.trees.contains_key(tree) {
            return Err(bad_object("tree", tree));
        }
        if !inner.commits.contains_key(parent) {
            return Err(bad_object("commit", parent));
        }
        Ok(inner.put_commit(message, tree.clone(), Some(parent.clone())))
    }

    async fn update_ref(
        &self,
        branch: &BranchName,
        commit: &Oid,
        force: bool,
    ) -> Result<(), ForgeError> {
        self.record(MockOperation::UpdateRef {
            branch: branch.to_string(),
            commit: commit.clone(),
            force,
        });
        self.check_fail("update_ref")?;

        let mut inner = self.inner.lock().unwrap();
        if !inner.commits.contains_key(commit) {
            return Err(bad_object("commit", commit));
        }
        let current = inner
            .branches
            .get(branch.as_str())
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("Reference does not exist: {}", branch)))?;
        if !force && !inner.is_ancestor(&current, commit.clone()) {
            return Err(ForgeError::RefConflict("Update is not a fast forward".into()));
        }
        inner.branches.insert(branch.to_string(), commit.clone());
        Ok(())
    }

    async fn delete_path(
        &self,
        path: &str,
        blob: &Oid,
        branch: &BranchName,
        message: &str,
    ) -> Result<DeleteResult, ForgeError> {
        self.record(MockOperation::DeletePath {
            path: path.to_string(),
            branch: branch.to_string(),
            message: message.to_string(),
        });
        self.check_fail("delete_path")?;

        let mut inner = self.inner.lock().unwrap();
        let (_, tree) = inner.head(branch.as_str())?;
        let mut items = inner.blob_items(&tree);
        let position = items
            .iter()
            .position(|(p, _)| p == path)
            .ok_or_else(|| ForgeError::NotFound(format!("path {}", path)))?;
        if &items[position].1.oid != blob {
            return Err(ForgeError::RefConflict(format!(
                "{} does not match {}",
                path, blob
            )));
        }
        items.remove(position);

        let (commit, tree) = inner.commit_files(branch.as_str(), items, message)?;
        Ok(DeleteResult { commit, tree })
    }
}
