//! forge
//!
//! Abstraction over the remote that stores the branch.
//!
//! # Architecture
//!
//! The `Forge` trait covers the Git data operations the filesystem needs:
//! reading a branch head, listing trees, reading and writing blobs, creating
//! trees and commits, moving a ref, and deleting a single path. The
//! filesystem only ever talks to a `dyn Forge`, so the adapter can be
//! swapped for the in-memory [`mock`] in tests.
//!
//! - Forge calls are made only after local path checks pass
//! - A failed forge call never leaves the local cache half-updated
//! - Adapters do not retry
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait and request/response types
//! - [`github`]: GitHub implementation over the REST Git Data API
//! - [`mock`]: In-memory implementation for deterministic testing
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ghfs::auth::StaticToken;
//! use ghfs::forge::github::GitHubForge;
//! use ghfs::forge::Forge;
//!
//! let forge = GitHubForge::new(
//!     Arc::new(StaticToken::new("ghp_example")),
//!     "octocat",
//!     "site",
//! );
//! assert_eq!(forge.name(), "github");
//! ```

pub mod github;
pub mod mock;
mod traits;

pub use traits::*;
