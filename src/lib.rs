//! ghfs - a filesystem view over a GitHub branch
//!
//! ghfs adapts a remote Git branch (blobs, trees, commits and a branch ref)
//! to a conventional filesystem interface. Callers create, read, write,
//! move and remove files as if the branch were a local directory; every
//! successful mutation becomes a new commit on the branch.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to fs)
//! - [`fs`] - The mounted session: path resolution, listings, tree
//!   rebuilds, commits and file handles
//! - [`forge`] - The Git data operations the filesystem consumes, with
//!   GitHub and in-memory implementations
//! - [`core`] - Domain types, path handling and configuration
//! - [`auth`] - Bearer token seam for forge adapters
//! - [`logging`] - Subscriber setup for the binary
//!
//! # Correctness Invariants
//!
//! 1. Every mutation on a session is serialized behind one lock
//! 2. A commit is only made on top of the head the session last observed
//! 3. A moved branch is reported as a conflict, never overwritten
//! 4. Nothing retries behind the caller's back

pub mod auth;
pub mod cli;
pub mod core;
pub mod forge;
pub mod fs;
pub mod logging;
