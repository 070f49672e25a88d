//! core
//!
//! Domain types, path arithmetic and configuration for ghfs.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, Entry, BranchState
//! - [`paths`] - Slash-separated path arithmetic
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Nothing in `core` performs network I/O

pub mod config;
pub mod paths;
pub mod types;
