//! Status engine for Vista.
//!
//! Reports, for every path in a repository, how it differs between the
//! HEAD snapshot, the staging index, and the working tree. The three sources
//! are merged in a single ordered pass: each yields entries sorted by
//! [`PathKey`](vista_types::PathKey), and the [`Reconciler`] walks them like
//! a three-way merge join, consulting the ignore rules for paths only the
//! worktree knows about and skipping the contents of ignored directories
//! wholesale.
//!
//! # Key Types
//!
//! - [`Repository`] - Backend plus cached ignore rules; entry point for callers
//! - [`StatusBackend`] / [`Worktree`] - The sources a scan consumes
//! - [`NativeBackend`] - Backend over a Vista object store and index
//! - [`Workdir`] / [`MemoryWorktree`] - On-disk and in-memory worktrees
//! - [`Reconciler`] - The lazy merge scan
//! - [`StatusOptions`] / [`StatusConfig`] - Per-call and per-repository settings
//!
//! # Entry points
//!
//! - [`for_each`] - Enumerate results through a callback that may stop early
//! - [`status_of`] - One path's flags, computed by the same scan
//! - [`should_ignore`] - The ignore decision for any path

pub mod backend;
pub mod config;
mod cursor;
pub mod dispatch;
pub mod error;
pub mod list;
pub mod options;
pub mod query;
pub mod reconcile;
pub mod repository;
pub mod source;
pub mod worktree;

#[cfg(test)]
mod testutil;

pub use backend::NativeBackend;
pub use config::{StatusConfig, UntrackedMode};
pub use dispatch::{collect, for_each};
pub use error::{SourceError, SourceKind, SourceResult, StatusError, StatusResult};
pub use list::{StatusEntry, StatusList, StatusSummary};
pub use options::{Show, StatusOptions};
pub use query::{should_ignore, status_of};
pub use reconcile::{Reconciler, ScanStats};
pub use repository::Repository;
pub use source::{infallible, EntryStream, StatusBackend, Worktree, WorktreeStream, WorktreeWalk};
pub use worktree::{MemoryFile, MemoryWorktree, Workdir};
