//! Git backend for the Vista status engine.
//!
//! [`GitBackend`] opens a repository with libgit2 and serves the three
//! status sources from it: the HEAD tree, the on-disk index (with its
//! stat data and racy-entry detection), and the working directory, whose
//! content is hashed as git blobs. Ignore rules come from
//! `core.excludesfile`, `$GIT_DIR/info/exclude` and the worktree's
//! `.gitignore` files.

pub mod backend;
pub mod config;
mod convert;
pub mod error;
pub mod hasher;
pub mod worktree;

pub use backend::GitBackend;
pub use config::{default_excludes_file, status_config};
pub use error::{GitError, GitResult};
pub use hasher::GitBlobHasher;
pub use worktree::GitWorktree;
