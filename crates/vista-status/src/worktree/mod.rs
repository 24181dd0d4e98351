//! Worktree adapters.

pub mod fs;
pub mod memory;

pub use fs::{FsWalk, Workdir};
pub use memory::{MemoryFile, MemoryWalk, MemoryWorktree, DEFAULT_MTIME};
