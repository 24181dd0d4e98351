use std::path::PathBuf;

use vista_types::TypeError;

/// Why a single ignore-file line was rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("pattern is empty after removing `!` and slashes")]
    Empty,

    /// The glob was rejected by the matcher (unclosed class, dangling escape).
    #[error("{0}")]
    Glob(String),
}

/// Errors from building an ignore rule set.
#[derive(Debug, thiserror::Error)]
pub enum IgnoreError {
    /// An ignore file exists but could not be read.
    #[error("failed to read ignore file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Walking the worktree for nested ignore files failed.
    #[error("walking worktree for ignore files: {0}")]
    Walk(#[from] walkdir::Error),

    /// A directory name could not be turned into a path key.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] TypeError),
}

/// Result alias for ignore operations.
pub type IgnoreResult<T> = Result<T, IgnoreError>;
