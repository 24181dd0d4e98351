//! Error types for the status engine.

use std::fmt;
use std::path::PathBuf;

use vista_ignore::IgnoreError;
use vista_index::IndexError;
use vista_store::StoreError;
use vista_types::{PathKey, TypeError};

/// Which of the three sources an entry came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Head,
    Index,
    Worktree,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => f.write_str("HEAD"),
            Self::Index => f.write_str("index"),
            Self::Worktree => f.write_str("worktree"),
        }
    }
}

/// Failure surfaced by a path source or another collaborator.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("walking worktree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Ignore(#[from] IgnoreError),

    #[error(transparent)]
    Path(#[from] TypeError),

    /// Backend-specific failure (e.g. libgit2).
    #[error("{backend} backend: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    /// A source broke the strictly-ascending order contract.
    #[error("{source_kind} source out of order: {next} after {previous}")]
    OutOfOrder {
        source_kind: SourceKind,
        previous: PathKey,
        next: PathKey,
    },
}

impl SourceError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors returned by the status API.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    /// A collaborator failed mid-scan. The scan was aborted, so whatever the
    /// caller received before this error is an incomplete report.
    #[error("status scan aborted after {reported} entries, report is incomplete: {source}")]
    AdapterFailure {
        reported: usize,
        #[source]
        source: SourceError,
    },

    /// The queried path names a directory or cannot be normalized.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// The queried path is absent from HEAD, the index, and the worktree.
    #[error("path not found in HEAD, index, or worktree: {0}")]
    NotFound(PathKey),

    /// The ignore rule set could not be constructed.
    #[error("cannot build ignore rules: {0}")]
    IgnoreRules(#[source] SourceError),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("cannot read configuration {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StatusError {
    /// Whether the error means a partial report was delivered.
    pub fn is_incomplete_report(&self) -> bool {
        matches!(self, Self::AdapterFailure { .. })
    }
}

impl From<TypeError> for StatusError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidPath { path, reason } => Self::InvalidPath {
                path,
                reason: reason.to_string(),
            },
            other => Self::InvalidPath {
                path: String::new(),
                reason: other.to_string(),
            },
        }
    }
}

/// Result alias for status operations.
pub type StatusResult<T> = Result<T, StatusError>;
