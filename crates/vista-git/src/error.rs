use std::path::PathBuf;

use vista_ignore::IgnoreError;
use vista_status::SourceError;
use vista_types::TypeError;

/// Errors from the git backend.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("libgit2: {}", .0.message())]
    Git(#[from] git2::Error),

    #[error("repository at {} has no working directory", .0.display())]
    BareRepository(PathBuf),

    #[error(transparent)]
    Path(#[from] TypeError),

    #[error(transparent)]
    Ignore(#[from] IgnoreError),
}

pub type GitResult<T> = Result<T, GitError>;

impl From<GitError> for SourceError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::Path(e) => SourceError::Path(e),
            GitError::Ignore(e) => SourceError::Ignore(e),
            other => SourceError::Backend {
                backend: "git",
                message: other.to_string(),
            },
        }
    }
}
