//! Error types for the index crate.

use vista_types::{ObjectId, PathKey, TypeError};

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The specified path was not found in the index.
    #[error("path not found in index: {0}")]
    PathNotFound(PathKey),

    /// An object referenced by the index was not found in the store.
    #[error("object not found in store: {0:?}")]
    ObjectNotFound(ObjectId),

    /// Only files can be staged; directory keys are rejected.
    #[error("cannot stage directory: {0}")]
    DirectoryPath(PathKey),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] vista_store::StoreError),

    /// An invalid path was provided or stored.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] TypeError),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
