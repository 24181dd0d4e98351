use git2::{ObjectType, Oid};
use tracing::warn;
use vista_store::BlobHasher;
use vista_types::ObjectId;

use crate::convert::object_id;

/// Hashes worktree content the way `git hash-object` does, so it can be
/// compared with the blob ids recorded in a git index.
///
/// Content filters (line-ending conversion, clean filters) are not applied.
#[derive(Clone, Copy, Debug, Default)]
pub struct GitBlobHasher;

impl BlobHasher for GitBlobHasher {
    fn hash_blob(&self, data: &[u8]) -> ObjectId {
        match Oid::hash_object(ObjectType::Blob, data)
            .map_err(Into::into)
            .and_then(object_id)
        {
            Ok(id) => id,
            Err(err) => {
                // The null id never equals a staged blob, so the file shows as modified.
                warn!(error = %err, "cannot hash blob");
                ObjectId::null()
            }
        }
    }
}
