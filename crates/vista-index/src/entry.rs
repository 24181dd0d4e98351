//! Index entry type.

use serde::{Deserialize, Serialize};
use vista_types::{
    ContentIdentity, EntryDescriptor, FileMode, FileTime, ObjectId, PathKey, StatFingerprint,
};

/// An entry in the staging index, representing a tracked file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Repository-relative path.
    pub path: PathKey,
    /// Content-addressed ID of the staged blob.
    pub object_id: ObjectId,
    /// File mode (regular, executable, symlink).
    pub mode: FileMode,
    /// Size and mtime of the worktree file when it was staged.
    pub stat: StatFingerprint,
}

impl IndexEntry {
    pub fn new(path: PathKey, object_id: ObjectId, mode: FileMode, stat: StatFingerprint) -> Self {
        Self {
            path,
            object_id,
            mode,
            stat,
        }
    }

    /// Whether the entry was written in the same timestamp granule as the
    /// index itself, so a later edit could have kept the same mtime.
    pub fn is_racy(&self, index_timestamp: Option<FileTime>) -> bool {
        match (self.stat.mtime, index_timestamp) {
            (Some(mtime), Some(ts)) => mtime >= ts,
            _ => false,
        }
    }

    /// Descriptor handed to the status scan.
    ///
    /// Racy entries lose their mtime so that an equal size alone never
    /// counts as unchanged.
    pub fn to_descriptor(&self, index_timestamp: Option<FileTime>) -> EntryDescriptor {
        let stat = if self.is_racy(index_timestamp) {
            self.stat.without_mtime()
        } else {
            self.stat
        };
        EntryDescriptor::new(
            self.path.clone(),
            self.mode,
            ContentIdentity::staged(self.object_id, stat),
        )
    }
}
