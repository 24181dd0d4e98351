//! Conversions between libgit2 values and Vista types.

use git2::{IndexTime, Oid};
use vista_types::{FileMode, FileTime, ObjectId, PathKey};

use crate::error::GitResult;

/// Mode of a gitlink (submodule commit) entry.
pub(crate) const GITLINK_MODE: u32 = 0o160000;

pub(crate) fn object_id(oid: Oid) -> GitResult<ObjectId> {
    Ok(ObjectId::from_digest(oid.as_bytes())?)
}

/// Mode of a tree or index entry; `None` for gitlinks.
pub(crate) fn file_mode(bits: u32) -> GitResult<Option<FileMode>> {
    if bits & 0o170000 == GITLINK_MODE {
        return Ok(None);
    }
    Ok(Some(FileMode::from_mode_bits(bits)?))
}

pub(crate) fn file_time(time: IndexTime) -> FileTime {
    FileTime::new(i64::from(time.seconds()), time.nanoseconds())
}

pub(crate) fn path_key(raw: &[u8]) -> GitResult<PathKey> {
    Ok(PathKey::parse(raw)?)
}
