//! Entry descriptors and the identities used to compare them.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::mode::FileMode;
use crate::object::ObjectId;
use crate::path::PathKey;

/// Modification timestamp with nanosecond precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileTime {
    pub secs: i64,
    pub nanos: u32,
}

impl FileTime {
    pub fn new(secs: i64, nanos: u32) -> Self {
        Self { secs, nanos }
    }

    /// Convert a `SystemTime`; times before the epoch are negative.
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self::new(d.as_secs() as i64, d.subsec_nanos()),
            Err(e) => {
                let d = e.duration();
                if d.subsec_nanos() == 0 {
                    Self::new(-(d.as_secs() as i64), 0)
                } else {
                    Self::new(-(d.as_secs() as i64) - 1, 1_000_000_000 - d.subsec_nanos())
                }
            }
        }
    }
}

/// Outcome of comparing two identities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sameness {
    Same,
    Different,
    /// The cheap data is inconclusive; content must be compared.
    Unknown,
}

/// Stat data cached for a file: enough to skip reading unchanged content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatFingerprint {
    pub size: u64,
    /// `None` when the timestamp cannot be trusted (racily clean entries).
    pub mtime: Option<FileTime>,
}

impl StatFingerprint {
    pub fn new(size: u64, mtime: FileTime) -> Self {
        Self {
            size,
            mtime: Some(mtime),
        }
    }

    /// The same fingerprint with the timestamp discarded.
    pub fn without_mtime(self) -> Self {
        Self { mtime: None, ..self }
    }

    /// A size difference is conclusive; a matching size is only conclusive
    /// when both timestamps are known and equal.
    pub fn compare(&self, other: &StatFingerprint) -> Sameness {
        if self.size != other.size {
            return Sameness::Different;
        }
        match (self.mtime, other.mtime) {
            (Some(a), Some(b)) if a == b => Sameness::Same,
            _ => Sameness::Unknown,
        }
    }
}

/// Opaque, equality-comparable token standing in for an entry's content.
///
/// HEAD entries carry an object id, index entries carry both an object id
/// and the stat data recorded when the file was staged, and worktree
/// entries carry only stat data until their content is hashed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentIdentity {
    pub oid: Option<ObjectId>,
    pub stat: Option<StatFingerprint>,
}

impl ContentIdentity {
    pub fn object(oid: ObjectId) -> Self {
        Self {
            oid: Some(oid),
            stat: None,
        }
    }

    pub fn stat(stat: StatFingerprint) -> Self {
        Self {
            oid: None,
            stat: Some(stat),
        }
    }

    pub fn staged(oid: ObjectId, stat: StatFingerprint) -> Self {
        Self {
            oid: Some(oid),
            stat: Some(stat),
        }
    }

    /// Compare using object ids when both sides have one, stat data otherwise.
    pub fn compare(&self, other: &ContentIdentity) -> Sameness {
        if let (Some(a), Some(b)) = (self.oid, other.oid) {
            return if a == b {
                Sameness::Same
            } else {
                Sameness::Different
            };
        }
        match (self.stat, other.stat) {
            (Some(a), Some(b)) => a.compare(&b),
            _ => Sameness::Unknown,
        }
    }
}

/// One `(path, mode, identity)` tuple yielded by a path source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDescriptor {
    pub path: PathKey,
    pub mode: FileMode,
    pub identity: ContentIdentity,
}

impl EntryDescriptor {
    pub fn new(path: PathKey, mode: FileMode, identity: ContentIdentity) -> Self {
        Self {
            path,
            mode,
            identity,
        }
    }

    /// A worktree directory marker for `path`.
    pub fn directory(path: &PathKey) -> Self {
        Self {
            path: path.to_dir(),
            mode: FileMode::Directory,
            identity: ContentIdentity::default(),
        }
    }

    /// Returns `true` for worktree directory markers.
    pub fn is_directory(&self) -> bool {
        self.mode == FileMode::Directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(size: u64, secs: i64) -> StatFingerprint {
        StatFingerprint::new(size, FileTime::new(secs, 0))
    }

    #[test]
    fn object_ids_decide_when_both_present() {
        let a = ContentIdentity::staged(ObjectId::from_bytes(b"a"), stat(1, 10));
        let b = ContentIdentity::staged(ObjectId::from_bytes(b"a"), stat(9, 99));
        assert_eq!(a.compare(&b), Sameness::Same);

        let c = ContentIdentity::object(ObjectId::from_bytes(b"c"));
        assert_eq!(a.compare(&c), Sameness::Different);
    }

    #[test]
    fn size_change_is_conclusive() {
        let index = ContentIdentity::staged(ObjectId::from_bytes(b"x"), stat(3, 10));
        let worktree = ContentIdentity::stat(stat(4, 10));
        assert_eq!(index.compare(&worktree), Sameness::Different);
    }

    #[test]
    fn equal_stat_is_same_and_touched_file_is_unknown() {
        let index = ContentIdentity::staged(ObjectId::from_bytes(b"x"), stat(3, 10));
        assert_eq!(index.compare(&ContentIdentity::stat(stat(3, 10))), Sameness::Same);
        assert_eq!(index.compare(&ContentIdentity::stat(stat(3, 11))), Sameness::Unknown);
    }

    #[test]
    fn racy_entry_needs_content_check() {
        let racy = ContentIdentity::staged(
            ObjectId::from_bytes(b"x"),
            stat(3, 10).without_mtime(),
        );
        assert_eq!(racy.compare(&ContentIdentity::stat(stat(3, 10))), Sameness::Unknown);
        assert_eq!(racy.compare(&ContentIdentity::stat(stat(5, 10))), Sameness::Different);
    }

    #[test]
    fn pre_epoch_times_normalize_nanos() {
        let t = UNIX_EPOCH - std::time::Duration::new(1, 250_000_000);
        assert_eq!(FileTime::from_system_time(t), FileTime::new(-2, 750_000_000));
    }

    #[test]
    fn directory_marker_has_trailing_slash() {
        let marker = EntryDescriptor::directory(&PathKey::parse("src").unwrap());
        assert!(marker.is_directory());
        assert_eq!(marker.path.as_bytes(), b"src/");
    }
}
