//! The working directory as git's index sees it.

use std::path::{Path, PathBuf};

use vista_ignore::IgnoreEngine;
use vista_status::{SourceResult, Workdir, Worktree, WorktreeStream, WorktreeWalk};
use vista_types::{EntryDescriptor, ObjectId, PathKey, Scope, StatFingerprint};

use crate::hasher::GitBlobHasher;

/// A [`Workdir`] whose stat data is comparable with git index entries.
///
/// The index stores file sizes in 32 bits. Sizes past that are reduced to
/// their low 32 bits and lose their timestamp, so a file the index cannot
/// describe exactly is always settled by hashing its content.
pub struct GitWorktree {
    inner: Workdir<GitBlobHasher>,
}

impl GitWorktree {
    /// The worktree at `root`, hashed as git blobs.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: Workdir::with_hasher(root, GitBlobHasher),
        }
    }

    /// The worktree's top-level directory.
    pub fn root(&self) -> &Path {
        self.inner.root()
    }
}

/// Reduce a worktree entry's size to the width git records.
pub(crate) fn index_width(mut entry: EntryDescriptor) -> EntryDescriptor {
    if let Some(stat) = entry.identity.stat.as_mut() {
        if stat.size > u64::from(u32::MAX) {
            *stat = StatFingerprint {
                size: stat.size & u64::from(u32::MAX),
                mtime: None,
            };
        }
    }
    entry
}

impl Worktree for GitWorktree {
    fn walk(&self, scope: &Scope) -> SourceResult<WorktreeStream<'_>> {
        Ok(Box::new(GitWalk(self.inner.walk(scope)?)))
    }

    fn entry(&self, path: &PathKey) -> SourceResult<Option<EntryDescriptor>> {
        Ok(self.inner.entry(path)?.map(index_width))
    }

    fn content_id(&self, path: &PathKey) -> SourceResult<ObjectId> {
        self.inner.content_id(path)
    }

    fn load_ignore_files(&self, engine: &mut IgnoreEngine) -> SourceResult<()> {
        self.inner.load_ignore_files(engine)
    }
}

struct GitWalk<'a>(WorktreeStream<'a>);

impl Iterator for GitWalk<'_> {
    type Item = SourceResult<EntryDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|entry| entry.map(index_width))
    }
}

impl WorktreeWalk for GitWalk<'_> {
    fn skip_subtree(&mut self, dir: &PathKey) {
        self.0.skip_subtree(dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use vista_types::{ContentIdentity, FileMode, FileTime, Sameness};

    const MTIME: FileTime = FileTime {
        secs: 1_700_000_000,
        nanos: 0,
    };

    fn file(size: u64) -> EntryDescriptor {
        EntryDescriptor::new(
            PathKey::parse("big.bin").unwrap(),
            FileMode::Regular,
            ContentIdentity::stat(StatFingerprint::new(size, MTIME)),
        )
    }

    #[test]
    fn oversized_file_is_settled_by_content() {
        let size = (1u64 << 32) + 10;
        let index = ContentIdentity::staged(
            ObjectId::from_bytes(b"blob"),
            StatFingerprint::new(size & u64::from(u32::MAX), MTIME),
        );

        // Compared at full width the sizes disagree.
        assert_eq!(index.compare(&file(size).identity), Sameness::Different);

        let folded = index_width(file(size));
        assert_eq!(folded.identity.stat.unwrap().size, 10);
        assert_eq!(index.compare(&folded.identity), Sameness::Unknown);
    }

    #[test]
    fn oversized_size_change_is_still_seen() {
        let index = ContentIdentity::staged(
            ObjectId::from_bytes(b"blob"),
            StatFingerprint::new(10, MTIME),
        );
        let folded = index_width(file((1u64 << 32) + 11));
        assert_eq!(index.compare(&folded.identity), Sameness::Different);
    }

    #[test]
    fn ordinary_sizes_are_untouched() {
        assert_eq!(index_width(file(4096)), file(4096));
        assert_eq!(index_width(file(u64::from(u32::MAX))), file(u64::from(u32::MAX)));
    }

    #[test]
    fn walk_and_lookup_go_through_the_workdir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), "lib").unwrap();

        let wt = GitWorktree::new(dir.path());
        let listed: Vec<String> = wt
            .walk(&Scope::All)
            .unwrap()
            .map(|e| e.unwrap().path.to_string())
            .collect();
        assert_eq!(listed, vec!["src/", "src/lib.rs"]);
        let entry = wt.entry(&PathKey::parse("src/lib.rs").unwrap()).unwrap().unwrap();
        assert_eq!(entry.identity.stat.unwrap().size, 3);
    }
}
