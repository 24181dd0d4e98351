//! The on-disk working directory.

use std::cmp::Ordering;
use std::fs::{self, Metadata};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use vista_ignore::{IgnoreEngine, IgnoreLoader};
use vista_store::{BlobHasher, ContentHasher};
use vista_types::{
    ContentIdentity, EntryDescriptor, FileMode, FileTime, ObjectId, PathKey, Scope,
    StatFingerprint,
};
use walkdir::{DirEntry, WalkDir};

use crate::error::{SourceError, SourceResult};
use crate::source::{Worktree, WorktreeStream, WorktreeWalk};

const GIT_DIR: &str = ".git";

/// A worktree rooted at a directory on disk.
///
/// Listings come from `walkdir` with siblings sorted the way git sorts tree
/// entries, so the walk is in path-key order. Only stat data is collected
/// while walking; content is read when the reconciler asks for it.
#[derive(Clone, Debug)]
pub struct Workdir<H = ContentHasher> {
    root: PathBuf,
    hasher: H,
}

impl Workdir {
    /// A worktree at `root` whose content is hashed as Vista blobs.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_hasher(root, ContentHasher::BLOB)
    }
}

impl<H: BlobHasher> Workdir<H> {
    /// A worktree at `root` hashing content with `hasher`.
    pub fn with_hasher(root: impl Into<PathBuf>, hasher: H) -> Self {
        Self {
            root: root.into(),
            hasher,
        }
    }

    /// The directory every path key is resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a file's content; symlinks yield their target path.
    pub fn read_content(&self, path: &PathKey) -> SourceResult<Vec<u8>> {
        let full = path.to_path(&self.root);
        let meta = fs::symlink_metadata(&full).map_err(|e| SourceError::io(&full, e))?;
        if meta.file_type().is_symlink() {
            let target = fs::read_link(&full).map_err(|e| SourceError::io(&full, e))?;
            return Ok(target.as_os_str().as_encoded_bytes().to_vec());
        }
        fs::read(&full).map_err(|e| SourceError::io(&full, e))
    }

    /// Whether some ancestor of `path` exists as a non-directory.
    fn shadowed_by_file(&self, path: &PathKey) -> bool {
        path.ancestors().any(|dir| {
            PathKey::parse(dir).is_ok_and(|dir| {
                fs::symlink_metadata(dir.to_path(&self.root)).is_ok_and(|m| !m.is_dir())
            })
        })
    }

    fn describe(&self, path: PathKey, meta: &Metadata) -> Option<EntryDescriptor> {
        let file_type = meta.file_type();
        let mode = if file_type.is_symlink() {
            FileMode::Symlink
        } else if file_type.is_file() {
            if is_executable(meta) {
                FileMode::Executable
            } else {
                FileMode::Regular
            }
        } else {
            // Sockets, fifos and devices are never tracked.
            return None;
        };
        let stat = StatFingerprint {
            size: meta.len(),
            mtime: meta.modified().ok().map(FileTime::from_system_time),
        };
        Some(EntryDescriptor::new(path, mode, ContentIdentity::stat(stat)))
    }
}

#[cfg(unix)]
fn is_executable(meta: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &Metadata) -> bool {
    false
}

/// Sibling order matching git trees: directories sort as `name/`.
fn git_order(a: &DirEntry, b: &DirEntry) -> Ordering {
    let key = |e: &DirEntry| {
        let mut name = e.file_name().as_encoded_bytes().to_vec();
        if e.file_type().is_dir() {
            name.push(b'/');
        }
        name
    };
    key(a).cmp(&key(b))
}

fn is_vanished(err: &walkdir::Error) -> bool {
    err.io_error()
        .is_some_and(|e| e.kind() == ErrorKind::NotFound)
}

impl<H: BlobHasher> Worktree for Workdir<H> {
    fn walk(&self, scope: &Scope) -> SourceResult<WorktreeStream<'_>> {
        let mut walk = FsWalk {
            workdir: self,
            inner: None,
            single: None,
            last_dir: None,
        };
        match scope {
            Scope::All => walk.inner = Some(walk_from(&self.root)),
            Scope::Directory(dir) => walk.inner = Some(walk_from(&dir.to_path(&self.root))),
            Scope::Path(path) => {
                walk.single = self.entry(path)?.filter(|e| !e.is_directory());
            }
        }
        Ok(Box::new(walk))
    }

    fn entry(&self, path: &PathKey) -> SourceResult<Option<EntryDescriptor>> {
        let full = path.to_path(&self.root);
        let meta = match fs::symlink_metadata(&full) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound || self.shadowed_by_file(path) => {
                return Ok(None)
            }
            Err(e) => return Err(SourceError::io(full, e)),
        };
        if meta.is_dir() {
            return Ok(Some(EntryDescriptor::directory(path)));
        }
        Ok(self.describe(path.to_file(), &meta))
    }

    fn content_id(&self, path: &PathKey) -> SourceResult<ObjectId> {
        Ok(self.hasher.hash_blob(&self.read_content(path)?))
    }

    fn load_ignore_files(&self, engine: &mut IgnoreEngine) -> SourceResult<()> {
        IgnoreLoader::new(&self.root).load_tree(engine)?;
        Ok(())
    }
}

fn walk_from(dir: &Path) -> walkdir::IntoIter {
    WalkDir::new(dir).min_depth(1).sort_by(git_order).into_iter()
}

/// Walk over a [`Workdir`].
pub struct FsWalk<'a, H> {
    workdir: &'a Workdir<H>,
    inner: Option<walkdir::IntoIter>,
    single: Option<EntryDescriptor>,
    /// The directory marker yielded by the latest call to `next`, if any.
    last_dir: Option<PathKey>,
}

impl<H: BlobHasher> Iterator for FsWalk<'_, H> {
    type Item = SourceResult<EntryDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(entry) = self.single.take() {
            return Some(Ok(entry));
        }
        self.last_dir = None;
        let inner = self.inner.as_mut()?;
        loop {
            let entry = match inner.next()? {
                Ok(entry) => entry,
                // Removed between readdir and stat.
                Err(e) if is_vanished(&e) => continue,
                Err(e) => return Some(Err(e.into())),
            };
            let file_type = entry.file_type();
            if file_type.is_dir() && entry.file_name() == GIT_DIR {
                inner.skip_current_dir();
                continue;
            }

            let rel = entry
                .path()
                .strip_prefix(&self.workdir.root)
                .unwrap_or(entry.path());
            let key = match PathKey::from_relative_path(rel) {
                Ok(key) => key,
                Err(e) => return Some(Err(e.into())),
            };
            if file_type.is_dir() {
                let marker = EntryDescriptor::directory(&key);
                self.last_dir = Some(marker.path.clone());
                return Some(Ok(marker));
            }

            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(e) if is_vanished(&e) => continue,
                Err(e) => return Some(Err(e.into())),
            };
            if let Some(descriptor) = self.workdir.describe(key, &meta) {
                return Some(Ok(descriptor));
            }
        }
    }
}

impl<H: BlobHasher> WorktreeWalk for FsWalk<'_, H> {
    fn skip_subtree(&mut self, dir: &PathKey) {
        if self.last_dir.as_ref() != Some(dir) {
            return;
        }
        if let Some(inner) = self.inner.as_mut() {
            inner.skip_current_dir();
        }
        self.last_dir = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> PathKey {
        PathKey::parse(s).unwrap()
    }

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn listed(walk: WorktreeStream<'_>) -> Vec<String> {
        walk.map(|e| e.unwrap().path.to_string()).collect()
    }

    #[test]
    fn walk_is_in_key_order_and_skips_git_dir() {
        let dir = tempfile::tempdir().unwrap();
        for rel in ["a/b", "a.txt", "a0", ".git/HEAD", "z/y/x"] {
            write(dir.path(), rel, rel);
        }
        let wd = Workdir::new(dir.path());
        assert_eq!(
            listed(wd.walk(&Scope::All).unwrap()),
            vec!["a.txt", "a/", "a/b", "a0", "z/", "z/y/", "z/y/x"]
        );
    }

    #[test]
    fn skip_subtree_prunes_last_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "build/out/obj.o", "");
        write(dir.path(), "build/log", "");
        write(dir.path(), "src/main.rs", "");
        let wd = Workdir::new(dir.path());

        let mut walk = wd.walk(&Scope::All).unwrap();
        let first = walk.next().unwrap().unwrap();
        assert_eq!(first.path, key("build/"));
        walk.skip_subtree(&first.path);
        assert_eq!(listed(walk), vec!["src/", "src/main.rs"]);
    }

    #[test]
    fn directory_scope_and_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/lib.rs", "");
        write(dir.path(), "src/bin/cli.rs", "");
        write(dir.path(), "README", "");
        let wd = Workdir::new(dir.path());

        assert_eq!(
            listed(wd.walk(&Scope::directory(&key("src"))).unwrap()),
            vec!["src/bin/", "src/bin/cli.rs", "src/lib.rs"]
        );
        assert!(listed(wd.walk(&Scope::directory(&key("nope"))).unwrap()).is_empty());
    }

    #[test]
    fn entry_reports_files_directories_and_absence() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/lib.rs", "fn main() {}");
        let wd = Workdir::new(dir.path());

        let file = wd.entry(&key("src/lib.rs")).unwrap().unwrap();
        assert_eq!(file.mode, FileMode::Regular);
        assert_eq!(file.identity.stat.unwrap().size, 12);
        assert!(wd.entry(&key("src")).unwrap().unwrap().is_directory());
        assert!(wd.entry(&key("missing")).unwrap().is_none());
        assert!(wd.entry(&key("src/lib.rs/inner")).unwrap().is_none());
    }

    #[test]
    fn content_id_hashes_file_bytes() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "f.txt", "hello");
        let wd = Workdir::new(dir.path());
        assert_eq!(
            wd.content_id(&key("f.txt")).unwrap(),
            ContentHasher::BLOB.hash(b"hello")
        );
        assert!(matches!(
            wd.content_id(&key("gone")),
            Err(SourceError::Io { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn executable_bit_and_symlinks() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "run.sh", "#!/bin/sh");
        let script = dir.path().join("run.sh");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        std::os::unix::fs::symlink("run.sh", dir.path().join("link")).unwrap();
        let wd = Workdir::new(dir.path());

        assert_eq!(wd.entry(&key("run.sh")).unwrap().unwrap().mode, FileMode::Executable);
        assert_eq!(wd.entry(&key("link")).unwrap().unwrap().mode, FileMode::Symlink);
        assert_eq!(
            wd.content_id(&key("link")).unwrap(),
            ContentHasher::BLOB.hash(b"run.sh")
        );
    }

    #[test]
    fn nested_ignore_files_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".gitignore", "*.tmp\n");
        write(dir.path(), "docs/.gitignore", "!keep.tmp\n");
        let wd = Workdir::new(dir.path());
        let mut engine = IgnoreEngine::default();
        wd.load_ignore_files(&mut engine).unwrap();
        assert!(engine.is_ignored(&key("a.tmp"), false));
        assert!(!engine.is_ignored(&key("docs/keep.tmp"), false));
    }
}
