//! An in-memory worktree for tests and embedding.

use std::collections::btree_map::{self, BTreeMap};
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use vista_ignore::IgnoreEngine;
use vista_store::{BlobHasher, ContentHasher};
use vista_types::{
    ContentIdentity, EntryDescriptor, FileMode, FileTime, ObjectId, PathKey, Scope,
    StatFingerprint,
};

use crate::error::{SourceError, SourceResult};
use crate::source::{Worktree, WorktreeStream, WorktreeWalk};

/// Modification time given to files inserted without one.
pub const DEFAULT_MTIME: FileTime = FileTime {
    secs: 1_600_000_000,
    nanos: 0,
};

/// A file held by a [`MemoryWorktree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryFile {
    pub data: Vec<u8>,
    pub mode: FileMode,
    pub mtime: FileTime,
}

impl MemoryFile {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            mode: FileMode::Regular,
            mtime: DEFAULT_MTIME,
        }
    }

    pub fn stat(&self) -> StatFingerprint {
        StatFingerprint::new(self.data.len() as u64, self.mtime)
    }

    fn descriptor(&self, path: &PathKey) -> EntryDescriptor {
        EntryDescriptor::new(path.clone(), self.mode, ContentIdentity::stat(self.stat()))
    }
}

/// Worktree backed by a sorted map of files.
///
/// Directories exist implicitly through the files below them; walks
/// synthesize their markers. Counters record how many entries walks
/// yielded and how many files had their content hashed.
pub struct MemoryWorktree {
    files: BTreeMap<PathKey, MemoryFile>,
    hasher: Arc<dyn BlobHasher>,
    yielded: AtomicUsize,
    content_reads: AtomicUsize,
}

impl Default for MemoryWorktree {
    fn default() -> Self {
        Self::with_hasher(Arc::new(ContentHasher::BLOB))
    }
}

impl MemoryWorktree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hasher(hasher: Arc<dyn BlobHasher>) -> Self {
        Self {
            files: BTreeMap::new(),
            hasher,
            yielded: AtomicUsize::new(0),
            content_reads: AtomicUsize::new(0),
        }
    }

    /// Add or replace a regular file with the default mtime.
    pub fn insert(&mut self, path: &PathKey, data: impl Into<Vec<u8>>) {
        self.insert_file(path, MemoryFile::new(data));
    }

    pub fn insert_file(&mut self, path: &PathKey, file: MemoryFile) {
        self.files.insert(path.to_file(), file);
    }

    pub fn remove(&mut self, path: &PathKey) -> Option<MemoryFile> {
        self.files.remove(path)
    }

    pub fn get(&self, path: &PathKey) -> Option<&MemoryFile> {
        self.files.get(path)
    }

    pub fn get_mut(&mut self, path: &PathKey) -> Option<&mut MemoryFile> {
        self.files.get_mut(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Entries yielded by all walks so far.
    pub fn yielded(&self) -> usize {
        self.yielded.load(Ordering::Relaxed)
    }

    /// Files whose content was hashed so far.
    pub fn content_reads(&self) -> usize {
        self.content_reads.load(Ordering::Relaxed)
    }

    pub fn reset_counters(&self) {
        self.yielded.store(0, Ordering::Relaxed);
        self.content_reads.store(0, Ordering::Relaxed);
    }

    fn has_children(&self, dir: &PathKey) -> bool {
        let dir = dir.to_dir();
        self.files
            .range(dir.clone()..)
            .next()
            .is_some_and(|(k, _)| k.is_inside(&dir))
    }
}

impl Worktree for MemoryWorktree {
    fn walk(&self, scope: &Scope) -> SourceResult<WorktreeStream<'_>> {
        let mut walk = MemoryWalk {
            files: &self.files,
            range: self.files.range::<PathKey, _>(..),
            within: None,
            open: Vec::new(),
            pending: VecDeque::new(),
            yielded: &self.yielded,
        };
        match scope {
            Scope::All => {}
            Scope::Directory(dir) => {
                walk.range = self.files.range(dir.clone()..);
                walk.within = Some(dir.clone());
            }
            Scope::Path(path) => {
                walk.range = self.files.range(path.clone()..path.clone());
                if let Some(file) = self.files.get(path) {
                    walk.pending.push_back(file.descriptor(path));
                }
            }
        }
        Ok(Box::new(walk))
    }

    fn entry(&self, path: &PathKey) -> SourceResult<Option<EntryDescriptor>> {
        if let Some(file) = self.files.get(&path.to_file()) {
            return Ok(Some(file.descriptor(&path.to_file())));
        }
        Ok(self
            .has_children(path)
            .then(|| EntryDescriptor::directory(path)))
    }

    fn content_id(&self, path: &PathKey) -> SourceResult<ObjectId> {
        self.content_reads.fetch_add(1, Ordering::Relaxed);
        let file = self.files.get(path).ok_or_else(|| {
            SourceError::io(path.to_string(), io::Error::from(io::ErrorKind::NotFound))
        })?;
        Ok(self.hasher.hash_blob(&file.data))
    }

    fn load_ignore_files(&self, engine: &mut IgnoreEngine) -> SourceResult<()> {
        let name = engine.config().file_name.clone();
        let mut candidates: Vec<(&PathKey, &MemoryFile)> = self
            .files
            .iter()
            .filter(|(k, _)| k.file_name() == name.as_bytes())
            .collect();
        candidates.sort_by_key(|(k, _)| k.depth());

        for (key, file) in candidates {
            let dir = key.parent();
            if dir.as_ref().is_some_and(|d| engine.is_ignored(d, true)) {
                continue;
            }
            engine.add_directory(dir.as_ref(), &file.data);
        }
        Ok(())
    }
}

/// Walk over a [`MemoryWorktree`].
pub struct MemoryWalk<'a> {
    files: &'a BTreeMap<PathKey, MemoryFile>,
    range: btree_map::Range<'a, PathKey, MemoryFile>,
    /// Directory scope; only entries strictly inside it are listed.
    within: Option<PathKey>,
    /// Directories whose markers were emitted and that may still have entries.
    open: Vec<PathKey>,
    pending: VecDeque<EntryDescriptor>,
    yielded: &'a AtomicUsize,
}

impl MemoryWalk<'_> {
    fn fill(&mut self) -> SourceResult<bool> {
        let Some((path, file)) = self.range.next() else {
            return Ok(false);
        };
        if let Some(dir) = &self.within {
            if !path.is_inside(dir) {
                self.range = self.files.range(path.clone()..path.clone());
                return Ok(false);
            }
        }

        while let Some(top) = self.open.last() {
            if path.is_inside(top) {
                break;
            }
            self.open.pop();
        }
        for ancestor in path.ancestors() {
            let dir = PathKey::directory(ancestor)?;
            if self.within.as_ref().is_some_and(|w| !dir.is_inside(w)) {
                continue;
            }
            if self.open.contains(&dir) {
                continue;
            }
            self.pending.push_back(EntryDescriptor::directory(&dir));
            self.open.push(dir);
        }
        self.pending.push_back(file.descriptor(path));
        Ok(true)
    }
}

impl Iterator for MemoryWalk<'_> {
    type Item = SourceResult<EntryDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pending.is_empty() {
            match self.fill() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
        let entry = self.pending.pop_front()?;
        self.yielded.fetch_add(1, Ordering::Relaxed);
        Some(Ok(entry))
    }
}

impl WorktreeWalk for MemoryWalk<'_> {
    fn skip_subtree(&mut self, dir: &PathKey) {
        self.pending.retain(|e| !e.path.is_inside(dir));
        self.open.retain(|o| o != dir && !o.is_inside(dir));
        // Every key inside `dir/` sorts below `dir0`.
        let mut bound = dir.trimmed().to_vec();
        bound.push(b'/' + 1);
        if let Ok(bound) = PathKey::parse(bound) {
            self.range = self.files.range(bound..);
        }
    }
}
