//! Fixtures shared by the unit tests.

use std::sync::Arc;

use vista_store::InMemoryObjectStore;
use vista_types::{PathKey, StatusFlags};

use crate::backend::NativeBackend;
use crate::dispatch::collect;
use crate::options::StatusOptions;
use crate::source::StatusBackend;
use crate::worktree::{MemoryFile, MemoryWorktree};

pub(crate) type TestBackend = NativeBackend<MemoryWorktree>;

pub(crate) fn key(s: &str) -> PathKey {
    PathKey::parse(s).unwrap()
}

pub(crate) fn backend() -> TestBackend {
    NativeBackend::new(Arc::new(InMemoryObjectStore::new()), MemoryWorktree::new())
}

/// Stage `data` at `path` and put the identical file in the worktree.
pub(crate) fn track(b: &mut TestBackend, path: &str, data: &str) {
    stage(b, path, data);
    write(b, path, data);
}

/// Stage `data` at `path` without touching the worktree.
pub(crate) fn stage(b: &mut TestBackend, path: &str, data: &str) {
    let file = MemoryFile::new(data);
    b.index_mut()
        .stage_file(&key(path), data.as_bytes(), file.mode, file.stat())
        .unwrap();
}

/// Write an untracked (or overwrite a tracked) worktree file.
pub(crate) fn write(b: &mut TestBackend, path: &str, data: &str) {
    b.worktree_mut().insert(&key(path), data);
}

pub(crate) fn scan<B: StatusBackend>(b: &B, options: &StatusOptions) -> Vec<(String, StatusFlags)> {
    let engine = b.ignore_engine().unwrap();
    collect(b, &engine, options)
        .unwrap()
        .into_iter()
        .map(|e| (e.path.to_string(), e.flags))
        .collect()
}

pub(crate) fn entries(list: &[(&str, StatusFlags)]) -> Vec<(String, StatusFlags)> {
    list.iter().map(|(p, f)| (p.to_string(), *f)).collect()
}
