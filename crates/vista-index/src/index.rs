//! The core Index structure managing staged entries in memory.
//!
//! The [`Index`] manages a `BTreeMap<PathKey, IndexEntry>` as the staging
//! area. Keys order byte-wise, so iterating the map already yields the
//! sorted stream the status scan needs. Filesystem I/O (walking directories,
//! reading files) is the responsibility of the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;
use vista_store::{Blob, ObjectStore, Tree, TreeEntry, TreeLister};
use vista_types::{FileMode, FileTime, ObjectId, PathKey, Scope, StatFingerprint};

use crate::entry::IndexEntry;
use crate::error::{IndexError, IndexResult};
use crate::lister::IndexLister;

/// The staging index: what would be committed next.
///
/// The `store` is used for writing blobs when staging content and for
/// reading and writing tree objects.
pub struct Index {
    /// All tracked entries, keyed by path.
    pub entries: BTreeMap<PathKey, IndexEntry>,
    /// When the index was last written; entries not older than this are racy.
    pub timestamp: Option<FileTime>,
    /// Cached tree ObjectId for the current staged state (invalidated on changes).
    pub tree_cache: Option<ObjectId>,
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("entries", &self.entries.len())
            .field("timestamp", &self.timestamp)
            .field("tree_cache", &self.tree_cache)
            .finish()
    }
}

impl Index {
    /// Create a new empty index backed by the given store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            entries: BTreeMap::new(),
            timestamp: None,
            tree_cache: None,
            store,
        }
    }

    /// The backing object store.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &PathKey) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// Record the time the index was written.
    pub fn set_timestamp(&mut self, timestamp: FileTime) {
        self.timestamp = Some(timestamp);
    }

    // ---------------------------------------------------------------
    // Stage operations
    // ---------------------------------------------------------------

    /// Stage file content: the blob is written to the store and an entry
    /// with the given worktree stat data is recorded.
    pub fn stage_file(
        &mut self,
        path: &PathKey,
        content: &[u8],
        mode: FileMode,
        stat: StatFingerprint,
    ) -> IndexResult<ObjectId> {
        let object_id = self.store.write(&Blob::new(content.to_vec()).to_stored_object())?;
        self.stage_object(path, object_id, mode, stat)?;
        Ok(object_id)
    }

    /// Stage an already-stored object.
    pub fn stage_object(
        &mut self,
        path: &PathKey,
        object_id: ObjectId,
        mode: FileMode,
        stat: StatFingerprint,
    ) -> IndexResult<()> {
        if path.is_dir() || mode == FileMode::Directory {
            return Err(IndexError::DirectoryPath(path.clone()));
        }
        let entry = IndexEntry::new(path.clone(), object_id, mode, stat);
        self.entries.insert(path.clone(), entry);
        self.tree_cache = None;
        Ok(())
    }

    /// Remove an entry from the index entirely.
    pub fn remove(&mut self, path: &PathKey) -> IndexResult<IndexEntry> {
        self.tree_cache = None;
        self.entries
            .remove(path)
            .ok_or_else(|| IndexError::PathNotFound(path.clone()))
    }

    /// Sorted stream of the entries inside `scope`.
    pub fn lister(&self, scope: &Scope) -> IndexLister<'_> {
        IndexLister::new(self, scope)
    }

    // ---------------------------------------------------------------
    // Tree building
    // ---------------------------------------------------------------

    /// Build nested trees from all entries and return the root tree id.
    pub fn write_tree(&mut self) -> IndexResult<ObjectId> {
        let entries: Vec<&IndexEntry> = self.entries.values().collect();
        let tree_id = self.build_tree(&entries, 0)?;
        debug!(entries = entries.len(), tree = %tree_id.short_hex(), "wrote index tree");
        self.tree_cache = Some(tree_id);
        Ok(tree_id)
    }

    /// `entries` are sorted and all share the first `prefix_len` bytes.
    fn build_tree(&self, entries: &[&IndexEntry], prefix_len: usize) -> IndexResult<ObjectId> {
        let mut tree_entries = Vec::new();
        let mut i = 0;
        while i < entries.len() {
            let rel = &entries[i].path.as_bytes()[prefix_len..];
            match rel.iter().position(|b| *b == b'/') {
                Some(slash) => {
                    let dir = &rel[..=slash];
                    let run = entries[i..]
                        .iter()
                        .take_while(|e| e.path.as_bytes()[prefix_len..].starts_with(dir))
                        .count();
                    let subtree = self.build_tree(&entries[i..i + run], prefix_len + dir.len())?;
                    tree_entries.push(TreeEntry::new(
                        FileMode::Directory,
                        segment_name(&rel[..slash])?,
                        subtree,
                    ));
                    i += run;
                }
                None => {
                    let entry = entries[i];
                    tree_entries.push(TreeEntry::new(entry.mode, segment_name(rel)?, entry.object_id));
                    i += 1;
                }
            }
        }
        let tree = Tree::new(tree_entries);
        Ok(self.store.write(&tree.to_stored_object()?)?)
    }

    /// Replace the index contents with the files of an existing tree.
    ///
    /// Sizes are taken from the blobs; mtimes are unknown, so the first
    /// status scan compares content for files of matching size.
    pub fn read_tree(&mut self, tree_id: &ObjectId) -> IndexResult<()> {
        let mut entries = BTreeMap::new();
        for descriptor in TreeLister::new(Arc::clone(&self.store), Some(*tree_id), &Scope::All)? {
            let descriptor = descriptor?;
            let object_id = descriptor
                .identity
                .oid
                .ok_or_else(|| IndexError::PathNotFound(descriptor.path.clone()))?;
            let blob = self
                .store
                .read(&object_id)?
                .ok_or(IndexError::ObjectNotFound(object_id))?;
            let size = Blob::from_stored_object(&blob)?.data.len() as u64;
            let stat = StatFingerprint { size, mtime: None };
            entries.insert(
                descriptor.path.clone(),
                IndexEntry::new(descriptor.path, object_id, descriptor.mode, stat),
            );
        }

        self.entries = entries;
        self.tree_cache = Some(*tree_id);
        Ok(())
    }
}

fn segment_name(segment: &[u8]) -> IndexResult<String> {
    std::str::from_utf8(segment)
        .map(str::to_owned)
        .map_err(|_| {
            IndexError::InvalidPath(vista_types::TypeError::InvalidPath {
                path: String::from_utf8_lossy(segment).into_owned(),
                reason: "tree entry names must be UTF-8",
            })
        })
}
