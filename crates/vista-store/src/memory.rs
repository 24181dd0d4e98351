use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use vista_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{Blob, StoredObject, Tree};
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Objects live behind a `RwLock` and are
/// cloned on read/write. Reads are counted so callers can observe how much of
/// a tree a lister actually loaded.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
    reads: AtomicUsize,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `read` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Store raw file content and return its blob id.
    pub fn write_blob(&self, data: &[u8]) -> StoreResult<ObjectId> {
        self.write(&Blob::new(data.to_vec()).to_stored_object())
    }

    /// Store a tree and return its id.
    pub fn write_tree(&self, tree: &Tree) -> StoreResult<ObjectId> {
        self.write(&tree.to_stored_object()?)
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        let mut map = self.objects.write().expect("lock poisoned");
        map.entry(id).or_insert_with(|| object.clone());
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.objects.read().expect("lock poisoned").contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ObjectKind, TreeEntry};
    use vista_types::FileMode;

    #[test]
    fn identical_content_is_stored_once() {
        let store = InMemoryObjectStore::new();
        let id1 = store.write_blob(b"identical content").unwrap();
        let id2 = store.write_blob(b"identical content").unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn tree_written_and_read_back() {
        let store = InMemoryObjectStore::new();
        let blob = store.write_blob(b"hi").unwrap();
        let tree = Tree::new(vec![TreeEntry::new(FileMode::Regular, "hello.txt", blob)]);
        let id = store.write_tree(&tree).unwrap();

        let read_back = store.read(&id).unwrap().expect("should exist");
        assert_eq!(read_back.kind, ObjectKind::Tree);
        assert_eq!(Tree::from_stored_object(&read_back).unwrap(), tree);
        assert!(store.exists(&blob).unwrap());
    }

    #[test]
    fn missing_object_reads_as_none_and_counts() {
        let store = InMemoryObjectStore::new();
        assert!(store.read(&ObjectId::from_bytes(b"missing")).unwrap().is_none());
        assert_eq!(store.read_count(), 1);
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryObjectStore::new());
        let id = store.write_blob(b"shared data").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.read(&id).unwrap().map(|o| o.compute_id()))
            })
            .collect();

        for h in handles {
            assert_eq!(h.join().expect("thread should not panic"), Some(id));
        }
        assert_eq!(store.read_count(), 8);
    }
}
