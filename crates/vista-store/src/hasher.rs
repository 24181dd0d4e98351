use vista_types::ObjectId;

/// Hashes raw file content into the id the object store would assign it.
///
/// The worktree uses this to compare a file against the index when stat
/// data alone cannot decide.
pub trait BlobHasher: Send + Sync {
    fn hash_blob(&self, data: &[u8]) -> ObjectId;
}

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher prepends a domain tag so that a blob and a tree with
/// identical bytes never share an id.
#[derive(Clone, Copy, Debug)]
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for blob objects.
    pub const BLOB: Self = Self {
        domain: "vista-blob-v1",
    };
    /// Hasher for tree objects.
    pub const TREE: Self = Self {
        domain: "vista-tree-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }
}

impl BlobHasher for ContentHasher {
    fn hash_blob(&self, data: &[u8]) -> ObjectId {
        self.hash(data)
    }
}
