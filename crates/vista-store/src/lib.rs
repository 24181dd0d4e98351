//! Content-addressed object storage for Vista.
//!
//! Blobs and trees are stored by the domain-separated BLAKE3 hash of their
//! content. Trees keep their entries in git order, which lets
//! [`TreeLister`] turn a committed tree into the byte-ordered entry stream
//! the status scan consumes as its HEAD source.

pub mod error;
pub mod hasher;
pub mod lister;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use hasher::{BlobHasher, ContentHasher};
pub use lister::TreeLister;
pub use memory::InMemoryObjectStore;
pub use object::{Blob, ObjectKind, StoredObject, Tree, TreeEntry};
pub use traits::ObjectStore;
