//! Lazy listing of a committed tree as a sorted stream of file entries.

use std::sync::Arc;

use tracing::debug;
use vista_types::{ContentIdentity, EntryDescriptor, FileMode, ObjectId, PathKey, Scope};

use crate::error::{StoreError, StoreResult};
use crate::object::{Tree, TreeEntry};
use crate::traits::ObjectStore;

struct Frame {
    /// Directory key of the tree being walked, `None` at the root.
    prefix: Option<PathKey>,
    entries: std::vec::IntoIter<TreeEntry>,
}

/// Pre-order walk of a tree yielding file entries in path order.
///
/// Subtrees are loaded only when the walk reaches them. Trees are stored in
/// git order, so the yielded paths come out in plain byte order. Directory
/// entries themselves are never yielded.
pub struct TreeLister {
    store: Arc<dyn ObjectStore>,
    stack: Vec<Frame>,
    single: Option<EntryDescriptor>,
}

impl TreeLister {
    /// List the files of `root` that fall inside `scope`.
    ///
    /// A `None` root (unborn branch) lists nothing. The trees leading down
    /// to a scoped directory or path are resolved eagerly.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        root: Option<ObjectId>,
        scope: &Scope,
    ) -> StoreResult<Self> {
        let mut lister = Self {
            store,
            stack: Vec::new(),
            single: None,
        };
        let Some(root) = root else {
            return Ok(lister);
        };
        let tree = lister.load_tree(&root)?;

        match scope {
            Scope::All => lister.stack.push(Frame {
                prefix: None,
                entries: tree.entries.into_iter(),
            }),
            Scope::Directory(dir) => {
                if let Some(subtree) = lister.descend(tree, dir.trimmed())? {
                    lister.stack.push(Frame {
                        prefix: Some(dir.clone()),
                        entries: subtree.entries.into_iter(),
                    });
                }
            }
            Scope::Path(path) => {
                let parent = match path.parent() {
                    Some(parent) => lister.descend(tree, parent.trimmed())?,
                    None => Some(tree),
                };
                lister.single = parent
                    .as_ref()
                    .and_then(|t| segment_entry(t, path.file_name()))
                    .filter(|e| e.mode != FileMode::Directory)
                    .map(|e| {
                        EntryDescriptor::new(
                            path.clone(),
                            e.mode,
                            ContentIdentity::object(e.object_id),
                        )
                    });
            }
        }
        debug!(root = %root.short_hex(), ?scope, "listing tree");
        Ok(lister)
    }

    fn load_tree(&self, id: &ObjectId) -> StoreResult<Tree> {
        let object = self.store.read(id)?.ok_or(StoreError::NotFound(*id))?;
        Tree::from_stored_object(&object)
    }

    /// Follow `dir` segment by segment; `None` if some segment is not a subtree.
    fn descend(&self, mut tree: Tree, dir: &[u8]) -> StoreResult<Option<Tree>> {
        for segment in dir.split(|b| *b == b'/') {
            let next = match segment_entry(&tree, segment) {
                Some(entry) if entry.mode == FileMode::Directory => entry.object_id,
                _ => return Ok(None),
            };
            tree = self.load_tree(&next)?;
        }
        Ok(Some(tree))
    }

    fn step(&mut self) -> StoreResult<Option<EntryDescriptor>> {
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };
            let Some(entry) = frame.entries.next() else {
                self.stack.pop();
                continue;
            };
            let path = match &frame.prefix {
                Some(prefix) => prefix.join(entry.name.as_bytes())?,
                None => PathKey::parse(entry.name.as_bytes())?,
            };
            if entry.mode == FileMode::Directory {
                let subtree = self.load_tree(&entry.object_id)?;
                self.stack.push(Frame {
                    prefix: Some(path.to_dir()),
                    entries: subtree.entries.into_iter(),
                });
                continue;
            }
            return Ok(Some(EntryDescriptor::new(
                path,
                entry.mode,
                ContentIdentity::object(entry.object_id),
            )));
        }
    }
}

fn segment_entry<'t>(tree: &'t Tree, segment: &[u8]) -> Option<&'t TreeEntry> {
    std::str::from_utf8(segment).ok().and_then(|name| tree.get(name))
}

impl Iterator for TreeLister {
    type Item = StoreResult<EntryDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(entry) = self.single.take() {
            return Some(Ok(entry));
        }
        match self.step() {
            Ok(entry) => entry.map(Ok),
            Err(e) => {
                self.stack.clear();
                Some(Err(e))
            }
        }
    }
}

impl std::fmt::Debug for TreeLister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeLister")
            .field("depth", &self.stack.len())
            .finish()
    }
}
