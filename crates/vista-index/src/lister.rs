use vista_types::{EntryDescriptor, FileTime, Scope};

use crate::entry::IndexEntry;
use crate::index::Index;

/// Sorted stream of index entries restricted to a [`Scope`].
///
/// Entries are yielded in byte order straight from the index map. Racy
/// entries come out without their mtime.
pub struct IndexLister<'a> {
    entries: Box<dyn Iterator<Item = &'a IndexEntry> + 'a>,
    timestamp: Option<FileTime>,
}

impl<'a> IndexLister<'a> {
    pub fn new(index: &'a Index, scope: &Scope) -> Self {
        let entries: Box<dyn Iterator<Item = &'a IndexEntry> + 'a> = match scope {
            Scope::All => Box::new(index.entries.values()),
            Scope::Directory(dir) => {
                let dir = dir.clone();
                Box::new(
                    index
                        .entries
                        .range(dir.clone()..)
                        .map(|(_, e)| e)
                        .take_while(move |e| e.path.is_inside(&dir)),
                )
            }
            Scope::Path(path) => Box::new(index.entries.get(path).into_iter()),
        };
        Self {
            entries,
            timestamp: index.timestamp,
        }
    }
}

impl Iterator for IndexLister<'_> {
    type Item = EntryDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries
            .next()
            .map(|entry| entry.to_descriptor(self.timestamp))
    }
}
