use vista_types::{EntryDescriptor, PathKey};

use crate::error::{SourceError, SourceKind, SourceResult};

/// One-entry lookahead over a sorted source, enforcing strict ordering.
pub(crate) struct Cursor<I> {
    kind: SourceKind,
    source: I,
    current: Option<EntryDescriptor>,
}

impl<I> Cursor<I>
where
    I: Iterator<Item = SourceResult<EntryDescriptor>>,
{
    pub(crate) fn new(kind: SourceKind, mut source: I) -> SourceResult<Self> {
        let current = source.next().transpose()?;
        Ok(Self {
            kind,
            source,
            current,
        })
    }

    pub(crate) fn peek(&self) -> Option<&EntryDescriptor> {
        self.current.as_ref()
    }

    /// Take the current entry and pull the next one.
    pub(crate) fn advance(&mut self) -> SourceResult<Option<EntryDescriptor>> {
        let taken = self.current.take();
        let next = self.source.next().transpose()?;
        if let (Some(prev), Some(next)) = (&taken, &next) {
            if next.path <= prev.path {
                return Err(SourceError::OutOfOrder {
                    source_kind: self.kind,
                    previous: prev.path.clone(),
                    next: next.path.clone(),
                });
            }
        }
        self.current = next;
        Ok(taken)
    }

    /// Take the current entry if it sits at `key`.
    pub(crate) fn take_if_at(&mut self, key: &PathKey) -> SourceResult<Option<EntryDescriptor>> {
        if self.peek().is_some_and(|e| &e.path == key) {
            self.advance()
        } else {
            Ok(None)
        }
    }

    pub(crate) fn source_mut(&mut self) -> &mut I {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_types::{ContentIdentity, FileMode};

    fn entries(paths: &[&str]) -> Vec<SourceResult<EntryDescriptor>> {
        paths
            .iter()
            .map(|p| {
                Ok(EntryDescriptor::new(
                    PathKey::parse(p).unwrap(),
                    FileMode::Regular,
                    ContentIdentity::default(),
                ))
            })
            .collect()
    }

    #[test]
    fn advances_through_sorted_entries() {
        let mut cursor = Cursor::new(SourceKind::Index, entries(&["a", "b"]).into_iter()).unwrap();
        assert_eq!(cursor.peek().unwrap().path.to_string(), "a");
        assert_eq!(cursor.advance().unwrap().unwrap().path.to_string(), "a");
        assert_eq!(cursor.advance().unwrap().unwrap().path.to_string(), "b");
        assert!(cursor.peek().is_none());
        assert!(cursor.advance().unwrap().is_none());
    }

    #[test]
    fn duplicate_or_descending_keys_are_rejected() {
        let mut cursor = Cursor::new(SourceKind::Head, entries(&["b", "a"]).into_iter()).unwrap();
        let err = cursor.advance().unwrap_err();
        assert!(matches!(
            err,
            SourceError::OutOfOrder { source_kind: SourceKind::Head, .. }
        ));

        let mut cursor = Cursor::new(SourceKind::Head, entries(&["a", "a"]).into_iter()).unwrap();
        assert!(cursor.advance().is_err());
    }
}
