//! Collected scan results.

use serde::{Deserialize, Serialize};
use vista_types::{PathKey, StatusFlags};

/// One reported path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub path: PathKey,
    pub flags: StatusFlags,
}

/// Counts by category. A path with both staged and unstaged changes is
/// counted in both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub staged: usize,
    pub unstaged: usize,
    pub untracked: usize,
    pub ignored: usize,
}

impl StatusSummary {
    pub fn is_clean(&self) -> bool {
        self.staged == 0 && self.unstaged == 0 && self.untracked == 0
    }
}

/// An ordered snapshot of one scan.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusList {
    entries: Vec<StatusEntry>,
}

impl StatusList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a path; entries are sorted so this is a binary search.
    pub fn get(&self, path: &PathKey) -> Option<StatusFlags> {
        self.entries
            .binary_search_by(|e| e.path.cmp(path))
            .ok()
            .map(|i| self.entries[i].flags)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StatusEntry> {
        self.entries.iter()
    }

    pub fn summary(&self) -> StatusSummary {
        let mut summary = StatusSummary::default();
        for entry in &self.entries {
            let flags = entry.flags;
            if flags.is_index_change() {
                summary.staged += 1;
            }
            if flags.is_worktree_change() {
                summary.unstaged += 1;
            }
            if flags.contains(StatusFlags::WT_NEW) {
                summary.untracked += 1;
            }
            if flags.contains(StatusFlags::IGNORED) {
                summary.ignored += 1;
            }
        }
        summary
    }

    pub(crate) fn push(&mut self, path: PathKey, flags: StatusFlags) {
        self.entries.push(StatusEntry { path, flags });
    }
}

impl<'a> IntoIterator for &'a StatusList {
    type Item = &'a StatusEntry;
    type IntoIter = std::slice::Iter<'a, StatusEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for StatusList {
    type Item = StatusEntry;
    type IntoIter = std::vec::IntoIter<StatusEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
