//! The collaborator interfaces the status engine consumes.

use vista_ignore::IgnoreEngine;
use vista_types::{EntryDescriptor, ObjectId, PathKey, Scope};

use crate::config::StatusConfig;
use crate::error::SourceResult;

/// A sorted, fallible stream of entries from HEAD or the index.
///
/// Paths must be strictly ascending in byte order.
pub type EntryStream<'a> = Box<dyn Iterator<Item = SourceResult<EntryDescriptor>> + 'a>;

/// A sorted worktree listing that can prune directories.
///
/// Directory markers (keys ending in `/`) come before the directory's
/// contents.
pub trait WorktreeWalk: Iterator<Item = SourceResult<EntryDescriptor>> {
    /// Do not list the contents of `dir`, which must be the directory marker
    /// yielded most recently.
    fn skip_subtree(&mut self, dir: &PathKey);
}

pub type WorktreeStream<'a> = Box<dyn WorktreeWalk + 'a>;

/// The live working directory.
pub trait Worktree: Send + Sync {
    /// List the entries inside `scope` in path order.
    fn walk(&self, scope: &Scope) -> SourceResult<WorktreeStream<'_>>;

    /// Look up a single path without listing its parent. Directories come
    /// back as markers; absent paths as `None`.
    fn entry(&self, path: &PathKey) -> SourceResult<Option<EntryDescriptor>>;

    /// Hash a file's content into the id the object store would give it.
    fn content_id(&self, path: &PathKey) -> SourceResult<ObjectId>;

    /// Add the worktree's per-directory ignore files to `engine`.
    fn load_ignore_files(&self, engine: &mut IgnoreEngine) -> SourceResult<()>;
}

/// A repository as seen by the status engine: three sources plus the
/// inputs needed to build its ignore rules.
pub trait StatusBackend: Send + Sync {
    /// Files of the HEAD tree inside `scope`; empty for an unborn branch.
    fn head_entries(&self, scope: &Scope) -> SourceResult<EntryStream<'_>>;

    /// Staged files inside `scope`.
    fn index_entries(&self, scope: &Scope) -> SourceResult<EntryStream<'_>>;

    fn worktree(&self) -> &dyn Worktree;

    /// Build the full ignore rule set for the repository.
    fn ignore_engine(&self) -> SourceResult<IgnoreEngine>;

    fn config(&self) -> &StatusConfig;
}

/// Adapt an infallible sorted iterator into an [`EntryStream`].
pub fn infallible<'a, I>(entries: I) -> EntryStream<'a>
where
    I: IntoIterator<Item = EntryDescriptor>,
    I::IntoIter: 'a,
{
    Box::new(entries.into_iter().map(Ok))
}
