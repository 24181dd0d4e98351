//! A backend over a `vista-store` object store and a `vista-index` index.

use std::sync::Arc;

use tracing::debug;
use vista_ignore::{read_rules_file, IgnoreEngine};
use vista_index::Index;
use vista_store::{ObjectStore, TreeLister};
use vista_types::{ObjectId, Scope};

use crate::config::StatusConfig;
use crate::error::{SourceError, SourceResult};
use crate::source::{EntryStream, StatusBackend, Worktree};
use crate::worktree::MemoryWorktree;

/// Label given to the repository exclude layer.
pub const REPO_EXCLUDE_LABEL: &str = "info/exclude";

/// HEAD is a tree in the object store, the index is an in-memory
/// [`Index`] over the same store, and the worktree is any adapter.
pub struct NativeBackend<W = MemoryWorktree> {
    store: Arc<dyn ObjectStore>,
    head: Option<ObjectId>,
    index: Index,
    worktree: W,
    config: StatusConfig,
    global_excludes: Option<(String, Vec<u8>)>,
    repo_exclude: Option<Vec<u8>>,
}

impl<W: Worktree> NativeBackend<W> {
    /// A backend with an unborn HEAD and an empty index.
    pub fn new(store: Arc<dyn ObjectStore>, worktree: W) -> Self {
        Self {
            index: Index::new(Arc::clone(&store)),
            store,
            head: None,
            worktree,
            config: StatusConfig::default(),
            global_excludes: None,
            repo_exclude: None,
        }
    }

    /// Replace the default configuration.
    pub fn with_config(mut self, config: StatusConfig) -> Self {
        self.config = config;
        self
    }

    /// Use the tree `head` as the HEAD snapshot.
    pub fn with_head(mut self, head: Option<ObjectId>) -> Self {
        self.head = head;
        self
    }

    /// Global excludes given as text; takes precedence over the file named
    /// in the configuration.
    pub fn with_global_excludes(mut self, label: &str, text: impl Into<Vec<u8>>) -> Self {
        self.global_excludes = Some((label.to_string(), text.into()));
        self
    }

    pub fn with_repo_exclude(mut self, text: impl Into<Vec<u8>>) -> Self {
        self.repo_exclude = Some(text.into());
        self
    }

    /// The object store HEAD trees are read from.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn head(&self) -> Option<ObjectId> {
        self.head
    }

    pub fn set_head(&mut self, head: Option<ObjectId>) {
        self.head = head;
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut Index {
        &mut self.index
    }

    /// The concrete worktree, for callers that need more than [`Worktree`].
    pub fn worktree_ref(&self) -> &W {
        &self.worktree
    }

    pub fn worktree_mut(&mut self) -> &mut W {
        &mut self.worktree
    }

    /// Write the index as a tree and make it HEAD.
    pub fn commit_index(&mut self) -> SourceResult<ObjectId> {
        let tree = self.index.write_tree()?;
        self.head = Some(tree);
        debug!(tree = %tree, entries = self.index.len(), "index committed as HEAD");
        Ok(tree)
    }
}

impl<W: Worktree> StatusBackend for NativeBackend<W> {
    fn head_entries(&self, scope: &Scope) -> SourceResult<EntryStream<'_>> {
        let lister = TreeLister::new(Arc::clone(&self.store), self.head, scope)?;
        Ok(Box::new(lister.map(|entry| entry.map_err(SourceError::from))))
    }

    fn index_entries(&self, scope: &Scope) -> SourceResult<EntryStream<'_>> {
        Ok(Box::new(self.index.lister(scope).map(Ok)))
    }

    fn worktree(&self) -> &dyn Worktree {
        &self.worktree
    }

    fn ignore_engine(&self) -> SourceResult<IgnoreEngine> {
        let mut engine = IgnoreEngine::new(self.config.ignore_config());

        match (&self.global_excludes, &self.config.global_excludes) {
            (Some((label, text)), _) => {
                engine.add_global(text, label);
            }
            (None, Some(path)) => {
                if let Some(text) = read_rules_file(path)? {
                    engine.add_global(&text, &path.display().to_string());
                }
            }
            (None, None) => {}
        }
        if let Some(text) = &self.repo_exclude {
            engine.add_repo_exclude(text, REPO_EXCLUDE_LABEL);
        }
        self.worktree.load_ignore_files(&mut engine)?;

        debug!(
            rules = engine.rule_count(),
            malformed = engine.diagnostics().len(),
            "ignore rules built"
        );
        Ok(engine)
    }

    fn config(&self) -> &StatusConfig {
        &self.config
    }
}
