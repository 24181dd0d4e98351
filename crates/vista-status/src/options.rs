use vista_types::Scope;

use crate::config::{StatusConfig, UntrackedMode};

/// Which comparisons a scan performs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Show {
    /// HEAD vs index and index vs worktree.
    #[default]
    IndexAndWorktree,
    /// HEAD vs index only; the worktree is not read.
    IndexOnly,
    /// Index vs worktree only; HEAD is not read.
    WorktreeOnly,
}

impl Show {
    pub fn reads_head(self) -> bool {
        self != Self::WorktreeOnly
    }

    pub fn reads_worktree(self) -> bool {
        self != Self::IndexOnly
    }
}

/// Per-call scan options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusOptions {
    pub show: Show,
    /// Report untracked paths (`WT_NEW`).
    pub include_untracked: bool,
    /// Report ignored paths (`IGNORED`).
    pub include_ignored: bool,
    /// Report `CURRENT` paths too.
    pub include_unmodified: bool,
    /// List the files of untracked directories instead of reporting `dir/`.
    pub recurse_untracked_dirs: bool,
    /// List the files of ignored directories instead of reporting `dir/`.
    pub recurse_ignored_dirs: bool,
    pub scope: Scope,
    /// Extra ignore rules for this call only; they outrank every file.
    pub ignore_overrides: Vec<String>,
}

impl Default for StatusOptions {
    fn default() -> Self {
        Self {
            show: Show::default(),
            include_untracked: true,
            include_ignored: true,
            include_unmodified: false,
            recurse_untracked_dirs: true,
            recurse_ignored_dirs: false,
            scope: Scope::All,
            ignore_overrides: Vec::new(),
        }
    }
}

impl StatusOptions {
    /// Defaults adjusted by repository configuration.
    pub fn from_config(config: &StatusConfig) -> Self {
        Self {
            include_untracked: config.untracked != UntrackedMode::No,
            recurse_untracked_dirs: config.untracked == UntrackedMode::All,
            include_ignored: config.show_ignored,
            ..Self::default()
        }
    }

    /// Options for a single-path lookup: every category is reported.
    pub fn single_path(&self, scope: Scope) -> Self {
        Self {
            include_untracked: true,
            include_ignored: true,
            include_unmodified: true,
            scope,
            ..self.clone()
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_show(mut self, show: Show) -> Self {
        self.show = show;
        self
    }
}
