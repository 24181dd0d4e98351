//! Reading ignore files from disk into an [`IgnoreEngine`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;
use vista_types::PathKey;
use walkdir::WalkDir;

use crate::engine::IgnoreEngine;
use crate::error::{IgnoreError, IgnoreResult};

/// Read an ignore file; a missing file is not an error.
pub fn read_rules_file(path: &Path) -> IgnoreResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(IgnoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Loads the per-directory ignore files of a worktree.
#[derive(Clone, Debug)]
pub struct IgnoreLoader {
    root: PathBuf,
}

impl IgnoreLoader {
    /// A loader for the worktree at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Add a global excludes file, if it exists.
    pub fn load_global(&self, engine: &mut IgnoreEngine, path: &Path) -> IgnoreResult<usize> {
        Ok(match read_rules_file(path)? {
            Some(text) => engine.add_global(&text, &path.display().to_string()),
            None => 0,
        })
    }

    /// Add a repository exclude file, if it exists.
    pub fn load_repo_exclude(&self, engine: &mut IgnoreEngine, path: &Path) -> IgnoreResult<usize> {
        let label = path
            .strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string();
        Ok(match read_rules_file(path)? {
            Some(text) => engine.add_repo_exclude(&text, &label),
            None => 0,
        })
    }

    /// Add the ignore file of one directory (`None` for the root).
    pub fn load_directory(&self, engine: &mut IgnoreEngine, dir: Option<&PathKey>) -> IgnoreResult<usize> {
        let dir_path = match dir {
            Some(dir) => dir.to_path(&self.root),
            None => self.root.clone(),
        };
        let file = dir_path.join(&engine.config().file_name);
        Ok(match read_rules_file(&file)? {
            Some(text) => engine.add_directory(dir, &text),
            None => 0,
        })
    }

    /// Walk the worktree and add every directory's ignore file.
    ///
    /// Directories are visited parents first, so a directory excluded by
    /// its parent's rules is never entered and its own ignore file is not
    /// read. `.git` is never entered.
    pub fn load_tree(&self, engine: &mut IgnoreEngine) -> IgnoreResult<usize> {
        let mut loaded = self.load_directory(engine, None)?;
        let mut dirs = 0usize;

        let mut walker = WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();
        while let Some(entry) = walker.next() {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if entry.file_name() == ".git" {
                walker.skip_current_dir();
                continue;
            }
            let rel = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            let key = PathKey::from_relative_path(rel)?.to_dir();
            if engine.is_ignored(&key, true) {
                debug!(dir = %key, "not reading ignore files under excluded directory");
                walker.skip_current_dir();
                continue;
            }
            dirs += 1;
            loaded += self.load_directory(engine, Some(&key))?;
        }

        debug!(root = %self.root.display(), dirs, rules = loaded, "loaded nested ignore files");
        Ok(loaded)
    }
}
