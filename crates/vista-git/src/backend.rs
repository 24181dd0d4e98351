//! A [`StatusBackend`] over a git repository.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use git2::{ErrorCode, ObjectType, Repository, Tree};
use tracing::debug;
use vista_ignore::{IgnoreEngine, IgnoreLoader};
use vista_index::IndexEntry;
use vista_status::{infallible, EntryStream, SourceResult, StatusBackend, StatusConfig, Worktree};
use vista_types::{
    ContentIdentity, EntryDescriptor, FileTime, PathKey, Scope, StatFingerprint,
};

use crate::config::status_config;
use crate::convert::{file_mode, file_time, object_id, path_key};
use crate::error::{GitError, GitResult};
use crate::worktree::GitWorktree;

const STAGE_MASK: u16 = 0x3000;
const STAGE_SHIFT: u16 = 12;
/// The "ours" side of a conflict.
const STAGE_OURS: u16 = 2;

/// Reads HEAD and the index through libgit2 and the worktree from disk.
///
/// Both listings are materialized when a scan starts, so a scan never holds
/// the repository lock while the reconciler runs.
pub struct GitBackend {
    repo: Mutex<Repository>,
    git_dir: PathBuf,
    worktree: GitWorktree,
    config: StatusConfig,
}

impl GitBackend {
    /// Find the repository containing `path`.
    pub fn discover(path: &Path) -> GitResult<Self> {
        Self::from_repository(Repository::discover(path)?)
    }

    /// Open the repository at exactly `path`.
    pub fn open(path: &Path) -> GitResult<Self> {
        Self::from_repository(Repository::open(path)?)
    }

    /// Wrap an opened repository; bare repositories have no worktree to scan.
    pub fn from_repository(repo: Repository) -> GitResult<Self> {
        let git_dir = repo.path().to_path_buf();
        let root = repo
            .workdir()
            .ok_or_else(|| GitError::BareRepository(git_dir.clone()))?
            .to_path_buf();
        let config = status_config(&repo.config()?);
        debug!(root = %root.display(), ?config, "opened git repository");

        Ok(Self {
            repo: Mutex::new(repo),
            git_dir,
            worktree: GitWorktree::new(root),
            config,
        })
    }

    /// Replace the configuration read from git.
    pub fn with_config(mut self, config: StatusConfig) -> Self {
        self.config = config;
        self
    }

    /// The `.git` directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// The worktree's top-level directory.
    pub fn workdir(&self) -> &Path {
        self.worktree.root()
    }

    fn lock(&self) -> MutexGuard<'_, Repository> {
        self.repo.lock().expect("lock poisoned")
    }

    /// HEAD entries inside `scope`, in path order.
    pub fn list_head(&self, scope: &Scope) -> GitResult<Vec<EntryDescriptor>> {
        let repo = self.lock();
        let tree = match repo.head() {
            Ok(head) => head.peel_to_tree()?,
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                return Ok(Vec::new())
            }
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        match scope {
            Scope::All => collect_tree(&repo, &tree, None, &mut out)?,
            Scope::Directory(dir) => {
                if let Some(entry) = tree_entry(&tree, dir)? {
                    if entry.kind() == Some(ObjectType::Tree) {
                        let subtree = repo.find_tree(entry.id())?;
                        collect_tree(&repo, &subtree, Some(dir), &mut out)?;
                    }
                }
            }
            Scope::Path(path) => {
                if let Some(entry) = tree_entry(&tree, path)? {
                    if entry.kind() == Some(ObjectType::Blob) {
                        if let Some(mode) = file_mode(entry.filemode() as u32)? {
                            let id = object_id(entry.id())?;
                            out.push(EntryDescriptor::new(
                                path.clone(),
                                mode,
                                ContentIdentity::object(id),
                            ));
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    /// Index entries inside `scope`, in path order.
    ///
    /// Conflicted paths appear once, as their "ours" stage when there is
    /// one, with no trusted stat data. Gitlinks are left out.
    pub fn list_index(&self, scope: &Scope) -> GitResult<Vec<EntryDescriptor>> {
        let mut index = self.lock().index()?;
        index.read(false)?;
        let timestamp = self.index_timestamp();

        let mut out: Vec<(u16, EntryDescriptor)> = Vec::new();
        for entry in index.iter() {
            let key = path_key(&entry.path)?;
            if !scope.contains(&key) {
                continue;
            }
            let Some(mode) = file_mode(entry.mode)? else {
                continue;
            };
            let stage = (entry.flags & STAGE_MASK) >> STAGE_SHIFT;
            // Truncated to 32 bits; the worktree side is reduced to match.
            let stat = StatFingerprint {
                size: u64::from(entry.file_size),
                mtime: Some(file_time(entry.mtime)),
            };
            let staged = IndexEntry::new(key, object_id(entry.id)?, mode, stat);
            let mut descriptor = staged.to_descriptor(timestamp);
            if stage != 0 {
                descriptor.identity.stat =
                    descriptor.identity.stat.map(StatFingerprint::without_mtime);
            }

            match out.last_mut() {
                Some((last_stage, last)) if last.path == descriptor.path => {
                    if stage == STAGE_OURS {
                        *last_stage = stage;
                        *last = descriptor;
                    }
                }
                _ => out.push((stage, descriptor)),
            }
        }
        // Case-insensitive repositories keep the index in folded order.
        let mut entries: Vec<EntryDescriptor> = out.into_iter().map(|(_, d)| d).collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Modification time of the index file; entries not older are racy.
    fn index_timestamp(&self) -> Option<FileTime> {
        fs::metadata(self.git_dir.join("index"))
            .and_then(|m| m.modified())
            .ok()
            .map(FileTime::from_system_time)
    }
}

fn tree_entry(tree: &Tree<'_>, key: &PathKey) -> GitResult<Option<git2::TreeEntry<'static>>> {
    match tree.get_path(&key.to_path(Path::new(""))) {
        Ok(entry) => Ok(Some(entry)),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Pre-order walk of `tree`. Git sorts subtrees as `name/`, so the walk
/// yields full paths in byte order.
fn collect_tree(
    repo: &Repository,
    tree: &Tree<'_>,
    prefix: Option<&PathKey>,
    out: &mut Vec<EntryDescriptor>,
) -> GitResult<()> {
    for entry in tree.iter() {
        let key = match prefix {
            Some(dir) => dir.join(entry.name_bytes())?,
            None => path_key(entry.name_bytes())?,
        };
        match entry.kind() {
            Some(ObjectType::Tree) => {
                let subtree = repo.find_tree(entry.id())?;
                collect_tree(repo, &subtree, Some(&key), out)?;
            }
            Some(ObjectType::Blob) => {
                if let Some(mode) = file_mode(entry.filemode() as u32)? {
                    out.push(EntryDescriptor::new(
                        key,
                        mode,
                        ContentIdentity::object(object_id(entry.id())?),
                    ));
                }
            }
            // Submodule commits.
            _ => {}
        }
    }
    Ok(())
}

impl StatusBackend for GitBackend {
    fn head_entries(&self, scope: &Scope) -> SourceResult<EntryStream<'_>> {
        Ok(infallible(self.list_head(scope)?))
    }

    fn index_entries(&self, scope: &Scope) -> SourceResult<EntryStream<'_>> {
        Ok(infallible(self.list_index(scope)?))
    }

    fn worktree(&self) -> &dyn Worktree {
        &self.worktree
    }

    fn ignore_engine(&self) -> SourceResult<IgnoreEngine> {
        let mut engine = IgnoreEngine::new(self.config.ignore_config());
        let loader = IgnoreLoader::new(self.worktree.root());
        if let Some(path) = &self.config.global_excludes {
            loader.load_global(&mut engine, path)?;
        }
        loader.load_repo_exclude(&mut engine, &self.git_dir.join("info").join("exclude"))?;
        self.worktree.load_ignore_files(&mut engine)?;
        Ok(engine)
    }

    fn config(&self) -> &StatusConfig {
        &self.config
    }
}
