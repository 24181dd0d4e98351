//! Point lookups: one path's status and ignore decision.

use tracing::debug;
use vista_ignore::IgnoreEngine;
use vista_types::{EntryDescriptor, PathKey, Scope, StatusFlags};

use crate::error::{SourceResult, StatusError, StatusResult};
use crate::options::StatusOptions;
use crate::reconcile::Reconciler;
use crate::source::StatusBackend;

/// The flags a full scan would report for `path`.
///
/// The scan is restricted to the single path, with every category
/// included, and runs through the same reconciler as bulk enumeration.
/// Unchanged paths come back as `CURRENT`.
///
/// Directories, including tracked ones deleted from the worktree, are
/// rejected with [`StatusError::InvalidPath`]; a path
/// absent from HEAD, the index, and the worktree yields
/// [`StatusError::NotFound`].
pub fn status_of<B>(
    backend: &B,
    ignores: &IgnoreEngine,
    options: &StatusOptions,
    path: &str,
) -> StatusResult<StatusFlags>
where
    B: StatusBackend + ?Sized,
{
    let key = PathKey::parse(path)?;
    if key.is_dir() {
        return Err(names_directory(path));
    }

    let adapter = |source| StatusError::AdapterFailure {
        reported: 0,
        source,
    };
    let options = options.single_path(Scope::path(&key));
    let mut reconciler = Reconciler::new(backend, ignores, &options).map_err(adapter)?;
    match reconciler.next() {
        Some(Ok((found, flags))) if found == key => return Ok(flags),
        Some(Ok(_)) | None => {}
        Some(Err(source)) => return Err(adapter(source)),
    }

    // Nothing tracked under this name; a directory here is a caller error,
    // including one that only survives in HEAD or the index.
    let found = backend.worktree().entry(&key).map_err(adapter)?;
    if found.as_ref().is_some_and(EntryDescriptor::is_directory)
        || tracked_below(backend, &key).map_err(adapter)?
    {
        return Err(names_directory(path));
    }
    debug!(path = %key, "path absent from every source");
    Err(StatusError::NotFound(key))
}

/// Whether HEAD or the index hold entries inside `dir`.
fn tracked_below<B>(backend: &B, dir: &PathKey) -> SourceResult<bool>
where
    B: StatusBackend + ?Sized,
{
    let scope = Scope::directory(dir);
    if backend.index_entries(&scope)?.next().transpose()?.is_some() {
        return Ok(true);
    }
    Ok(backend.head_entries(&scope)?.next().transpose()?.is_some())
}

/// Whether `path` is excluded by `ignores`, whether or not it exists.
///
/// A trailing `/` marks the path as a directory; otherwise the worktree is
/// asked, and a path that cannot be inspected is treated as a file.
pub fn should_ignore<B>(backend: &B, ignores: &IgnoreEngine, path: &str) -> StatusResult<bool>
where
    B: StatusBackend + ?Sized,
{
    let key = PathKey::parse(path)?;
    Ok(ignores.is_ignored(&key, is_directory(backend, &key)))
}

pub(crate) fn is_directory<B>(backend: &B, key: &PathKey) -> bool
where
    B: StatusBackend + ?Sized,
{
    key.is_dir()
        || backend
            .worktree()
            .entry(key)
            .ok()
            .flatten()
            .is_some_and(|e| e.is_directory())
}

fn names_directory(path: &str) -> StatusError {
    StatusError::InvalidPath {
        path: path.to_string(),
        reason: "names a directory".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{backend, scan, stage, track, write, TestBackend};
    use proptest::prelude::*;

    fn lookup(b: &TestBackend, path: &str) -> StatusResult<StatusFlags> {
        let engine = b.ignore_engine().unwrap();
        status_of(b, &engine, &StatusOptions::default(), path)
    }

    fn ignored(b: &TestBackend, path: &str) -> bool {
        let engine = b.ignore_engine().unwrap();
        should_ignore(b, &engine, path).unwrap()
    }

    fn sample() -> TestBackend {
        let mut b = backend();
        track(&mut b, ".gitignore", "*.log\nbuild/\n");
        track(&mut b, "src/lib.rs", "lib");
        track(&mut b, "src/main.rs", "main");
        b.commit_index().unwrap();
        write(&mut b, "src/main.rs", "fn main() {}");
        write(&mut b, "notes.md", "n");
        write(&mut b, "debug.log", "d");
        write(&mut b, "build/out.o", "o");
        b
    }

    #[test]
    fn reports_each_category() {
        let b = sample();
        assert_eq!(lookup(&b, "src/lib.rs").unwrap(), StatusFlags::CURRENT);
        assert_eq!(lookup(&b, "src/main.rs").unwrap(), StatusFlags::WT_MODIFIED);
        assert_eq!(lookup(&b, "notes.md").unwrap(), StatusFlags::WT_NEW);
        assert_eq!(lookup(&b, "debug.log").unwrap(), StatusFlags::IGNORED);
        assert_eq!(lookup(&b, "build/out.o").unwrap(), StatusFlags::IGNORED);
        assert_eq!(lookup(&b, "./src//lib.rs").unwrap(), StatusFlags::CURRENT);
    }

    #[test]
    fn directories_are_invalid() {
        let b = sample();
        for path in ["src/", "src", "build"] {
            assert!(
                matches!(lookup(&b, path), Err(StatusError::InvalidPath { .. })),
                "{path}"
            );
        }
        assert!(matches!(lookup(&b, "../x"), Err(StatusError::InvalidPath { .. })));
    }

    #[test]
    fn tracked_directory_missing_from_worktree_is_invalid() {
        let mut b = sample();
        b.worktree_mut().remove(&PathKey::parse("src/lib.rs").unwrap());
        b.worktree_mut().remove(&PathKey::parse("src/main.rs").unwrap());
        assert!(matches!(lookup(&b, "src"), Err(StatusError::InvalidPath { .. })));

        // Only HEAD still knows the directory.
        b.index_mut().remove(&PathKey::parse("src/lib.rs").unwrap()).unwrap();
        b.index_mut().remove(&PathKey::parse("src/main.rs").unwrap()).unwrap();
        assert!(matches!(lookup(&b, "src"), Err(StatusError::InvalidPath { .. })));

        // Only the index knows it.
        stage(&mut b, "staged/x", "x");
        assert!(matches!(lookup(&b, "staged"), Err(StatusError::InvalidPath { .. })));
    }

    #[test]
    fn absent_path_is_not_found() {
        let b = sample();
        match lookup(&b, "missing.txt") {
            Err(StatusError::NotFound(path)) => assert_eq!(path.to_string(), "missing.txt"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn staged_but_deleted_file_is_found() {
        let mut b = sample();
        stage(&mut b, "only-staged", "s");
        assert_eq!(
            lookup(&b, "only-staged").unwrap(),
            StatusFlags::INDEX_NEW | StatusFlags::WT_DELETED
        );
    }

    #[test]
    fn negated_file_inside_ignored_directory() {
        let mut b = backend();
        track(&mut b, ".gitignore", "build/\n!build/keep.txt\n");
        assert!(!ignored(&b, "build/keep.txt"));
        assert!(ignored(&b, "build/other.txt"));
        assert!(ignored(&b, "build/"));
        // Nothing named `build` exists, so without the slash it is a file.
        assert!(!ignored(&b, "build"));

        write(&mut b, "build/x", "x");
        assert!(ignored(&b, "build"));
    }

    #[test]
    fn should_ignore_rejects_malformed_paths() {
        let b = backend();
        let engine = b.ignore_engine().unwrap();
        assert!(matches!(
            should_ignore(&b, &engine, ""),
            Err(StatusError::InvalidPath { .. })
        ));
    }

    const POOL: [&str; 8] = ["a.txt", "a/b", "a/c.log", "b0", "d/e/f", "d/g.log", "h.log", "z"];

    /// Build a repository where each pool path is in one of eight states.
    fn repository(states: &[u8]) -> TestBackend {
        let mut b = backend().with_repo_exclude("*.log\n");
        for (path, state) in POOL.iter().zip(states) {
            if matches!(state, 1 | 2 | 3 | 5 | 7) {
                track(&mut b, path, path);
            }
        }
        b.commit_index().unwrap();
        for (path, state) in POOL.iter().zip(states) {
            match state {
                2 => write(&mut b, path, "modified in the worktree"),
                3 => {
                    b.worktree_mut().remove(&PathKey::parse(path).unwrap());
                }
                4 => track(&mut b, path, "new"),
                5 => track(&mut b, path, "staged edit"),
                6 => write(&mut b, path, "untracked"),
                7 => {
                    b.index_mut().remove(&PathKey::parse(path).unwrap()).unwrap();
                }
                _ => {}
            }
        }
        b
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn single_lookup_matches_bulk_scan(states in proptest::collection::vec(0u8..8, POOL.len())) {
            let b = repository(&states);
            let bulk = scan(&b, &StatusOptions::default());
            for (path, flags) in &bulk {
                prop_assert!(!path.ends_with('/'));
                prop_assert_eq!(lookup(&b, path).unwrap(), *flags);
            }
            for (path, state) in POOL.iter().zip(&states) {
                let listed = bulk.iter().any(|(p, _)| p == path);
                match state {
                    0 => prop_assert!(matches!(lookup(&b, path), Err(StatusError::NotFound(_)))),
                    1 => prop_assert_eq!(lookup(&b, path).unwrap(), StatusFlags::CURRENT),
                    _ => prop_assert!(listed, "{} in state {} not listed", path, state),
                }
            }
        }

        #[test]
        fn bulk_scan_is_idempotent(states in proptest::collection::vec(0u8..8, POOL.len())) {
            let b = repository(&states);
            let options = StatusOptions::default();
            prop_assert_eq!(scan(&b, &options), scan(&b, &options));
        }
    }
}
