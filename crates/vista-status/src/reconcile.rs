//! The ordered three-way merge of HEAD, index, and worktree.

use tracing::debug;
use vista_ignore::IgnoreEngine;
use vista_types::{EntryDescriptor, PathKey, Sameness, Scope, StatusFlags};

use crate::cursor::Cursor;
use crate::error::{SourceKind, SourceResult};
use crate::options::StatusOptions;
use crate::source::{EntryStream, StatusBackend, Worktree, WorktreeStream};

/// Counters describing one scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Distinct file paths classified.
    pub paths: usize,
    /// Directories whose contents were never listed.
    pub skipped_dirs: usize,
    /// Files whose content had to be hashed.
    pub content_checks: usize,
}

/// What an untracked directory holds below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Contents {
    /// At least one file that is not ignored.
    Untracked,
    /// Only ignored files or ignored subdirectories.
    Ignored,
    Empty,
}

/// Lazy, single-pass stream of `(path, flags)` in ascending path order.
///
/// Each step takes the smallest key among the three cursors and advances
/// only the cursors sitting at that key. `CURRENT` paths are dropped
/// unless `include_unmodified` is set. The first source error ends the
/// stream.
pub struct Reconciler<'a> {
    head: Option<Cursor<EntryStream<'a>>>,
    index: Cursor<EntryStream<'a>>,
    worktree: Option<Cursor<WorktreeStream<'a>>>,
    content: &'a dyn Worktree,
    ignores: &'a IgnoreEngine,
    options: StatusOptions,
    honor_file_mode: bool,
    stats: ScanStats,
    done: bool,
}

impl<'a> Reconciler<'a> {
    /// Open the sources `options` asks for, restricted to its scope, and
    /// read the first entry of each.
    pub fn new<B>(
        backend: &'a B,
        ignores: &'a IgnoreEngine,
        options: &StatusOptions,
    ) -> SourceResult<Self>
    where
        B: StatusBackend + ?Sized,
    {
        let scope = &options.scope;
        let head = if options.show.reads_head() {
            Some(Cursor::new(SourceKind::Head, backend.head_entries(scope)?)?)
        } else {
            None
        };
        let index = Cursor::new(SourceKind::Index, backend.index_entries(scope)?)?;
        let worktree = if options.show.reads_worktree() {
            Some(Cursor::new(SourceKind::Worktree, backend.worktree().walk(scope)?)?)
        } else {
            None
        };

        Ok(Self {
            head,
            index,
            worktree,
            content: backend.worktree(),
            ignores,
            options: options.clone(),
            honor_file_mode: backend.config().honor_file_mode,
            stats: ScanStats::default(),
            done: false,
        })
    }

    /// Counters for the entries consumed so far.
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    fn min_key(&self) -> Option<PathKey> {
        let head = self.head.as_ref().and_then(Cursor::peek);
        let index = self.index.peek();
        let worktree = self.worktree.as_ref().and_then(Cursor::peek);
        [head, index, worktree]
            .into_iter()
            .flatten()
            .map(|e| &e.path)
            .min()
            .cloned()
    }

    fn worktree_at(&self, key: &PathKey) -> Option<&EntryDescriptor> {
        self.worktree
            .as_ref()
            .and_then(Cursor::peek)
            .filter(|e| &e.path == key)
    }

    fn step(&mut self) -> SourceResult<Option<(PathKey, StatusFlags)>> {
        loop {
            let Some(key) = self.min_key() else {
                debug!(
                    paths = self.stats.paths,
                    skipped_dirs = self.stats.skipped_dirs,
                    content_checks = self.stats.content_checks,
                    "status scan complete"
                );
                return Ok(None);
            };

            if self.worktree_at(&key).is_some_and(EntryDescriptor::is_directory) {
                if let Some(entry) = self.directory(key)? {
                    return Ok(Some(entry));
                }
                continue;
            }

            let head = match &mut self.head {
                Some(cursor) => cursor.take_if_at(&key)?,
                None => None,
            };
            let index = self.index.take_if_at(&key)?;
            let worktree = match &mut self.worktree {
                Some(cursor) => cursor.take_if_at(&key)?,
                None => None,
            };
            self.stats.paths += 1;

            if let Some(flags) =
                self.classify(&key, head.as_ref(), index.as_ref(), worktree.as_ref())?
            {
                return Ok(Some((key, flags)));
            }
        }
    }

    /// Handle a worktree directory marker at `dir`.
    fn directory(&mut self, dir: PathKey) -> SourceResult<Option<(PathKey, StatusFlags)>> {
        let tracked = self
            .head
            .as_ref()
            .and_then(Cursor::peek)
            .is_some_and(|e| e.path.is_inside(&dir))
            || self.index.peek().is_some_and(|e| e.path.is_inside(&dir));

        let opts = &self.options;
        let ignored = (
            opts.include_ignored && opts.recurse_ignored_dirs,
            opts.include_ignored.then_some(StatusFlags::IGNORED),
        );
        let (descend, report) = if tracked {
            (true, None)
        } else if self.ignores.is_ignored(&dir, true) {
            ignored
        } else if opts.include_untracked && opts.recurse_untracked_dirs {
            (true, None)
        } else if opts.include_untracked {
            match self.contents(&dir)? {
                Contents::Untracked => (false, Some(StatusFlags::WT_NEW)),
                Contents::Ignored => ignored,
                Contents::Empty => (false, None),
            }
        } else {
            // Untracked files are not wanted, but ignored ones below may be.
            (opts.include_ignored, None)
        };

        let Some(cursor) = self.worktree.as_mut() else {
            return Ok(None);
        };
        if descend {
            cursor.advance()?;
            return Ok(None);
        }

        cursor.source_mut().skip_subtree(&dir);
        cursor.advance()?;
        self.stats.skipped_dirs += 1;
        debug!(dir = %dir, reported = ?report, "skipped directory contents");
        Ok(report.map(|flags| (dir, flags)))
    }

    /// Look below an untracked directory with a separate walk that stops at
    /// the first file that is not ignored.
    fn contents(&self, dir: &PathKey) -> SourceResult<Contents> {
        let mut walk = self.content.walk(&Scope::directory(dir))?;
        let mut found = Contents::Empty;
        while let Some(entry) = walk.next() {
            let entry = entry?;
            if entry.is_directory() {
                if self.ignores.is_ignored(&entry.path, true) {
                    walk.skip_subtree(&entry.path);
                    found = Contents::Ignored;
                }
                continue;
            }
            if !self.ignores.is_ignored(&entry.path, false) {
                return Ok(Contents::Untracked);
            }
            found = Contents::Ignored;
        }
        Ok(found)
    }

    fn classify(
        &mut self,
        key: &PathKey,
        head: Option<&EntryDescriptor>,
        index: Option<&EntryDescriptor>,
        worktree: Option<&EntryDescriptor>,
    ) -> SourceResult<Option<StatusFlags>> {
        let mut flags = StatusFlags::CURRENT;

        if self.head.is_some() {
            match (head, index) {
                (None, Some(_)) => flags |= StatusFlags::INDEX_NEW,
                (Some(h), Some(i)) if staged_change(h, i) => flags |= StatusFlags::INDEX_MODIFIED,
                (Some(_), None) => flags |= StatusFlags::INDEX_DELETED,
                _ => {}
            }
        }

        if self.worktree.is_some() {
            match (index, worktree) {
                (Some(_), None) => flags |= StatusFlags::WT_DELETED,
                (Some(i), Some(w)) => {
                    if self.worktree_change(key, i, w)? {
                        flags |= StatusFlags::WT_MODIFIED;
                    }
                }
                (None, Some(_)) => {
                    let ignored = self.ignores.is_ignored(key, false);
                    let (wanted, flag) = if ignored {
                        (self.options.include_ignored, StatusFlags::IGNORED)
                    } else {
                        (self.options.include_untracked, StatusFlags::WT_NEW)
                    };
                    if wanted {
                        flags |= flag;
                    } else if flags.is_current() {
                        return Ok(None);
                    }
                }
                (None, None) => {}
            }
        }

        if flags.is_current() && !self.options.include_unmodified {
            return Ok(None);
        }
        Ok(Some(flags))
    }

    fn worktree_change(
        &mut self,
        key: &PathKey,
        index: &EntryDescriptor,
        worktree: &EntryDescriptor,
    ) -> SourceResult<bool> {
        if !index.mode.matches(&worktree.mode, self.honor_file_mode) {
            return Ok(true);
        }
        match index.identity.compare(&worktree.identity) {
            Sameness::Same => Ok(false),
            Sameness::Different => Ok(true),
            Sameness::Unknown => {
                let Some(staged) = index.identity.oid else {
                    return Ok(true);
                };
                self.stats.content_checks += 1;
                debug!(path = %key, "stat data inconclusive, hashing content");
                Ok(self.content.content_id(key)? != staged)
            }
        }
    }
}

fn staged_change(head: &EntryDescriptor, index: &EntryDescriptor) -> bool {
    head.mode != index.mode || head.identity.compare(&index.identity) != Sameness::Same
}

impl Iterator for Reconciler<'_> {
    type Item = SourceResult<(PathKey, StatusFlags)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatusConfig;
    use crate::options::Show;
    use crate::testutil::{backend, entries, key, scan, stage, track, write, TestBackend};
    use crate::worktree::{MemoryFile, DEFAULT_MTIME};
    use vista_types::{FileMode, FileTime, Scope};

    const LATER: FileTime = FileTime {
        secs: DEFAULT_MTIME.secs + 60,
        nanos: 0,
    };

    fn committed(paths: &[(&str, &str)]) -> TestBackend {
        let mut b = backend();
        for (path, data) in paths {
            track(&mut b, path, data);
        }
        b.commit_index().unwrap();
        b
    }

    fn stats(b: &TestBackend, options: &StatusOptions) -> ScanStats {
        let engine = b.ignore_engine().unwrap();
        let mut scan = Reconciler::new(b, &engine, options).unwrap();
        for item in scan.by_ref() {
            item.unwrap();
        }
        scan.stats()
    }

    #[test]
    fn classifies_every_kind_of_change() {
        let mut b = committed(&[
            ("a.txt", "one"),
            ("gone.txt", "bye"),
            ("src/lib.rs", "lib"),
            ("src/main.rs", "main"),
        ]);
        track(&mut b, "new.txt", "fresh");
        track(&mut b, "src/lib.rs", "lib v2");
        b.worktree_mut().insert_file(
            &key("src/main.rs"),
            MemoryFile {
                data: b"MAIN".to_vec(),
                mode: FileMode::Regular,
                mtime: LATER,
            },
        );
        b.worktree_mut().remove(&key("gone.txt"));
        write(&mut b, "notes.md", "todo");

        assert_eq!(
            scan(&b, &StatusOptions::default()),
            entries(&[
                ("gone.txt", StatusFlags::WT_DELETED),
                ("new.txt", StatusFlags::INDEX_NEW),
                ("notes.md", StatusFlags::WT_NEW),
                ("src/lib.rs", StatusFlags::INDEX_MODIFIED),
                ("src/main.rs", StatusFlags::WT_MODIFIED),
            ])
        );
    }

    #[test]
    fn unstaged_removal_with_file_left_behind() {
        let mut b = committed(&[("old.txt", "x")]);
        b.index_mut().remove(&key("old.txt")).unwrap();
        assert_eq!(
            scan(&b, &StatusOptions::default()),
            entries(&[("old.txt", StatusFlags::INDEX_DELETED | StatusFlags::WT_NEW)])
        );
    }

    #[test]
    fn clean_repository_reports_nothing_unless_asked() {
        let b = committed(&[("a", "1"), ("d/b", "2")]);
        assert!(scan(&b, &StatusOptions::default()).is_empty());

        let all = StatusOptions {
            include_unmodified: true,
            ..StatusOptions::default()
        };
        assert_eq!(
            scan(&b, &all),
            entries(&[("a", StatusFlags::CURRENT), ("d/b", StatusFlags::CURRENT)])
        );
    }

    #[test]
    fn touched_file_with_same_content_is_hashed_once_and_clean() {
        let mut b = committed(&[("f", "same")]);
        b.worktree_mut().get_mut(&key("f")).unwrap().mtime = LATER;

        assert!(scan(&b, &StatusOptions::default()).is_empty());
        assert_eq!(b.worktree_ref().content_reads(), 1);
    }

    #[test]
    fn size_change_needs_no_content_read() {
        let mut b = committed(&[("f", "short")]);
        write(&mut b, "f", "much longer");
        let s = stats(&b, &StatusOptions::default());
        assert_eq!(s.content_checks, 0);
        assert_eq!(b.worktree_ref().content_reads(), 0);
    }

    #[test]
    fn racy_entry_catches_same_size_edit() {
        let mut b = committed(&[("f", "abc")]);
        write(&mut b, "f", "abd");
        // Without an index timestamp the equal stat data looks clean.
        assert!(scan(&b, &StatusOptions::default()).is_empty());

        b.index_mut().set_timestamp(DEFAULT_MTIME);
        assert_eq!(
            scan(&b, &StatusOptions::default()),
            entries(&[("f", StatusFlags::WT_MODIFIED)])
        );
    }

    #[test]
    fn executable_bit_respects_configuration() {
        let mut b = committed(&[("run.sh", "#!/bin/sh")]);
        b.worktree_mut().get_mut(&key("run.sh")).unwrap().mode = FileMode::Executable;
        assert_eq!(
            scan(&b, &StatusOptions::default()),
            entries(&[("run.sh", StatusFlags::WT_MODIFIED)])
        );

        let b = b.with_config(StatusConfig {
            honor_file_mode: false,
            ..StatusConfig::default()
        });
        assert!(scan(&b, &StatusOptions::default()).is_empty());
    }

    #[test]
    fn ignored_directory_is_never_listed() {
        let mut b = committed(&[(".gitignore", "target/\n"), ("keep.rs", "fn x() {}")]);
        for i in 0..10_000 {
            write(&mut b, &format!("target/obj{i:05}.o"), "o");
        }
        let engine = b.ignore_engine().unwrap();
        b.worktree_ref().reset_counters();

        let options = StatusOptions::default();
        let mut scan = Reconciler::new(&b, &engine, &options).unwrap();
        let reported: Vec<_> = scan.by_ref().map(Result::unwrap).collect();

        assert_eq!(reported, vec![(key("target/"), StatusFlags::IGNORED)]);
        assert_eq!(scan.stats().skipped_dirs, 1);
        assert!(b.worktree_ref().yielded() <= 4, "{}", b.worktree_ref().yielded());
    }

    #[test]
    fn ignored_directory_can_be_hidden_or_expanded() {
        let mut b = committed(&[(".gitignore", "build/\n")]);
        write(&mut b, "build/a.o", "a");
        write(&mut b, "build/sub/b.o", "b");

        let hidden = StatusOptions {
            include_ignored: false,
            ..StatusOptions::default()
        };
        assert!(scan(&b, &hidden).is_empty());

        let expanded = StatusOptions {
            recurse_ignored_dirs: true,
            ..StatusOptions::default()
        };
        assert_eq!(
            scan(&b, &expanded),
            entries(&[
                ("build/a.o", StatusFlags::IGNORED),
                ("build/sub/b.o", StatusFlags::IGNORED),
            ])
        );
    }

    #[test]
    fn tracked_content_keeps_ignored_directory_open() {
        let mut b = committed(&[(".gitignore", "build/\n"), ("build/keep.txt", "k")]);
        write(&mut b, "build/out.o", "o");
        write(&mut b, "build/keep.txt", "changed");

        assert_eq!(
            scan(&b, &StatusOptions::default()),
            entries(&[
                ("build/keep.txt", StatusFlags::WT_MODIFIED),
                ("build/out.o", StatusFlags::IGNORED),
            ])
        );
    }

    #[test]
    fn untracked_directory_collapses_when_not_recursing() {
        let mut b = committed(&[("a", "1")]);
        write(&mut b, "new/x", "x");
        write(&mut b, "new/deep/y", "y");
        write(&mut b, "top.txt", "t");

        let collapsed = StatusOptions {
            recurse_untracked_dirs: false,
            ..StatusOptions::default()
        };
        assert_eq!(
            scan(&b, &collapsed),
            entries(&[("new/", StatusFlags::WT_NEW), ("top.txt", StatusFlags::WT_NEW)])
        );
        assert_eq!(
            scan(&b, &StatusOptions::default()),
            entries(&[
                ("new/deep/y", StatusFlags::WT_NEW),
                ("new/x", StatusFlags::WT_NEW),
                ("top.txt", StatusFlags::WT_NEW),
            ])
        );
    }

    #[test]
    fn collapsed_directory_of_ignored_files_is_not_new() {
        let mut b = committed(&[(".gitignore", "*.log\ncache/\n")]);
        write(&mut b, "logs/a.log", "a");
        write(&mut b, "logs/deep/b.log", "b");
        write(&mut b, "mixed/c.log", "c");
        write(&mut b, "mixed/sub/notes.md", "n");
        write(&mut b, "tmp/cache/blob", "x");

        let collapsed = StatusOptions {
            recurse_untracked_dirs: false,
            include_ignored: false,
            ..StatusOptions::default()
        };
        assert_eq!(scan(&b, &collapsed), entries(&[("mixed/", StatusFlags::WT_NEW)]));

        let with_ignored = StatusOptions {
            recurse_untracked_dirs: false,
            ..StatusOptions::default()
        };
        assert_eq!(
            scan(&b, &with_ignored),
            entries(&[
                ("logs/", StatusFlags::IGNORED),
                ("mixed/", StatusFlags::WT_NEW),
                ("tmp/", StatusFlags::IGNORED),
            ])
        );

        let expanded = StatusOptions {
            recurse_untracked_dirs: false,
            recurse_ignored_dirs: true,
            ..StatusOptions::default()
        };
        assert_eq!(
            scan(&b, &expanded),
            entries(&[
                ("logs/a.log", StatusFlags::IGNORED),
                ("logs/deep/b.log", StatusFlags::IGNORED),
                ("mixed/", StatusFlags::WT_NEW),
                ("tmp/cache/blob", StatusFlags::IGNORED),
            ])
        );
    }

    #[test]
    fn ignored_files_never_reported_as_new() {
        let mut b = committed(&[(".gitignore", "*.log\n"), ("kept.log", "v1")]);
        write(&mut b, "debug.log", "d");
        write(&mut b, "logs/today.log", "t");
        write(&mut b, "kept.log", "v2");

        assert_eq!(
            scan(&b, &StatusOptions::default()),
            entries(&[
                ("debug.log", StatusFlags::IGNORED),
                ("kept.log", StatusFlags::WT_MODIFIED),
                ("logs/today.log", StatusFlags::IGNORED),
            ])
        );

        let no_untracked = StatusOptions {
            include_untracked: false,
            ..StatusOptions::default()
        };
        write(&mut b, "notes.md", "n");
        let reported = scan(&b, &no_untracked);
        assert!(reported.iter().all(|(p, _)| p != "notes.md"));
        assert!(reported.contains(&("logs/today.log".to_string(), StatusFlags::IGNORED)));
    }

    #[test]
    fn show_limits_the_comparisons() {
        let mut b = committed(&[("a", "1"), ("b", "2")]);
        track(&mut b, "staged", "s");
        write(&mut b, "a", "edited");
        write(&mut b, "untracked", "u");

        let index_only = StatusOptions::default().with_show(Show::IndexOnly);
        b.worktree_ref().reset_counters();
        assert_eq!(
            scan(&b, &index_only),
            entries(&[("staged", StatusFlags::INDEX_NEW)])
        );
        assert_eq!(b.worktree_ref().yielded(), 0);

        let worktree_only = StatusOptions::default().with_show(Show::WorktreeOnly);
        assert_eq!(
            scan(&b, &worktree_only),
            entries(&[
                ("a", StatusFlags::WT_MODIFIED),
                ("untracked", StatusFlags::WT_NEW),
            ])
        );
    }

    #[test]
    fn directory_scope_restricts_all_sources() {
        let mut b = committed(&[("src/a.rs", "a"), ("srcs", "x"), ("top", "t")]);
        write(&mut b, "src/a.rs", "changed");
        write(&mut b, "src/new.rs", "n");
        write(&mut b, "top", "changed");
        stage(&mut b, "src/staged.rs", "s");

        let options = StatusOptions::default().with_scope(Scope::directory(&key("src")));
        assert_eq!(
            scan(&b, &options),
            entries(&[
                ("src/a.rs", StatusFlags::WT_MODIFIED),
                ("src/new.rs", StatusFlags::WT_NEW),
                ("src/staged.rs", StatusFlags::INDEX_NEW | StatusFlags::WT_DELETED),
            ])
        );
    }

    #[test]
    fn output_is_strictly_ascending() {
        let mut b = committed(&[("a.txt", "1"), ("a/b", "2"), ("a0", "3")]);
        write(&mut b, "a/c", "new");
        write(&mut b, "a.txt", "changed");
        b.worktree_mut().remove(&key("a0"));

        let paths: Vec<String> = scan(&b, &StatusOptions::default())
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        assert_eq!(paths, vec!["a.txt", "a/c", "a0"]);
    }
}
