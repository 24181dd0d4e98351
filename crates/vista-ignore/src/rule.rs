use std::fmt;
use std::path::Path;
use std::sync::Arc;

use ignore::gitignore::{Gitignore, Glob};
use ignore::Match;
use serde::Serialize;
use vista_types::path::bytes_to_path;
use vista_types::PathKey;

/// Where a rule came from. Later variants take precedence over earlier ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RuleOrigin {
    /// User-wide excludes file (`core.excludesfile`).
    Global,
    /// Repository exclude file (`.git/info/exclude`).
    RepoExclude,
    /// A per-directory ignore file; deeper directories win.
    Directory { depth: usize },
    /// Rules added programmatically for a repository or a single call.
    Override,
    /// Rules that are always in force, such as `.git`.
    Builtin,
}

/// The rule that decided a path, as reported by `check-ignore -v`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IgnoreRule {
    /// The pattern as written, including a leading `!`.
    pub pattern: String,
    pub negated: bool,
    pub origin: RuleOrigin,
    /// Label of the declaring source (`.gitignore`, `sub/.gitignore`, ...).
    pub source: Arc<str>,
    /// 1-based line number within the source.
    pub line: usize,
}

impl IgnoreRule {
    /// Whether the rule re-includes what it matches.
    pub fn is_negated(&self) -> bool {
        self.negated
    }
}

/// `source:line:pattern`, the format of `check-ignore -v`.
impl fmt::Display for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.pattern)
    }
}

/// The compiled rules of one source (an ignore file, the overrides, the
/// built-ins), rooted at the directory that declares them.
#[derive(Clone, Debug)]
pub(crate) struct RuleFile {
    pub(crate) origin: RuleOrigin,
    /// Declaring directory; `None` for the repository root and for
    /// non-directory origins.
    pub(crate) base: Option<PathKey>,
    pub(crate) source: Arc<str>,
    pub(crate) matcher: Gitignore,
    /// `(line number, pattern)` for every line handed to the matcher, in order.
    pub(crate) lines: Vec<(usize, String)>,
    pub(crate) seq: usize,
}

impl RuleFile {
    /// The last rule of this file matching a path given without a trailing
    /// slash.
    pub(crate) fn decide(&self, path: &[u8], is_dir: bool) -> Option<IgnoreRule> {
        if let Some(base) = &self.base {
            match path.strip_prefix(base.as_bytes()) {
                Some(rel) if !rel.is_empty() => {}
                _ => return None,
            }
        }
        match self.matcher.matched(bytes_to_path(path), is_dir) {
            Match::None => None,
            Match::Ignore(glob) => Some(self.report(glob, false)),
            Match::Whitelist(glob) => Some(self.report(glob, true)),
        }
    }

    fn report(&self, glob: &Glob, negated: bool) -> IgnoreRule {
        // Identical lines match identically, so the matcher picked the last one.
        let line = self
            .lines
            .iter()
            .rev()
            .find(|(_, text)| text == glob.original())
            .map_or(0, |(line, _)| *line);
        let source = match glob.from() {
            Some(from) if from != Path::new(self.source.as_ref()) => {
                Arc::from(from.display().to_string())
            }
            _ => Arc::clone(&self.source),
        };
        IgnoreRule {
            pattern: glob.original().to_string(),
            negated,
            origin: self.origin,
            source,
            line,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }
}
