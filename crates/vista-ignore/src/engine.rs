//! The layered ignore rule set.
//!
//! Each source is compiled into one gitignore matcher, and the matchers are
//! kept sorted by `(origin, declaration order)`. A path's own
//! highest-priority matching rule decides it; when no rule matches the path
//! itself, it takes the decision of its nearest decided ancestor directory.
//! So a file inside an excluded directory is excluded, and an explicit
//! `!file` rule of higher priority re-includes it.

use std::path::PathBuf;
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};
use vista_types::path::bytes_to_path;
use vista_types::PathKey;

use crate::config::IgnoreConfig;
use crate::error::PatternError;
use crate::rule::{IgnoreRule, RuleFile, RuleOrigin};

/// A pattern line that was skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternDiagnostic {
    pub source: String,
    pub line: usize,
    pub text: String,
    pub reason: PatternError,
}

/// Answers "is this path ignored?" for one repository snapshot.
///
/// Built once, then shared read-only (typically behind an `Arc`) by every
/// query against the same snapshot.
#[derive(Clone, Debug)]
pub struct IgnoreEngine {
    config: IgnoreConfig,
    files: Vec<RuleFile>,
    diagnostics: Vec<PatternDiagnostic>,
    next_seq: usize,
}

impl Default for IgnoreEngine {
    fn default() -> Self {
        Self::new(IgnoreConfig::default())
    }
}

impl IgnoreEngine {
    /// Create an engine holding only the configured built-in rules.
    pub fn new(config: IgnoreConfig) -> Self {
        let builtin = config.builtin_rules.join("\n");
        let mut engine = Self {
            config,
            files: Vec::new(),
            diagnostics: Vec::new(),
            next_seq: 0,
        };
        engine.add_rules(builtin.as_bytes(), RuleOrigin::Builtin, None, "<builtin>");
        engine
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &IgnoreConfig {
        &self.config
    }

    /// Add the contents of the user-wide excludes file.
    pub fn add_global(&mut self, text: &[u8], source: &str) -> usize {
        self.add_rules(text, RuleOrigin::Global, None, source)
    }

    /// Add the contents of the repository exclude file.
    pub fn add_repo_exclude(&mut self, text: &[u8], source: &str) -> usize {
        self.add_rules(text, RuleOrigin::RepoExclude, None, source)
    }

    /// Add a per-directory ignore file; `dir` is `None` for the root.
    pub fn add_directory(&mut self, dir: Option<&PathKey>, text: &[u8]) -> usize {
        let depth = dir.map_or(0, PathKey::depth);
        let base = dir.map(PathKey::to_dir);
        let source = match &base {
            Some(base) => format!("{base}{}", self.config.file_name),
            None => self.config.file_name.clone(),
        };
        self.add_rules(text, RuleOrigin::Directory { depth }, base, &source)
    }

    /// Add override rules that outrank every ignore file.
    pub fn add_overrides<S: AsRef<str>>(&mut self, lines: &[S]) -> usize {
        let text = lines
            .iter()
            .map(|l| l.as_ref())
            .collect::<Vec<_>>()
            .join("\n");
        self.add_rules(text.as_bytes(), RuleOrigin::Override, None, "<override>")
    }

    /// A copy of this engine with extra override rules.
    pub fn with_overrides<S: AsRef<str>>(&self, lines: &[S]) -> IgnoreEngine {
        let mut engine = self.clone();
        engine.add_overrides(lines);
        engine
    }

    /// Compile one source into a matcher rooted at its declaring directory.
    fn add_rules(
        &mut self,
        text: &[u8],
        origin: RuleOrigin,
        base: Option<PathKey>,
        source: &str,
    ) -> usize {
        let root = base
            .as_ref()
            .map_or_else(|| PathBuf::from("."), |b| bytes_to_path(b.trimmed()));
        let mut builder = GitignoreBuilder::new(root);
        if let Err(err) = builder.case_insensitive(self.config.ignore_case) {
            warn!(source, %err, "case-insensitive matching unavailable");
        }

        let from = PathBuf::from(source);
        let mut lines = Vec::new();
        for (idx, raw) in text.split(|b| *b == b'\n').enumerate() {
            let line = idx + 1;
            let Some(pattern) = pattern_text(raw) else {
                continue;
            };
            let result = if is_empty_pattern(&pattern) {
                Err(PatternError::Empty)
            } else {
                builder
                    .add_line(Some(from.clone()), &pattern)
                    .map(|_| ())
                    .map_err(|err| PatternError::Glob(err.to_string()))
            };
            match result {
                Ok(()) => lines.push((line, pattern)),
                Err(reason) => self.skip(source, line, pattern, reason),
            }
        }

        let matcher = match builder.build() {
            Ok(matcher) => matcher,
            Err(err) => {
                self.skip(source, 0, String::new(), PatternError::Glob(err.to_string()));
                lines.clear();
                Gitignore::empty()
            }
        };
        let added = lines.len();
        self.files.push(RuleFile {
            origin,
            base,
            source: Arc::from(source),
            matcher,
            lines,
            seq: self.next_seq,
        });
        self.next_seq += 1;
        self.files.sort_by_key(|f| (f.origin, f.seq));
        debug!(source, ?origin, added, "loaded ignore rules");
        added
    }

    fn skip(&mut self, source: &str, line: usize, text: String, reason: PatternError) {
        warn!(source, line, pattern = %text, %reason, "skipping malformed ignore pattern");
        self.diagnostics.push(PatternDiagnostic {
            source: source.to_string(),
            line,
            text,
            reason,
        });
    }

    /// Number of pattern lines in force, built-ins included.
    pub fn rule_count(&self) -> usize {
        self.files.iter().map(RuleFile::len).sum()
    }

    /// Labels of every loaded source, lowest priority first.
    pub fn sources(&self) -> impl Iterator<Item = &str> + '_ {
        self.files.iter().map(|f| f.source.as_ref())
    }

    /// Lines skipped because they could not be parsed.
    pub fn diagnostics(&self) -> &[PatternDiagnostic] {
        &self.diagnostics
    }

    /// The highest-priority rule matching exactly this path.
    fn decide(&self, path: &[u8], is_dir: bool) -> Option<IgnoreRule> {
        self.files
            .iter()
            .rev()
            .find_map(|file| file.decide(path, is_dir))
    }

    /// The rule that decides `path`, either directly or through an ancestor.
    ///
    /// A directory key (trailing `/`) is always treated as a directory.
    pub fn matching_rule(&self, path: &PathKey, is_dir: bool) -> Option<IgnoreRule> {
        let is_dir = is_dir || path.is_dir();
        if let Some(rule) = self.decide(path.trimmed(), is_dir) {
            return Some(rule);
        }
        let ancestors: Vec<&[u8]> = path.ancestors().collect();
        ancestors
            .into_iter()
            .rev()
            .find_map(|dir| self.decide(dir, true))
    }

    /// Whether `path` is ignored.
    pub fn is_ignored(&self, path: &PathKey, is_dir: bool) -> bool {
        self.matching_rule(path, is_dir)
            .is_some_and(|rule| !rule.is_negated())
    }
}

/// The pattern a raw line contributes, or `None` for blanks and comments.
/// Trailing whitespace is dropped unless the last space is escaped.
fn pattern_text(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    if text.starts_with('#') {
        return None;
    }
    let text = if text.ends_with("\\ ") {
        text.as_ref()
    } else {
        text.trim_end()
    };
    (!text.is_empty()).then(|| text.to_string())
}

/// `!`, `/` and `!/` alone, or with only a trailing `/`, select nothing.
fn is_empty_pattern(pattern: &str) -> bool {
    let body = pattern.strip_prefix('!').unwrap_or(pattern);
    let body = body.strip_prefix('/').unwrap_or(body);
    body.strip_suffix('/').unwrap_or(body).is_empty()
}
