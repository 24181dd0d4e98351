//! The repository context every status call goes through.

use std::ops::ControlFlow;
use std::sync::{Arc, RwLock};

use tracing::debug;
use vista_ignore::{IgnoreEngine, IgnoreRule};
use vista_types::{PathKey, StatusFlags};

use crate::config::StatusConfig;
use crate::dispatch;
use crate::error::{StatusError, StatusResult};
use crate::list::StatusList;
use crate::options::StatusOptions;
use crate::query;
use crate::source::StatusBackend;

/// A backend plus the state shared between scans: the cached ignore rule
/// set and repository-level override rules.
///
/// The rule set is built on first use and reused by every later call until
/// [`invalidate_ignores`](Self::invalidate_ignores) is called; edit ignore
/// files, then invalidate. Scans only read the cached rules, so a
/// repository can serve concurrent queries.
pub struct Repository<B> {
    backend: B,
    ignores: RwLock<Option<Arc<IgnoreEngine>>>,
    overrides: RwLock<Vec<String>>,
}

impl<B: StatusBackend> Repository<B> {
    /// Wrap a backend. No ignore rules are read until the first query.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            ignores: RwLock::new(None),
            overrides: RwLock::new(Vec::new()),
        }
    }

    /// The backend the repository reads from.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend. Cached ignore rules are kept; call
    /// [`invalidate_ignores`](Self::invalidate_ignores) after touching
    /// ignore files.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Give the backend back, dropping the cached rules.
    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn config(&self) -> &StatusConfig {
        self.backend.config()
    }

    /// Scan options derived from the repository configuration.
    pub fn default_options(&self) -> StatusOptions {
        StatusOptions::from_config(self.config())
    }

    // ---- Ignore rules ----

    /// The repository's ignore rules, built on first use.
    pub fn ignore_engine(&self) -> StatusResult<Arc<IgnoreEngine>> {
        if let Some(engine) = self.ignores.read().expect("lock poisoned").as_ref() {
            return Ok(Arc::clone(engine));
        }

        // Held across the build: an invalidation waits until the rules it
        // makes stale have been published, then clears them.
        let mut cache = self.ignores.write().expect("lock poisoned");
        if let Some(engine) = cache.as_ref() {
            return Ok(Arc::clone(engine));
        }
        let overrides = self.overrides.read().expect("lock poisoned").clone();
        let mut engine = self
            .backend
            .ignore_engine()
            .map_err(StatusError::IgnoreRules)?;
        engine.add_overrides(&overrides);
        let engine = Arc::new(engine);
        debug!(rules = engine.rule_count(), "cached ignore rules");

        *cache = Some(Arc::clone(&engine));
        Ok(engine)
    }

    /// Drop the cached rule set; the next call rebuilds it.
    pub fn invalidate_ignores(&self) {
        *self.ignores.write().expect("lock poisoned") = None;
    }

    /// Add override rules, one pattern per line. They outrank every ignore
    /// file and stay until [`clear_ignore_rules`](Self::clear_ignore_rules).
    pub fn add_ignore_rules(&self, rules: &str) {
        self.overrides
            .write()
            .expect("lock poisoned")
            .extend(rules.lines().map(str::to_string));
        self.invalidate_ignores();
    }

    /// Remove every override added with
    /// [`add_ignore_rules`](Self::add_ignore_rules).
    pub fn clear_ignore_rules(&self) {
        self.overrides.write().expect("lock poisoned").clear();
        self.invalidate_ignores();
    }

    fn engine_for(&self, options: &StatusOptions) -> StatusResult<Arc<IgnoreEngine>> {
        let engine = self.ignore_engine()?;
        if options.ignore_overrides.is_empty() {
            return Ok(engine);
        }
        Ok(Arc::new(engine.with_overrides(&options.ignore_overrides)))
    }

    // ---- Status ----

    /// Enumerate scan results through `handler`; see [`dispatch::for_each`].
    pub fn for_each<F, C>(&self, options: &StatusOptions, handler: F) -> StatusResult<ControlFlow<C>>
    where
        F: FnMut(&PathKey, StatusFlags) -> ControlFlow<C>,
    {
        let engine = self.engine_for(options)?;
        dispatch::for_each(&self.backend, &engine, options, handler)
    }

    /// Collect the results of a full scan.
    pub fn statuses(&self, options: &StatusOptions) -> StatusResult<StatusList> {
        let engine = self.engine_for(options)?;
        dispatch::collect(&self.backend, &engine, options)
    }

    /// Status of one file under the default options; see [`query::status_of`].
    pub fn status_of(&self, path: &str) -> StatusResult<StatusFlags> {
        self.status_of_with(path, &self.default_options())
    }

    pub fn status_of_with(&self, path: &str, options: &StatusOptions) -> StatusResult<StatusFlags> {
        let engine = self.engine_for(options)?;
        query::status_of(&self.backend, &engine, options, path)
    }

    /// Whether `path` is ignored. Fails only if the rules cannot be built.
    pub fn should_ignore(&self, path: &str) -> StatusResult<bool> {
        let engine = self.ignore_engine()?;
        query::should_ignore(&self.backend, &engine, path)
    }

    /// The rule deciding `path`, if any; negated rules are returned too.
    pub fn ignore_rule_for(&self, path: &str) -> StatusResult<Option<IgnoreRule>> {
        let engine = self.ignore_engine()?;
        let key = PathKey::parse(path)?;
        let is_dir = query::is_directory(&self.backend, &key);
        Ok(engine.matching_rule(&key, is_dir))
    }
}
