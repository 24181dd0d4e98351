//! Ignore-pattern engine for Vista.
//!
//! Compiles gitignore-style pattern files with the `ignore` crate and
//! resolves precedence across the rule layers: global excludes, the
//! repository exclude file, nested per-directory files (deepest first) and
//! explicit overrides.
//!
//! # Key Types
//!
//! - [`IgnoreEngine`] - The layered rule set; answers `is_ignored`
//! - [`IgnoreRule`] / [`RuleOrigin`] - The deciding rule and the layer it came from
//! - [`IgnoreLoader`] - Reads ignore files from a worktree on disk

pub mod config;
pub mod engine;
pub mod error;
pub mod load;
pub mod rule;

pub use config::IgnoreConfig;
pub use engine::{IgnoreEngine, PatternDiagnostic};
pub use error::{IgnoreError, IgnoreResult, PatternError};
pub use load::{read_rules_file, IgnoreLoader};
pub use rule::{IgnoreRule, RuleOrigin};
