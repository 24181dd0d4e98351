use serde::{Deserialize, Serialize};

/// Settings for an [`IgnoreEngine`](crate::IgnoreEngine).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Fold ASCII case when matching.
    pub ignore_case: bool,
    /// Name of per-directory ignore files.
    pub file_name: String,
    /// Patterns that are always in force.
    pub builtin_rules: Vec<String>,
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            ignore_case: false,
            file_name: ".gitignore".to_string(),
            builtin_rules: vec![".git".to_string()],
        }
    }
}
