//! Repository-level status configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vista_ignore::IgnoreConfig;

use crate::error::{StatusError, StatusResult};

/// How untracked files are reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UntrackedMode {
    /// Not at all.
    No,
    /// Untracked directories are reported as `dir/`.
    Normal,
    /// Every untracked file is reported.
    #[default]
    All,
}

/// Settings that shape every scan of a repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Match ignore patterns case-insensitively.
    pub ignore_case: bool,
    /// Treat a change of the executable bit as a modification.
    pub honor_file_mode: bool,
    /// User-wide excludes file.
    pub global_excludes: Option<PathBuf>,
    /// Name of per-directory ignore files.
    pub ignore_file_name: String,
    pub untracked: UntrackedMode,
    pub show_ignored: bool,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            ignore_case: false,
            honor_file_mode: true,
            global_excludes: None,
            ignore_file_name: ".gitignore".to_string(),
            untracked: UntrackedMode::default(),
            show_ignored: true,
        }
    }
}

impl StatusConfig {
    pub fn from_toml_str(text: &str) -> StatusResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> StatusResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| StatusError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Settings for the ignore engine.
    pub fn ignore_config(&self) -> IgnoreConfig {
        IgnoreConfig {
            ignore_case: self.ignore_case,
            file_name: self.ignore_file_name.clone(),
            ..IgnoreConfig::default()
        }
    }
}
