//! Status configuration derived from git configuration.

use std::env;
use std::path::PathBuf;

use vista_status::{StatusConfig, UntrackedMode};

/// Read `core.ignorecase`, `core.filemode`, `core.excludesfile` and
/// `status.showUntrackedFiles`; unset keys keep their defaults.
pub fn status_config(config: &git2::Config) -> StatusConfig {
    let defaults = StatusConfig::default();
    let untracked = match config.get_string("status.showUntrackedFiles").as_deref() {
        Ok("no") => UntrackedMode::No,
        Ok("normal") => UntrackedMode::Normal,
        Ok("all") => UntrackedMode::All,
        _ => defaults.untracked,
    };
    StatusConfig {
        ignore_case: config.get_bool("core.ignorecase").unwrap_or(defaults.ignore_case),
        honor_file_mode: config
            .get_bool("core.filemode")
            .unwrap_or(defaults.honor_file_mode),
        global_excludes: config
            .get_path("core.excludesfile")
            .ok()
            .or_else(default_excludes_file),
        untracked,
        ..defaults
    }
}

/// `$XDG_CONFIG_HOME/git/ignore`, falling back to `~/.config/git/ignore`.
pub fn default_excludes_file() -> Option<PathBuf> {
    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(xdg).join("git").join("ignore"));
    }
    env::var_os("HOME").map(|home| PathBuf::from(home).join(".config").join("git").join("ignore"))
}
