// src/infra/paths.rs — Config path management
//
// HOTLOOP_HOME overrides the config directory. When unset, config lives
// under ~/.hotloop/ (or the platform config dir if no home is known).

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Returns the HOTLOOP_HOME override, if set.
fn hotloop_home() -> Option<PathBuf> {
    std::env::var_os("HOTLOOP_HOME").map(PathBuf::from)
}

/// Configuration directory: $HOTLOOP_HOME/ or ~/.hotloop/
pub fn config_dir() -> PathBuf {
    if let Some(home) = hotloop_home() {
        return home;
    }
    if let Some(base) = BaseDirs::new() {
        return base.home_dir().join(".hotloop");
    }
    ProjectDirs::from("", "", "hotloop")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".hotloop"))
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
