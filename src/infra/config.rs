// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub explore: ExploreConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

/// Limits and host functions for the embedded Rhai engine.
///
/// A zero limit means "unlimited", which is Rhai's own convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_operations: u64,
    pub max_expr_depth: usize,
    pub max_function_expr_depth: usize,
    pub max_call_levels: usize,
    pub max_string_size: usize,
    pub max_array_size: usize,
    pub max_map_size: usize,
    pub allow_log: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_operations: 0,
            max_expr_depth: 64,
            max_function_expr_depth: 32,
            max_call_levels: 64,
            max_string_size: 0,
            max_array_size: 0,
            max_map_size: 0,
            allow_log: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploreConfig {
    /// Input that ends the loop; anything else (including empty) re-runs.
    pub exit_word: String,
    /// Report iterations whose result is `()` as well.
    pub show_unit_results: bool,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            exit_word: "exit".into(),
            show_unit_results: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub interval_ms: u64,
    pub method: String,
    /// Search roots for resource ids, tried in order.
    pub roots: Vec<PathBuf>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            method: "run".into(),
            roots: vec![PathBuf::from(".")],
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.explore.exit_word.trim().is_empty() {
            anyhow::bail!("explore.exit_word must not be empty");
        }
        if self.watch.method.trim().is_empty() {
            anyhow::bail!("watch.method must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.engine.max_operations, 0);
        assert_eq!(c.engine.max_expr_depth, 64);
        assert!(c.engine.allow_log);
        assert_eq!(c.explore.exit_word, "exit");
        assert!(!c.explore.show_unit_results);
        assert_eq!(c.watch.interval_ms, 1000);
        assert_eq!(c.watch.method, "run");
        assert_eq!(c.watch.roots, vec![PathBuf::from(".")]);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.explore.exit_word, "exit");
        assert_eq!(config.engine.max_call_levels, 64);
    }

    #[test]
    fn test_parse_partial_section() {
        let toml_str = r#"
[engine]
max_operations = 50000

[watch]
method = "tick"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.max_operations, 50_000);
        // Unset keys in a present section keep their defaults
        assert_eq!(config.engine.max_expr_depth, 64);
        assert_eq!(config.watch.method, "tick");
        assert_eq!(config.watch.interval_ms, 1000);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[engine]
max_operations = 1000
max_expr_depth = 16
max_function_expr_depth = 8
max_call_levels = 10
max_string_size = 4096
max_array_size = 100
max_map_size = 100
allow_log = false

[explore]
exit_word = "quit"
show_unit_results = true

[watch]
interval_ms = 250
method = "main"
roots = ["scripts", "/opt/shared"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(!config.engine.allow_log);
        assert_eq!(config.engine.max_string_size, 4096);
        assert_eq!(config.explore.exit_word, "quit");
        assert!(config.explore.show_unit_results);
        assert_eq!(config.watch.interval_ms, 250);
        assert_eq!(config.watch.roots.len(), 2);
    }

    #[test]
    fn test_load_from_rejects_empty_exit_word() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[explore]\nexit_word = \"  \"\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("exit_word"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[watch]\ninterval_ms = 10\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.watch.interval_ms, 10);
    }
}
