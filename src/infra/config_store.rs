// ============================================================
// Layer 6 — Config Store
// ============================================================
// Reads and writes `AssistantConfig` as pretty JSON.
//
// Every field has a default, so a config file only needs the
// keys it wants to change:
//
//   { "pairs_csv": "data/my_pairs.csv", "min_similarity": 0.35 }
//
// Without a file the built-in defaults are used.
//
// Reference: Rust Book §9 (Error Handling)
//            serde_json docs (to_string_pretty / from_str)

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::application::assistant::AssistantConfig;

pub struct ConfigStore;

impl ConfigStore {
    /// Load from `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<AssistantConfig> {
        let Some(path) = path else {
            tracing::debug!("No config file given, using defaults");
            return Ok(AssistantConfig::default());
        };

        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;

        let cfg = serde_json::from_str(&json)
            .with_context(|| format!("Invalid config in '{}'", path.display()))?;

        tracing::info!("Loaded config from '{}'", path.display());
        Ok(cfg)
    }

    pub fn save(cfg: &AssistantConfig, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        }

        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::info!("Saved config to '{}'", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_path_gives_defaults() {
        assert_eq!(ConfigStore::load(None).unwrap(), AssistantConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("assistant.json");

        let mut cfg = AssistantConfig::default();
        cfg.min_similarity = 0.35;
        cfg.max_order      = 4;
        ConfigStore::save(&cfg, &path).unwrap();

        assert_eq!(ConfigStore::load(Some(path.as_path())).unwrap(), cfg);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{ "suggest_top_k": 3 }"#).unwrap();

        let cfg = ConfigStore::load(Some(path.as_path())).unwrap();
        assert_eq!(cfg.suggest_top_k, 3);
        assert_eq!(cfg.max_order, AssistantConfig::default().max_order);
    }

    #[test]
    fn test_unreadable_or_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigStore::load(Some(dir.path().join("nope.json").as_path())).is_err());

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "not json").unwrap();
        assert!(ConfigStore::load(Some(bad.as_path())).is_err());
    }
}
