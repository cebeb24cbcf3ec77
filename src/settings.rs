use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DiotError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
}

fn documents_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("diot")
}

fn default_catalog_path() -> String {
    documents_dir()
        .join("catalogo.json")
        .to_string_lossy()
        .to_string()
}

fn default_export_dir() -> String {
    documents_dir().join("exports").to_string_lossy().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            export_dir: default_export_dir(),
        }
    }
}

impl Settings {
    pub fn catalog_path(&self) -> PathBuf {
        PathBuf::from(&self.catalog_path)
    }

    pub fn export_dir(&self) -> PathBuf {
        PathBuf::from(&self.export_dir)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("diot")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Settings from `path`; a missing or corrupt file gives defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("ignoring corrupt settings {}: {e}", path.display());
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| DiotError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

/// Expand a leading `~` and make relative paths absolute when they exist.
pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("settings.json");
        let settings = Settings {
            catalog_path: "/tmp/catalogo.json".to_string(),
            export_dir: "/tmp/exports".to_string(),
        };
        save_settings_to(&path, &settings).unwrap();
        assert_eq!(load_settings_from(&path), settings);
        assert!(std::fs::read_to_string(&path).unwrap().ends_with("}\n"));
    }

    #[test]
    fn test_defaults_live_under_documents() {
        let s = Settings::default();
        assert!(s.catalog_path.ends_with("catalogo.json"));
        assert!(s.export_dir.ends_with("exports"));
        assert!(s.catalog_path.contains("diot"));
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let s: Settings = serde_json::from_str(r#"{"export_dir": "/tmp/out"}"#).unwrap();
        assert_eq!(s.export_dir, "/tmp/out");
        assert_eq!(s.catalog_path, default_catalog_path());
    }

    #[test]
    fn test_missing_or_corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_settings_from(&dir.path().join("none.json")), Settings::default());

        let corrupt = dir.path().join("settings.json");
        std::fs::write(&corrupt, "{oops").unwrap();
        assert_eq!(load_settings_from(&corrupt), Settings::default());
    }

    #[test]
    fn test_shellexpand_keeps_missing_relative_path() {
        assert_eq!(shellexpand_path("no/such/dir/x.json"), "no/such/dir/x.json");
    }
}
