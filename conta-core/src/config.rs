//! Configuration management
//!
//! Settings live in `settings.json` inside the conta directory:
//! ```json
//! {
//!   "database": { "file": "conta.duckdb" },
//!   "secret": { "timeCost": 3, "memoryCost": 65536, "parallelism": 4, "hashLen": 32 },
//!   "operationTimeoutMs": 5000
//! }
//! ```
//!
//! Keys this crate does not know about are kept when saving.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::Argon2Params;

pub const SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_DATABASE_FILE: &str = "conta.duckdb";
pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 5000;

/// Overrides `database.file`
pub const ENV_DB_FILE: &str = "CONTA_DB_FILE";
/// Overrides `operationTimeoutMs`
pub const ENV_TIMEOUT_MS: &str = "CONTA_TIMEOUT_MS";
/// Data directory, `~/.conta` when unset
pub const ENV_DIR: &str = "CONTA_DIR";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    database: DatabaseSettings,
    #[serde(default)]
    secret: Argon2Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operation_timeout_ms: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Conta configuration (resolved view of settings + environment)
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Account database file name, relative to the conta directory
    pub database_file: String,
    /// Argon2id parameters used by the secret encoder
    pub secret: Argon2Params,
    /// Deadline given to every CLI operation
    pub operation_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_file: DEFAULT_DATABASE_FILE.to_string(),
            secret: Argon2Params::default(),
            operation_timeout_ms: DEFAULT_OPERATION_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Load config from the conta directory
    ///
    /// A missing or malformed settings file gives the defaults. Environment
    /// variables win over the file.
    pub fn load(conta_dir: &Path) -> Result<Self> {
        let raw = read_settings(&conta_dir.join(SETTINGS_FILE))?;
        Ok(Self::from_settings(raw, |key| std::env::var(key).ok()))
    }

    /// Load only what settings.json holds, ignoring the environment
    ///
    /// Used before [`Self::save`] so an override never ends up in the file.
    pub fn load_file(conta_dir: &Path) -> Result<Self> {
        let raw = read_settings(&conta_dir.join(SETTINGS_FILE))?;
        Ok(Self::from_settings(raw, |_| None))
    }

    fn from_settings(raw: SettingsFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let database_file = env(ENV_DB_FILE)
            .filter(|file| !file.is_empty())
            .or(raw.database.file)
            .unwrap_or(defaults.database_file);

        let operation_timeout_ms = env(ENV_TIMEOUT_MS)
            .and_then(|ms| ms.trim().parse().ok())
            .or(raw.operation_timeout_ms)
            .unwrap_or(defaults.operation_timeout_ms);

        Self {
            database_file,
            secret: raw.secret,
            operation_timeout_ms,
        }
    }

    /// Save config to the conta directory
    ///
    /// Preserves settings this crate doesn't manage.
    pub fn save(&self, conta_dir: &Path) -> Result<()> {
        let settings_path = conta_dir.join(SETTINGS_FILE);
        let mut settings = read_settings(&settings_path)?;

        settings.database.file = Some(self.database_file.clone());
        settings.secret = self.secret.clone();
        settings.operation_timeout_ms = Some(self.operation_timeout_ms);

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    pub fn database_path(&self, conta_dir: &Path) -> PathBuf {
        conta_dir.join(&self.database_file)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

fn read_settings(path: &Path) -> Result<SettingsFile> {
    if !path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}

/// Conta data directory: `CONTA_DIR`, else `~/.conta`
pub fn default_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(ENV_DIR) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".conta")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let raw = read_settings(&dir.path().join(SETTINGS_FILE)).unwrap();
        let config = Config::from_settings(raw, no_env);
        assert_eq!(config, Config::default());
        assert_eq!(config.database_path(dir.path()), dir.path().join("conta.duckdb"));
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        let config = Config::from_settings(read_settings(&path).unwrap(), no_env);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_file_values() {
        let raw: SettingsFile = serde_json::from_str(
            r#"{
                "database": { "file": "other.duckdb" },
                "secret": { "timeCost": 1, "memoryCost": 1024 },
                "operationTimeoutMs": 250
            }"#,
        )
        .unwrap();

        let config = Config::from_settings(raw, no_env);
        assert_eq!(config.database_file, "other.duckdb");
        assert_eq!(config.secret.time_cost, 1);
        assert_eq!(config.secret.memory_cost, 1024);
        assert_eq!(config.secret.parallelism, 4);
        assert_eq!(config.operation_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_env_overrides_file() {
        let raw: SettingsFile = serde_json::from_str(
            r#"{ "database": { "file": "other.duckdb" }, "operationTimeoutMs": 250 }"#,
        )
        .unwrap();

        let config = Config::from_settings(raw, |key| match key {
            ENV_DB_FILE => Some("env.duckdb".to_string()),
            ENV_TIMEOUT_MS => Some("1500".to_string()),
            _ => None,
        });
        assert_eq!(config.database_file, "env.duckdb");
        assert_eq!(config.operation_timeout_ms, 1500);
    }

    #[test]
    fn test_unparseable_env_timeout_is_ignored() {
        let config = Config::from_settings(SettingsFile::default(), |key| match key {
            ENV_TIMEOUT_MS => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config.operation_timeout_ms, DEFAULT_OPERATION_TIMEOUT_MS);
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(
            &path,
            r#"{ "theme": "dark", "database": { "file": "a.duckdb", "readOnly": true } }"#,
        )
        .unwrap();

        let mut config = Config::from_settings(read_settings(&path).unwrap(), no_env);
        config.database_file = "b.duckdb".to_string();
        config.operation_timeout_ms = 900;
        config.save(dir.path()).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["theme"], "dark");
        assert_eq!(saved["database"]["readOnly"], true);
        assert_eq!(saved["database"]["file"], "b.duckdb");
        assert_eq!(saved["operationTimeoutMs"], 900);
        assert_eq!(saved["secret"]["timeCost"], 3);

        let reloaded = Config::from_settings(read_settings(&path).unwrap(), no_env);
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_load_file_then_save() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{ "database": { "file": "a.duckdb" }, "operationTimeoutMs": 250 }"#,
        )
        .unwrap();

        let mut config = Config::load_file(dir.path()).unwrap();
        assert_eq!(config.database_file, "a.duckdb");
        assert_eq!(config.operation_timeout_ms, 250);

        config.operation_timeout_ms = 750;
        config.save(dir.path()).unwrap();

        let reloaded = Config::load_file(dir.path()).unwrap();
        assert_eq!(reloaded.database_file, "a.duckdb");
        assert_eq!(reloaded.operation_timeout_ms, 750);
    }
}
