use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::SheddomeError;
use crate::store::CuratedStore;

pub const CONFIG_FILE_NAME: &str = "sheddome.json";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_API_KEY_ENV: &str = "API_KEY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub curated_records: Option<Utf8PathBuf>,
    #[serde(default)]
    pub collaborator: Option<CollaboratorEntry>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CollaboratorEntry {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorSettings {
    pub enabled: bool,
    pub model: String,
    pub endpoint: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for CollaboratorSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub curated_records: Option<Utf8PathBuf>,
    pub collaborator: CollaboratorSettings,
}

impl ResolvedConfig {
    /// Built-in curated records plus any configured extras.
    pub fn curated_store(&self) -> Result<CuratedStore, SheddomeError> {
        let mut store = CuratedStore::builtin();
        if let Some(path) = &self.curated_records {
            store.extend_from_file(path)?;
        }
        Ok(store)
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist. Otherwise `./sheddome.json`, then the user config
    /// directory, then built-in defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, SheddomeError> {
        let config_path = match path {
            Some(path) => Some(PathBuf::from(path)),
            None => default_locations().into_iter().find(|path| path.exists()),
        };
        let Some(config_path) = config_path else {
            tracing::debug!("no config file found, using defaults");
            return Self::resolve_config(Config::default());
        };

        let content = fs::read_to_string(&config_path)
            .map_err(|_| SheddomeError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| SheddomeError::ConfigParse(err.to_string()))?;
        tracing::debug!(path = %config_path.display(), "loaded config");

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, SheddomeError> {
        let schema_version = config.schema_version.unwrap_or(1);
        let defaults = CollaboratorSettings::default();
        let collaborator = match config.collaborator {
            Some(entry) => CollaboratorSettings {
                enabled: entry.enabled.unwrap_or(defaults.enabled),
                model: entry.model.unwrap_or(defaults.model),
                endpoint: entry.endpoint.unwrap_or(defaults.endpoint),
                api_key_env: entry.api_key_env.unwrap_or(defaults.api_key_env),
                timeout_secs: entry.timeout_secs.unwrap_or(defaults.timeout_secs),
            },
            None => defaults,
        };
        if collaborator.timeout_secs == 0 {
            return Err(SheddomeError::ConfigParse(
                "collaborator.timeout_secs must be positive".to_string(),
            ));
        }

        Ok(ResolvedConfig {
            schema_version,
            curated_records: config.curated_records,
            collaborator,
        })
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dirs) = ProjectDirs::from("org", "sheddome", "sheddome-atlas") {
        locations.push(dirs.config_dir().join(CONFIG_FILE_NAME));
    }
    locations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaborator_disabled_by_default() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert!(!resolved.collaborator.enabled);
        assert_eq!(resolved.collaborator.model, DEFAULT_MODEL);
        assert!(resolved.curated_records.is_none());
    }
}
