use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_BUCKET: &str = "anexos";

/// Resolved configuration used to build backend clients. Stored values can be
/// overridden per invocation through `DEMANDAS_URL` / `DEMANDAS_ANON_KEY`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    pub attachments_bucket: String,
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        let stored = StoredConfig::load()?;

        let backend_url = env::var("DEMANDAS_URL").ok().or(stored.backend_url);
        let anon_key = env::var("DEMANDAS_ANON_KEY").ok().or(stored.anon_key);
        let attachments_bucket = stored
            .attachments_bucket
            .filter(|bucket| !bucket.is_empty())
            .unwrap_or_else(|| DEFAULT_BUCKET.to_string());

        Ok(Self {
            backend_url,
            anon_key,
            attachments_bucket,
        })
    }
}

/// On-disk configuration, written by `demandas config init`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredConfig {
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    pub attachments_bucket: Option<String>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        Self::load_from(&config_file_path()?)
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&config_file_path()?)
    }

    fn load_from(path: &Path) -> AppResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                AppError::Configuration(format!("invalid config file {}: {err}", path.display()))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to encode config: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    if let Ok(dir) = env::var("DEMANDAS_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("demandas"));
    }
    let home =
        env::var("HOME").map_err(|_| AppError::Configuration("HOME is not set".to_string()))?;
    Ok(PathBuf::from(home).join(".config").join("demandas"))
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let cfg = StoredConfig {
            backend_url: Some("https://backend.example.com".to_string()),
            anon_key: Some("anon-123".to_string()),
            attachments_bucket: None,
        };
        cfg.save_to(&path).unwrap();

        let loaded = StoredConfig::load_from(&path).unwrap();
        assert_eq!(
            loaded.backend_url.as_deref(),
            Some("https://backend.example.com")
        );
        assert_eq!(loaded.anon_key.as_deref(), Some("anon-123"));
        assert!(loaded.attachments_bucket.is_none());
    }

    #[test]
    fn missing_config_file_is_defaulted() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = StoredConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.backend_url.is_none());
        assert!(loaded.anon_key.is_none());
    }
}
