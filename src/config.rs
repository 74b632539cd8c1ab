use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::DEFAULT_IMAGE_CACHE_SECONDS;
use crate::error::{AppError, Result};

const APP_DIR: &str = "content-admin";
const URL_ENV: &str = "SUPABASE_URL";
const KEY_ENV: &str = "SUPABASE_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,

    #[serde(default = "default_storage_bucket")]
    pub storage_bucket: String,

    #[serde(default = "default_image_cache_seconds")]
    pub image_cache_seconds: u32,
}

fn default_storage_bucket() -> String {
    "images".to_string()
}

fn default_image_cache_seconds() -> u32 {
    DEFAULT_IMAGE_CACHE_SECONDS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_key: None,
            storage_bucket: default_storage_bucket(),
            image_cache_seconds: default_image_cache_seconds(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(std::env::var(URL_ENV).ok(), std::env::var(KEY_ENV).ok());
        Ok(config)
    }

    /// Reads `path`, writing a default file there first if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn apply_env(&mut self, url: Option<String>, key: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.supabase_url = Some(url);
        }
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.supabase_key = Some(key);
        }
    }

    /// Project URL and API key, or a message naming where to set them.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        let missing = |what: &str, env: &str| {
            AppError::Config(format!(
                "{what} is not set. Add it to {} or export {env}",
                Self::config_path().display()
            ))
        };

        let url = self
            .supabase_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| missing("supabase_url", URL_ENV))?;
        let key = self
            .supabase_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| missing("supabase_key", KEY_ENV))?;
        Ok((url, key))
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config, Config::default());
        assert!(path.exists());
        assert_eq!(config.storage_bucket, "images");
        assert_eq!(config.image_cache_seconds, 3600);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "supabase_url = \"https://demo.supabase.co\"\nsupabase_key = \"anon\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.credentials().unwrap(), ("https://demo.supabase.co", "anon"));
        assert_eq!(config.storage_bucket, "images");
    }

    #[test]
    fn invalid_toml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "supabase_url = ").unwrap();

        assert!(matches!(Config::load_from(&path), Err(AppError::Toml(_))));
    }

    #[test]
    fn env_overrides_file_values_unless_blank() {
        let mut config = Config {
            supabase_url: Some("https://file.supabase.co".to_string()),
            ..Config::default()
        };
        config.apply_env(Some("https://env.supabase.co".to_string()), Some("  ".to_string()));

        assert_eq!(config.supabase_url.as_deref(), Some("https://env.supabase.co"));
        assert!(config.supabase_key.is_none());
    }

    #[test]
    fn credentials_require_url_and_key() {
        let config = Config {
            supabase_url: Some("https://demo.supabase.co".to_string()),
            supabase_key: Some(String::new()),
            ..Config::default()
        };
        let err = config.credentials().unwrap_err();
        assert!(err.to_string().contains("supabase_key"));
    }

    #[test]
    fn saved_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config {
            supabase_url: Some("https://demo.supabase.co".to_string()),
            supabase_key: Some("anon".to_string()),
            storage_bucket: "media".to_string(),
            image_cache_seconds: 60,
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }
}
