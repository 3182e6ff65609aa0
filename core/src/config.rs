//! Layered configuration loaded with figment.
//!
//! Precedence (highest wins):
//! 1. Environment variables (`TASKDESK_*`, e.g. `TASKDESK_API_URL`)
//! 2. `~/.config/taskdesk/config.toml`
//! 3. Built-in defaults

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `TASKDESK_*` variables the config reads. `TASKDESK_TOKEN` belongs to the token store.
const ENV_KEYS: [&str; 4] = ["api_url", "login_path", "timeout_secs", "data_dir"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("could not determine home directory")]
    NoHomeDir,
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Figment(Box::new(err))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Base URL of the task API, without the `/api` suffix.
    pub api_url: String,
    pub login_path: String,
    pub timeout_secs: u64,
    /// Where the credentials file and TUI log live. Defaults to `~/.taskdesk`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_url: "http://localhost:8000".to_string(),
            login_path: "/auth/token".to_string(),
            timeout_secs: 15,
            data_dir: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        figment.merge(Env::prefixed("TASKDESK_").only(&ENV_KEYS))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("taskdesk").join("config.toml"))
    }

    pub fn resolve_data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::home_dir()
                .map(|h| h.join(".taskdesk"))
                .ok_or(ConfigError::NoHomeDir),
        }
    }

    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_when_nothing_set() {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .extract()
            .unwrap();
        assert_eq!(config, AppConfig::default());
    }

    /// Points the platform config dir at the jail and returns the config file path.
    fn jailed_config_path(jail: &mut Jail) -> PathBuf {
        let root = jail.directory().to_path_buf();
        jail.set_env("HOME", root.display());
        jail.set_env("XDG_CONFIG_HOME", root.display());
        AppConfig::global_config_path().unwrap()
    }

    #[test]
    fn load_without_config_file_uses_defaults() {
        Jail::expect_with(|jail| {
            let path = jailed_config_path(jail);
            assert!(path.starts_with(jail.directory()));
            assert!(!path.exists());

            assert_eq!(AppConfig::load().unwrap(), AppConfig::default());
            Ok(())
        });
    }

    #[test]
    fn load_layers_toml_then_env() {
        Jail::expect_with(|jail| {
            let path = jailed_config_path(jail);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(
                &path,
                r#"
api_url = "https://tasks.example.com"
timeout_secs = 30
"#,
            )
            .unwrap();
            jail.set_env("TASKDESK_TIMEOUT_SECS", "5");
            jail.set_env("TASKDESK_DATA_DIR", "/tmp/taskdesk-data");
            // read by the token store, not by the config
            jail.set_env("TASKDESK_TOKEN", "ignored-by-config");

            let config = AppConfig::load().unwrap();
            assert_eq!(config.api_url, "https://tasks.example.com");
            assert_eq!(config.timeout_secs, 5);
            assert_eq!(config.login_path, "/auth/token");
            assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/taskdesk-data")));
            Ok(())
        });
    }

    #[test]
    fn env_overrides_without_config_file() {
        Jail::expect_with(|jail| {
            jailed_config_path(jail);
            jail.set_env("TASKDESK_API_URL", "http://10.0.0.9:8000");

            let config = AppConfig::load().unwrap();
            assert_eq!(config.api_url, "http://10.0.0.9:8000");
            assert_eq!(config.timeout_secs, 15);
            Ok(())
        });
    }

    #[test]
    fn bad_toml_value_is_reported() {
        Jail::expect_with(|jail| {
            let path = jailed_config_path(jail);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, "timeout_secs = \"soon\"\n").unwrap();

            let err = AppConfig::load().unwrap_err();
            assert!(matches!(err, ConfigError::Figment(_)));
            Ok(())
        });
    }

    #[test]
    fn explicit_data_dir_and_override() {
        let config = AppConfig {
            data_dir: Some(PathBuf::from("/tmp/td")),
            ..Default::default()
        }
        .with_api_url(Some("http://10.0.0.2:9000".to_string()));
        assert_eq!(config.resolve_data_dir().unwrap(), PathBuf::from("/tmp/td"));
        assert_eq!(config.api_url, "http://10.0.0.2:9000");
    }
}
