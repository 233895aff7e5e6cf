// Mapper configuration
//
// Layering, last wins: defaults, config file, environment, CLI flags.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, LocalCatalog, RemoteCatalog};
use crate::constants::{
    CONFIG_APP_NAME, CONFIG_FILENAME, DEFAULT_MAPPING_FILENAME, ENV_API_KEY, ENV_DB_PATH,
    ENV_LOG_LEVEL, ENV_SERVER_URL,
};
use crate::error::{MapperError, Result};
use crate::report::LogLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Local catalog database
    pub db_path: Option<PathBuf>,
    /// Remote catalog server, e.g. http://localhost:9999
    pub server_url: Option<String>,
    pub api_key: Option<String>,
    pub log_level: LogLevel,
    pub mapping_filename: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            server_url: None,
            api_key: None,
            log_level: LogLevel::default(),
            mapping_filename: DEFAULT_MAPPING_FILENAME.to_string(),
        }
    }
}

/// `<config dir>/metadata-mapper/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new()
        .map(|dirs| dirs.config_dir().join(CONFIG_APP_NAME).join(CONFIG_FILENAME))
}

impl Config {
    /// Load from `path`, or the default location when `None`, then apply
    /// environment overrides. A missing file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };

        let mut config = match path {
            Some(p) if p.is_file() => Self::from_file(&p)?,
            Some(p) => {
                log::debug!("no config at {}, using defaults", p.display());
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| MapperError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Apply overrides from an environment lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_DB_PATH) {
            self.db_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get(ENV_SERVER_URL) {
            self.server_url = Some(v);
        }
        if let Some(v) = get(ENV_API_KEY) {
            self.api_key = Some(v);
        }
        if let Some(v) = get(ENV_LOG_LEVEL) {
            self.log_level = v
                .parse()
                .map_err(|e| MapperError::Config(format!("{}: {}", ENV_LOG_LEVEL, e)))?;
        }
        Ok(())
    }

    /// Catalog chosen by what is configured: a database wins, with the server
    /// (if any) attached as its scraper; a server alone is used directly.
    pub fn connect_catalog(&self) -> Result<Box<dyn Catalog>> {
        let remote = self
            .server_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|url| RemoteCatalog::new(url, self.api_key.clone()));
        self.connect_catalog_with(remote)
    }

    /// Same selection, with an already built remote client (plugin mode
    /// gets its connection from the host rather than from config)
    pub fn connect_catalog_with(&self, remote: Option<RemoteCatalog>) -> Result<Box<dyn Catalog>> {
        if let Some(client) = &remote {
            client.check_connection()?;
        }

        match (&self.db_path, remote) {
            (Some(db_path), remote) => {
                let mut catalog = LocalCatalog::open(db_path)?;
                if let Some(client) = remote {
                    catalog = catalog.with_scraper(Box::new(client));
                }
                log::info!("using local catalog {}", db_path.display());
                Ok(Box::new(catalog))
            }
            (None, Some(client)) => {
                log::info!("using remote catalog {}", client.endpoint());
                Ok(Box::new(client))
            }
            (None, None) => Err(MapperError::CatalogUnavailable(
                "no catalog configured (set a database path or server url)".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load(Some(&tmp.path().join("none.json"))).unwrap();
        assert_eq!(config.mapping_filename, "mapping.yaml");
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_file_uses_camel_case_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"dbPath": "/data/catalog.db", "serverUrl": "http://localhost:9999", "logLevel": "debug"}"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/data/catalog.db")));
        assert_eq!(config.server_url.as_deref(), Some("http://localhost:9999"));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.mapping_filename, "mapping.yaml");
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::from_file(&path), Err(MapperError::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_DB_PATH, "/env/catalog.db"),
            (ENV_API_KEY, ""),
            (ENV_LOG_LEVEL, "4"),
        ]
        .into_iter()
        .collect();

        let mut config = Config {
            api_key: Some("from-file".into()),
            ..Config::default()
        };
        config.apply_env(|k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.db_path, Some(PathBuf::from("/env/catalog.db")));
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.log_level, LogLevel::Warn);

        let mut config = Config::default();
        let bad = config.apply_env(|k| (k == ENV_LOG_LEVEL).then(|| "9".to_string()));
        assert!(matches!(bad, Err(MapperError::Config(_))));
    }

    #[test]
    fn test_no_catalog_configured_is_unavailable() {
        let config = Config::default();
        assert!(matches!(config.connect_catalog(), Err(MapperError::CatalogUnavailable(_))));
    }

    #[test]
    fn test_missing_database_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            db_path: Some(tmp.path().join("missing.db")),
            ..Config::default()
        };
        assert!(matches!(config.connect_catalog(), Err(MapperError::CatalogUnavailable(_))));
    }
}
