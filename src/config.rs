// Runtime configuration.
// Layers built-in defaults, an optional JSON config file and environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{LazyOrgError, Result};
use crate::github::GITHUB_API_BASE;

/// Default number of rows fetched per batch.
pub const DEFAULT_BATCH_SIZE: u64 = 50;

/// GitHub API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub base_url: String,
    pub token: Option<String>,
    /// Organization to list repositories for, if any.
    pub org: Option<String>,
    /// License key to filter repositories by.
    pub license: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_url: GITHUB_API_BASE.to_string(),
            token: None,
            org: None,
            license: None,
        }
    }
}

/// MySQL connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Table read by the batch reader.
    pub table: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "ALX_prodev".to_string(),
            table: "user_data".to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub database: DbConfig,
    pub batch_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github: GitHubConfig::default(),
            database: DbConfig::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Get the platform config directory (~/.config/lazyorg on Linux).
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "lazyorg").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Path to the default config file.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.json"))
}

impl Config {
    /// Load from the default config file (if present) and the process environment.
    pub fn load() -> Result<Self> {
        let base = match config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Read a JSON config file, falling back to defaults when it does not exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        log::debug!("reading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Apply environment-style overrides obtained through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GITHUB_API_URL") {
            self.github.base_url = v;
        }
        if let Some(v) = lookup("GITHUB_TOKEN") {
            self.github.token = Some(v);
        }
        if let Some(v) = lookup("GITHUB_ORG") {
            self.github.org = Some(v);
        }
        if let Some(v) = lookup("GITHUB_LICENSE") {
            self.github.license = Some(v);
        }

        if let Some(v) = lookup("DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = lookup("DB_PORT") {
            self.database.port = parse_var("DB_PORT", &v)?;
        }
        if let Some(v) = lookup("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = lookup("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Some(v) = lookup("DB_NAME") {
            self.database.database = v;
        }
        if let Some(v) = lookup("DB_TABLE") {
            self.database.table = v;
        }

        if let Some(v) = lookup("BATCH_SIZE") {
            self.batch_size = parse_var("BATCH_SIZE", &v)?;
        }
        if self.batch_size == 0 {
            return Err(LazyOrgError::Config("batch_size must be positive".into()));
        }
        Ok(self)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| LazyOrgError::Config(format!("{name}: cannot parse {value:?}")))
}
