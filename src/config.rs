//! Runtime configuration.
//!
//! Built-in defaults, overlaid by an optional TOML file, overlaid by
//! environment variables (a `.env` file is loaded by `main` beforehand).

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use thiserror::Error;
use url::Url;

use crate::search_utils::{
    debounce::DEFAULT_DEBOUNCE, pagination::DEFAULT_PAGE_SIZE, url_sync::HistoryMode,
};

pub const DEFAULT_CONFIG_REL_PATH: &str = "resources/search.toml";
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/";
pub const DEFAULT_USER_AGENT: &str = "react_repo_search";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("couldn't parse config file {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
    #[error("missing required setting {0}")]
    Missing(String),
}

/// Shape of the optional TOML file; every key may be omitted.
#[derive(serde::Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub user_agent: Option<String>,
    pub graphql_url: Option<String>,
    pub debounce_ms: Option<u64>,
    pub page_size: Option<u32>,
    pub page_history: Option<HistoryMode>,
    pub base_url: Option<String>,
}

impl FileConfig {
    /// Reads `path`; a missing file yields an empty config.
    pub fn read(path: &Path) -> Result<FileConfig, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("No config file at {}, using defaults", path.display());
                return Ok(FileConfig::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_owned(),
                    source,
                })
            }
        };
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_owned(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Github token; requests go out unauthenticated without it.
    pub api_key: Option<String>,
    pub user_agent: String,
    pub graphql_url: Url,
    pub debounce: Duration,
    pub page_size: u32,
    /// History semantics of page navigation url writes.
    pub page_history: HistoryMode,
    /// Location the url state is kept in.
    pub base_url: Url,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: None,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            graphql_url: Url::parse(DEFAULT_GRAPHQL_URL).expect("default graphql url is valid"),
            debounce: DEFAULT_DEBOUNCE,
            page_size: DEFAULT_PAGE_SIZE,
            page_history: HistoryMode::Replace,
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
        }
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value.trim()).map_err(|e| ConfigError::Invalid {
        key: key.to_owned(),
        message: e.to_string(),
    })
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key: key.to_owned(),
        message: e.to_string(),
    })
}

impl Config {
    /// Loads the file named by `SEARCH_CONFIG` (or the default path) and the
    /// process environment.
    pub fn load() -> Result<Config, ConfigError> {
        let path = std::env::var("SEARCH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_REL_PATH));
        let file = FileConfig::read(&path)?;
        Config::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Layers `file` and then `env` over the defaults.
    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(user_agent) = file.user_agent {
            config.user_agent = user_agent;
        }
        if let Some(url) = file.graphql_url {
            config.graphql_url = parse_url("graphql_url", &url)?;
        }
        if let Some(ms) = file.debounce_ms {
            config.debounce = Duration::from_millis(ms);
        }
        if let Some(size) = file.page_size {
            config.page_size = size;
        }
        if let Some(mode) = file.page_history {
            config.page_history = mode;
        }
        if let Some(url) = file.base_url {
            config.base_url = parse_url("base_url", &url)?;
        }

        config.api_key = env("GH_API_KEY").filter(|key| !key.trim().is_empty());
        if let Some(user_agent) = env("GH_API_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(url) = env("GH_GRAPHQL_URL") {
            config.graphql_url = parse_url("GH_GRAPHQL_URL", &url)?;
        }
        if let Some(ms) = env("SEARCH_DEBOUNCE_MS") {
            config.debounce = Duration::from_millis(parse_number("SEARCH_DEBOUNCE_MS", &ms)?);
        }
        if let Some(size) = env("SEARCH_PAGE_SIZE") {
            config.page_size = parse_number("SEARCH_PAGE_SIZE", &size)?;
        }
        if let Some(mode) = env("SEARCH_PAGE_HISTORY") {
            config.page_history = mode.parse().map_err(|message| ConfigError::Invalid {
                key: "SEARCH_PAGE_HISTORY".to_owned(),
                message,
            })?;
        }
        if let Some(url) = env("SEARCH_BASE_URL") {
            config.base_url = parse_url("SEARCH_BASE_URL", &url)?;
        }

        // github caps search windows at 100
        if !(1..=100).contains(&config.page_size) {
            return Err(ConfigError::Invalid {
                key: "page_size".to_owned(),
                message: format!("{} is outside 1..=100", config.page_size),
            });
        }
        Ok(config)
    }

    /// Fails unless a github token is configured.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ConfigError::Missing("GH_API_KEY".to_owned()))
    }
}
