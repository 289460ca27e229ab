//! Configuration file support.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags (applied by the binary)
//! 2. Environment variables prefixed with `FEEDWATCH_`; nested keys use `__`
//!    (e.g. `FEEDWATCH_ITEM_CAP`, `FEEDWATCH_REPOSITORIES__TOKEN`)
//! 3. `./feedwatch.toml`
//! 4. `~/.config/feedwatch/config.toml`
//! 5. Built-in defaults
//!
//! Example config file:
//! ```toml
//! item_cap = 3
//! timeout_secs = 10
//!
//! [[feeds]]
//! name = "Dark Reading"
//! endpoint = "https://www.darkreading.com/rss/all.xml"
//!
//! [repositories]
//! endpoint = "https://api.github.com/users/ronoc2020/repos"
//! token = "..."  # or GITHUB_API_TOKEN
//! ```
//!
//! A `[[feeds]]` list in any file replaces the default list as a whole.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::source::FeedSource;

/// Items kept per feed source unless configured otherwise.
pub const DEFAULT_ITEM_CAP: usize = 3;

/// Per-fetch timeout unless configured otherwise.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_REPOSITORY_ENDPOINT: &str = "https://api.github.com/users/ronoc2020/repos";

/// Fallback variable for the repository API token.
pub const TOKEN_ENV_VAR: &str = "GITHUB_API_TOKEN";

/// Top-level configuration as read from files and the environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Feed sources, in display order.
    pub feeds: Vec<FeedSource>,
    /// Maximum number of valid items kept per source.
    pub item_cap: usize,
    /// Timeout applied to each individual fetch.
    pub timeout_secs: u64,
    /// Repository listing.
    pub repositories: RepositoriesConfig,
}

/// Repository listing endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RepositoriesConfig {
    pub endpoint: String,
    /// API token; falls back to `GITHUB_API_TOKEN` when unset.
    pub token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feeds: vec![
                FeedSource::new("Dark Reading", "https://www.darkreading.com/rss/all.xml"),
                FeedSource::new("ESET", "https://feeds.feedburner.com/eset/blog"),
            ],
            item_cap: DEFAULT_ITEM_CAP,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            repositories: RepositoriesConfig::default(),
        }
    }
}

impl Default for RepositoriesConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_REPOSITORY_ENDPOINT.to_string(),
            token: None,
        }
    }
}

/// Validated settings the aggregator is constructed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    pub sources: Vec<FeedSource>,
    pub repository_endpoint: String,
    pub repository_token: Option<String>,
    pub item_cap: usize,
    pub timeout: Duration,
}

impl AppConfig {
    /// Load configuration using the layered approach described above.
    ///
    /// When `path` is given, that file is required and replaces the XDG and
    /// local lookups.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        match path {
            Some(path) => {
                tracing::debug!("Loading config from {:?}", path);
                builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
            }
            None => {
                for candidate in Self::default_paths() {
                    if candidate.exists() {
                        tracing::debug!("Loading config from {:?}", candidate);
                        builder = builder.add_source(
                            File::from(candidate)
                                .format(FileFormat::Toml)
                                .required(false),
                        );
                    }
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("FEEDWATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Parse configuration from TOML text alone, without files or env.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Ok(ConfigBuilder::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?)
    }

    /// Config files consulted when no explicit path is given, lowest
    /// priority first.
    fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dirs) = ProjectDirs::from("", "", "feedwatch") {
            paths.push(dirs.config_dir().join("config.toml"));
        }
        paths.push(PathBuf::from("feedwatch.toml"));
        paths
    }

    /// The configured token, else `GITHUB_API_TOKEN`.
    pub fn repository_token(&self) -> Option<String> {
        self.repositories
            .token
            .clone()
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok())
            .filter(|t| !t.is_empty())
    }

    /// Check names and endpoints and produce the aggregator's settings.
    pub fn validate(&self) -> Result<AggregatorConfig, ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let mut seen = HashSet::new();
        for (i, source) in self.feeds.iter().enumerate() {
            if source.name.trim().is_empty() {
                return Err(ConfigError::EmptyName(i));
            }
            if !seen.insert(source.name.as_str()) {
                return Err(ConfigError::DuplicateSource(source.name.clone()));
            }
            check_endpoint(&source.name, &source.endpoint)?;
        }
        check_endpoint("repositories", &self.repositories.endpoint)?;

        Ok(AggregatorConfig {
            sources: self.feeds.clone(),
            repository_endpoint: self.repositories.endpoint.clone(),
            repository_token: self.repository_token(),
            item_cap: self.item_cap,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

fn check_endpoint(name: &str, endpoint: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        name: name.to_string(),
        endpoint: endpoint.to_string(),
        reason,
    };

    let url = reqwest::Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme `{other}`"))),
    }
}
