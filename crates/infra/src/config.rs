//! Application configuration.
//!
//! Every setting has a default. An optional JSON file named by
//! `SHOPFEED_CONFIG` is read first, then `SHOPFEED_*` environment variables
//! override single fields.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use shopfeed_core::Handle;
use shopfeed_feed::{FeedSettings, SizeModifiers, VariantExpander};
use shopfeed_observability::LogConfig;

pub const CONFIG_PATH_VAR: &str = "SHOPFEED_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("invalid pattern for size option '{option}': {source}")]
    Pattern {
        option: String,
        #[source]
        source: regex::Error,
    },
}

/// An option handled as a size axis in the strict feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SizeOptionConfig {
    /// Handle of the option, e.g. `jacket-size`.
    pub option: String,
    /// Group 1 is parsed as a surcharge.
    #[serde(default)]
    pub price_pattern: Option<String>,
    /// Text matching these is removed from the size.
    #[serde(default)]
    pub strip_patterns: Vec<String>,
    #[serde(default = "default_true")]
    pub strip_whitespace: bool,
}

fn default_true() -> bool {
    true
}

impl SizeOptionConfig {
    pub fn modifiers(&self) -> Result<SizeModifiers, ConfigError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|source| ConfigError::Pattern {
                option: self.option.clone(),
                source,
            })
        };
        Ok(SizeModifiers {
            price_attribute_extraction_regex: self.price_pattern.as_deref().map(compile).transpose()?,
            attribute_regexes: self
                .strip_patterns
                .iter()
                .map(|p| compile(p))
                .collect::<Result<_, _>>()?,
            strip_attribute: self.strip_whitespace,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    /// Root of the per-item page cache.
    pub cache_dir: PathBuf,
    /// Total fetch attempts per item before it is marked as having no
    /// options.
    pub max_option_fetch_attempts: u32,
    pub fetch_timeout_secs: u64,
    /// Storefront host used to build item URLs.
    pub domain_name: String,
    pub output_dir: PathBuf,
    pub log: LogConfig,
    pub feed: FeedSettings,
    pub sizes: Vec<SizeOptionConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://shopfeed.db".to_string(),
            cache_dir: PathBuf::from("cache/product_pages"),
            max_option_fetch_attempts: 3,
            fetch_timeout_secs: 30,
            domain_name: String::new(),
            output_dir: PathBuf::from("."),
            log: LogConfig::default(),
            feed: FeedSettings::default(),
            sizes: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the file named by `SHOPFEED_CONFIG`, then the process
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Expander with every configured size option registered.
    pub fn variant_expander(&self) -> Result<VariantExpander, ConfigError> {
        let mut expander = VariantExpander::new();
        for size in &self.sizes {
            expander.handle_size(Handle::new(size.option.as_str()), size.modifiers()?);
        }
        Ok(expander)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from `SHOPFEED_*` variables looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("SHOPFEED_DATABASE_URL") {
            self.database_url = value;
        }
        if let Some(value) = lookup("SHOPFEED_CACHE_DIR") {
            self.cache_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("SHOPFEED_MAX_OPTION_FETCH_ATTEMPTS") {
            self.max_option_fetch_attempts = parse_env("SHOPFEED_MAX_OPTION_FETCH_ATTEMPTS", value)?;
        }
        if let Some(value) = lookup("SHOPFEED_FETCH_TIMEOUT_SECS") {
            self.fetch_timeout_secs = parse_env("SHOPFEED_FETCH_TIMEOUT_SECS", value)?;
        }
        if let Some(value) = lookup("SHOPFEED_DOMAIN_NAME") {
            self.domain_name = value;
        }
        if let Some(value) = lookup("SHOPFEED_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("SHOPFEED_LOG_FILE") {
            self.log.file = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("SHOPFEED_LOG_JSON") {
            self.log.json = parse_env("SHOPFEED_LOG_JSON", value)?;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env { var, value })
}
