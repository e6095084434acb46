//! Configuration management for reddit-daily.
//!
//! Configuration is read from `~/.config/reddit-daily/config.toml` unless a
//! path is given on the command line. If the default file doesn't exist, a
//! commented default is created.

pub mod reddit;

pub use reddit::RedditConfig;

use crate::fetcher::style::{BUNDLED_STYLESHEET, DEFAULT_STYLESHEET};
use crate::fetcher::StylePolicy;
use crate::mailer::MailConfig;
use crate::retry::RetryConfig;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reddit: RedditConfig,
    pub style: StyleConfig,
    pub render: RenderConfig,
    pub mail: MailConfig,
    pub retry: RetryConfig,
    pub pipeline: PipelineConfig,
    pub secrets: SecretsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub policy: StylePolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Base for resolving relative links in the inlined email
    pub base_url: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum forums processed concurrently (default: 4)
    pub workers: usize,
}

pub const DEFAULT_WORKERS: usize = 4;

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretSource {
    #[default]
    Env,
    File,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub source: SecretSource,
    /// Secrets file, required when `source = "file"`
    pub path: Option<PathBuf>,
    /// Prefix prepended to secret names when reading the environment
    pub env_prefix: Option<String>,
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist. The default path is created with
    /// commented defaults and the bundled stylesheet on first use. Missing
    /// fields use default values. Relative CSS paths are taken from the
    /// config file's directory.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = Self::default_config_path()?;
                if !default_path.exists() {
                    Self::create_default_config(&default_path)?;
                    return Ok(Self::default().with_base_dir(&default_path));
                }
                default_path
            }
        };

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config = Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: config_path.clone(),
            source: e,
        })?;
        Ok(config.with_base_dir(&config_path))
    }

    fn with_base_dir(mut self, config_path: &Path) -> Self {
        if let Some(dir) = config_path.parent() {
            self.style.policy = self.style.policy.resolve_paths(dir);
        }
        self
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Get the default config file path: `~/.config/reddit-daily/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("reddit-daily").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        write_new_file(path, &Self::default_config_content())?;

        if let Some(dir) = path.parent() {
            let stylesheet = dir.join(DEFAULT_STYLESHEET);
            if !stylesheet.exists() {
                write_new_file(&stylesheet, BUNDLED_STYLESHEET)?;
            }
        }

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# reddit-daily configuration
#
# Secrets (app id/secret, refresh token, email credentials, Slack message
# template and webhook) are never stored here. See [secrets].

[reddit]
user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:52.0) Gecko/20100101 Firefox/52.0"
www_base = "https://www.reddit.com"
oauth_base = "https://oauth.reddit.com"
listing_base = "https://old.reddit.com"
timeout_secs = 30

[style]
# How the email <head> is built:
#   "download-external"                       fetch and embed linked stylesheets
#   "keep-external"                           copy the page <head> as-is
#   { literal-css-file = "css/reddit.css" }   embed one local file
#   { literal-css-files = ["a.css", "b.css"] } embed several local files
#   "none"                                    empty head
# Relative paths are resolved against the directory of this file.
policy = { literal-css-file = "css/reddit.css" }

[render]
base_url = "https://www.reddit.com"

[mail]
host = "smtp.gmail.com"
port = 587
subject_template = "Reddit daily r/{forum}"
plain_text = "Daily Subreddit"

[retry]
max_attempts = 5
delay_secs = 300

[pipeline]
workers = 4

[secrets]
# "env" reads REDDIT_DAILY_* variables, "file" reads a TOML table at `path`
source = "env"
"##
        .to_string()
    }
}

fn write_new_file(path: &Path, content: &str) -> Result<(), ConfigError> {
    let io_error = |e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut file = fs::File::create(path).map_err(io_error)?;
    file.write_all(content.as_bytes()).map_err(io_error)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
