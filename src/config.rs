use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::core::ingest::DEFAULT_MAX_DEPTH;
use crate::core::packing::DEFAULT_BATCH_CAP;
use crate::core::size::{LimitPolicy, GIB};
use crate::http::DEFAULT_TIMEOUT;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000/";
pub const DEFAULT_DISPLAY_LIMIT: u64 = 2 * GIB;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "could not read config: {err}"),
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub request_timeout_secs: u64,
    pub batch_cap_bytes: u64,
    pub display_limit_bytes: u64,
    pub limit_policy: LimitPolicy,
    pub max_depth: usize,
    pub output_dir: PathBuf,
    pub combine_archives: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: String::from(DEFAULT_SERVER_URL),
            request_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            batch_cap_bytes: DEFAULT_BATCH_CAP,
            display_limit_bytes: DEFAULT_DISPLAY_LIMIT,
            limit_policy: LimitPolicy::Warn,
            max_depth: DEFAULT_MAX_DEPTH,
            output_dir: PathBuf::from("."),
            combine_archives: false,
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// A zero timeout would fail every request before it is sent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "request_timeout_secs must be at least 1",
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
