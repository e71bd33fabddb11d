//! Connection settings for the CLI.
//!
//! Read from an optional TOML file layered with `EVENTWATCH_`-prefixed
//! environment variables:
//!
//! ```toml
//! endpoint = "https://abc123.execute-api.us-west-2.amazonaws.com/msam"
//! api_key = "secret"
//! settings_file = "eventwatch-settings.json"
//! timeout_secs = 10
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

/// Default location of the persisted settings (update interval).
pub const DEFAULT_SETTINGS_FILE: &str = "eventwatch-settings.json";

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Status API base URL.
    pub endpoint: Option<String>,
    /// API key sent with every request.
    pub api_key: Option<String>,
    /// Where the update interval is persisted.
    pub settings_file: Option<PathBuf>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Load settings from `path` (if given) and the environment.
    ///
    /// An explicitly given file must exist. Environment variables override
    /// file values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let config = builder
            .add_source(Environment::with_prefix("EVENTWATCH").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.settings_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
    }
}
