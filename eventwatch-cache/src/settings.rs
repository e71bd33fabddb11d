//! Persisted settings stores.
//!
//! The poller keeps exactly one setting, the update interval in seconds,
//! under [`INTERVAL_SETTING_KEY`].

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::error::SettingsError;

/// Key under which the update interval (whole seconds) is stored.
pub const INTERVAL_SETTING_KEY: &str = "app-event-update-interval";

/// A key/value store that survives restarts.
#[async_trait]
pub trait SettingsStore: Send + Sync + Debug {
    /// Read a value. `Ok(None)` when the key has never been written.
    async fn get(&self, key: &str) -> Result<Option<String>, SettingsError>;

    /// Write a value, replacing any previous one.
    async fn put(&self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// In-memory settings, lost on restart.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one value.
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.values.lock().insert(key.into(), value.into());
        store
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Settings kept in a JSON object file.
///
/// A missing file reads as empty. Every `put` rewrites the whole file.
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    // Serializes read-modify-write cycles from this process.
    write_lock: tokio::sync::Mutex<()>,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns the path of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>, SettingsError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Map::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SettingsStore for FileSettings {
    async fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        let values = self.read_all().await?;
        Ok(values.get(key).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), Value::String(value.to_string()));

        let json = serde_json::to_string_pretty(&values)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}
