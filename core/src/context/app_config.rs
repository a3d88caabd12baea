use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use starlog_types::{DisplayContext, HistorySettings, JOURNAL_DIRECTORY_KEY, TailerSettings};
use thiserror::Error;

const APP_NAME: &str = "starlog";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[source] confy::ConfyError),
    #[error("failed to store configuration: {0}")]
    Store(#[source] confy::ConfyError),
}

/// Key/value persistence consumed by the tailer to remember its directory.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError>;
}

/// Persisted application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub journal_directory: Option<String>,
    pub tailer: TailerSettings,
    pub history: HistorySettings,
    pub display: DisplayContext,
    /// Anything else stored through [`SettingsStore`].
    pub values: BTreeMap<String, String>,
}

impl AppConfig {
    /// Load from the platform config location, creating defaults on first run.
    pub fn load() -> Result<Self, ConfigError> {
        confy::load(APP_NAME, None).map_err(ConfigError::Load)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        confy::load_path(path).map_err(ConfigError::Load)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if key == JOURNAL_DIRECTORY_KEY {
            return self.journal_directory.clone();
        }
        self.values.get(key).cloned()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        if key == JOURNAL_DIRECTORY_KEY {
            self.journal_directory = Some(value.to_string());
        } else {
            self.values.insert(key.to_string(), value.to_string());
        }
    }
}

/// [`SettingsStore`] backed by a confy file. Every `set` is written through.
#[derive(Debug)]
pub struct ConfyStore {
    path: Option<PathBuf>,
    config: RwLock<AppConfig>,
}

impl ConfyStore {
    /// Store at the platform config location.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            path: None,
            config: RwLock::new(AppConfig::load()?),
        })
    }

    /// Store at an explicit file path.
    pub fn at_path(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = AppConfig::load_from(&path)?;
        Ok(Self {
            path: Some(path),
            config: RwLock::new(config),
        })
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn persist(&self, config: &AppConfig) -> Result<(), ConfigError> {
        match &self.path {
            Some(path) => confy::store_path(path, config),
            None => confy::store(APP_NAME, None, config),
        }
        .map_err(ConfigError::Store)
    }
}

impl SettingsStore for ConfyStore {
    fn get(&self, key: &str) -> Option<String> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let mut updated = config.clone();
        updated.set(key, value);
        self.persist(&updated)?;
        *config = updated;
        Ok(())
    }
}

/// In-memory [`SettingsStore`] for embedders that persist elsewhere, and tests.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, value: &str) -> Self {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        self
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
