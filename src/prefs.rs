use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PreferencesError {
    #[error("Failed to read preferences from {0}: {1}")]
    Read(String, String),

    #[error("Failed to write preferences to {0}: {1}")]
    Write(String, String),

    #[error("Preferences lock poisoned")]
    Poisoned,
}

/// Values persisted in client-local storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceValues {
    #[serde(default)]
    pub muted: bool,
    #[serde(default = "default_auto_advance")]
    pub auto_advance: bool,
}

fn default_auto_advance() -> bool {
    true
}

impl Default for PreferenceValues {
    fn default() -> Self {
        Self {
            muted: false,
            auto_advance: default_auto_advance(),
        }
    }
}

/// Cross-session viewer preferences shared by every card and the feed.
///
/// Writes are last-write-wins; each write persists the whole value set.
#[derive(Clone)]
pub struct Preferences {
    values: Arc<RwLock<PreferenceValues>>,
    path: Option<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl Preferences {
    /// Preferences that are never persisted
    pub fn in_memory() -> Self {
        Self::with_values(PreferenceValues::default(), None)
    }

    /// Load from a JSON file. A missing or unreadable-as-JSON file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<PreferenceValues>(&text) {
                Ok(values) => values,
                Err(e) => {
                    warn!(
                        "Ignoring corrupt preferences file {}: {}",
                        path.display(),
                        e
                    );
                    PreferenceValues::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No preferences at {}, using defaults", path.display());
                PreferenceValues::default()
            }
            Err(e) => {
                return Err(PreferencesError::Read(
                    path.display().to_string(),
                    e.to_string(),
                ))
            }
        };
        Ok(Self::with_values(values, Some(path)))
    }

    fn with_values(values: PreferenceValues, path: Option<PathBuf>) -> Self {
        Self {
            values: Arc::new(RwLock::new(values)),
            path,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn values(&self) -> PreferenceValues {
        self.values
            .read()
            .map(|values| *values)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }

    pub fn muted(&self) -> bool {
        self.values().muted
    }

    pub fn auto_advance(&self) -> bool {
        self.values().auto_advance
    }

    pub async fn set_muted(&self, muted: bool) -> Result<(), PreferencesError> {
        self.update(|values| values.muted = muted).await
    }

    pub async fn set_auto_advance(&self, auto_advance: bool) -> Result<(), PreferencesError> {
        self.update(|values| values.auto_advance = auto_advance)
            .await
    }

    async fn update(&self, f: impl FnOnce(&mut PreferenceValues)) -> Result<(), PreferencesError> {
        let _write = self.write_lock.lock().await;
        let snapshot = {
            let mut values = self
                .values
                .write()
                .map_err(|_| PreferencesError::Poisoned)?;
            f(&mut values);
            *values
        };

        let Some(path) = &self.path else {
            return Ok(());
        };
        let body = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| PreferencesError::Write(path.display().to_string(), e.to_string()))?;
        tokio::fs::write(path, body)
            .await
            .map_err(|e| PreferencesError::Write(path.display().to_string(), e.to_string()))?;
        debug!("Saved preferences {:?} to {}", snapshot, path.display());
        Ok(())
    }
}
