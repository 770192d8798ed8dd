use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use monitor_core::{parse_target_url, ConfigChange, MonitorConfig, DEFAULT_TARGET_HOST};
use monitor_logging::{monitor_debug, monitor_info, monitor_warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed settings: {0}")]
    Parse(String),
    #[error("failed to serialize settings: {0}")]
    Serialize(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedSettings {
    #[serde(default)]
    target_url: Option<String>,
    #[serde(default)]
    only_log_filtered_messages: bool,
    #[serde(default)]
    target_host: Option<String>,
}

impl PersistedSettings {
    fn into_config(self) -> MonitorConfig {
        let target_url = self.target_url.and_then(|raw| match parse_target_url(&raw) {
            Ok(url) => Some(url),
            Err(err) => {
                monitor_warn!("Ignoring persisted target url: {}", err);
                None
            }
        });
        MonitorConfig {
            target_url,
            only_log_filtered_messages: self.only_log_filtered_messages,
            target_host: self
                .target_host
                .unwrap_or_else(|| DEFAULT_TARGET_HOST.to_string()),
        }
    }

    fn from_config(config: &MonitorConfig) -> Self {
        Self {
            target_url: config.target_url.as_ref().map(|url| url.to_string()),
            only_log_filtered_messages: config.only_log_filtered_messages,
            target_host: Some(config.target_host.clone()),
        }
    }
}

/// Strict read: `Ok(None)` when the file does not exist.
pub fn read_settings(path: &Path) -> Result<Option<MonitorConfig>, SettingsError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let persisted: PersistedSettings =
        ron::from_str(&content).map_err(|err| SettingsError::Parse(err.to_string()))?;
    Ok(Some(persisted.into_config()))
}

/// Startup read: a missing or unreadable file yields defaults.
pub fn load_settings(path: &Path) -> MonitorConfig {
    match read_settings(path) {
        Ok(Some(config)) => {
            monitor_info!("Loaded settings from {:?}", path);
            config
        }
        Ok(None) => {
            monitor_info!("No settings at {:?}; using defaults", path);
            MonitorConfig::default()
        }
        Err(err) => {
            monitor_warn!("Failed to load settings from {:?}: {}", path, err);
            MonitorConfig::default()
        }
    }
}

/// Atomically replace the settings file (temp file in the same directory, then rename).
pub fn save_settings(path: &Path, config: &MonitorConfig) -> Result<PathBuf, SettingsError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(&PersistedSettings::from_config(config), pretty)
        .map_err(|err| SettingsError::Serialize(err.to_string()))?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|err| SettingsError::Io(err.error))?;
    Ok(path.to_path_buf())
}

/// Shared, last-write-wins configuration. Readers take an immutable snapshot
/// per message and never wait on writers.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    tx: Arc<watch::Sender<Arc<MonitorConfig>>>,
}

impl ConfigHandle {
    pub fn new(config: MonitorConfig) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(config));
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> Arc<MonitorConfig> {
        self.tx.borrow().clone()
    }

    pub fn apply(&self, change: ConfigChange) {
        self.tx.send_modify(|current| {
            let mut next = (**current).clone();
            next.apply(change);
            *current = Arc::new(next);
        });
    }

    /// Replace the whole configuration; returns whether anything changed.
    pub fn replace(&self, config: MonitorConfig) -> bool {
        self.tx.send_if_modified(|current| {
            if **current == config {
                false
            } else {
                *current = Arc::new(config);
                true
            }
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<MonitorConfig>> {
        self.tx.subscribe()
    }
}

/// Poll the settings file and publish changes; stands in for storage change
/// notifications.
pub fn spawn_settings_reloader(
    path: PathBuf,
    handle: ConfigHandle,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match read_settings(&path) {
                Ok(Some(config)) => {
                    if handle.replace(config) {
                        monitor_info!("Settings reloaded from {:?}", path);
                    }
                }
                Ok(None) => monitor_debug!("Settings file {:?} not present", path),
                Err(err) => monitor_warn!("Keeping current settings; reload failed: {}", err),
            }
        }
    })
}
