//! JSON file config store
//!
//! Configuration lives in a single pretty-printed `config.json`. Writes go to
//! a temporary file that is renamed over the original, so a concurrent reader
//! sees either the old or the new config, never a torn one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{fs, sync::Mutex};
use tracing::{debug, error, info, trace};

use super::backend::ConfigStore;
use super::error::{StoreError, StoreResult};
use crate::config::Config;

pub const CONFIG_FILE_NAME: &str = "config.json";

/// Config store backed by `<dir>/config.json`
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,

    /// Serializes writers sharing the temporary file
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Store `config.json` inside `dir`; the directory is created on first write
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CONFIG_FILE_NAME),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, config: &Config) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write_locked(config).await
    }

    /// Caller must hold `write_lock`
    async fn write_locked(&self, config: &Config) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(config)?;

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| StoreError::io(dir, e))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .await
            .map_err(|e| StoreError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;

        trace!("wrote configuration to {}", self.path.display());
        Ok(())
    }

    /// Read the file; `None` if it does not exist, defaults if it is unusable
    async fn read(&self) -> Option<Config> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                error!(
                    "failed to read config {}: {e}, falling back to defaults",
                    self.path.display()
                );
                return Some(Config::default());
            }
        };

        match serde_json::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                error!(
                    "failed to load config {}: {e}, falling back to defaults",
                    self.path.display()
                );
                Some(Config::default())
            }
        }
    }

    /// First run: write the defaults unless a writer got there first
    async fn create_default(&self) -> Config {
        let _guard = self.write_lock.lock().await;

        if let Some(config) = self.read().await {
            debug!("configuration appeared while creating defaults");
            return config;
        }

        let config = Config::default();
        match self.write_locked(&config).await {
            Ok(()) => info!("created default configuration at {}", self.path.display()),
            Err(e) => error!("failed to write default configuration: {e}"),
        }
        config
    }
}

#[async_trait]
impl ConfigStore for JsonFileStore {
    /// Never fails: a missing, unreadable or unparsable file yields the defaults
    async fn get_config(&self) -> StoreResult<Config> {
        match self.read().await {
            Some(config) => Ok(config),
            None => Ok(self.create_default().await),
        }
    }

    async fn save_config(&self, config: &Config) -> StoreResult<()> {
        self.write(config).await?;
        info!("configuration saved successfully");
        Ok(())
    }

    async fn reset_config(&self) -> StoreResult<Config> {
        let _guard = self.write_lock.lock().await;

        match fs::remove_file(&self.path).await {
            Ok(()) => debug!("old configuration file deleted"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io(&self.path, e)),
        }

        let config = Config::default();
        self.write_locked(&config).await?;
        info!("configuration reset to defaults and saved");
        Ok(config)
    }
}
