//! In-memory config store (no persistence)

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::backend::ConfigStore;
use super::error::StoreResult;
use crate::config::Config;

/// Config store keeping a single [`Config`] in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    config: RwLock<Config>,
}

impl MemoryStore {
    pub fn new(config: Config) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get_config(&self) -> StoreResult<Config> {
        Ok(self.config.read().await.clone())
    }

    async fn save_config(&self, config: &Config) -> StoreResult<()> {
        *self.config.write().await = config.clone();
        Ok(())
    }

    async fn reset_config(&self) -> StoreResult<Config> {
        let config = Config::default();
        *self.config.write().await = config.clone();
        Ok(config)
    }
}
