//! Config store trait definition

use async_trait::async_trait;

use super::error::StoreResult;
use crate::config::Config;

/// Trait for configuration stores
///
/// Readers treat every returned [`Config`] as an immutable snapshot, so
/// implementations may be written to concurrently with reads.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as they are shared between the
/// monitor task and host request handlers.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Current configuration, creating and persisting defaults if none exists
    async fn get_config(&self) -> StoreResult<Config>;

    /// Replace the stored configuration
    async fn save_config(&self, config: &Config) -> StoreResult<()>;

    /// Discard the stored configuration and persist defaults
    async fn reset_config(&self) -> StoreResult<Config>;
}
