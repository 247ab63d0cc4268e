//! Configuration persistence
//!
//! The monitor only ever calls [`ConfigStore::get_config`]; saving and
//! resetting are host operations.
//!
//! ## Backends
//!
//! - **JSON file** (default): `config.json` in the watchdog's config directory,
//!   created with defaults on first read
//! - **In-memory**: no persistence, for tests and embedding
//!
//! ## Usage
//!
//! ```no_run
//! use portal_watchdog::store::{ConfigStore, json::JsonFileStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = JsonFileStore::new("./watchdog");
//!     let config = store.get_config().await?;
//!     println!("probing {}", config.ping_target);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod json;
pub mod memory;

pub use backend::ConfigStore;
pub use error::{StoreError, StoreResult};
