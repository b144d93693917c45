//! HTTP adapters for the owning backend and the configuration table.
//!
//! ```ignore
//! let settings = BackendSettings::load()?;
//! let client = BackendClient::new(settings.clone())?;
//! let store = RestConfigurationStore::new(&settings)?;
//! let service = ConfigurationService::new(store, client);
//! ```

mod client;
mod rest_store;
mod settings;

pub use client::BackendClient;
pub use rest_store::{ConfigurationRow, RestConfigurationStore};
pub use settings::BackendSettings;
