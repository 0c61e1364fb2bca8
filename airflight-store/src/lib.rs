pub mod app_config;
pub mod firebase;
pub mod memory;
pub mod session;

use std::sync::Arc;

use airflight_core::{RemoteStore, StoreResult};
use tracing::info;

use app_config::{StoreBackend, StoreConfig};

pub use firebase::FirebaseStore;
pub use memory::MemoryStore;
pub use session::{FileSessionStore, MemorySessionStore};

/// Build the remote store selected by `config.backend`.
pub async fn open_remote_store(config: &StoreConfig) -> StoreResult<Arc<dyn RemoteStore>> {
    match config.backend {
        StoreBackend::Firebase => {
            info!("Using realtime database at {}", config.database_url);
            Ok(Arc::new(FirebaseStore::new(config)?))
        }
        StoreBackend::Memory => {
            let store = match &config.seed_file {
                Some(path) => MemoryStore::from_seed_file(path).await?,
                None => MemoryStore::new(),
            };
            info!("Using in-memory store");
            Ok(Arc::new(store))
        }
    }
}
