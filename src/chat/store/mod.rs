//! Document store backends for conversation turns.

pub mod memory_store;
pub mod turn_store;

use std::sync::Arc;

use crate::chat::core::config::{StoreBackend, StoreConfig};
use crate::chat::core::errors::ChatResult;

pub use memory_store::InMemoryTurnStore;
pub use turn_store::{SqliteTurnStore, StoreFuture, TurnStore};

/// Open the store selected by `config`.
///
/// # Errors
/// Returns an error if the backend cannot be opened.
pub async fn open_store(config: &StoreConfig) -> ChatResult<Arc<dyn TurnStore>> {
    let store: Arc<dyn TurnStore> = match config.backend {
        StoreBackend::Sqlite => Arc::new(SqliteTurnStore::new(config).await?),
        StoreBackend::Memory => Arc::new(InMemoryTurnStore::new()),
    };
    Ok(store)
}
