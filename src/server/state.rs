//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::chat::completion::{CompletionSettings, build_backend};
use crate::chat::core::config::ChatConfig;
use crate::chat::core::errors::ChatResult;
use crate::chat::orchestrator::Conversation;
use crate::chat::store::open_store;

/// Shared application state.
///
/// Built once at startup; the store and completion clients inside are reused
/// by every request and never mutated.
pub struct AppState {
    /// Conversation orchestrator.
    pub conversation: Conversation,
}

impl AppState {
    /// Create the application state from configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid, the store cannot be
    /// opened, or the completion client cannot be built.
    pub async fn new(config: &ChatConfig) -> ChatResult<Arc<Self>> {
        config.validate()?;
        let store = open_store(&config.store).await?;
        let completion = build_backend(&config.llm)?;
        let settings = CompletionSettings::from(&config.llm);

        Ok(Self::with_conversation(Conversation::new(
            store, completion, settings,
        )))
    }

    /// Wrap an already-built conversation.
    #[must_use]
    pub fn with_conversation(conversation: Conversation) -> Arc<Self> {
        Arc::new(Self { conversation })
    }
}
