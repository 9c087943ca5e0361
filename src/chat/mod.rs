//! Session-scoped chat relay.
//!
//! - `core`: configuration, errors and identifiers
//! - `turn`: the persisted turn document
//! - `store`: turn store trait with `SQLite` and in-memory backends
//! - `completion`: completion service trait with Azure OpenAI and Ollama backends
//! - `orchestrator`: the read, persist, complete, persist sequence

pub mod completion;
pub mod core;
pub mod orchestrator;
pub mod store;
pub mod turn;

#[cfg(test)]
pub(crate) mod testing;

pub use completion::{
    AzureOpenAiBackend, ChatMessage, CompletionBackend, CompletionSettings, OllamaBackend,
    build_backend,
};
pub use core::{ChatConfig, ChatError, ChatResult, SessionId, TurnId};
pub use orchestrator::{Conversation, NO_RESPONSE, build_history};
pub use store::{InMemoryTurnStore, SqliteTurnStore, TurnStore, open_store};
pub use turn::{Turn, TurnRole};
