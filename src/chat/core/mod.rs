//! Core chat relay types: configuration, errors and identifiers.

pub mod config;
pub mod errors;
pub mod ids;

pub use config::{
    AzureOpenAiConfig, ChatConfig, LlmConfig, LlmProvider, OllamaConfig, ServerConfig,
    StoreBackend, StoreConfig, DEFAULT_PORT,
};
pub use errors::{ChatError, ChatResult};
pub use ids::{SessionId, TurnId};
