//! Completion service backends.

pub mod azure_openai;
pub mod backend;
pub mod ollama;

use std::sync::Arc;

use crate::chat::core::config::{LlmConfig, LlmProvider};
use crate::chat::core::errors::ChatResult;

pub use azure_openai::AzureOpenAiBackend;
pub use backend::{ChatMessage, CompletionBackend, CompletionFuture, CompletionSettings};
pub use ollama::OllamaBackend;

/// Build the backend selected by `config`.
///
/// # Errors
/// Returns an error if the provider client cannot be built.
pub fn build_backend(config: &LlmConfig) -> ChatResult<Arc<dyn CompletionBackend>> {
    let backend: Arc<dyn CompletionBackend> = match config.provider {
        LlmProvider::AzureOpenAi => Arc::new(AzureOpenAiBackend::new(&config.azure)?),
        LlmProvider::Ollama => Arc::new(OllamaBackend::new(&config.ollama)?),
    };
    Ok(backend)
}
