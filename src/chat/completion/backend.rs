//! Completion service abstraction.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::chat::core::config::LlmConfig;
use crate::chat::core::errors::ChatResult;
use crate::chat::turn::TurnRole;

/// Boxed future type for completion operations.
pub type CompletionFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One role-tagged entry of the history sent to the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who said it.
    pub role: TurnRole,
    /// What was said.
    pub content: String,
}

impl ChatMessage {
    /// Build a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Build an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Execution parameters for a completion call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompletionSettings {
    /// Maximum reply length in tokens.
    pub max_tokens: u64,
    /// Sampling temperature.
    pub temperature: f64,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

impl From<&LlmConfig> for CompletionSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// Chat completion service.
pub trait CompletionBackend: Send + Sync {
    /// Complete `history` and return the candidate replies, best first.
    ///
    /// An empty vector means the service produced no candidate.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response is malformed.
    fn complete<'a>(
        &'a self,
        history: &'a [ChatMessage],
        settings: CompletionSettings,
    ) -> CompletionFuture<'a, ChatResult<Vec<String>>>;
}
