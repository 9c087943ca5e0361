//! Ollama chat completions through Rig, for local runs.

use reqwest::Client as ReqwestClient;
use rig::client::CompletionClient;
use rig::completion::CompletionModel;
use rig::message::{AssistantContent, Message};
use rig::providers::ollama;
use tracing::debug;

use crate::chat::completion::backend::{
    ChatMessage, CompletionBackend, CompletionFuture, CompletionSettings,
};
use crate::chat::core::config::OllamaConfig;
use crate::chat::core::errors::{ChatError, ChatResult};
use crate::chat::turn::TurnRole;

/// Ollama completion backend.
pub struct OllamaBackend {
    model: ollama::CompletionModel,
}

impl OllamaBackend {
    /// Create a new Ollama backend.
    ///
    /// # Errors
    /// Returns an error if the Ollama client cannot be built.
    pub fn new(config: &OllamaConfig) -> ChatResult<Self> {
        let builder = ollama::Client::<ReqwestClient>::builder().api_key(rig::client::Nothing);
        let builder = if let Some(base_url) = &config.base_url {
            builder.base_url(base_url)
        } else {
            builder
        };
        let client = builder.build().map_err(ChatError::from)?;
        let model = client.completion_model(config.model.clone());

        Ok(Self { model })
    }

    async fn chat(
        &self,
        history: &[ChatMessage],
        settings: CompletionSettings,
    ) -> ChatResult<Vec<String>> {
        // Rig takes the newest message as the prompt and the rest as chat history.
        let Some((prompt, earlier)) = history.split_last() else {
            return Ok(Vec::new());
        };

        debug!(messages = history.len(), "requesting ollama completion");
        let request = self
            .model
            .completion_request(to_rig_message(prompt))
            .messages(earlier.iter().map(to_rig_message).collect())
            .temperature(settings.temperature)
            .max_tokens_opt(Some(settings.max_tokens))
            .build();

        let response = self.model.completion(request).await?;
        let text = extract_text(&response.choice);
        if text.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![text])
    }
}

impl CompletionBackend for OllamaBackend {
    fn complete<'a>(
        &'a self,
        history: &'a [ChatMessage],
        settings: CompletionSettings,
    ) -> CompletionFuture<'a, ChatResult<Vec<String>>> {
        Box::pin(self.chat(history, settings))
    }
}

fn to_rig_message(message: &ChatMessage) -> Message {
    match message.role {
        TurnRole::User => Message::user(message.content.clone()),
        TurnRole::Assistant => Message::assistant(message.content.clone()),
    }
}

fn extract_text(choice: &rig::OneOrMany<AssistantContent>) -> String {
    let mut out = String::new();
    for content in choice.iter() {
        if let AssistantContent::Text(text) = content {
            out.push_str(&text.text);
        }
    }
    out
}
