//! Azure OpenAI chat completions over REST.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::chat::completion::backend::{
    ChatMessage, CompletionBackend, CompletionFuture, CompletionSettings,
};
use crate::chat::core::config::AzureOpenAiConfig;
use crate::chat::core::errors::{ChatError, ChatResult};

/// Connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Client timeout for long-running generations.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    messages: Vec<RequestMessage<'a>>,
    max_tokens: u64,
    temperature: f64,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Azure OpenAI deployment client.
pub struct AzureOpenAiBackend {
    client: Client,
    url: Url,
}

impl AzureOpenAiBackend {
    /// Create a client for the configured deployment.
    ///
    /// # Errors
    /// Returns an error if the endpoint is invalid, the key is not a valid
    /// header value, or the HTTP client cannot be built.
    pub fn new(config: &AzureOpenAiConfig) -> ChatResult<Self> {
        let url = completions_url(config)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut api_key = HeaderValue::from_str(&config.api_key).map_err(|err| {
            ChatError::InvalidConfig(format!("invalid AZURE_OPENAI_API_KEY header value: {err}"))
        })?;
        api_key.set_sensitive(true);
        headers.insert("api-key", api_key);

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(CLIENT_TIMEOUT)
            .build()?;

        Ok(Self { client, url })
    }

    async fn post_completion(
        &self,
        history: &[ChatMessage],
        settings: CompletionSettings,
    ) -> ChatResult<Vec<String>> {
        let request = ChatCompletionRequest {
            messages: history
                .iter()
                .map(|message| RequestMessage {
                    role: message.role.as_str(),
                    content: &message.content,
                })
                .collect(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        };

        debug!(messages = history.len(), "requesting azure openai completion");
        let response = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::CompletionStatus {
                status: status.as_u16(),
                body,
            });
        }

        let response = response.json::<ChatCompletionResponse>().await?;
        Ok(candidates(response))
    }
}

impl CompletionBackend for AzureOpenAiBackend {
    fn complete<'a>(
        &'a self,
        history: &'a [ChatMessage],
        settings: CompletionSettings,
    ) -> CompletionFuture<'a, ChatResult<Vec<String>>> {
        Box::pin(self.post_completion(history, settings))
    }
}

/// `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version=...`
fn completions_url(config: &AzureOpenAiConfig) -> ChatResult<Url> {
    let base = format!("{}/", config.endpoint.trim_end_matches('/'));
    let mut url = Url::parse(&base)?.join(&format!(
        "openai/deployments/{}/chat/completions",
        config.deployment
    ))?;
    url.query_pairs_mut()
        .append_pair("api-version", &config.api_version);
    Ok(url)
}

fn candidates(response: ChatCompletionResponse) -> Vec<String> {
    response
        .choices
        .into_iter()
        .map(|choice| {
            choice
                .message
                .and_then(|message| message.content)
                .unwrap_or_default()
        })
        .collect()
}
