//! Configuration for the chat relay.
//!
//! Values come from environment variables; everything has a default except
//! the Azure OpenAI deployment, endpoint and key, which `validate` requires
//! when that provider is selected.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::chat::core::errors::{ChatError, ChatResult};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Top-level configuration for the relay.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Document store settings.
    pub store: StoreConfig,
    /// Completion service settings.
    pub llm: LlmConfig,
}

impl ChatConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns an error if a numeric or enumerated variable cannot be parsed.
    pub fn from_env() -> ChatResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unset and empty variables both fall back to the default.
    ///
    /// # Errors
    /// Returns an error if a numeric or enumerated variable cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> ChatResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(port) = get("CHAT_RELAY_PORT") {
            config.server.port = parse_var("CHAT_RELAY_PORT", &port)?;
        }

        if let Some(backend) = get("CHAT_RELAY_STORE") {
            config.store.backend = parse_var("CHAT_RELAY_STORE", &backend)?;
        }
        if let Some(endpoint) = get("CHAT_RELAY_STORE_ENDPOINT") {
            config.store.endpoint = PathBuf::from(endpoint);
        }
        if let Some(database) = get("CHAT_RELAY_DATABASE") {
            config.store.database = database;
        }
        if let Some(container) = get("CHAT_RELAY_CONTAINER") {
            config.store.container = container;
        }

        if let Some(provider) = get("CHAT_RELAY_PROVIDER") {
            config.llm.provider = parse_var("CHAT_RELAY_PROVIDER", &provider)?;
        }
        if let Some(deployment) = get("AZURE_OPENAI_DEPLOYMENT_NAME") {
            config.llm.azure.deployment = deployment;
        }
        if let Some(endpoint) = get("AZURE_OPENAI_ENDPOINT") {
            config.llm.azure.endpoint = endpoint;
        }
        if let Some(api_key) = get("AZURE_OPENAI_API_KEY") {
            config.llm.azure.api_key = api_key;
        }
        if let Some(api_version) = get("AZURE_OPENAI_API_VERSION") {
            config.llm.azure.api_version = api_version;
        }
        config.llm.ollama.base_url = get("CHAT_RELAY_OLLAMA_URL");
        if let Some(model) = get("CHAT_RELAY_OLLAMA_MODEL") {
            config.llm.ollama.model = model;
        }
        if let Some(max_tokens) = get("CHAT_RELAY_MAX_TOKENS") {
            config.llm.max_tokens = parse_var("CHAT_RELAY_MAX_TOKENS", &max_tokens)?;
        }
        if let Some(temperature) = get("CHAT_RELAY_TEMPERATURE") {
            config.llm.temperature = parse_var("CHAT_RELAY_TEMPERATURE", &temperature)?;
        }

        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> ChatResult<()> {
        if self.store.backend == StoreBackend::Sqlite {
            if !is_plain_identifier(&self.store.container) {
                return Err(ChatError::InvalidConfig(format!(
                    "store.container must be a plain identifier, got {:?}",
                    self.store.container
                )));
            }
            if self.store.database.trim().is_empty() {
                return Err(ChatError::InvalidConfig(
                    "store.database must not be empty".to_string(),
                ));
            }
        }

        if self.llm.max_tokens == 0 {
            return Err(ChatError::InvalidConfig(
                "llm.max_tokens must be > 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ChatError::InvalidConfig(format!(
                "llm.temperature must be within [0, 2], got {}",
                self.llm.temperature
            )));
        }

        match self.llm.provider {
            LlmProvider::AzureOpenAi => {
                let azure = &self.llm.azure;
                for (name, value) in [
                    ("AZURE_OPENAI_DEPLOYMENT_NAME", &azure.deployment),
                    ("AZURE_OPENAI_ENDPOINT", &azure.endpoint),
                    ("AZURE_OPENAI_API_KEY", &azure.api_key),
                ] {
                    if value.trim().is_empty() {
                        return Err(ChatError::InvalidConfig(format!("{name} must be set")));
                    }
                }
                Url::parse(&azure.endpoint)?;
            }
            LlmProvider::Ollama => {
                if let Some(base_url) = &self.llm.ollama.base_url {
                    Url::parse(base_url)?;
                }
            }
        }

        Ok(())
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

/// Document store backend selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// `SQLite` file holding one table per container.
    Sqlite,
    /// Process-local store, lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            _ => Err(format!("unknown store backend {value:?}")),
        }
    }
}

/// Document store settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Which backend to open.
    pub backend: StoreBackend,
    /// Directory holding the database file.
    pub endpoint: PathBuf,
    /// Database name, used as the file stem.
    pub database: String,
    /// Container (table) holding turn documents.
    pub container: String,
}

impl StoreConfig {
    /// Path of the `SQLite` database file.
    #[must_use]
    pub fn sqlite_path(&self) -> PathBuf {
        self.endpoint.join(format!("{}.sqlite", self.database))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            endpoint: PathBuf::from("."),
            database: "chat_relay".to_string(),
            container: "turns".to_string(),
        }
    }
}

/// Completion provider selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// Azure OpenAI chat completions.
    #[serde(rename = "azure_openai")]
    AzureOpenAi,
    /// Ollama through Rig.
    Ollama,
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "azure_openai" => Ok(Self::AzureOpenAi),
            "ollama" => Ok(Self::Ollama),
            _ => Err(format!("unknown completion provider {value:?}")),
        }
    }
}

/// Completion model settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Which provider answers completions.
    pub provider: LlmProvider,
    /// Maximum reply length in tokens.
    pub max_tokens: u64,
    /// Sampling temperature.
    pub temperature: f64,
    /// Azure OpenAI settings.
    pub azure: AzureOpenAiConfig,
    /// Ollama settings.
    pub ollama: OllamaConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::AzureOpenAi,
            max_tokens: 1000,
            temperature: 0.7,
            azure: AzureOpenAiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// Azure OpenAI deployment settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AzureOpenAiConfig {
    /// Deployment name.
    pub deployment: String,
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    /// API key.
    #[serde(skip_serializing)]
    pub api_key: String,
    /// REST `api-version` query value.
    pub api_version: String,
}

impl Default for AzureOpenAiConfig {
    fn default() -> Self {
        Self {
            deployment: String::new(),
            endpoint: String::new(),
            api_key: String::new(),
            api_version: "2024-06-01".to_string(),
        }
    }
}

/// Ollama settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama completion model name.
    pub model: String,
    /// Optional custom base URL.
    pub base_url: Option<String>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: "ministral-3:8b-instruct-2512-q8_0".to_string(),
            base_url: None,
        }
    }
}

fn parse_var<T>(name: &str, value: &str) -> ChatResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err| ChatError::InvalidConfig(format!("{name}: {err}")))
}

fn is_plain_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    fn azure_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("AZURE_OPENAI_DEPLOYMENT_NAME", "gpt-4o"),
            ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com"),
            ("AZURE_OPENAI_API_KEY", "secret"),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = ChatConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.container, "turns");
        assert_eq!(config.llm.provider, LlmProvider::AzureOpenAi);
        assert_eq!(config.llm.max_tokens, 1000);
        assert!((config.llm.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.store.sqlite_path(), PathBuf::from("./chat_relay.sqlite"));
    }

    #[test]
    fn test_azure_requires_credentials() {
        let config = ChatConfig::from_lookup(lookup(&[])).unwrap();
        assert!(matches!(config.validate(), Err(ChatError::InvalidConfig(_))));

        let config = ChatConfig::from_lookup(lookup(&azure_vars())).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let mut vars = azure_vars();
        vars.extend([
            ("CHAT_RELAY_PORT", "8080"),
            ("CHAT_RELAY_STORE", "memory"),
            ("CHAT_RELAY_CONTAINER", "history"),
            ("CHAT_RELAY_MAX_TOKENS", "256"),
            ("CHAT_RELAY_TEMPERATURE", "0.2"),
        ]);
        let config = ChatConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.container, "history");
        assert_eq!(config.llm.max_tokens, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unparseable_values_are_rejected() {
        let result = ChatConfig::from_lookup(lookup(&[("CHAT_RELAY_PORT", "eighty")]));
        assert!(matches!(result, Err(ChatError::InvalidConfig(_))));

        let result = ChatConfig::from_lookup(lookup(&[("CHAT_RELAY_PROVIDER", "bard")]));
        assert!(matches!(result, Err(ChatError::InvalidConfig(_))));
    }

    #[test]
    fn test_container_must_be_identifier() {
        let mut vars = azure_vars();
        vars.push(("CHAT_RELAY_CONTAINER", "turns; DROP TABLE x"));
        let config = ChatConfig::from_lookup(lookup(&vars)).unwrap();
        assert!(matches!(config.validate(), Err(ChatError::InvalidConfig(_))));
    }

    #[test]
    fn test_ollama_needs_no_credentials() {
        let config = ChatConfig::from_lookup(lookup(&[
            ("CHAT_RELAY_PROVIDER", "ollama"),
            ("CHAT_RELAY_OLLAMA_URL", "http://127.0.0.1:11434"),
        ]))
        .unwrap();
        assert_eq!(config.llm.provider, LlmProvider::Ollama);
        assert!(config.validate().is_ok());

        let config = ChatConfig::from_lookup(lookup(&[
            ("CHAT_RELAY_PROVIDER", "ollama"),
            ("CHAT_RELAY_OLLAMA_URL", "not a url"),
        ]))
        .unwrap();
        assert!(matches!(config.validate(), Err(ChatError::Url(_))));
    }
}
