//! Provider router: selects the completion and embedding backends from config.
//!
//! Completions and query embeddings may come from different providers
//! (`default_provider` vs `embedding.provider`); both are resolved here once
//! at startup and shared via `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use docbot_core::embedding::EmbeddingClient;
use docbot_core::provider::Provider;

use crate::openai_compat::OpenAiCompatProvider;

/// Routes requests to the configured providers.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<OpenAiCompatProvider>>,
    completion_provider: String,
    embedding_provider: String,
}

impl ProviderRouter {
    /// Create an empty router naming the completion and embedding providers.
    pub fn new(
        completion_provider: impl Into<String>,
        embedding_provider: impl Into<String>,
    ) -> Self {
        Self {
            providers: HashMap::new(),
            completion_provider: completion_provider.into(),
            embedding_provider: embedding_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<OpenAiCompatProvider>) {
        self.providers.insert(name.into(), provider);
    }

    /// The provider used for chat completions.
    pub fn completion(&self) -> Option<Arc<dyn Provider>> {
        self.providers
            .get(&self.completion_provider)
            .map(|p| p.clone() as Arc<dyn Provider>)
    }

    /// The client used for query embeddings.
    pub fn embedder(&self) -> Option<Arc<dyn EmbeddingClient>> {
        self.providers
            .get(&self.embedding_provider)
            .map(|p| p.clone() as Arc<dyn EmbeddingClient>)
    }

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
pub fn build_from_config(config: &docbot_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider, &config.embedding.provider);

    let mut names: Vec<String> = config.providers.keys().cloned().collect();
    for required in [&config.default_provider, &config.embedding.provider] {
        if !names.contains(required) {
            names.push(required.clone());
        }
    }

    for name in names {
        let provider_config = config.providers.get(&name).cloned().unwrap_or_default();

        let api_key = provider_config
            .api_key
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        let base_url = provider_config
            .api_url
            .unwrap_or_else(|| default_base_url(&name));

        let provider = OpenAiCompatProvider::new(&name, &base_url, &api_key)
            .with_embedding_model(&config.embedding.model);

        router.register(name, Arc::new(provider));
    }

    router
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        "mistral" => "https://api.mistral.ai/v1",
        _ => "https://api.openai.com/v1",
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docbot_config::{AppConfig, ProviderConfig};

    #[test]
    fn default_config_builds_both_roles() {
        let router = build_from_config(&AppConfig::default());
        assert_eq!(router.completion().unwrap().name(), "openai");
        assert_eq!(router.embedder().unwrap().name(), "openai");
        assert_eq!(router.list(), vec!["openai"]);
    }

    #[test]
    fn split_providers() {
        let mut config = AppConfig::default();
        config.default_provider = "openrouter".into();
        config.embedding.provider = "ollama".into();
        config.providers.insert(
            "ollama".into(),
            ProviderConfig {
                api_key: None,
                api_url: Some("http://gpu-box:11434/v1".into()),
            },
        );

        let router = build_from_config(&config);
        assert_eq!(router.completion().unwrap().name(), "openrouter");
        assert_eq!(router.embedder().unwrap().name(), "ollama");
        assert_eq!(router.list(), vec!["ollama", "openrouter"]);
    }

    #[test]
    fn unknown_provider_falls_back_to_openai_url() {
        assert_eq!(default_base_url("acme"), "https://api.openai.com/v1");
        assert_eq!(default_base_url("groq"), "https://api.groq.com/openai/v1");
    }
}
