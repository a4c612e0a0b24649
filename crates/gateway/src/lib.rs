//! HTTP API gateway for docbot.
//!
//! Exposes a health check plus the v1 API: context debugging and threaded
//! chat backed by a single shared [`DocBot`].
//!
//! Built on Axum.

pub mod api_v1;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use docbot_agent::DocBot;
use docbot_config::AppConfig;
use docbot_core::error::{Error, ProviderError};
use docbot_retrieval::CorpusStore;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub bot: Arc<DocBot>,
    /// Upper bound for one context build or chat turn.
    pub request_timeout: Duration,
    /// Maximum request body size in bytes.
    pub body_limit: usize,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn from_config(config: &AppConfig, bot: Arc<DocBot>) -> Self {
        Self {
            bot,
            request_timeout: Duration::from_secs(config.gateway.request_timeout_secs),
            body_limit: config.gateway.body_limit_kb * 1024,
        }
    }
}

/// Load the corpus and wire providers into a ready-to-serve bot.
pub fn build_bot(config: &AppConfig) -> Result<DocBot, Error> {
    let corpus = Arc::new(CorpusStore::load(
        &config.corpus.path,
        config.embedding.dimensions,
    )?);

    let router = docbot_providers::build_from_config(config);
    let provider = router.completion().ok_or_else(|| {
        ProviderError::NotConfigured(format!("completion provider {}", config.default_provider))
    })?;
    let embedder = router.embedder().ok_or_else(|| {
        ProviderError::NotConfigured(format!("embedding provider {}", config.embedding.provider))
    })?;

    DocBot::from_config(config, provider, embedder, corpus)
}

/// Build the full router: health, v1 API and the shared layers.
pub fn build_router(state: SharedState) -> Router {
    let body_limit = state.body_limit;

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router())
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let bot = Arc::new(build_bot(&config)?);
    let corpus_entries = bot.fusion().corpus().len();
    let state = Arc::new(GatewayState::from_config(&config, bot));
    let app = build_router(state);

    info!(addr = %addr, corpus_entries, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub corpus_entries: usize,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        corpus_entries: state.bot.fusion().corpus().len(),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use docbot_agent::{Persona, PromptTemplate, TranscriptCache};
    use docbot_core::embedding::{EmbeddingClient, EmbeddingVector};
    use docbot_core::error::EmbeddingError;
    use docbot_core::message::Message;
    use docbot_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use docbot_retrieval::{ContextFusion, CorpusRecord};
    use std::num::NonZeroUsize;

    pub const GREETING: &str = "Hi! I'm Docbot. How may I help?";

    pub struct EchoProvider {
        pub delay: Option<Duration>,
    }

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let last = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(ProviderResponse {
                message: Message::assistant(format!("You asked: {last}")),
                usage: None,
                model: request.model,
            })
        }
    }

    /// Maps texts mentioning "auth" to the y axis, everything else to x.
    pub struct KeywordEmbedder {
        pub fail: bool,
    }

    #[async_trait]
    impl EmbeddingClient for KeywordEmbedder {
        fn name(&self) -> &str {
            "keyword"
        }

        async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbeddingError> {
            if self.fail {
                return Err(ProviderError::Network("unreachable".into()).into());
            }
            if text.contains("auth") {
                EmbeddingVector::new(vec![0.0, 1.0])
            } else {
                EmbeddingVector::new(vec![1.0, 0.0])
            }
        }
    }

    pub fn state_with(
        embedder: KeywordEmbedder,
        provider: EchoProvider,
        timeout: Duration,
    ) -> SharedState {
        let corpus = CorpusStore::from_records(
            vec![
                Some(CorpusRecord::new(
                    "/reference/threads",
                    "Threads",
                    "Threads hold messages.",
                    Some(vec![1.0, 0.0]),
                )),
                Some(CorpusRecord::new(
                    "/reference/auth",
                    "Authentication",
                    "Tokens are signed with the app secret.",
                    Some(vec![0.0, 1.0]),
                )),
            ],
            2,
        )
        .unwrap();

        let persona = Persona {
            name: "Docbot".into(),
            escape_word: "Stumped!".into(),
            first_message: GREETING.into(),
        };
        let fusion = ContextFusion::new(Arc::new(corpus), Arc::new(embedder))
            .with_docs_origin(Some("https://docs.example.com".into()));
        let prompt = PromptTemplate::new("You are BOT_USER_NAME.\nBOT_CONTEXT", &persona).unwrap();
        let transcripts =
            TranscriptCache::new(NonZeroUsize::new(16).unwrap(), Duration::from_secs(60));
        let bot = DocBot::new(
            Arc::new(provider),
            fusion,
            prompt,
            persona,
            transcripts,
            "mock-model",
        );

        Arc::new(GatewayState {
            bot: Arc::new(bot),
            request_timeout: timeout,
            body_limit: 64 * 1024,
        })
    }

    pub fn test_state() -> SharedState {
        state_with(
            KeywordEmbedder { fail: false },
            EchoProvider { delay: None },
            Duration::from_secs(5),
        )
    }
}
