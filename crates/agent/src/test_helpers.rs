//! Scripted collaborators shared by the agent tests.

use std::sync::{Arc, Mutex};

use docbot_core::embedding::{EmbeddingClient, EmbeddingVector};
use docbot_core::error::{EmbeddingError, ProviderError};
use docbot_core::message::Message;
use docbot_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use docbot_retrieval::{CorpusRecord, CorpusStore};

/// Two-dimensional corpus: a "threads" passage on the x axis and an
/// "auth" passage on the y axis.
pub fn corpus() -> Arc<CorpusStore> {
    let records = vec![
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
    ];
    Arc::new(CorpusStore::from_records(records, 2).unwrap())
}

/// Returns the same vector for every text, or always fails.
pub struct StaticEmbedder {
    vector: Option<Vec<f32>>,
}

impl StaticEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector: Some(vector),
        }
    }

    pub fn failing() -> Self {
        Self { vector: None }
    }
}

#[async_trait::async_trait]
impl EmbeddingClient for StaticEmbedder {
    fn name(&self) -> &str {
        "static"
    }

    async fn embed(&self, _text: &str) -> Result<EmbeddingVector, EmbeddingError> {
        match &self.vector {
            Some(values) => EmbeddingVector::new(values.clone()),
            None => Err(ProviderError::ApiError {
                status_code: 500,
                message: "embedding backend down".into(),
            }
            .into()),
        }
    }
}

/// Replies with fixed text and keeps the last request for inspection.
pub struct RecordingProvider {
    reply: String,
    last_request: Mutex<Option<ProviderRequest>>,
}

impl RecordingProvider {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            last_request: Mutex::new(None),
        }
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for RecordingProvider {
    fn name(&self) -> &str {
        "recording_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        *self.last_request.lock().unwrap() = Some(request);
        Ok(ProviderResponse {
            message: Message::assistant(&self.reply),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model,
        })
    }
}

/// Always fails with the given error.
pub struct FailingProvider(pub ProviderError);

#[async_trait::async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(self.0.clone())
    }
}
