//! v1 API: context debugging and threaded chat.
//!
//! | Method | Path                              | Purpose                      |
//! |--------|-----------------------------------|------------------------------|
//! | POST   | `/v1/context`                     | Build context for a message  |
//! | POST   | `/v1/threads/{thread_id}`         | Start a thread (greeting)    |
//! | POST   | `/v1/threads/{thread_id}/messages`| Post a message, get a reply  |
//! | GET    | `/v1/threads/{thread_id}`         | Read a cached transcript     |
//!
//! Upstream failures (embedding service, chat provider) are `502`, a turn
//! exceeding the configured request timeout is `504`.

use std::future::Future;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use docbot_core::error::Error;
use docbot_core::message::{Conversation, Message, Role};
use docbot_retrieval::fusion::PackedPassage;
use docbot_retrieval::FusionQuery;

use crate::SharedState;

/// Build the v1 router. State is supplied by the caller.
pub fn v1_router() -> Router<SharedState> {
    Router::new()
        .route("/context", post(context_handler))
        .route(
            "/threads/{thread_id}",
            post(start_thread_handler).get(get_thread_handler),
        )
        .route("/threads/{thread_id}/messages", post(post_message_handler))
}

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct ContextRequest {
    pub message: String,
    /// Defaults to `message` when absent.
    #[serde(default)]
    pub transcript: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct PassageDto {
    pub url: String,
    pub title: String,
    pub similarity: f32,
    pub chars: usize,
}

impl From<PackedPassage> for PassageDto {
    fn from(p: PackedPassage) -> Self {
        Self {
            url: p.url,
            title: p.title,
            similarity: p.similarity,
            chars: p.chars,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ContextResponse {
    pub context: String,
    pub chars: usize,
    pub passages: Vec<PassageDto>,
}

#[derive(Serialize, Deserialize)]
pub struct MessageDto {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub timestamp: String,
}

impl From<&Message> for MessageDto {
    fn from(m: &Message) -> Self {
        let role = match m.role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        };
        Self {
            role: role.into(),
            content: m.content.clone(),
            author: m.author.clone(),
            timestamp: m.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct StartThreadResponse {
    pub thread_id: String,
    pub greeting: MessageDto,
}

#[derive(Serialize, Deserialize)]
pub struct PostMessageRequest {
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct PostMessageResponse {
    /// `None` when the bot declined to answer.
    pub reply: Option<MessageDto>,
    #[serde(default)]
    pub passages: Vec<PassageDto>,
}

#[derive(Serialize, Deserialize)]
pub struct ThreadResponse {
    pub thread_id: String,
    pub messages: Vec<MessageDto>,
}

impl From<&Conversation> for ThreadResponse {
    fn from(c: &Conversation) -> Self {
        Self {
            thread_id: c.id.0.clone(),
            messages: c.messages.iter().map(MessageDto::from).collect(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

fn upstream_error(e: Error) -> ApiError {
    let status = match &e {
        Error::Embedding(_) | Error::Provider(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(error = %e, status = status.as_u16(), "Request failed");
    api_error(status, e.to_string())
}

/// Run `fut` under the gateway's request timeout.
async fn with_timeout<T, F>(state: &SharedState, fut: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, Error>>,
{
    match tokio::time::timeout(state.request_timeout, fut).await {
        Ok(result) => result.map_err(upstream_error),
        Err(_) => {
            warn!(
                timeout_secs = state.request_timeout.as_secs_f64(),
                "Request timed out"
            );
            Err(api_error(
                StatusCode::GATEWAY_TIMEOUT,
                "Upstream did not answer in time",
            ))
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn context_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ContextRequest>,
) -> Result<Json<ContextResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "message must not be empty"));
    }

    let transcript = payload.transcript.as_deref().unwrap_or(&payload.message);
    let query = FusionQuery {
        latest: &payload.message,
        transcript,
    };

    let packed = with_timeout(&state, async {
        state.bot.fusion().build(query).await.map_err(Error::from)
    })
    .await?;

    info!(
        passages = packed.passages.len(),
        chars = packed.chars(),
        "v1/context request"
    );

    Ok(Json(ContextResponse {
        chars: packed.chars(),
        context: packed.text,
        passages: packed.passages.into_iter().map(PassageDto::from).collect(),
    }))
}

async fn start_thread_handler(
    State(state): State<SharedState>,
    Path(thread_id): Path<String>,
) -> (StatusCode, Json<StartThreadResponse>) {
    let greeting = state.bot.start_thread(&thread_id);
    (
        StatusCode::CREATED,
        Json(StartThreadResponse {
            thread_id,
            greeting: MessageDto::from(&greeting),
        }),
    )
}

async fn post_message_handler(
    State(state): State<SharedState>,
    Path(thread_id): Path<String>,
    Json(payload): Json<PostMessageRequest>,
) -> Result<Json<PostMessageResponse>, ApiError> {
    if payload.content.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "content must not be empty"));
    }

    let mut message = Message::user(payload.content);
    if let Some(author) = payload.author {
        message = message.with_author(author);
    }

    let reply = with_timeout(&state, state.bot.respond(&thread_id, message)).await?;

    Ok(Json(match reply {
        Some(reply) => PostMessageResponse {
            reply: Some(MessageDto::from(&reply.message)),
            passages: reply.passages.into_iter().map(PassageDto::from).collect(),
        },
        None => PostMessageResponse {
            reply: None,
            passages: Vec::new(),
        },
    }))
}

async fn get_thread_handler(
    State(state): State<SharedState>,
    Path(thread_id): Path<String>,
) -> Result<Json<ThreadResponse>, ApiError> {
    state
        .bot
        .thread(&thread_id)
        .map(|conversation| Json(ThreadResponse::from(&conversation)))
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("thread {thread_id} not found")))
}
