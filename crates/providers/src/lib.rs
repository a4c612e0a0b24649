//! LLM provider implementations for docbot.
//!
//! The OpenAI-compatible provider implements both `docbot_core::Provider`
//! (chat completions) and `docbot_core::EmbeddingClient` (query embeddings).
//! The router resolves which configured provider serves each role.

pub mod openai_compat;
pub mod router;

pub use openai_compat::{OpenAiCompatProvider, parse_embedding_response};
pub use router::{ProviderRouter, build_from_config};
