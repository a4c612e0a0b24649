//! # docbot core
//!
//! Domain types, traits, and error definitions for docbot, a chatbot that
//! grounds its replies in a pre-embedded documentation corpus.
//! This crate has **zero framework dependencies**; it defines the domain model
//! that all other crates implement against.
//!
//! The two external collaborators are modelled as traits here:
//! - [`EmbeddingClient`] turns query text into an [`EmbeddingVector`]
//! - [`Provider`] turns a rendered prompt plus history into a reply
//!
//! Implementations live in `docbot-providers`; tests use scripted mocks.

pub mod embedding;
pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use embedding::{EmbeddingClient, EmbeddingVector};
pub use error::{Error, Result};
pub use message::{Conversation, ConversationId, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
