//! The docbot responder.
//!
//! Ties retrieval to the chat provider: every user message in a thread is
//! answered with a system prompt carrying context fused from the latest
//! message and the thread's full transcript.

pub mod prompt;
pub mod responder;
pub mod transcript;

#[cfg(test)]
mod test_helpers;

pub use prompt::{Persona, PromptTemplate};
pub use responder::{BotReply, DocBot, fusion_from_config};
pub use transcript::TranscriptCache;
