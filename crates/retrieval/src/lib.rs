//! # docbot-retrieval
//!
//! Grounded context for the documentation bot: a precomputed, embedded
//! corpus held in memory, cosine ranking over it, and the fusion step that
//! turns two rankings into one prompt-sized context string.

pub mod corpus;
pub mod fusion;
pub mod similarity;

pub use corpus::{CorpusEntry, CorpusRecord, CorpusStore};
pub use fusion::{ContextBudget, ContextFusion, FusionQuery, MergeOrder, PackedContext, pack};
pub use similarity::{ScoredEntry, cosine_similarity, rank};
