//! Context fusion: two rankings in, one budget-bounded context string out.
//!
//! For each request the latest message and the whole transcript are embedded
//! independently. Each vector ranks the full corpus, the two rankings are
//! concatenated according to [`MergeOrder`], and the merged walk is packed:
//!
//! - passages are deduplicated by their exact text;
//! - a passage is accepted only while the joined output stays strictly
//!   under the [`ContextBudget`] (in Unicode scalar values, separators
//!   included);
//! - the first passage that does not fit ends the walk. Later passages are
//!   less relevant, so nothing after it is considered.
//!
//! Either embedding call failing fails the whole build. There is no partial
//! or empty fallback.

use std::collections::HashSet;
use std::sync::Arc;

use docbot_core::embedding::EmbeddingClient;
use docbot_core::error::EmbeddingError;
use serde::Serialize;
use tracing::debug;

use crate::corpus::{CorpusStore, resolve_url};
use crate::similarity::{ScoredEntry, rank};

pub const DEFAULT_SEPARATOR: &str = "\n\n";

/// Maximum length of an assembled context, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget(usize);

impl ContextBudget {
    /// `None` for a zero budget.
    pub fn new(max_chars: usize) -> Option<Self> {
        (max_chars > 0).then_some(Self(max_chars))
    }

    pub fn max_chars(&self) -> usize {
        self.0
    }
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self(8000)
    }
}

/// Which ranking the packer walks first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeOrder {
    /// Latest-message ranking, then transcript ranking.
    #[default]
    LatestMessageFirst,
    /// Transcript ranking, then latest-message ranking.
    TranscriptFirst,
}

impl MergeOrder {
    /// Concatenate the two rankings in this order.
    pub fn merge<'a>(
        self,
        latest: Vec<ScoredEntry<'a>>,
        transcript: Vec<ScoredEntry<'a>>,
    ) -> Vec<ScoredEntry<'a>> {
        let (mut first, second) = match self {
            Self::LatestMessageFirst => (latest, transcript),
            Self::TranscriptFirst => (transcript, latest),
        };
        first.extend(second);
        first
    }
}

/// The two query texts of one context build.
#[derive(Debug, Clone, Copy)]
pub struct FusionQuery<'a> {
    pub latest: &'a str,
    pub transcript: &'a str,
}

/// A passage accepted into a context.
#[derive(Debug, Clone, Serialize)]
pub struct PackedPassage {
    pub url: String,
    pub title: String,
    pub similarity: f32,
    pub chars: usize,
}

/// The result of a context build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PackedContext {
    pub text: String,
    pub passages: Vec<PackedPassage>,
}

impl PackedContext {
    /// Length of `text` in characters.
    pub fn chars(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Deduplicate and pack an already-merged walk under `budget`.
pub fn pack<'a, I>(candidates: I, budget: ContextBudget, separator: &str) -> PackedContext
where
    I: IntoIterator<Item = ScoredEntry<'a>>,
{
    let separator_chars = separator.chars().count();
    let mut seen: HashSet<&'a str> = HashSet::new();
    let mut accepted: Vec<&'a str> = Vec::new();
    let mut passages = Vec::new();
    let mut running = 0usize;

    for scored in candidates {
        let text = scored.entry.text();
        if seen.contains(text) {
            continue;
        }

        let chars = text.chars().count();
        let joining = if accepted.is_empty() { 0 } else { separator_chars };
        if running + joining + chars >= budget.max_chars() {
            break;
        }

        seen.insert(text);
        accepted.push(text);
        running += joining + chars;
        passages.push(PackedPassage {
            url: scored.entry.url().to_string(),
            title: scored.entry.title().to_string(),
            similarity: scored.similarity,
            chars,
        });
    }

    PackedContext {
        text: accepted.join(separator),
        passages,
    }
}

/// Builds prompt context from the corpus for one conversation turn.
pub struct ContextFusion {
    corpus: Arc<CorpusStore>,
    embedder: Arc<dyn EmbeddingClient>,
    budget: ContextBudget,
    separator: String,
    merge_order: MergeOrder,
    docs_origin: Option<String>,
}

impl ContextFusion {
    pub fn new(corpus: Arc<CorpusStore>, embedder: Arc<dyn EmbeddingClient>) -> Self {
        Self {
            corpus,
            embedder,
            budget: ContextBudget::default(),
            separator: DEFAULT_SEPARATOR.to_string(),
            merge_order: MergeOrder::default(),
            docs_origin: None,
        }
    }

    pub fn with_budget(mut self, budget: ContextBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_merge_order(mut self, merge_order: MergeOrder) -> Self {
        self.merge_order = merge_order;
        self
    }

    /// Origin used to turn relative passage URLs into absolute ones.
    pub fn with_docs_origin(mut self, origin: Option<String>) -> Self {
        self.docs_origin = origin;
        self
    }

    pub fn corpus(&self) -> &CorpusStore {
        &self.corpus
    }

    pub fn budget(&self) -> ContextBudget {
        self.budget
    }

    pub fn merge_order(&self) -> MergeOrder {
        self.merge_order
    }

    /// Build the context and report which passages went into it.
    pub async fn build(&self, query: FusionQuery<'_>) -> Result<PackedContext, EmbeddingError> {
        if self.corpus.is_empty() {
            debug!("Corpus is empty, skipping context build");
            return Ok(PackedContext::default());
        }

        let (latest, transcript) = futures::future::try_join(
            self.embedder.embed(query.latest),
            self.embedder.embed(query.transcript),
        )
        .await?;

        let dimensions = self.corpus.dimensions();
        latest.ensure_dimensions(dimensions)?;
        transcript.ensure_dimensions(dimensions)?;

        let merged = self.merge_order.merge(
            rank(&self.corpus, latest.as_slice()),
            rank(&self.corpus, transcript.as_slice()),
        );

        let mut packed = pack(merged, self.budget, &self.separator);
        for passage in &mut packed.passages {
            passage.url = resolve_url(&passage.url, self.docs_origin.as_deref());
            debug!(similarity = passage.similarity, url = %passage.url, "Context passage");
        }

        debug!(
            passages = packed.passages.len(),
            chars = packed.chars(),
            budget = self.budget.max_chars(),
            "Context built"
        );
        Ok(packed)
    }

    /// Build the context string for a latest message and its transcript.
    pub async fn build_context(
        &self,
        latest: &str,
        transcript: &str,
    ) -> Result<String, EmbeddingError> {
        self.build(FusionQuery { latest, transcript })
            .await
            .map(|packed| packed.text)
    }
}
