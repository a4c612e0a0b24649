//! The embedded documentation corpus.
//!
//! Loaded once at startup from a precomputed artifact and never mutated
//! afterwards, so a single `Arc<CorpusStore>` is shared by every request
//! without locking.
//!
//! # Artifact format
//!
//! A JSON array (or JSON Lines when the file ends in `.jsonl`) of records:
//!
//! ```json
//! {"url": "/reference/threads", "title": "Threads", "plaintext": "...", "embedding": [0.1, ...]}
//! ```
//!
//! `embedding` may also be the embedding-service response envelope
//! (`{"data": [{"embedding": [...]}]}`), which is what the corpus generator
//! writes when it stores the raw API response.
//!
//! # Load policy
//!
//! - `null` records and records whose embedding is missing or `null` are
//!   skipped (the generator leaves them empty when an embedding call failed).
//! - A vector whose length differs from the configured dimensionality aborts
//!   the whole load with [`CorpusError::DimensionMismatch`].
//! - A vector with non-finite components aborts with [`CorpusError::Malformed`].

use std::path::Path;

use docbot_core::embedding::EmbeddingVector;
use docbot_core::error::CorpusError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One record of the corpus artifact, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusRecord {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub title: String,

    pub plaintext: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<RecordEmbedding>,
}

impl CorpusRecord {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        plaintext: impl Into<String>,
        embedding: Option<Vec<f32>>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            plaintext: plaintext.into(),
            embedding: embedding.map(RecordEmbedding::Vector),
        }
    }
}

/// The two accepted shapes of a stored embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordEmbedding {
    Vector(Vec<f32>),
    Envelope { data: Vec<EnvelopeItem> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeItem {
    pub embedding: Vec<f32>,
}

impl RecordEmbedding {
    /// Raw components, or `None` for an envelope with no data items.
    fn into_values(self) -> Option<Vec<f32>> {
        match self {
            Self::Vector(values) => Some(values),
            Self::Envelope { data } => data.into_iter().next().map(|item| item.embedding),
        }
    }
}

/// A validated corpus passage. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct CorpusEntry {
    url: String,
    title: String,
    text: String,
    vector: EmbeddingVector,
}

impl CorpusEntry {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The raw passage text injected into prompts.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn vector(&self) -> &EmbeddingVector {
        &self.vector
    }

    /// The passage URL with relative paths resolved against `docs_origin`.
    pub fn resolved_url(&self, docs_origin: Option<&str>) -> String {
        resolve_url(&self.url, docs_origin)
    }
}

/// Prefix a site-relative URL (`/path`) with `docs_origin`.
pub fn resolve_url(url: &str, docs_origin: Option<&str>) -> String {
    match docs_origin {
        Some(origin) if url.starts_with('/') => {
            format!("{}{}", origin.trim_end_matches('/'), url)
        }
        _ => url.to_string(),
    }
}

/// In-memory, immutable corpus of embedded passages.
#[derive(Debug, Clone)]
pub struct CorpusStore {
    entries: Vec<CorpusEntry>,
    dimensions: usize,
    skipped: usize,
}

impl CorpusStore {
    /// A corpus with no entries.
    pub fn empty(dimensions: usize) -> Self {
        Self {
            entries: Vec::new(),
            dimensions,
            skipped: 0,
        }
    }

    /// Load the corpus artifact at `path`.
    pub fn load(path: &Path, dimensions: usize) -> Result<Self, CorpusError> {
        let content = std::fs::read_to_string(path).map_err(|e| CorpusError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let is_jsonl = path.extension().is_some_and(|ext| ext == "jsonl");
        let store = if is_jsonl {
            Self::from_json_lines(&content, dimensions)?
        } else {
            Self::from_json_str(&content, dimensions)?
        };

        info!(
            path = %path.display(),
            entries = store.len(),
            skipped = store.skipped(),
            dimensions,
            "Corpus loaded"
        );
        Ok(store)
    }

    /// Parse a JSON array of records.
    pub fn from_json_str(json: &str, dimensions: usize) -> Result<Self, CorpusError> {
        let records: Vec<Option<CorpusRecord>> =
            serde_json::from_str(json).map_err(|e| CorpusError::Parse(e.to_string()))?;
        Self::from_records(records, dimensions)
    }

    /// Parse a JSON array of records from any reader.
    pub fn from_reader<R: std::io::Read>(reader: R, dimensions: usize) -> Result<Self, CorpusError> {
        let records: Vec<Option<CorpusRecord>> =
            serde_json::from_reader(reader).map_err(|e| CorpusError::Parse(e.to_string()))?;
        Self::from_records(records, dimensions)
    }

    /// Parse JSON Lines, one record per non-blank line.
    pub fn from_json_lines(jsonl: &str, dimensions: usize) -> Result<Self, CorpusError> {
        let records = jsonl
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str::<Option<CorpusRecord>>(line)
                    .map_err(|e| CorpusError::Parse(format!("line {}: {e}", n + 1)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_records(records, dimensions)
    }

    /// Validate records in source order. See the module docs for the policy.
    pub fn from_records<I>(records: I, dimensions: usize) -> Result<Self, CorpusError>
    where
        I: IntoIterator<Item = Option<CorpusRecord>>,
    {
        let mut entries = Vec::new();
        let mut skipped = 0;

        for (position, record) in records.into_iter().enumerate() {
            let Some(record) = record else {
                debug!(position, "Skipping null corpus record");
                skipped += 1;
                continue;
            };

            let Some(values) = record.embedding.and_then(RecordEmbedding::into_values) else {
                debug!(position, url = %record.url, "Skipping corpus record without embedding");
                skipped += 1;
                continue;
            };

            if values.len() != dimensions {
                return Err(CorpusError::DimensionMismatch {
                    position,
                    url: record.url,
                    expected: dimensions,
                    actual: values.len(),
                });
            }

            let vector = EmbeddingVector::new(values).map_err(|e| CorpusError::Malformed {
                position,
                reason: e.to_string(),
            })?;

            entries.push(CorpusEntry {
                url: record.url,
                title: record.title,
                text: record.plaintext,
                vector,
            });
        }

        if skipped > 0 {
            warn!(skipped, "Corpus records without embeddings were excluded");
        }

        Ok(Self {
            entries,
            dimensions,
            skipped,
        })
    }

    /// Entries in original insertion order.
    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn get(&self, position: usize) -> Option<&CorpusEntry> {
        self.entries.get(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The dimensionality D every entry (and every query) must have.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// How many source records were excluded for lacking an embedding.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_bare_vectors_in_order() {
        let json = r#"[
            {"url": "/a", "title": "A", "plaintext": "alpha", "embedding": [1.0, 0.0]},
            {"url": "/b", "title": "B", "plaintext": "beta", "embedding": [0.0, 1.0]}
        ]"#;
        let store = CorpusStore::from_json_str(json, 2).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.entries()[0].text(), "alpha");
        assert_eq!(store.entries()[1].title(), "B");
        assert_eq!(store.skipped(), 0);
    }

    #[test]
    fn accepts_response_envelope() {
        let json = r#"[
            {"url": "/a", "title": "A", "plaintext": "alpha",
             "embedding": {"object": "list", "data": [{"embedding": [0.5, 0.5], "index": 0}],
                           "model": "text-embedding-ada-002"}}
        ]"#;
        let store = CorpusStore::from_json_str(json, 2).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].vector().as_slice(), &[0.5, 0.5]);
    }

    #[test]
    fn skips_records_without_embedding() {
        let json = r#"[
            {"url": "/a", "title": "A", "plaintext": "alpha", "embedding": [1.0, 0.0]},
            {"url": "/b", "title": "B", "plaintext": "beta"},
            {"url": "/c", "title": "C", "plaintext": "gamma", "embedding": null},
            null,
            {"url": "/d", "title": "D", "plaintext": "delta", "embedding": {"data": []}}
        ]"#;
        let store = CorpusStore::from_json_str(json, 2).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.skipped(), 4);
        assert_eq!(store.entries()[0].url(), "/a");
    }

    #[test]
    fn dimension_mismatch_aborts_load() {
        let records = vec![
            Some(CorpusRecord::new("/a", "A", "alpha", Some(vec![1.0, 0.0, 0.0]))),
            Some(CorpusRecord::new("/b", "B", "beta", Some(vec![1.0, 0.0]))),
        ];
        let err = CorpusStore::from_records(records, 3).unwrap_err();
        match err {
            CorpusError::DimensionMismatch {
                position,
                url,
                expected,
                actual,
            } => {
                assert_eq!(position, 1);
                assert_eq!(url, "/b");
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_finite_component_aborts_load() {
        let records = vec![Some(CorpusRecord::new(
            "/a",
            "A",
            "alpha",
            Some(vec![1.0, f32::NAN]),
        ))];
        assert!(matches!(
            CorpusStore::from_records(records, 2),
            Err(CorpusError::Malformed { position: 0, .. })
        ));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            CorpusStore::from_json_str("{not json", 2),
            Err(CorpusError::Parse(_))
        ));
    }

    #[test]
    fn from_reader_matches_from_str() {
        let json = br#"[{"url": "/a", "title": "A", "plaintext": "alpha", "embedding": [1.0]}]"#;
        let store = CorpusStore::from_reader(&json[..], 1).unwrap();
        assert_eq!(store.get(0).map(|e| e.url()), Some("/a"));
        assert!(store.get(1).is_none());
    }

    #[test]
    fn json_lines_skip_blank_lines() {
        let jsonl = concat!(
            r#"{"url": "/a", "title": "A", "plaintext": "alpha", "embedding": [1.0, 0.0]}"#,
            "\n\n",
            r#"{"url": "/b", "title": "B", "plaintext": "beta", "embedding": [0.0, 1.0]}"#,
            "\n"
        );
        let store = CorpusStore::from_json_lines(jsonl, 2).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn json_lines_report_line_number() {
        let jsonl = "{\"plaintext\": \"a\", \"embedding\": [1.0]}\n{oops\n";
        let err = CorpusStore::from_json_lines(jsonl, 1).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn load_from_file_picks_format_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(
            file,
            r#"{{"url": "/a", "title": "A", "plaintext": "alpha", "embedding": [1.0, 0.0]}}"#
        )
        .unwrap();
        let store = CorpusStore::load(file.path(), 2).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.dimensions(), 2);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = CorpusStore::load(Path::new("/nonexistent/corpus.json"), 2).unwrap_err();
        assert!(matches!(err, CorpusError::Read { .. }));
    }

    #[test]
    fn resolves_relative_urls() {
        let store = CorpusStore::from_records(
            vec![
                Some(CorpusRecord::new("/reference/threads", "T", "t", Some(vec![1.0]))),
                Some(CorpusRecord::new("https://example.com/x", "X", "x", Some(vec![1.0]))),
            ],
            1,
        )
        .unwrap();
        let origin = Some("https://docs.example.com/");
        assert_eq!(
            store.entries()[0].resolved_url(origin),
            "https://docs.example.com/reference/threads"
        );
        assert_eq!(store.entries()[1].resolved_url(origin), "https://example.com/x");
        assert_eq!(store.entries()[0].resolved_url(None), "/reference/threads");
    }
}
