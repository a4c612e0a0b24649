//! Embedding vectors and the embedding service abstraction.
//!
//! An [`EmbeddingVector`] can only be built through [`EmbeddingVector::new`],
//! so every vector that reaches ranking code is non-empty and finite.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;

/// A validated, fixed-length embedding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    /// Validate raw components. Rejects empty vectors and NaN/infinite values.
    pub fn new(values: Vec<f32>) -> Result<Self, EmbeddingError> {
        if values.is_empty() {
            return Err(EmbeddingError::MalformedResponse(
                "embedding vector is empty".into(),
            ));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(EmbeddingError::MalformedResponse(format!(
                "component {i} is not a finite number"
            )));
        }
        Ok(Self(values))
    }

    /// Number of components (D).
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Fail unless this vector has exactly `expected` components.
    pub fn ensure_dimensions(&self, expected: usize) -> Result<(), EmbeddingError> {
        if self.dimensions() == expected {
            Ok(())
        } else {
            Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: self.dimensions(),
            })
        }
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl<'de> Deserialize<'de> for EmbeddingVector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let values = Vec::<f32>::deserialize(deserializer)?;
        Self::new(values).map_err(serde::de::Error::custom)
    }
}

/// The embedding service collaborator.
///
/// Implementations must validate the service response before returning:
/// a malformed payload is an [`EmbeddingError`], never a partially-filled vector.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// A human-readable name for this client (e.g., "openai").
    fn name(&self) -> &str;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbeddingError>;
}
