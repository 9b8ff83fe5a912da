use tracing::warn;

use carerag_core::error::{Error, Result};
use carerag_core::traits::Embedder;

/// Fail-soft front for an [`Embedder`].
///
/// `embed` never fails: blank input, provider errors and vectors of the wrong
/// dimension all come back as the zero vector, which callers treat as
/// "no embedding".
pub struct EmbeddingGateway {
    inner: Box<dyn Embedder>,
}

impl EmbeddingGateway {
    pub fn new(inner: Box<dyn Embedder>) -> Self {
        Self { inner }
    }

    pub fn dim(&self) -> usize {
        self.inner.dim()
    }

    pub fn embedder_id(&self) -> &str {
        self.inner.embedder_id()
    }

    pub fn zero_vector(&self) -> Vec<f32> {
        vec![0.0; self.dim()]
    }

    /// Embed `text`, reporting why no vector could be produced.
    /// Blank input is not an error and yields the zero vector.
    pub fn try_embed(&self, text: &str) -> Result<Vec<f32>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(self.zero_vector());
        }
        let v = self.inner.embed(trimmed).map_err(|e| Error::Embedding(format!("{e:#}")))?;
        if v.len() != self.dim() {
            return Err(Error::DimensionMismatch { expected: self.dim(), actual: v.len() });
        }
        Ok(v)
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        match self.try_embed(text) {
            Ok(v) => v,
            Err(e) => {
                warn!(embedder = self.embedder_id(), error = %e, "embedding failed; using zero vector");
                self.zero_vector()
            }
        }
    }
}

/// True when `v` carries no embedding (every component is zero).
pub fn is_zero_vector(v: &[f32]) -> bool {
    v.iter().all(|x| *x == 0.0)
}
