/// A provider that turns text into a fixed-dimension vector.
///
/// Implementations may fail; callers that need a fail-soft contract wrap the
/// provider in an embedding gateway.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `openai:text-embedding-ada-002`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    /// Compute the embedding of a single text.
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
    /// Compute embeddings for a batch of input texts.
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}
