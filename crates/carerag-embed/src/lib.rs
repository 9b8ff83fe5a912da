//! carerag-embed
//!
//! Embedding providers behind the core `Embedder` trait, plus the fail-soft
//! gateway the vector store embeds through.
//!
//! `APP_USE_FAKE_EMBEDDINGS=1` switches to the offline `HashEmbedder` for fast
//! and deterministic outputs in tests and development.
use anyhow::Result;
use tracing::info;

use carerag_core::config::{EmbeddingProvider, EmbeddingSettings};
use carerag_core::traits::Embedder;

pub mod gateway;
pub mod hash;
pub mod openai;

pub use gateway::{is_zero_vector, EmbeddingGateway};
pub use hash::HashEmbedder;
pub use openai::OpenAiEmbedder;

/// True when `APP_USE_FAKE_EMBEDDINGS` is `1` or `true`.
pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Whether `settings` resolve to the offline embedder (directly or via the env switch).
pub fn uses_offline_embedder(settings: &EmbeddingSettings) -> bool {
    use_fake_embeddings() || settings.provider == EmbeddingProvider::Hash
}

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    if uses_offline_embedder(settings) {
        info!(dim = settings.dimension, "using offline hash embedder");
        return Ok(Box::new(HashEmbedder::new(settings.dimension)));
    }
    let embedder = OpenAiEmbedder::from_env(settings)?;
    info!(id = embedder.embedder_id(), "using OpenAI embeddings");
    Ok(Box::new(embedder))
}
