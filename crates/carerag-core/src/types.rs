//! Domain types shared by the chunker, the vector store and the retriever.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Extension values carried next to the fixed metadata keys
/// (e.g. `counselor_name`, `programs`).
pub type Extra = BTreeMap<String, serde_json::Value>;

/// Retrieval priority of a piece of knowledge. `High` marks crisis content.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
}

/// Metadata attached to every stored chunk.
///
/// - `kind`: category label, serialized as `type` (e.g. `crisis_resource`)
/// - `category`: finer topic label (e.g. `anxiety`)
/// - `source`: provenance string shown next to the label in packed context
/// - `priority`: `High` moves the chunk ahead of other results
/// - `chunk_id`/`total_chunks`: position within the parent document
/// - `extra`: any other key, kept verbatim
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<usize>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ChunkMetadata {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: Some(kind.into()), ..Self::default() }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Metadata for knowledge added at runtime without explicit metadata.
    pub fn custom() -> Self {
        Self::new("custom").with_source("user_added")
    }

    pub fn is_high_priority(&self) -> bool {
        self.priority == Some(Priority::High)
    }

    /// Copy of `self` stamped with its position inside the parent document.
    #[must_use]
    pub fn for_chunk(&self, chunk_id: usize, total_chunks: usize) -> Self {
        let mut meta = self.clone();
        meta.chunk_id = Some(chunk_id);
        meta.total_chunks = Some(total_chunks);
        meta
    }

    /// Names of the keys this metadata carries, as they appear when serialized.
    pub fn keys(&self) -> Vec<String> {
        let fixed = [
            ("type", self.kind.is_some()),
            ("category", self.category.is_some()),
            ("source", self.source.is_some()),
            ("priority", self.priority.is_some()),
            ("chunk_id", self.chunk_id.is_some()),
            ("total_chunks", self.total_chunks.is_some()),
        ];
        fixed
            .iter()
            .filter(|(_, present)| *present)
            .map(|(key, _)| (*key).to_string())
            .chain(self.extra.keys().cloned())
            .collect()
    }
}

/// Input unit before chunking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self { content: content.into(), metadata }
    }
}

/// A stored chunk returned by a similarity search.
///
/// `similarity` lies in `[0, 1]` (higher is better); `distance` is the raw
/// squared Euclidean distance between query and chunk vectors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub text: String,
    pub metadata: ChunkMetadata,
    pub similarity: f32,
    pub distance: f32,
}

/// Snapshot of the store's size and shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStats {
    pub total_documents: usize,
    pub index_size: usize,
    pub dimension: usize,
    pub metadata_keys: Vec<String>,
}
