use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use carerag_core::chunker::{Chunker, ChunkingConfig};
use carerag_core::config::StoreSettings;
use carerag_core::error::{Error, Result};
use carerag_core::types::{ChunkMetadata, Document, IndexStats, SearchResult};
use carerag_embed::{is_zero_vector, EmbeddingGateway};

use crate::index::FlatL2Index;
use crate::snapshot;

/// Squared distance at which similarity reaches zero (two opposite unit vectors).
pub const DISTANCE_NORMALIZATION: f32 = 4.0;

/// Map a squared L2 distance onto `[0, 1]`.
pub fn similarity_from_distance(distance: f32) -> f32 {
    (1.0 - distance / DISTANCE_NORMALIZATION).max(0.0)
}

/// Chunk vectors with their texts and metadata, kept in lock-step:
/// row `i` of the index belongs to `texts[i]` and `metadata[i]`.
pub struct VectorStore {
    gateway: EmbeddingGateway,
    chunker: Chunker,
    index: FlatL2Index,
    texts: Vec<String>,
    metadata: Vec<ChunkMetadata>,
    persist_dir: PathBuf,
}

impl VectorStore {
    pub fn new(gateway: EmbeddingGateway, chunker: Chunker, persist_dir: impl Into<PathBuf>) -> Self {
        let index = FlatL2Index::new(gateway.dim());
        Self {
            gateway,
            chunker,
            index,
            texts: Vec::new(),
            metadata: Vec::new(),
            persist_dir: persist_dir.into(),
        }
    }

    /// Build a store with chunking taken from `settings`; `persist_dir` is
    /// expected to be already resolved.
    pub fn from_settings(
        gateway: EmbeddingGateway,
        settings: &StoreSettings,
        persist_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let chunker = Chunker::new(ChunkingConfig {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        })?;
        Ok(Self::new(gateway, chunker, persist_dir))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dim()
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn metadata(&self) -> &[ChunkMetadata] {
        &self.metadata
    }

    pub fn persist_dir(&self) -> &Path {
        &self.persist_dir
    }

    /// Index one chunk. Returns `false` (and stores nothing) when the text is
    /// blank or could not be embedded.
    pub fn add(&mut self, text: &str, metadata: ChunkMetadata) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let vector = self.gateway.embed(text);
        if is_zero_vector(&vector) {
            debug!(chars = text.chars().count(), "skipping chunk without embedding");
            return false;
        }
        if let Err(e) = self.index.add(&vector) {
            warn!(error = %e, "rejecting chunk vector");
            return false;
        }
        self.texts.push(text.to_string());
        self.metadata.push(metadata);
        true
    }

    /// Chunk and index each document. Every chunk carries a copy of its
    /// parent's metadata stamped with `chunk_id` and `total_chunks`.
    /// Returns the number of chunks indexed.
    pub fn add_documents(&mut self, documents: &[Document]) -> usize {
        let mut added = 0;
        for doc in documents {
            if doc.content.trim().is_empty() {
                continue;
            }
            let chunks = self.chunker.split(&doc.content);
            let total = chunks.len();
            for (i, chunk) in chunks.iter().enumerate() {
                if self.add(chunk, doc.metadata.for_chunk(i, total)) {
                    added += 1;
                }
            }
        }
        info!(documents = documents.len(), chunks = added, total = self.len(), "indexed documents");
        added
    }

    /// Nearest chunks to `query` with similarity at or above `score_threshold`,
    /// best first.
    pub fn try_search(&self, query: &str, k: usize, score_threshold: f32) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() || self.is_empty() {
            return Ok(Vec::new());
        }
        let vector = self.gateway.embed(query);
        if is_zero_vector(&vector) {
            return Ok(Vec::new());
        }
        self.search_vector(&vector, k, score_threshold)
    }

    /// Like [`try_search`](Self::try_search) but logs failures and returns no results.
    pub fn search(&self, query: &str, k: usize, score_threshold: f32) -> Vec<SearchResult> {
        self.try_search(query, k, score_threshold).unwrap_or_else(|e| {
            warn!(error = %e, "search failed");
            Vec::new()
        })
    }

    pub fn search_vector(&self, vector: &[f32], k: usize, score_threshold: f32) -> Result<Vec<SearchResult>> {
        let hits = self.index.search(vector, k)?;
        let mut results: Vec<SearchResult> = hits
            .into_iter()
            .filter_map(|(row, distance)| {
                let similarity = similarity_from_distance(distance);
                (similarity >= score_threshold).then(|| SearchResult {
                    text: self.texts[row].clone(),
                    metadata: self.metadata[row].clone(),
                    similarity,
                    distance,
                })
            })
            .collect();
        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        Ok(results)
    }

    pub fn save(&self) -> Result<()> {
        snapshot::save(&self.persist_dir, &self.index, &self.texts, &self.metadata)
    }

    /// Replace the in-memory state with the snapshot under `persist_dir`.
    ///
    /// Never fails: a missing, partial or corrupt snapshot leaves the store
    /// empty. Returns whether a snapshot was restored.
    pub fn load(&mut self) -> bool {
        match self.read_snapshot() {
            Ok(Some(snap)) => {
                info!(
                    dir = %self.persist_dir.display(),
                    vectors = snap.index.len(),
                    saved_at = %snap.saved_at,
                    "restored vector store snapshot"
                );
                self.index = snap.index;
                self.texts = snap.texts;
                self.metadata = snap.metadata;
                true
            }
            Ok(None) => {
                self.clear();
                false
            }
            Err(e) => {
                warn!(dir = %self.persist_dir.display(), error = %e, "ignoring unusable snapshot");
                self.clear();
                false
            }
        }
    }

    fn read_snapshot(&self) -> Result<Option<snapshot::Snapshot>> {
        let Some(snap) = snapshot::load(&self.persist_dir)? else {
            return Ok(None);
        };
        if snap.index.dim() != self.gateway.dim() {
            return Err(Error::SnapshotCorrupt(
                Error::DimensionMismatch { expected: self.gateway.dim(), actual: snap.index.dim() }
                    .to_string(),
            ));
        }
        Ok(Some(snap))
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.texts.clear();
        self.metadata.clear();
    }

    pub fn stats(&self) -> IndexStats {
        let keys: BTreeSet<String> = self.metadata.iter().flat_map(ChunkMetadata::keys).collect();
        IndexStats {
            total_documents: self.texts.len(),
            index_size: self.index.len(),
            dimension: self.index.dim(),
            metadata_keys: keys.into_iter().collect(),
        }
    }
}
