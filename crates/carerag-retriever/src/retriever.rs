use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use carerag_core::config::{Config, RetrievalSettings};
use carerag_core::error::Result;
use carerag_core::types::{ChunkMetadata, IndexStats};
use carerag_embed::{get_default_embedder, EmbeddingGateway};
use carerag_vector::VectorStore;

use crate::context::{default_context, pack_context, prioritize};
use crate::knowledge::KnowledgeSources;

/// Query-to-context engine over one vector store and its knowledge corpus.
///
/// The store sits behind a reader-writer lock: searches and stats share it,
/// while ingestion, saves, snapshot restore and clearing take it
/// exclusively. `load_guard` serializes the one-time knowledge load so
/// concurrent first queries ingest the corpus exactly once.
pub struct Retriever {
    store: RwLock<VectorStore>,
    knowledge_loaded: AtomicBool,
    load_guard: Mutex<()>,
    sources: KnowledgeSources,
    retrieval: RetrievalSettings,
    rebuild_on_start: bool,
}

impl Retriever {
    pub fn new(store: VectorStore, sources: KnowledgeSources, retrieval: RetrievalSettings) -> Self {
        Self {
            store: RwLock::new(store),
            knowledge_loaded: AtomicBool::new(false),
            load_guard: Mutex::new(()),
            sources,
            retrieval,
            rebuild_on_start: false,
        }
    }

    /// Discard a restored snapshot in [`init`](Self::init) and re-ingest.
    #[must_use]
    pub fn with_rebuild_on_start(mut self, rebuild: bool) -> Self {
        self.rebuild_on_start = rebuild;
        self
    }

    /// Wire the embedder, store and knowledge sources from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let settings = config.settings()?;
        let gateway = EmbeddingGateway::new(get_default_embedder(&settings.embedding)?);
        let persist_dir = config.resolve_path(&settings.store.persist_dir);
        let store = VectorStore::from_settings(gateway, &settings.store, persist_dir)?;
        let sources = KnowledgeSources::from_settings(&settings.knowledge, config.base_dir());
        Ok(Self::new(store, sources, settings.retrieval)
            .with_rebuild_on_start(settings.knowledge.rebuild_on_start))
    }

    /// Restore the persisted snapshot, falling back to ingesting the corpus.
    ///
    /// A non-empty snapshot counts as the loaded knowledge base unless
    /// rebuilding on start is requested. Returns whether the snapshot was used.
    pub fn init(&self) -> bool {
        let _guard = self.load_guard.lock();
        if self.knowledge_loaded.load(Ordering::Acquire) {
            return false;
        }

        let restored = self.store.write().load();
        let usable = restored && !self.store.read().is_empty();
        if usable && !self.rebuild_on_start {
            self.knowledge_loaded.store(true, Ordering::Release);
            info!(chunks = self.store.read().len(), "knowledge base restored from snapshot");
            return true;
        }
        if usable {
            info!("rebuilding knowledge base; discarding restored snapshot");
            self.store.write().clear();
        }
        self.load_knowledge_locked();
        false
    }

    /// Ingest the knowledge corpus unless that already happened.
    pub fn ensure_loaded(&self) {
        if self.knowledge_loaded.load(Ordering::Acquire) {
            return;
        }
        let _guard = self.load_guard.lock();
        if self.knowledge_loaded.load(Ordering::Acquire) {
            return;
        }
        self.load_knowledge_locked();
    }

    // Caller holds `load_guard`.
    fn load_knowledge_locked(&self) {
        let docs = self.sources.collect_documents();
        let added = self.store.write().add_documents(&docs);
        if added == 0 {
            warn!(documents = docs.len(), "no knowledge chunks could be embedded");
        }
        self.knowledge_loaded.store(true, Ordering::Release);
        info!(documents = docs.len(), chunks = added, "loaded mental health knowledge documents");
    }

    pub fn is_knowledge_loaded(&self) -> bool {
        self.knowledge_loaded.load(Ordering::Acquire)
    }

    /// Search, prioritize and pack; no results yields the default context.
    pub fn try_retrieve(&self, query: &str, max_results: usize, context_length: usize) -> Result<String> {
        self.ensure_loaded();
        let results = self.store.read().try_search(query, max_results, self.retrieval.score_threshold)?;
        if results.is_empty() {
            debug!("no results above threshold; using default context");
            return Ok(default_context(query).to_string());
        }

        let ordered = prioritize(query, results);
        let packed = pack_context(&ordered, context_length);
        if packed.is_empty() {
            debug!(context_length, "nothing fit the context budget; using default context");
            return Ok(default_context(query).to_string());
        }
        Ok(packed)
    }

    /// Context string for `query`. Never fails: any error degrades to the
    /// default context.
    pub fn retrieve_knowledge(&self, query: &str, max_results: usize, context_length: usize) -> String {
        match self.try_retrieve(query, max_results, context_length) {
            Ok(context) => context,
            Err(e) => {
                warn!(error = %e, "retrieval failed; using default context");
                default_context(query).to_string()
            }
        }
    }

    /// [`retrieve_knowledge`](Self::retrieve_knowledge) with the configured limits.
    pub fn retrieve(&self, query: &str) -> String {
        self.retrieve_knowledge(query, self.retrieval.max_results, self.retrieval.context_length)
    }

    /// Index `content` as a single chunk; metadata defaults to
    /// `{type: custom, source: user_added}`. Returns whether it was indexed.
    pub fn add_custom_knowledge(&self, content: &str, metadata: Option<ChunkMetadata>) -> bool {
        let added = self.store.write().add(content, metadata.unwrap_or_else(ChunkMetadata::custom));
        if added {
            info!("added custom knowledge");
        } else {
            warn!("custom knowledge was empty or could not be embedded");
        }
        added
    }

    /// Persist the store. Holds the write lock so saves never overlap each
    /// other or a search.
    pub fn save_knowledge_base(&self) -> Result<()> {
        let store = self.store.write();
        store.save()?;
        info!(dir = %store.persist_dir().display(), "knowledge base saved");
        Ok(())
    }

    pub fn get_stats(&self) -> IndexStats {
        self.store.read().stats()
    }
}
