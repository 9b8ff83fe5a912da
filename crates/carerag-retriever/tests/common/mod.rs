#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use carerag_core::chunker::Chunker;
use carerag_core::config::RetrievalSettings;
use carerag_core::traits::Embedder;
use carerag_embed::EmbeddingGateway;
use carerag_retriever::{KnowledgeSources, Retriever};
use carerag_vector::VectorStore;

/// Each dimension counts occurrences of a handful of word stems.
const CONCEPTS: [&[&str]; 8] = [
    &["anxi", "nervous", "worry", "panic"],
    &["exam", "academ", "coursework", "study"],
    &["counsel"],
    &["contact", "email", "phone", "call"],
    &["depress", "sad"],
    &["suicid", "crisis", "emergenc", "self-harm", "danger"],
    &["stress"],
    &["resilien", "wellbeing", "gratitude"],
];

/// Deterministic topic embedder; texts with no known stem embed to zero.
pub struct ConceptEmbedder;

impl Embedder for ConceptEmbedder {
    fn embedder_id(&self) -> &str {
        "concept"
    }
    fn dim(&self) -> usize {
        CONCEPTS.len()
    }
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let lowered = text.to_lowercase();
        let mut v: Vec<f32> = CONCEPTS
            .iter()
            .map(|stems| stems.iter().map(|s| lowered.matches(s).count()).sum::<usize>() as f32)
            .collect();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(v)
    }
}

pub const COUNSELORS_JSON: &str = r#"[
  {
    "counselor": {
      "name": "Dr. Meera Nair",
      "email": "meera.nair@christuniversity.in",
      "phone": "+91 80 4012 9001",
      "location": "Central Block, Room 112"
    },
    "programs": ["BBA", "BCom"]
  },
  {
    "counselor": {
      "name": "Mr. Arjun Rao",
      "email": "arjun.rao@christuniversity.in",
      "phone": "+91 80 4012 9002",
      "location": "Block IV, Room 305"
    },
    "programs": ["BSc Physics", "BSc Chemistry"]
  }
]"#;

/// Static documents plus the two directory entries above.
pub const FULL_CORPUS_CHUNKS: usize = 10;

pub fn write_counselors(dir: &Path) -> PathBuf {
    let path = dir.join("counselors.json");
    fs::write(&path, COUNSELORS_JSON).expect("write counselors.json");
    path
}

pub fn sources_in(dir: &Path) -> KnowledgeSources {
    KnowledgeSources { counselors_path: Some(write_counselors(dir)), extra_documents_dir: None }
}

pub fn concept_store(dir: &Path) -> VectorStore {
    let gateway = EmbeddingGateway::new(Box::new(ConceptEmbedder));
    VectorStore::new(gateway, Chunker::default(), dir.join("index"))
}

pub fn retriever_in(dir: &Path) -> Retriever {
    Retriever::new(concept_store(dir), sources_in(dir), RetrievalSettings::default())
}
