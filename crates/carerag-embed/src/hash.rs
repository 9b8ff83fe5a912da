use anyhow::{bail, Result};
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use carerag_core::traits::Embedder;

const STEM_CHARS: usize = 4;
const MIN_TOKEN_CHARS: usize = 3;

const STOP_WORDS: &[&str] = &[
    "about", "and", "are", "but", "can", "could", "did", "does", "for", "from", "had", "has",
    "have", "having", "her", "his", "how", "its", "may", "might", "must", "not", "our", "shall",
    "should", "than", "that", "the", "their", "them", "then", "there", "these", "they", "this",
    "very", "was", "what", "when", "where", "which", "who", "whom", "whose", "why", "will", "with",
    "would", "you", "your",
];

/// Deterministic offline embedder.
///
/// Lowercased alphanumeric tokens (stop words and very short tokens dropped)
/// are cut to a short stem, hashed into one of `dim` buckets and counted; the
/// result is L2-normalized. Inflections sharing a stem ("anxiety"/"anxious")
/// land in the same bucket, which is enough for development and tests without
/// a network provider. Text without any usable token embeds to the zero vector.
pub struct HashEmbedder {
    dim: usize,
    id: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim, id: format!("hash:xxh64:d{dim}") }
    }

    fn bucket(&self, stem: &str) -> usize {
        let mut hasher = XxHash64::with_seed(0);
        stem.hash(&mut hasher);
        (hasher.finish() % self.dim as u64) as usize
    }
}

impl Embedder for HashEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.dim == 0 {
            bail!("hash embedder configured with zero dimension");
        }
        let mut v = vec![0f32; self.dim];
        for stem in stems(text) {
            v[self.bucket(&stem)] += 1.0;
        }
        l2_normalize(&mut v);
        Ok(v)
    }
}

fn stems(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS && !STOP_WORDS.contains(&t.as_str()))
        .map(|t| t.chars().take(STEM_CHARS).collect())
}

/// Scale `v` to unit length in place; the zero vector is left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn shapes_and_determinism() {
        let embedder = HashEmbedder::new(256);
        let v1 = embedder.embed("Coping strategies include deep breathing").unwrap();
        let v2 = embedder.embed("Coping strategies include deep breathing").unwrap();
        assert_eq!(v1.len(), 256);
        let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
        assert_eq!(v1, v2);
    }

    #[test]
    fn shared_stems_are_closer_than_unrelated_text() {
        let embedder = HashEmbedder::new(1536);
        let query = embedder.embed("anxious").unwrap();
        let related = embedder.embed("Anxiety disorders").unwrap();
        let unrelated = embedder.embed("Campus security hours").unwrap();
        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[test]
    fn stop_words_only_embed_to_zero() {
        let embedder = HashEmbedder::new(32);
        let v = embedder.embed("what are you about").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn zero_dimension_is_an_error() {
        assert!(HashEmbedder::new(0).embed("hello world").is_err());
    }

    #[test]
    fn l2_normalize_basic() {
        let mut v = [1.0f32, 2.0, 3.0, 4.0];
        l2_normalize(&mut v);
        let norm: f32 = (1.0f32 + 4.0 + 9.0 + 16.0).sqrt();
        let expected = [1.0 / norm, 2.0 / norm, 3.0 / norm, 4.0 / norm];
        for (a, b) in v.iter().copied().zip(expected) {
            assert!((a - b).abs() < 1e-5, "a={a} b={b}");
        }
    }
}
