//! Shared plumbing for the carerag binaries.

use carerag_core::config::{Config, Settings};
use carerag_embed::openai::API_KEY_ENV;
use carerag_embed::uses_offline_embedder;
use tracing_subscriber::EnvFilter;

/// Queries run after a build to confirm retrieval answers end to end.
pub const SMOKE_QUERIES: [&str; 4] = [
    "I'm feeling very anxious about exams",
    "How can I contact a counselor?",
    "I'm having thoughts of suicide",
    "What are signs of depression?",
];
pub const SMOKE_MAX_RESULTS: usize = 2;
pub const SMOKE_CONTEXT_LENGTH: usize = 300;

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Problems that would keep the knowledge base from building.
pub fn verify_setup(config: &Config, settings: &Settings) -> Vec<String> {
    let mut problems = Vec::new();

    if !uses_offline_embedder(&settings.embedding) {
        let key = std::env::var(API_KEY_ENV).unwrap_or_default();
        if key.trim().is_empty() {
            problems.push(format!("{API_KEY_ENV} is not set (add it to .env or the environment)"));
        }
    }

    match &settings.knowledge.counselors_path {
        Some(path) => {
            let resolved = config.resolve_path(path);
            if !resolved.is_file() {
                problems.push(format!("counselor directory not found at {}", resolved.display()));
            }
        }
        None => problems.push("knowledge.counselors_path is not configured".to_string()),
    }

    problems
}
