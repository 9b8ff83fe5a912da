//! OpenAI-compatible embeddings client (`POST {base_url}/embeddings`).

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use carerag_core::config::EmbeddingSettings;
use carerag_core::traits::Embedder;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedder {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    dim: usize,
    id: String,
}

impl OpenAiEmbedder {
    pub fn new(settings: &EmbeddingSettings, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            bail!("{API_KEY_ENV} is empty");
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("http client build")?;
        Ok(Self {
            client,
            url: format!("{}/embeddings", settings.base_url.trim_end_matches('/')),
            api_key,
            model: settings.model.clone(),
            dim: settings.dimension,
            id: format!("openai:{}:d{}", settings.model, settings.dimension),
        })
    }

    /// Build a client with the key taken from `OPENAI_API_KEY`.
    pub fn from_env(settings: &EmbeddingSettings) -> Result<Self> {
        let key = std::env::var(API_KEY_ENV)
            .map_err(|_| anyhow!("{API_KEY_ENV} environment variable is not set"))?;
        Self::new(settings, key)
    }

    fn request(&self, input: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        let expected = input.len();
        let body = EmbeddingRequest { model: &self.model, input };
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .with_context(|| format!("POST {}", self.url))?;

        if resp.status() != StatusCode::OK {
            let code = resp.status();
            let text = resp.text().unwrap_or_else(|_| "<failed to read body>".into());
            bail!("embeddings endpoint returned {code}; body: {text}");
        }

        let mut parsed: EmbeddingResponse = resp.json().context("parse embeddings json")?;
        if parsed.data.len() != expected {
            bail!("embeddings endpoint returned {} vectors for {} inputs", parsed.data.len(), expected);
        }
        parsed.data.sort_by_key(|d| d.index);
        debug!(model = %self.model, count = expected, "embedded batch");
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

impl Embedder for OpenAiEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(vec![text])?
            .pop()
            .ok_or_else(|| anyhow!("embeddings endpoint returned no vector"))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts.iter().map(String::as_str).collect())
    }
}
