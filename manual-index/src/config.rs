//! Configuration layer: reads runtime settings from environment variables
//! and exposes strongly typed configs for embeddings, index, ranking and search.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::embed::{
    Embedder, ImageHashEmbedder, MultiModalEmbedder, OllamaConfig, OllamaEmbedder,
    TextHashEmbedder,
};
use crate::errors::SearchError;
use crate::index::IndexKind;

const DEFAULT_IVF_LISTS: usize = 16;

/// Which embedding backend serves text queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedderKind {
    /// Local feature-hashing embedders for both modalities.
    Hash,
    /// Local image embedder, remote Ollama text embedder.
    Ollama,
}

impl FromStr for EmbedderKind {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hash" => Ok(EmbedderKind::Hash),
            "ollama" => Ok(EmbedderKind::Ollama),
            other => Err(SearchError::Config(format!("unknown EMBEDDER_KIND: {other}"))),
        }
    }
}

/// Embedding configuration (backend, dimension, and concurrency).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub kind: EmbedderKind,
    /// Embedding vector dimensionality.
    pub dim: usize,
    /// Remote model name (Ollama only).
    pub model: String,
    /// Reported in stats (e.g. "cpu", "cuda:0").
    pub device: String,
    /// Max concurrent embedding tasks during ingestion.
    pub concurrency: usize,
    pub ollama_url: String,
    pub request_timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            kind: EmbedderKind::Hash,
            dim: 256,
            model: "bge-m3".to_string(),
            device: "cpu".to_string(),
            concurrency: 4,
            ollama_url: "http://localhost:11434".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Ranking policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Similarity above which a hit is labeled `exact_image`.
    pub exact_threshold: f32,
    /// Characters of context text kept on the top result.
    pub preview_chars: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            exact_threshold: 0.92,
            preview_chars: 200,
        }
    }
}

/// Query-time behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Minimum similarity for a result to count as a match (0.0 = best effort).
    pub min_score: f32,
    /// Default number of results for top-k queries.
    pub top_k: usize,
    /// Deadline for embedding + index query.
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_score: 0.0,
            top_k: 5,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Top-level runtime configuration for the retrieval core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// JSONL corpus manifest loaded at startup and on rebuild.
    pub corpus_path: Option<PathBuf>,
    pub embedding: EmbeddingConfig,
    pub index: IndexKind,
    pub ranker: RankerConfig,
    pub search: SearchConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            corpus_path: None,
            embedding: EmbeddingConfig::default(),
            index: IndexKind::Flat,
            ranker: RankerConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Build configuration from environment variables.
    ///
    /// Environment variables used:
    /// - `CORPUS_PATH` (optional; JSONL manifest)
    /// - `EMBEDDER_KIND` (`hash` | `ollama`; default: `hash`)
    /// - `EMBEDDING_DIM` (default: 256)
    /// - `EMBEDDING_MODEL` (default: `bge-m3`, Ollama only)
    /// - `EMBEDDING_DEVICE` (default: `cpu`)
    /// - `EMBEDDING_CONCURRENCY` (default: 4)
    /// - `OLLAMA_URL` (default: `http://localhost:11434`)
    /// - `EMBEDDING_TIMEOUT_SECS` (default: 30)
    /// - `INDEX_KIND` (`flat` | `ivf`; default: `flat`)
    /// - `IVF_LISTS` (default: 16), `IVF_PROBES` (default: `IVF_LISTS / 2`)
    /// - `RANK_EXACT_THRESHOLD` (default: 0.92)
    /// - `RANK_PREVIEW_CHARS` (default: 200)
    /// - `SEARCH_MIN_SCORE` (default: 0.0)
    /// - `SEARCH_TOP_K` (default: 5)
    /// - `SEARCH_TIMEOUT_MS` (default: 10000)
    pub fn from_env() -> Result<Self, SearchError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServiceConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SearchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let embedding = EmbeddingConfig {
            kind: parse(&get, "EMBEDDER_KIND")?.unwrap_or(d.embedding.kind),
            dim: parse(&get, "EMBEDDING_DIM")?.unwrap_or(d.embedding.dim),
            model: get("EMBEDDING_MODEL").unwrap_or(d.embedding.model),
            device: get("EMBEDDING_DEVICE").unwrap_or(d.embedding.device),
            concurrency: parse(&get, "EMBEDDING_CONCURRENCY")?.unwrap_or(d.embedding.concurrency),
            ollama_url: get("OLLAMA_URL").unwrap_or(d.embedding.ollama_url),
            request_timeout: parse::<u64, _>(&get, "EMBEDDING_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(d.embedding.request_timeout),
        };

        let index = match get("INDEX_KIND").as_deref().map(str::trim) {
            None | Some("flat") => IndexKind::Flat,
            Some("ivf") => {
                let lists = parse(&get, "IVF_LISTS")?.unwrap_or(DEFAULT_IVF_LISTS);
                let probes = parse(&get, "IVF_PROBES")?.unwrap_or((lists / 2).max(1));
                IndexKind::Ivf { lists, probes }
            }
            Some(other) => {
                return Err(SearchError::Config(format!("unknown INDEX_KIND: {other}")));
            }
        };

        let ranker = RankerConfig {
            exact_threshold: parse(&get, "RANK_EXACT_THRESHOLD")?
                .unwrap_or(d.ranker.exact_threshold),
            preview_chars: parse(&get, "RANK_PREVIEW_CHARS")?.unwrap_or(d.ranker.preview_chars),
        };

        let search = SearchConfig {
            min_score: parse(&get, "SEARCH_MIN_SCORE")?.unwrap_or(d.search.min_score),
            top_k: parse(&get, "SEARCH_TOP_K")?.unwrap_or(d.search.top_k),
            timeout: parse::<u64, _>(&get, "SEARCH_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(d.search.timeout),
        };

        let cfg = Self {
            corpus_path: get("CORPUS_PATH").map(PathBuf::from),
            embedding,
            index,
            ranker,
            search,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.embedding.dim == 0 {
            return Err(SearchError::Config("EMBEDDING_DIM must be > 0".into()));
        }
        if self.embedding.concurrency == 0 {
            return Err(SearchError::Config(
                "EMBEDDING_CONCURRENCY must be > 0".into(),
            ));
        }
        if let IndexKind::Ivf { lists, probes } = self.index {
            if lists == 0 || probes == 0 {
                return Err(SearchError::Config(
                    "IVF_LISTS and IVF_PROBES must be > 0".into(),
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.ranker.exact_threshold) {
            return Err(SearchError::Config(
                "RANK_EXACT_THRESHOLD must be in 0.0..=1.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.search.min_score) {
            return Err(SearchError::Config(
                "SEARCH_MIN_SCORE must be in 0.0..=1.0".into(),
            ));
        }
        if self.search.top_k == 0 {
            return Err(SearchError::Config("SEARCH_TOP_K must be > 0".into()));
        }
        if self.search.timeout.is_zero() {
            return Err(SearchError::Config("SEARCH_TIMEOUT_MS must be > 0".into()));
        }
        Ok(())
    }

    /// Instantiates the configured embedder.
    pub fn build_embedder(&self) -> Result<Arc<dyn Embedder>, SearchError> {
        let e = &self.embedding;
        let image: Arc<dyn Embedder> = Arc::new(ImageHashEmbedder::new(e.dim));
        let text: Arc<dyn Embedder> = match e.kind {
            EmbedderKind::Hash => Arc::new(TextHashEmbedder::new(e.dim)),
            EmbedderKind::Ollama => Arc::new(OllamaEmbedder::new(OllamaConfig {
                endpoint: e.ollama_url.clone(),
                model: e.model.clone(),
                dim: e.dim,
                timeout: e.request_timeout,
            })?),
        };
        Ok(Arc::new(MultiModalEmbedder::new(image, text)?))
    }
}

/// Parses an optional variable; a present but malformed value is an error.
fn parse<T, G>(get: &G, key: &str) -> Result<Option<T>, SearchError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => v.trim().parse::<T>().map(Some).map_err(|_| {
            SearchError::Config(format!("failed to parse env variable: {key} = '{v}'"))
        }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ServiceConfig, SearchError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = from_pairs(&[]).unwrap();
        assert_eq!(cfg.embedding.kind, EmbedderKind::Hash);
        assert_eq!(cfg.embedding.dim, 256);
        assert_eq!(cfg.index, IndexKind::Flat);
        assert!((cfg.ranker.exact_threshold - 0.92).abs() < f32::EPSILON);
        assert_eq!(cfg.ranker.preview_chars, 200);
        assert_eq!(cfg.search.min_score, 0.0);
        assert!(cfg.corpus_path.is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = from_pairs(&[
            ("CORPUS_PATH", "data/corpus.jsonl"),
            ("EMBEDDING_DIM", "64"),
            ("INDEX_KIND", "ivf"),
            ("IVF_LISTS", "8"),
            ("IVF_PROBES", "2"),
            ("RANK_PREVIEW_CHARS", "80"),
            ("SEARCH_TIMEOUT_MS", "250"),
        ])
        .unwrap();
        assert_eq!(cfg.corpus_path, Some(PathBuf::from("data/corpus.jsonl")));
        assert_eq!(cfg.embedding.dim, 64);
        assert_eq!(cfg.index, IndexKind::Ivf { lists: 8, probes: 2 });
        assert_eq!(cfg.ranker.preview_chars, 80);
        assert_eq!(cfg.search.timeout, Duration::from_millis(250));
    }

    #[test]
    fn ivf_probes_default_to_half_the_lists() {
        let cfg = from_pairs(&[("INDEX_KIND", "ivf")]).unwrap();
        assert_eq!(cfg.index, IndexKind::Ivf { lists: 16, probes: 8 });

        let cfg = from_pairs(&[("INDEX_KIND", "ivf"), ("IVF_LISTS", "6")]).unwrap();
        assert_eq!(cfg.index, IndexKind::Ivf { lists: 6, probes: 3 });

        let cfg = from_pairs(&[("INDEX_KIND", "ivf"), ("IVF_LISTS", "1")]).unwrap();
        assert_eq!(cfg.index, IndexKind::Ivf { lists: 1, probes: 1 });
    }

    #[test]
    fn rejects_malformed_and_out_of_range() {
        assert!(matches!(
            from_pairs(&[("EMBEDDING_DIM", "many")]),
            Err(SearchError::Config(_))
        ));
        assert!(matches!(
            from_pairs(&[("EMBEDDING_DIM", "0")]),
            Err(SearchError::Config(_))
        ));
        assert!(matches!(
            from_pairs(&[("RANK_EXACT_THRESHOLD", "1.5")]),
            Err(SearchError::Config(_))
        ));
        assert!(matches!(
            from_pairs(&[("INDEX_KIND", "hnsw")]),
            Err(SearchError::Config(_))
        ));
        assert!(matches!(
            from_pairs(&[("EMBEDDER_KIND", "clip")]),
            Err(SearchError::Config(_))
        ));
    }

    #[test]
    fn builds_hash_embedder() {
        let cfg = from_pairs(&[("EMBEDDING_DIM", "32")]).unwrap();
        let e = cfg.build_embedder().unwrap();
        assert_eq!(e.dimension(), 32);
        assert_eq!(e.model(), "image-hash-32+text-hash-32");
    }
}
