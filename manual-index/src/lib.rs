//! Retrieval core for manual page search.
//!
//! This crate provides:
//! - A document store of manual pages (vehicle, manual, page, text, image)
//! - Pluggable embedders for page images and text snippets
//! - Flat and IVF nearest-neighbor indexes with one ordering contract
//! - A ranker that labels matches and clips context text
//! - [`QueryService`], which publishes store + index snapshots atomically and
//!   answers best-match / top-k queries under a deadline
//!
//! Ingestion reads a JSONL manifest (see [`io_jsonl`]) and resolves missing
//! embeddings with bounded concurrency.

pub mod config;
pub mod embed;
mod embed_pool;
pub mod errors;
pub mod index;
pub mod ingest;
pub mod io_jsonl;
mod normalize;
pub mod ranker;
pub mod record;
pub mod service;
pub mod snapshot;
pub mod store;

pub use config::{EmbedderKind, EmbeddingConfig, RankerConfig, SearchConfig, ServiceConfig};
pub use embed::{EmbedInput, Embedder, QueryInput};
pub use errors::{ErrorKind, SearchError};
pub use index::{Candidate, IndexKind, VectorIndex};
pub use io_jsonl::{CorpusRow, read_corpus};
pub use record::{
    Confidence, IndexEntry, IndexReport, MatchType, Record, RecordId, SearchResult, Stats,
};
pub use service::QueryService;
pub use store::DocumentStore;
