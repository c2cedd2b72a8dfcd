//! Core data models used by the library.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Stable identifier of a corpus record. Ordering is used for tie-breaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One page of one manual. Immutable once stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub vehicle: String,
    pub manual: String,
    pub page: u32,
    pub text: String,
    /// Extracted page image, if the corpus provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,
    #[serde(default, skip_serializing)]
    pub embedding: Vec<f32>,
}

/// Vector entry handed to the index. Holds only a back-reference to the record.
#[derive(Clone, Debug)]
pub struct IndexEntry {
    pub record_id: RecordId,
    pub vector: Vec<f32>,
}

impl From<&Record> for IndexEntry {
    fn from(r: &Record) -> Self {
        Self {
            record_id: r.id,
            vector: r.embedding.clone(),
        }
    }
}

/// How a result matched the query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    ExactImage,
    ContextualText,
}

/// Coarse confidence bucket derived from the score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn from_score(score: f32) -> Self {
        if score > 0.7 {
            Confidence::High
        } else if score > 0.5 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// A ranked match, built per query and never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub page: u32,
    pub score: f32,
    pub vehicle: String,
    pub manual: String,
    pub match_type: MatchType,
    pub context_text: String,
    pub record_id: RecordId,
    pub confidence: Confidence,
}

/// Read-only view over the published snapshot and embedder configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_items: usize,
    pub vehicles: usize,
    pub model: String,
    pub device: String,
    pub ready: bool,
    pub index_kind: String,
    pub dimension: usize,
}

/// Summary of a full rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    pub indexed: usize,
    pub skipped: usize,
    pub duration_ms: u128,
}
