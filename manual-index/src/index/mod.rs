//! Nearest-neighbor indexes over record embeddings.
//!
//! Two variants share one ordering contract (descending similarity, ties by
//! ascending record id):
//! - [`FlatIndex`]: exact full scan, O(n·D) per query.
//! - [`IvfIndex`]: inverted file with a k-means coarse quantizer. Probing
//!   every list reproduces the flat result exactly; probing fewer lists trades
//!   recall for speed.
//!
//! Indexes are immutable once built. Replacement happens by building a new
//! one and swapping the published snapshot (see [`crate::snapshot`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::SearchError;
use crate::record::IndexEntry;

pub mod flat;
pub mod ivf;
pub mod similarity;

pub use flat::FlatIndex;
pub use ivf::IvfIndex;
pub use similarity::{Candidate, similarity};

/// Query side of an index. Implementations are read-only and `Sync`.
pub trait VectorIndex: Send + Sync {
    /// Returns at most `k` candidates in rank order.
    ///
    /// # Errors
    /// - [`SearchError::EmptyIndex`] if the index holds no entries.
    /// - [`SearchError::DimensionMismatch`] if `vector` has the wrong length.
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Candidate>, SearchError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension of the indexed vectors; 0 for an empty index.
    fn dimension(&self) -> usize;

    fn kind(&self) -> IndexKind;
}

/// Index variant and its tuning knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum IndexKind {
    Flat,
    Ivf { lists: usize, probes: usize },
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Flat => write!(f, "flat"),
            IndexKind::Ivf { lists, probes } => write!(f, "ivf(lists={lists},probes={probes})"),
        }
    }
}

impl IndexKind {
    /// Builds a fresh index of this kind from `entries`.
    ///
    /// # Errors
    /// Returns [`SearchError::DimensionMismatch`] if the entries disagree on
    /// vector length, [`SearchError::UnsupportedInput`] for empty or
    /// non-finite vectors, or [`SearchError::Config`] for invalid IVF
    /// parameters.
    pub fn build(self, entries: Vec<IndexEntry>) -> Result<Box<dyn VectorIndex>, SearchError> {
        let dim = validate_entries(&entries)?;
        debug!(
            target: "manual_index::index",
            kind = %self,
            entries = entries.len(),
            dim,
            "building index"
        );
        Ok(match self {
            IndexKind::Flat => Box::new(FlatIndex::from_entries(dim, entries)),
            IndexKind::Ivf { lists, probes } => {
                if lists == 0 || probes == 0 {
                    return Err(SearchError::Config(
                        "ivf lists and probes must be > 0".into(),
                    ));
                }
                Box::new(IvfIndex::from_entries(dim, entries, lists, probes))
            }
        })
    }
}

/// Returns the shared dimension, or 0 when there are no entries.
///
/// Every value must be finite: a NaN or infinite component makes the
/// similarity NaN, and the record could never be ranked.
fn validate_entries(entries: &[IndexEntry]) -> Result<usize, SearchError> {
    let Some(first) = entries.first() else {
        return Ok(0);
    };
    let want = first.vector.len();
    if want == 0 {
        return Err(SearchError::UnsupportedInput(format!(
            "record {} has an empty embedding",
            first.record_id
        )));
    }
    for e in entries {
        if e.vector.len() != want {
            return Err(SearchError::DimensionMismatch {
                got: e.vector.len(),
                want,
            });
        }
        if !all_finite(&e.vector) {
            return Err(SearchError::UnsupportedInput(format!(
                "record {} has a non-finite embedding value",
                e.record_id
            )));
        }
    }
    Ok(want)
}

pub(crate) fn all_finite(v: &[f32]) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// Flat storage of unit-normalized vectors shared by both variants.
#[derive(Debug, Default)]
pub(crate) struct VectorTable {
    pub(crate) dim: usize,
    pub(crate) ids: Vec<crate::record::RecordId>,
    pub(crate) data: Vec<f32>,
}

impl VectorTable {
    pub(crate) fn new(dim: usize, entries: Vec<IndexEntry>) -> Self {
        let mut ids = Vec::with_capacity(entries.len());
        let mut data = Vec::with_capacity(entries.len() * dim);
        for e in entries {
            ids.push(e.record_id);
            data.extend(similarity::unit(&e.vector));
        }
        Self { dim, ids, data }
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    pub(crate) fn candidate(&self, i: usize, query_unit: &[f32]) -> Candidate {
        Candidate {
            record_id: self.ids[i],
            similarity: similarity::to_unit_interval(similarity::dot(self.row(i), query_unit)),
        }
    }

    /// Common query preconditions; returns the unit query vector.
    pub(crate) fn prepare_query(&self, vector: &[f32]) -> Result<Vec<f32>, SearchError> {
        if self.ids.is_empty() {
            return Err(SearchError::EmptyIndex);
        }
        if vector.len() != self.dim {
            return Err(SearchError::DimensionMismatch {
                got: vector.len(),
                want: self.dim,
            });
        }
        if !all_finite(vector) {
            return Err(SearchError::UnsupportedInput(
                "query embedding has a non-finite value".into(),
            ));
        }
        Ok(similarity::unit(vector))
    }
}
