//! Exact nearest-neighbor search by full scan.

use super::similarity::{Candidate, top_k};
use super::{IndexKind, VectorIndex, VectorTable};
use crate::errors::SearchError;
use crate::record::IndexEntry;

/// Exact index: scores every entry on every query.
#[derive(Debug)]
pub struct FlatIndex {
    table: VectorTable,
}

impl FlatIndex {
    pub(crate) fn from_entries(dim: usize, entries: Vec<IndexEntry>) -> Self {
        Self {
            table: VectorTable::new(dim, entries),
        }
    }
}

impl VectorIndex for FlatIndex {
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Candidate>, SearchError> {
        let q = self.table.prepare_query(vector)?;
        let cands = (0..self.table.len())
            .map(|i| self.table.candidate(i, &q))
            .collect();
        Ok(top_k(cands, k))
    }

    fn len(&self) -> usize {
        self.table.len()
    }

    fn dimension(&self) -> usize {
        self.table.dim
    }

    fn kind(&self) -> IndexKind {
        IndexKind::Flat
    }
}
