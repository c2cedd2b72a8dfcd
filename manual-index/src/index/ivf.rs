//! Inverted-file index with a spherical k-means coarse quantizer.
//!
//! Build is deterministic: centroids are seeded from evenly spaced entries in
//! record-id order and refined for a fixed number of iterations. A query ranks
//! the centroids, scans the members of the `probes` closest lists exactly and
//! merges them with the shared ordering contract.

use tracing::trace;

use super::similarity::{Candidate, dot, top_k, unit};
use super::{IndexKind, VectorIndex, VectorTable};
use crate::errors::SearchError;
use crate::record::IndexEntry;

const KMEANS_ITERATIONS: usize = 10;

#[derive(Debug)]
pub struct IvfIndex {
    table: VectorTable,
    centroids: Vec<Vec<f32>>,
    /// Row positions in `table`, one list per centroid.
    lists: Vec<Vec<usize>>,
    requested_lists: usize,
    probes: usize,
}

impl IvfIndex {
    pub(crate) fn from_entries(
        dim: usize,
        entries: Vec<IndexEntry>,
        lists: usize,
        probes: usize,
    ) -> Self {
        let table = VectorTable::new(dim, entries);
        let n = table.len();
        let nlist = lists.min(n);

        let mut centroids = seed_centroids(&table, nlist);
        let mut assignment = vec![0usize; n];
        for _ in 0..KMEANS_ITERATIONS {
            let mut changed = false;
            for (i, slot) in assignment.iter_mut().enumerate() {
                let best = nearest_centroid(&centroids, table.row(i));
                if *slot != best {
                    *slot = best;
                    changed = true;
                }
            }
            recompute_centroids(&table, &assignment, &mut centroids);
            if !changed {
                break;
            }
        }

        // Final assignment against the refined centroids.
        let mut inverted = vec![Vec::new(); nlist];
        for i in 0..n {
            inverted[nearest_centroid(&centroids, table.row(i))].push(i);
        }
        trace!(
            "ivf::build n={n} lists={nlist} sizes={:?}",
            inverted.iter().map(Vec::len).collect::<Vec<_>>()
        );

        Self {
            table,
            centroids,
            lists: inverted,
            requested_lists: lists,
            probes,
        }
    }
}

fn seed_centroids(table: &VectorTable, nlist: usize) -> Vec<Vec<f32>> {
    let mut order: Vec<usize> = (0..table.len()).collect();
    order.sort_by_key(|&i| table.ids[i]);
    (0..nlist)
        .map(|c| table.row(order[c * order.len() / nlist]).to_vec())
        .collect()
}

/// Index of the closest centroid; lowest index wins ties.
fn nearest_centroid(centroids: &[Vec<f32>], v: &[f32]) -> usize {
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (c, centroid) in centroids.iter().enumerate() {
        let s = dot(centroid, v);
        if s > best_score {
            best = c;
            best_score = s;
        }
    }
    best
}

fn recompute_centroids(table: &VectorTable, assignment: &[usize], centroids: &mut [Vec<f32>]) {
    let dim = table.dim;
    let mut sums = vec![vec![0.0f32; dim]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];
    for (i, &c) in assignment.iter().enumerate() {
        counts[c] += 1;
        for (s, x) in sums[c].iter_mut().zip(table.row(i)) {
            *s += x;
        }
    }
    for (c, sum) in sums.into_iter().enumerate() {
        // Empty clusters keep their previous centroid.
        if counts[c] > 0 {
            centroids[c] = unit(&sum);
        }
    }
}

impl VectorIndex for IvfIndex {
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Candidate>, SearchError> {
        let q = self.table.prepare_query(vector)?;

        let mut ranked: Vec<(usize, f32)> = self
            .centroids
            .iter()
            .enumerate()
            .map(|(c, centroid)| (c, dot(centroid, &q)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let cands = ranked
            .iter()
            .take(self.probes)
            .flat_map(|(c, _)| self.lists[*c].iter())
            .map(|&i| self.table.candidate(i, &q))
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
        IndexKind::Ivf {
            lists: self.requested_lists,
            probes: self.probes,
        }
    }
}
