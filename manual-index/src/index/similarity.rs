//! Cosine similarity helpers shared by every index variant.

use std::cmp::Ordering;

use crate::record::RecordId;

/// One scored neighbor returned by an index query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub record_id: RecordId,
    /// Cosine similarity mapped to `[0, 1]` via `(cos + 1) / 2`.
    pub similarity: f32,
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Returns a unit-length copy of `v`; zero vectors stay zero.
pub(crate) fn unit(v: &[f32]) -> Vec<f32> {
    let norm = dot(v, v).sqrt();
    if norm == 0.0 {
        return vec![0.0; v.len()];
    }
    v.iter().map(|x| x / norm).collect()
}

/// Maps a cosine in `[-1, 1]` to `[0, 1]`.
pub(crate) fn to_unit_interval(cosine: f32) -> f32 {
    ((cosine + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Normalized cosine similarity of two raw vectors. A zero vector has cosine 0.
pub fn similarity(a: &[f32], b: &[f32]) -> f32 {
    to_unit_interval(dot(&unit(a), &unit(b)))
}

/// Descending similarity, ascending record id on ties.
pub(crate) fn by_rank(a: &Candidate, b: &Candidate) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| a.record_id.cmp(&b.record_id))
}

/// Sorts by [`by_rank`] and keeps the first `k`.
pub(crate) fn top_k(mut cands: Vec<Candidate>, k: usize) -> Vec<Candidate> {
    cands.sort_by(by_rank);
    cands.truncate(k);
    cands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_range() {
        assert!((similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((similarity(&[1.0, 0.0], &[0.0, 1.0]) - 0.5).abs() < 1e-6);
        assert!(similarity(&[1.0, 0.0], &[-1.0, 0.0]).abs() < 1e-6);
        assert!((similarity(&[0.0, 0.0], &[1.0, 0.0]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn ties_break_by_ascending_id() {
        let c = |id, s| Candidate {
            record_id: RecordId(id),
            similarity: s,
        };
        let out = top_k(vec![c(5, 0.8), c(2, 0.8), c(9, 0.9), c(1, 0.1)], 3);
        let ids: Vec<u64> = out.iter().map(|c| c.record_id.0).collect();
        assert_eq!(ids, vec![9, 2, 5]);
    }
}
