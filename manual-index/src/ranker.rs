//! Turns raw index candidates into ranked, labeled search results.

use tracing::trace;

use crate::config::RankerConfig;
use crate::errors::SearchError;
use crate::index::Candidate;
use crate::normalize::preview;
use crate::record::{Confidence, MatchType, SearchResult};
use crate::store::DocumentStore;

/// Threshold-based match typing on top of index similarity.
#[derive(Debug, Clone)]
pub struct Ranker {
    cfg: RankerConfig,
}

impl Ranker {
    pub fn new(cfg: RankerConfig) -> Self {
        Self { cfg }
    }

    pub fn match_type(&self, similarity: f32) -> MatchType {
        if similarity > self.cfg.exact_threshold {
            MatchType::ExactImage
        } else {
            MatchType::ContextualText
        }
    }

    /// Orders candidates (descending similarity, ascending id), resolves them
    /// against `store`, labels the match type and clips the top result's
    /// context text to the preview length.
    ///
    /// # Errors
    /// Returns [`SearchError::DimensionMismatch`] if the query vector does not
    /// match the stored embeddings, or [`SearchError::NotFound`] if a candidate
    /// does not resolve in `store`.
    pub fn rank(
        &self,
        query_embedding: &[f32],
        candidates: &[Candidate],
        store: &DocumentStore,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let mut ordered = candidates.to_vec();
        ordered.sort_by(crate::index::similarity::by_rank);

        let mut out = Vec::with_capacity(ordered.len());
        for (pos, cand) in ordered.iter().enumerate() {
            let record = store.get(cand.record_id)?;
            if !record.embedding.is_empty() && record.embedding.len() != query_embedding.len() {
                return Err(SearchError::DimensionMismatch {
                    got: query_embedding.len(),
                    want: record.embedding.len(),
                });
            }

            let score = cand.similarity.clamp(0.0, 1.0);
            let context_text = if pos == 0 {
                preview(&record.text, self.cfg.preview_chars)
            } else {
                record.text.clone()
            };

            out.push(SearchResult {
                page: record.page,
                score,
                vehicle: record.vehicle.clone(),
                manual: record.manual.clone(),
                match_type: self.match_type(score),
                context_text,
                record_id: record.id,
                confidence: Confidence::from_score(score),
            });
        }

        trace!("ranker::rank candidates={} results={}", candidates.len(), out.len());
        Ok(out)
    }
}
