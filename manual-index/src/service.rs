//! Query service: embed → index → rank, plus stats and atomic rebuilds.
//!
//! The service owns one [`SnapshotCell`] holding the published
//! [`CorpusSnapshot`]. Queries clone the `Arc` once and work on that snapshot
//! until they finish; rebuilds construct a new snapshot off to the side and
//! swap it in. Until the first successful build every query fails with
//! [`SearchError::NotReady`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::config::ServiceConfig;
use crate::embed::{Embedder, QueryInput};
use crate::errors::SearchError;
use crate::ingest::{CorpusSnapshot, snapshot_from_manifest, snapshot_from_rows};
use crate::io_jsonl::CorpusRow;
use crate::ranker::Ranker;
use crate::record::{IndexReport, Record, RecordId, SearchResult, Stats};
use crate::snapshot::SnapshotCell;

pub struct QueryService {
    cfg: ServiceConfig,
    embedder: Arc<dyn Embedder>,
    ranker: Ranker,
    snapshot: SnapshotCell<CorpusSnapshot>,
}

impl QueryService {
    pub fn new(cfg: ServiceConfig, embedder: Arc<dyn Embedder>) -> Self {
        let ranker = Ranker::new(cfg.ranker.clone());
        Self {
            cfg,
            embedder,
            ranker,
            snapshot: SnapshotCell::new(),
        }
    }

    /// Builds the configured embedder and an unready service around it.
    pub fn from_config(cfg: ServiceConfig) -> Result<Self, SearchError> {
        cfg.validate()?;
        let embedder = cfg.build_embedder()?;
        Ok(Self::new(cfg, embedder))
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.cfg
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot.load().is_some()
    }

    /// Best match for `input`.
    ///
    /// # Errors
    /// `NotReady`, `EmptyIndex`, `NoMatch`, `UnsupportedInput`, `Timeout`, or
    /// an embedding backend error.
    #[instrument(target = "manual_index::service", skip_all, fields(modality = input.as_input().modality()))]
    pub async fn search(
        &self,
        input: &QueryInput,
        timeout: Option<Duration>,
    ) -> Result<SearchResult, SearchError> {
        let results = self.run_query(input, 1, timeout).await?;
        results.into_iter().next().ok_or(SearchError::NoMatch {
            min_score: self.cfg.search.min_score,
        })
    }

    /// Up to `k` ranked matches for `input`.
    #[instrument(target = "manual_index::service", skip_all, fields(modality = input.as_input().modality(), k = k))]
    pub async fn search_top_k(
        &self,
        input: &QueryInput,
        k: usize,
        timeout: Option<Duration>,
    ) -> Result<Vec<SearchResult>, SearchError> {
        if k == 0 {
            return Err(SearchError::UnsupportedInput("k must be > 0".into()));
        }
        self.run_query(input, k, timeout).await
    }

    /// Up to `k` ranked matches for a precomputed query embedding.
    ///
    /// `timeout` overrides the configured query deadline.
    #[instrument(target = "manual_index::service", skip_all, fields(dim = vector.len(), k = k))]
    pub async fn search_vector(
        &self,
        vector: Vec<f32>,
        k: usize,
        timeout: Option<Duration>,
    ) -> Result<Vec<SearchResult>, SearchError> {
        if k == 0 {
            return Err(SearchError::UnsupportedInput("k must be > 0".into()));
        }
        let snapshot = self.snapshot.load().ok_or(SearchError::NotReady)?;
        let timeout = timeout.unwrap_or(self.cfg.search.timeout);
        match tokio::time::timeout(timeout, self.query_snapshot(snapshot, vector, k)).await {
            Ok(res) => res,
            Err(_) => {
                warn!(target: "manual_index::service", ?timeout, "vector query timed out");
                Err(SearchError::Timeout(timeout))
            }
        }
    }

    async fn run_query(
        &self,
        input: &QueryInput,
        k: usize,
        timeout: Option<Duration>,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let snapshot = self.snapshot.load().ok_or(SearchError::NotReady)?;
        let timeout = timeout.unwrap_or(self.cfg.search.timeout);

        let work = async {
            let vector = self.embedder.embed(input.as_input()).await?;
            self.query_snapshot(snapshot, vector, k).await
        };

        match tokio::time::timeout(timeout, work).await {
            Ok(res) => res,
            Err(_) => {
                warn!(target: "manual_index::service", ?timeout, "query timed out");
                Err(SearchError::Timeout(timeout))
            }
        }
    }

    /// Index scan and ranking on the blocking pool, then the score floor.
    async fn query_snapshot(
        &self,
        snapshot: Arc<CorpusSnapshot>,
        vector: Vec<f32>,
        k: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let ranker = self.ranker.clone();
        let ranked = tokio::task::spawn_blocking(move || {
            let candidates = snapshot.index.query(&vector, k)?;
            ranker.rank(&vector, &candidates, &snapshot.store)
        })
        .await??;

        let min_score = self.cfg.search.min_score;
        let kept: Vec<SearchResult> = ranked.into_iter().filter(|r| r.score >= min_score).collect();
        if kept.is_empty() {
            return Err(SearchError::NoMatch { min_score });
        }

        debug!(
            target: "manual_index::service",
            hits = kept.len(),
            top_page = kept[0].page,
            top_score = kept[0].score,
            "query ranked"
        );
        Ok(kept)
    }

    /// Counts over the published snapshot. Never fails.
    pub fn stats(&self) -> Stats {
        let snapshot = self.snapshot.load();
        let (total_items, vehicles, index_kind) = match &snapshot {
            Some(s) => (
                s.store.len(),
                s.store.distinct_vehicles(),
                s.index.kind().to_string(),
            ),
            None => (0, 0, self.cfg.index.to_string()),
        };
        Stats {
            total_items,
            vehicles,
            model: self.embedder.model().to_string(),
            device: self.cfg.embedding.device.clone(),
            ready: snapshot.is_some(),
            index_kind,
            dimension: self.embedder.dimension(),
        }
    }

    /// Full stored record, including untruncated text.
    pub fn record(&self, id: RecordId) -> Result<Record, SearchError> {
        let snapshot = self.snapshot.load().ok_or(SearchError::NotReady)?;
        snapshot.store.get(id).cloned()
    }

    /// Rebuilds from manifest rows and publishes the result.
    ///
    /// On failure the previously published snapshot keeps serving.
    #[instrument(target = "manual_index::service", skip_all, fields(rows = rows.len()))]
    pub async fn rebuild(
        &self,
        rows: Vec<CorpusRow>,
        base_dir: &Path,
    ) -> Result<IndexReport, SearchError> {
        let _permit = self.snapshot.build_permit().await;
        let built = snapshot_from_rows(
            rows,
            base_dir,
            self.embedder.as_ref(),
            self.cfg.embedding.concurrency,
            self.cfg.index,
        )
        .await;
        self.publish(built)
    }

    /// Rebuilds from a JSONL manifest (`path`, or the configured corpus).
    #[instrument(target = "manual_index::service", skip(self))]
    pub async fn rebuild_from_corpus(
        &self,
        path: Option<&Path>,
    ) -> Result<IndexReport, SearchError> {
        let path: PathBuf = match path {
            Some(p) => p.to_path_buf(),
            None => self
                .cfg
                .corpus_path
                .clone()
                .ok_or_else(|| SearchError::Config("CORPUS_PATH is not set".into()))?,
        };

        let _permit = self.snapshot.build_permit().await;
        let built = snapshot_from_manifest(
            &path,
            self.embedder.as_ref(),
            self.cfg.embedding.concurrency,
            self.cfg.index,
        )
        .await;
        self.publish(built)
    }

    fn publish(
        &self,
        built: Result<(CorpusSnapshot, IndexReport), SearchError>,
    ) -> Result<IndexReport, SearchError> {
        match built {
            Ok((snapshot, report)) => {
                self.snapshot.publish(Arc::new(snapshot));
                info!(
                    target: "manual_index::service",
                    indexed = report.indexed,
                    skipped = report.skipped,
                    "snapshot published"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(
                    target: "manual_index::service",
                    error = %e,
                    ready = self.is_ready(),
                    "rebuild failed, keeping previous snapshot"
                );
                Err(e)
            }
        }
    }
}
