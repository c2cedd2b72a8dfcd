//! Ingestion pipeline: manifest rows → embeddings → document store → index.
//!
//! The result is a [`CorpusSnapshot`], a store/index pair built together so
//! every index entry resolves to exactly one stored record.

use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};

use crate::embed::Embedder;
use crate::embed_pool::embed_missing;
use crate::errors::SearchError;
use crate::index::{IndexKind, VectorIndex};
use crate::io_jsonl::{CorpusRow, read_corpus};
use crate::normalize::normalize_page_text;
use crate::record::{IndexEntry, IndexReport, Record};
use crate::store::DocumentStore;

/// Immutable store + index pair, published as one unit.
pub struct CorpusSnapshot {
    pub store: DocumentStore,
    pub index: Box<dyn VectorIndex>,
}

impl CorpusSnapshot {
    /// Builds the store and index from records that already carry embeddings.
    ///
    /// # Errors
    /// [`SearchError::Duplicate`] on repeated ids, plus any index build error.
    pub fn from_records(records: Vec<Record>, kind: IndexKind) -> Result<Self, SearchError> {
        let mut store = DocumentStore::new();
        for r in records {
            store.add(r)?;
        }
        let entries: Vec<IndexEntry> = store.all().map(IndexEntry::from).collect();
        let index = kind.build(entries)?;
        Ok(Self { store, index })
    }
}

/// Reads a manifest file and builds a snapshot from it.
///
/// Relative image paths resolve against the manifest's directory.
pub async fn snapshot_from_manifest(
    path: &Path,
    embedder: &dyn Embedder,
    concurrency: usize,
    kind: IndexKind,
) -> Result<(CorpusSnapshot, IndexReport), SearchError> {
    let rows = read_corpus(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    snapshot_from_rows(rows, base_dir, embedder, concurrency, kind).await
}

/// Resolves embeddings for `rows` and builds a snapshot.
///
/// Rows with no embedding, no image and no text cannot be embedded and are
/// skipped (counted in [`IndexReport::skipped`]).
pub async fn snapshot_from_rows(
    rows: Vec<CorpusRow>,
    base_dir: &Path,
    embedder: &dyn Embedder,
    concurrency: usize,
    kind: IndexKind,
) -> Result<(CorpusSnapshot, IndexReport), SearchError> {
    let started = Instant::now();
    let total = rows.len();

    let mut rows: Vec<CorpusRow> = rows
        .into_iter()
        .filter(|r| {
            let usable = r.embedding.is_some() || r.image.is_some() || !r.text.trim().is_empty();
            if !usable {
                warn!(
                    target: "manual_index::ingest",
                    id = %r.id,
                    "skipping row without text, image or embedding"
                );
            }
            usable
        })
        .collect();
    let skipped = total - rows.len();

    embed_missing(&mut rows, base_dir, embedder, concurrency).await?;

    let records: Vec<Record> = rows
        .into_iter()
        .map(|r| Record {
            id: r.id,
            vehicle: r.vehicle,
            manual: r.manual,
            page: r.page,
            text: normalize_page_text(&r.text),
            image: r.image,
            embedding: r.embedding.unwrap_or_default(),
        })
        .collect();

    let snapshot =
        tokio::task::spawn_blocking(move || CorpusSnapshot::from_records(records, kind)).await??;
    let report = IndexReport {
        indexed: snapshot.store.len(),
        skipped,
        duration_ms: started.elapsed().as_millis(),
    };

    info!(
        target: "manual_index::ingest",
        indexed = report.indexed,
        skipped = report.skipped,
        duration_ms = report.duration_ms as u64,
        "snapshot built"
    );
    Ok((snapshot, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::{ImageHashEmbedder, MultiModalEmbedder, TextHashEmbedder};
    use crate::record::RecordId;
    use std::io::Write;
    use std::sync::Arc;

    fn embedder() -> MultiModalEmbedder {
        MultiModalEmbedder::new(
            Arc::new(ImageHashEmbedder::new(32)),
            Arc::new(TextHashEmbedder::new(32)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn builds_from_manifest_and_skips_empty_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, r#"{{"id": 1, "vehicle": "X123", "manual": "Engine", "page": 1, "text": "Oil  \n\n\n level"}}"#).unwrap();
        writeln!(f, r#"{{"id": 2, "vehicle": "X123", "manual": "Engine", "page": 2, "text": "   "}}"#).unwrap();
        writeln!(f, r#"{{"id": 3, "vehicle": "Y9", "manual": "Brakes", "page": 7, "text": "Brake pads"}}"#).unwrap();
        drop(f);

        let (snap, report) = snapshot_from_manifest(&path, &embedder(), 2, IndexKind::Flat)
            .await
            .unwrap();
        assert_eq!(report.indexed, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(snap.index.len(), 2);
        assert_eq!(snap.store.get(RecordId(1)).unwrap().text, "Oil\n\n level");
        assert!(snap.store.get(RecordId(2)).is_err());
    }

    #[test]
    fn every_index_entry_resolves_in_store() {
        let records: Vec<Record> = (1..=5u64)
            .map(|id| Record {
                id: RecordId(id),
                vehicle: "X".into(),
                manual: "M".into(),
                page: id as u32,
                text: String::new(),
                image: None,
                embedding: vec![id as f32, 1.0],
            })
            .collect();
        let snap = CorpusSnapshot::from_records(records, IndexKind::Flat).unwrap();
        for c in snap.index.query(&[1.0, 1.0], 10).unwrap() {
            assert!(snap.store.get(c.record_id).is_ok());
        }
    }

    #[test]
    fn duplicate_ids_fail_the_build() {
        let r = Record {
            id: RecordId(1),
            vehicle: "X".into(),
            manual: "M".into(),
            page: 1,
            text: String::new(),
            image: None,
            embedding: vec![1.0],
        };
        let err = CorpusSnapshot::from_records(vec![r.clone(), r], IndexKind::Flat)
            .err()
            .unwrap();
        assert!(matches!(err, SearchError::Duplicate(RecordId(1))));
    }
}
