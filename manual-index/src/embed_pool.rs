//! Embedding executor with concurrency and dimension checks.

use std::path::Path;

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::embed::{EmbedInput, Embedder};
use crate::errors::SearchError;
use crate::io_jsonl::CorpusRow;

/// Fills `embedding` for rows that have none and enforces one dimension.
///
/// Rows with an `image` are embedded from the image file (resolved against
/// `base_dir`); other rows are embedded from their text.
///
/// # Errors
/// Returns [`SearchError::DimensionMismatch`] if a vector has the wrong size,
/// [`SearchError::Io`] if an image cannot be read, or the embedder's error.
pub async fn embed_missing(
    rows: &mut [CorpusRow],
    base_dir: &Path,
    embedder: &dyn Embedder,
    concurrency: usize,
) -> Result<(), SearchError> {
    let want = embedder.dimension();
    info!(
        "embed_pool::embed_missing: total={} concurrency={}",
        rows.len(),
        concurrency
    );

    let idxs: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, r)| if r.embedding.is_none() { Some(i) } else { None })
        .collect();

    if idxs.is_empty() {
        debug!("embed_pool::embed_missing: nothing to embed");
    }

    let results: Vec<(usize, Vec<f32>)> = stream::iter(idxs.into_iter())
        .map(|i| {
            let image = rows[i].image.as_ref().map(|p| base_dir.join(p));
            let text = rows[i].text.clone();
            async move {
                let v = match image {
                    Some(path) => {
                        let bytes = tokio::fs::read(&path).await?;
                        embedder.embed(EmbedInput::Image(&bytes)).await?
                    }
                    None => embedder.embed(EmbedInput::Text(&text)).await?,
                };
                Ok::<(usize, Vec<f32>), SearchError>((i, v))
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>, SearchError>>()?;

    for (i, v) in results {
        rows[i].embedding = Some(v);
    }

    for r in rows.iter() {
        if let Some(v) = &r.embedding {
            if v.len() != want {
                return Err(SearchError::DimensionMismatch { got: v.len(), want });
            }
        }
    }

    debug!("embed_pool::embed_missing: embeddings filled");
    Ok(())
}
