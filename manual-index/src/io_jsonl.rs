//! JSONL reader for the corpus manifest.
//!
//! One object per line:
//! `{"id": 1, "vehicle": "LYRIQ", "manual": "Owner", "page": 12, "text": "...",
//!   "image": "pages/owner-012.png", "embedding": [..]}`
//! `image` and `embedding` are optional. Empty lines are skipped.

use std::io::{BufRead, BufReader};
use std::{fs::File, path::Path, path::PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::SearchError;
use crate::record::RecordId;

/// One manifest row before embeddings are resolved.
#[derive(Debug, Clone, Deserialize)]
pub struct CorpusRow {
    pub id: RecordId,
    pub vehicle: String,
    pub manual: String,
    pub page: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image: Option<PathBuf>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

/// Reads the manifest strictly.
///
/// # Errors
/// - [`SearchError::Io`] if the file cannot be read.
/// - [`SearchError::Parse`] with the 1-based line number of the first bad row.
pub fn read_corpus(jsonl_path: impl AsRef<Path>) -> Result<Vec<CorpusRow>, SearchError> {
    info!("Reading corpus manifest: {:?}", jsonl_path.as_ref());

    let file = File::open(jsonl_path.as_ref())?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let row: CorpusRow = serde_json::from_str(&line).map_err(|e| SearchError::Parse {
            line: i + 1,
            reason: e.to_string(),
        })?;
        out.push(row);
    }

    debug!("Loaded {} corpus rows", out.len());
    Ok(out)
}
