//! Content-hash image embedder.
//!
//! Stands in for a learned image model: the container is validated, then the
//! payload is cut into fixed blocks that are feature-hashed together with a
//! coarse byte histogram. Identical images map to identical vectors; unrelated
//! images land close to orthogonal.

use tracing::trace;

use super::hashing::{HashProjector, l2_normalize};
use super::{EmbedFuture, EmbedInput, Embedder};
use crate::errors::SearchError;

const BLOCK: usize = 32;
/// Upper bound on hashed blocks per image; large files are sampled with a wider stride.
const MAX_BLOCKS: usize = 4096;
const HIST_BINS: usize = 16;
const HIST_WEIGHT: f32 = 4.0;
const MIN_LEN: usize = 16;
/// 14-byte file header plus the smallest (OS/2) info header.
const BMP_MIN_HEADER: usize = 26;
const WEBP_CHUNKS: [&[u8]; 3] = [b"VP8 ", b"VP8L", b"VP8X"];

/// Image containers accepted by [`ImageHashEmbedder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    WebP,
}

impl ImageFormat {
    /// Detects the container and checks that it is not truncated.
    ///
    /// # Errors
    /// Returns [`SearchError::UnsupportedInput`] for unknown or corrupt bytes.
    pub fn sniff(bytes: &[u8]) -> Result<Self, SearchError> {
        if bytes.len() < MIN_LEN {
            return Err(SearchError::UnsupportedInput(format!(
                "image is too short ({} bytes)",
                bytes.len()
            )));
        }

        let corrupt = |fmt: &str| SearchError::UnsupportedInput(format!("corrupt {fmt} image"));

        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            // Last chunk must be IEND: length(4) + "IEND" + crc(4).
            let n = bytes.len();
            if &bytes[n - 8..n - 4] != b"IEND" {
                return Err(corrupt("png"));
            }
            return Ok(ImageFormat::Png);
        }

        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            let end = trim_padding(bytes);
            if !end.ends_with(&[0xFF, 0xD9]) {
                return Err(corrupt("jpeg"));
            }
            return Ok(ImageFormat::Jpeg);
        }

        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            if trim_padding(bytes).last() != Some(&0x3B) {
                return Err(corrupt("gif"));
            }
            return Ok(ImageFormat::Gif);
        }

        if bytes.starts_with(b"BM") {
            // File header: total size at 2..6, pixel data offset at 10..14.
            let declared = le_u32(&bytes[2..6]);
            let pixels_at = le_u32(&bytes[10..14]);
            if declared < BMP_MIN_HEADER || declared > bytes.len() || pixels_at >= declared {
                return Err(corrupt("bmp"));
            }
            return Ok(ImageFormat::Bmp);
        }

        if bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
            // RIFF size excludes the 8-byte "RIFF" + size prefix.
            let declared = le_u32(&bytes[4..8]);
            let chunk = &bytes[12..16];
            if declared < 8
                || declared + 8 > bytes.len()
                || !WEBP_CHUNKS.iter().any(|c| *c == chunk)
            {
                return Err(corrupt("webp"));
            }
            return Ok(ImageFormat::WebP);
        }

        Err(SearchError::UnsupportedInput(
            "unrecognized image format".into(),
        ))
    }

    fn seed(self) -> &'static [u8] {
        match self {
            ImageFormat::Png => b"img/png",
            ImageFormat::Jpeg => b"img/jpeg",
            ImageFormat::Gif => b"img/gif",
            ImageFormat::Bmp => b"img/bmp",
            ImageFormat::WebP => b"img/webp",
        }
    }
}

fn le_u32(b: &[u8]) -> usize {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize
}

fn trim_padding(bytes: &[u8]) -> &[u8] {
    let mut end = bytes.len();
    while end > 0 && matches!(bytes[end - 1], 0x00 | b'\n' | b'\r' | b' ') {
        end -= 1;
    }
    &bytes[..end]
}

/// Deterministic image embedder based on content hashing.
#[derive(Clone, Debug)]
pub struct ImageHashEmbedder {
    dim: usize,
    model: String,
}

impl ImageHashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            model: format!("image-hash-{dim}"),
        }
    }

    /// Synchronous core of [`Embedder::embed`].
    pub fn embed_bytes(&self, bytes: &[u8]) -> Result<Vec<f32>, SearchError> {
        let format = ImageFormat::sniff(bytes)?;
        let projector = HashProjector::new(self.dim, format.seed());
        let mut out = vec![0.0f32; self.dim];

        let blocks = bytes.len().div_ceil(BLOCK);
        let stride = if blocks > MAX_BLOCKS {
            blocks.div_ceil(MAX_BLOCKS) * BLOCK
        } else {
            BLOCK
        };
        let mut start = 0;
        while start < bytes.len() {
            let end = (start + BLOCK).min(bytes.len());
            projector.add(&mut out, &bytes[start..end], 1.0);
            start += stride;
        }

        let mut hist = [0usize; HIST_BINS];
        for b in bytes {
            hist[(*b as usize) * HIST_BINS / 256] += 1;
        }
        let total = bytes.len() as f32;
        for (bin, count) in hist.iter().enumerate() {
            let token = format!("hist:{bin}");
            projector.add(&mut out, token.as_bytes(), HIST_WEIGHT * *count as f32 / total);
        }

        l2_normalize(&mut out);
        trace!(
            "embed::image format={format:?} bytes={} stride={stride}",
            bytes.len()
        );
        Ok(out)
    }
}

impl Embedder for ImageHashEmbedder {
    fn embed<'a>(&'a self, input: EmbedInput<'a>) -> EmbedFuture<'a> {
        Box::pin(async move {
            match input {
                EmbedInput::Image(bytes) => self.embed_bytes(bytes),
                EmbedInput::Text(_) => Err(SearchError::UnsupportedInput(
                    "image embedder cannot embed text".into(),
                )),
            }
        })
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn model(&self) -> &str {
        &self.model
    }
}
