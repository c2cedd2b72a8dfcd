//! Hashed bag-of-words text embedder.

use super::hashing::{HashProjector, l2_normalize};
use super::{EmbedFuture, EmbedInput, Embedder};
use crate::errors::SearchError;

const SEED: &[u8] = b"text/v1";
const BIGRAM_WEIGHT: f32 = 0.5;

/// Unigrams plus bigrams of lowercased alphanumeric words, feature-hashed.
#[derive(Clone, Debug)]
pub struct TextHashEmbedder {
    dim: usize,
    model: String,
}

impl TextHashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            model: format!("text-hash-{dim}"),
        }
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>, SearchError> {
        let tokens: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect();
        if tokens.is_empty() {
            return Err(SearchError::UnsupportedInput(
                "text contains no searchable words".into(),
            ));
        }

        let projector = HashProjector::new(self.dim, SEED);
        let mut out = vec![0.0f32; self.dim];
        for t in &tokens {
            projector.add(&mut out, t.as_bytes(), 1.0);
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            projector.add(&mut out, bigram.as_bytes(), BIGRAM_WEIGHT);
        }

        l2_normalize(&mut out);
        Ok(out)
    }
}

impl Embedder for TextHashEmbedder {
    fn embed<'a>(&'a self, input: EmbedInput<'a>) -> EmbedFuture<'a> {
        Box::pin(async move {
            match input {
                EmbedInput::Text(text) => self.embed_text(text),
                EmbedInput::Image(_) => Err(SearchError::UnsupportedInput(
                    "text embedder cannot embed images".into(),
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
