//! Embedding abstraction shared by the image and text variants.
//!
//! Index and ranker only ever see `Vec<f32>`; which modality produced the
//! vector is the embedder's business.

use std::{future::Future, pin::Pin};

use crate::errors::SearchError;

mod hashing;
pub mod image;
pub mod multimodal;
pub mod ollama;
pub mod text;

pub use image::{ImageFormat, ImageHashEmbedder};
pub use multimodal::MultiModalEmbedder;
pub use ollama::{OllamaConfig, OllamaEmbedder};
pub use text::TextHashEmbedder;

/// Boxed future returned by [`Embedder::embed`].
pub type EmbedFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<f32>, SearchError>> + Send + 'a>>;

/// Borrowed raw content to embed.
#[derive(Clone, Copy, Debug)]
pub enum EmbedInput<'a> {
    Image(&'a [u8]),
    Text(&'a str),
}

impl EmbedInput<'_> {
    pub fn modality(&self) -> &'static str {
        match self {
            EmbedInput::Image(_) => "image",
            EmbedInput::Text(_) => "text",
        }
    }
}

/// Owned query content, as received from a caller.
#[derive(Clone, Debug)]
pub enum QueryInput {
    Image(Vec<u8>),
    Text(String),
}

impl QueryInput {
    pub fn as_input(&self) -> EmbedInput<'_> {
        match self {
            QueryInput::Image(b) => EmbedInput::Image(b),
            QueryInput::Text(t) => EmbedInput::Text(t),
        }
    }
}

/// Provider interface for embedding generation.
///
/// Implementations must be deterministic for identical input and always
/// return vectors of [`Embedder::dimension`] length.
pub trait Embedder: Send + Sync {
    /// Async embedding function.
    fn embed<'a>(&'a self, input: EmbedInput<'a>) -> EmbedFuture<'a>;

    /// Output dimensionality.
    fn dimension(&self) -> usize;

    /// Model name reported in stats.
    fn model(&self) -> &str;
}
