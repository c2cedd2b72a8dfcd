use std::sync::Arc;

use super::{EmbedFuture, EmbedInput, Embedder};
use crate::errors::SearchError;

/// Routes image input to one embedder and text input to another.
///
/// Both must produce vectors of the same dimension so they can share an index.
#[derive(Clone)]
pub struct MultiModalEmbedder {
    image: Arc<dyn Embedder>,
    text: Arc<dyn Embedder>,
    model: String,
}

impl MultiModalEmbedder {
    /// # Errors
    /// Returns [`SearchError::Config`] if the two dimensions differ.
    pub fn new(image: Arc<dyn Embedder>, text: Arc<dyn Embedder>) -> Result<Self, SearchError> {
        if image.dimension() != text.dimension() {
            return Err(SearchError::Config(format!(
                "image embedder dim {} != text embedder dim {}",
                image.dimension(),
                text.dimension()
            )));
        }
        let model = format!("{}+{}", image.model(), text.model());
        Ok(Self { image, text, model })
    }
}

impl Embedder for MultiModalEmbedder {
    fn embed<'a>(&'a self, input: EmbedInput<'a>) -> EmbedFuture<'a> {
        match input {
            EmbedInput::Image(_) => self.image.embed(input),
            EmbedInput::Text(_) => self.text.embed(input),
        }
    }

    fn dimension(&self) -> usize {
        self.image.dimension()
    }

    fn model(&self) -> &str {
        &self.model
    }
}
