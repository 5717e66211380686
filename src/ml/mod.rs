pub mod engine;
pub mod pipeline;

use crate::error::Result;

/// Text to fixed-length vector. The production implementation is
/// [`engine::EmbeddingEngine`]; tests substitute their own.
pub trait Embedder {
    fn embed(&mut self, text: &str) -> Result<Vec<f32>>;
}
