//! Sentence embeddings from an ONNX export of `all-MiniLM-L6-v2`.
//!
//! Mirrors the sentence-transformers pipeline for that model: BERT tokenisation,
//! attention-masked mean pooling over `last_hidden_state`, then L2 normalisation.

use std::path::Path;

use ndarray::ArrayView2;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use crate::error::{ImportError, Result};
use crate::ml::pipeline::{hidden_size, l2_normalize, mean_pool, prepare_inputs};
use crate::ml::Embedder;

pub const MAX_SEQ_LENGTH: usize = 256;

pub struct EmbeddingEngine {
    session: Session,
    tokenizer: Tokenizer,
    max_length: usize,
}

fn model_err(e: impl std::fmt::Display) -> ImportError {
    ImportError::Model(e.to_string())
}

fn embed_err(e: impl std::fmt::Display) -> ImportError {
    ImportError::Embedding(e.to_string())
}

impl EmbeddingEngine {
    pub fn load(model_path: &Path, tokenizer_path: &Path) -> Result<Self> {
        let _ = ort::init().with_name("tool-import").commit();

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| ImportError::Model(format!("Failed to load tokenizer: {}", e)))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQ_LENGTH,
                ..Default::default()
            }))
            .map_err(model_err)?;
        tokenizer.with_padding(None);

        let session = Session::builder()
            .map_err(model_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(model_err)?
            .with_intra_threads(1)
            .map_err(model_err)?
            .commit_from_file(model_path)
            .map_err(|e| ImportError::Model(format!("Failed to load embedding model: {}", e)))?;

        info!(
            model = %model_path.display(),
            tokenizer = %tokenizer_path.display(),
            "Embedding model loaded"
        );

        Ok(Self {
            session,
            tokenizer,
            max_length: MAX_SEQ_LENGTH,
        })
    }
}

impl Embedder for EmbeddingEngine {
    fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
        let encoding = self.tokenizer.encode(text, true).map_err(embed_err)?;
        let inputs = prepare_inputs(
            encoding.get_ids(),
            encoding.get_attention_mask(),
            encoding.get_type_ids(),
            self.max_length,
        );

        let shape = [1usize, inputs.seq_len];
        let input_ids = Tensor::from_array((shape, inputs.input_ids)).map_err(embed_err)?;
        let attention_mask =
            Tensor::from_array((shape, inputs.attention_mask.clone())).map_err(embed_err)?;
        let token_type_ids = Tensor::from_array((shape, inputs.token_type_ids)).map_err(embed_err)?;

        let outputs = self
            .session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids,
            ])
            .map_err(embed_err)?;

        let hidden_state = outputs
            .get("last_hidden_state")
            .ok_or_else(|| ImportError::Embedding("No 'last_hidden_state' output found".to_string()))?;
        let (out_shape, data) = hidden_state.try_extract_tensor::<f32>().map_err(embed_err)?;
        let dims = &out_shape[..];
        let width = hidden_size(dims).ok_or_else(|| {
            ImportError::Embedding(format!("Unexpected last_hidden_state shape {:?}", dims))
        })?;

        let hidden = ArrayView2::from_shape((inputs.seq_len, width), data).map_err(embed_err)?;
        let pooled = l2_normalize(mean_pool(hidden, &inputs.attention_mask));
        Ok(pooled.to_vec())
    }
}
