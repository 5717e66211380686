use ndarray::{Array1, ArrayView2, Axis};

/// Flat, row-major model inputs for a single sequence (batch of one).
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInputs {
    pub seq_len: usize,
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

pub fn prepare_inputs(ids: &[u32], mask: &[u32], type_ids: &[u32], max_length: usize) -> ModelInputs {
    let seq_len = ids.len().min(max_length).max(1);
    let widen = |src: &[u32]| -> Vec<i64> {
        let mut out = vec![0i64; seq_len];
        for (dst, v) in out.iter_mut().zip(src.iter()) {
            *dst = *v as i64;
        }
        out
    };

    ModelInputs {
        seq_len,
        input_ids: widen(ids),
        attention_mask: widen(mask),
        token_type_ids: widen(type_ids),
    }
}

/// Width of a `(batch, seq_len, hidden)` output, or `None` for any other shape.
pub fn hidden_size(shape: &[i64]) -> Option<usize> {
    match shape {
        [_, _, hidden] if *hidden > 0 => Some(*hidden as usize),
        _ => None,
    }
}

/// Averages token embeddings of shape (seq_len, hidden) over positions where
/// the attention mask is set.
pub fn mean_pool(hidden: ArrayView2<f32>, attention_mask: &[i64]) -> Array1<f32> {
    let mut sum = Array1::<f32>::zeros(hidden.len_of(Axis(1)));
    let mut count = 0.0f32;

    for (row, &m) in hidden.outer_iter().zip(attention_mask.iter()) {
        if m == 1 {
            sum += &row;
            count += 1.0;
        }
    }

    if count > 0.0 {
        sum /= count;
    }
    sum
}

pub fn l2_normalize(mut v: Array1<f32>) -> Array1<f32> {
    let norm = v.dot(&v).sqrt();
    if norm > 0.0 {
        v /= norm;
    }
    v
}
