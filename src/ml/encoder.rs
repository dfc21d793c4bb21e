// ============================================================
// Layer 5 — Sequence Encoder
// ============================================================
// Embeds a padded batch of token sequences and runs a stacked
// GRU over it, returning the final hidden state of every layer.
//
// Padding handling:
//   at step t each row only advances if mask[row, t] == 1,
//     h_t = m ⊙ gru(x_t, h_{t-1}) + (1 − m) ⊙ h_{t-1}
//   so the returned state is the state at each row's true
//   length, regardless of how much padding follows it.
//
// A row that is all padding keeps the zero initial state.
//
// Reference: Sutskever et al. (2014) Sequence to Sequence Learning

use burn::{
    nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig},
    prelude::*,
};

use crate::data::batcher::TokenBatch;
use crate::ml::cell::{HiddenState, StackedGru, StackedGruConfig};

#[derive(Config, Debug)]
pub struct EncoderConfig {
    pub vocab_size: usize,
    pub d_hidden:   usize,
    pub n_layers:   usize,
    #[config(default = 0.0)]
    pub dropout:    f64,
}

impl EncoderConfig {
    /// The embedding width equals the hidden width.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Encoder<B> {
        Encoder {
            embedding: EmbeddingConfig::new(self.vocab_size, self.d_hidden).init(device),
            rnn: StackedGruConfig::new(self.d_hidden, self.d_hidden, self.n_layers)
                .with_dropout(self.dropout)
                .init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub embedding: Embedding<B>,
    pub rnn:       StackedGru<B>,
    pub dropout:   Dropout,
}

impl<B: Backend> Encoder<B> {
    /// tokens, mask: [batch, steps] → one [batch, d_hidden] tensor per layer
    pub fn forward(&self, input: &TokenBatch<B>) -> HiddenState<B> {
        let [batch, steps] = input.tokens.dims();
        let d = self.rnn.d_hidden();
        let device = input.tokens.device();

        let embedded = self.dropout.forward(self.embedding.forward(input.tokens.clone()));
        let mut state = self.rnn.zero_state(batch, &device);

        for t in 0..steps {
            let x = embedded.clone().slice([0..batch, t..t + 1, 0..d]).reshape([batch, d]);
            let keep: Tensor<B, 2> = input.mask.clone().slice([0..batch, t..t + 1]).expand([batch, d]);
            let skip = keep.clone().neg().add_scalar(1.0);

            let (_, next) = self.rnn.step(x, state.clone());
            state = next
                .into_iter()
                .zip(state)
                .map(|(new, old)| new * keep.clone() + old * skip.clone())
                .collect();
        }

        state
    }

    pub fn d_hidden(&self) -> usize {
        self.rnn.d_hidden()
    }

    pub fn n_layers(&self) -> usize {
        self.rnn.n_layers()
    }

    pub fn vocab_size(&self) -> usize {
        self.embedding.weight.val().dims()[0]
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::TensorData;

    type TestBackend = burn::backend::NdArray;

    fn token_batch(rows: Vec<Vec<i64>>, device: &<TestBackend as Backend>::Device) -> TokenBatch<TestBackend> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let mut tokens = Vec::new();
        let mut mask = Vec::new();
        for row in &rows {
            for i in 0..width {
                tokens.push(row.get(i).copied().unwrap_or(0));
                mask.push(if i < row.len() { 1.0f32 } else { 0.0 });
            }
        }
        TokenBatch {
            tokens: Tensor::from_data(TensorData::new(tokens, [rows.len(), width]), device),
            mask: Tensor::from_data(TensorData::new(mask, [rows.len(), width]), device),
        }
    }

    #[test]
    fn test_final_state_ignores_trailing_padding() {
        let device = Default::default();
        let encoder = EncoderConfig::new(10, 4, 2).init::<TestBackend>(&device);

        let short = encoder.forward(&token_batch(vec![vec![5, 6]], &device));
        let padded = encoder.forward(&token_batch(vec![vec![5, 6], vec![5, 6, 7, 8]], &device));

        assert_eq!(short.len(), 2);
        for (a, b) in short.iter().zip(&padded) {
            let a: Vec<f32> = a.clone().into_data().iter::<f32>().collect();
            let b: Vec<f32> = b.clone().slice([0..1, 0..4]).into_data().iter::<f32>().collect();
            for (x, y) in a.iter().zip(&b) {
                assert!((x - y).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_all_padding_row_keeps_zero_state() {
        let device = Default::default();
        let encoder = EncoderConfig::new(10, 3, 1).init::<TestBackend>(&device);
        let state = encoder.forward(&token_batch(vec![vec![]], &device));
        let sum: f32 = state[0].clone().abs().sum().into_scalar();
        assert_eq!(sum, 0.0);
    }
}
