// ============================================================
// Layer 5 — Sequence Loss
// ============================================================
// Masked cross-entropy over every decoded position:
//
//   loss = − (1 / |M|) Σ_{(b,t) ∈ M} log softmax(logits[b,t])[target[b,t]]
//
// where M is the set of non-<pad> target positions, so padding
// never contributes to the loss or its gradient.
//
// Epoch statistics are accumulated on the host:
//   epoch_loss = mean of the per-batch losses
//   perplexity = exp(epoch_loss)

use burn::{prelude::*, tensor::activation::log_softmax};

use crate::data::vocabulary::PAD_INDEX;

/// logits: [batch, steps, vocab], targets: [batch, steps] → scalar loss
pub fn sequence_loss<B: Backend>(logits: Tensor<B, 3>, targets: Tensor<B, 2, Int>) -> Tensor<B, 1> {
    let [batch, steps, vocab] = logits.dims();
    let positions = batch * steps;
    let targets = targets.reshape([positions, 1]);

    let log_probs = log_softmax(logits.reshape([positions, vocab]), 1);
    let nll = log_probs.gather(1, targets.clone()).reshape([positions]).neg();
    let mask = targets
        .reshape([positions])
        .not_equal_elem(PAD_INDEX as i64)
        .float();

    // Mean over real tokens; an all-pad batch yields 0 rather than 0/0.
    let tokens = mask.clone().sum().clamp_min(1.0);
    (nll * mask).sum() / tokens
}

/// Running mean of per-batch losses within one epoch.
#[derive(Debug, Clone, Default)]
pub struct LossAccumulator {
    sum:     f64,
    batches: usize,
}

impl LossAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn add(&mut self, loss: f64) {
        self.sum += loss;
        self.batches += 1;
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    /// NaN when no batch was added.
    pub fn epoch_loss(&self) -> f64 {
        if self.batches > 0 {
            self.sum / self.batches as f64
        } else {
            f64::NAN
        }
    }

    pub fn epoch_perplexity(&self) -> f64 {
        perplexity(self.epoch_loss())
    }
}

pub fn perplexity(loss: f64) -> f64 {
    loss.exp()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::{ElementConversion, TensorData};

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_accumulator_mean_and_perplexity() {
        let mut acc = LossAccumulator::new();
        assert!(acc.epoch_loss().is_nan());

        acc.add(1.0);
        acc.add(3.0);
        assert_eq!(acc.batches(), 2);
        assert_eq!(acc.epoch_loss(), 2.0);
        assert!((acc.epoch_perplexity() - 2.0f64.exp()).abs() < 1e-12);

        acc.reset();
        assert_eq!(acc.batches(), 0);
    }

    #[test]
    fn test_padding_positions_are_ignored() {
        let device = Default::default();
        let logits = |pad_scores: [f32; 5]| {
            let mut values = vec![0.0f32, 0.0, 0.0, 0.0, 5.0];
            values.extend(pad_scores);
            Tensor::<TestBackend, 3>::from_data(TensorData::new(values, [1, 2, 5]), &device)
        };
        let targets =
            || Tensor::<TestBackend, 2, Int>::from_data(TensorData::new(vec![4i64, 0], [1, 2]), &device);

        // Position 1 is <pad>: its scores must not move the loss.
        let a: f64 = sequence_loss(logits([9.0, 0.0, 0.0, 0.0, 0.0]), targets()).into_scalar().elem();
        let b: f64 = sequence_loss(logits([0.0, 0.0, 0.0, 0.0, 9.0]), targets()).into_scalar().elem();
        assert!((a - b).abs() < 1e-6);
        assert!(a.is_finite());
    }

    #[test]
    fn test_padding_does_not_dilute_the_mean() {
        let device = Default::default();
        let uniform = |steps: usize| {
            Tensor::<TestBackend, 3>::from_data(
                TensorData::new(vec![0.0f32; steps * 5], [1, steps, 5]),
                &device,
            )
        };
        let ids = |values: Vec<i64>| {
            let n = values.len();
            Tensor::<TestBackend, 2, Int>::from_data(TensorData::new(values, [1, n]), &device)
        };

        let unpadded: f64 = sequence_loss(uniform(1), ids(vec![4])).into_scalar().elem();
        let padded: f64 = sequence_loss(uniform(4), ids(vec![4, 0, 0, 0])).into_scalar().elem();
        let ln5 = 5.0f64.ln();
        assert!((unpadded - ln5).abs() < 1e-4, "unpadded = {unpadded}");
        assert!((padded - ln5).abs() < 1e-4, "padded = {padded}");
    }

    #[test]
    fn test_mean_is_over_tokens_across_rows() {
        let device = Default::default();
        // Row 0 has two real tokens, row 1 has one; all three sit at ln 5.
        let logits =
            Tensor::<TestBackend, 3>::from_data(TensorData::new(vec![0.0f32; 2 * 2 * 5], [2, 2, 5]), &device);
        let targets = Tensor::<TestBackend, 2, Int>::from_data(
            TensorData::new(vec![1i64, 2, 3, 0], [2, 2]),
            &device,
        );
        let loss: f64 = sequence_loss(logits, targets).into_scalar().elem();
        assert!((loss - 5.0f64.ln()).abs() < 1e-4);
    }

    #[test]
    fn test_all_pad_batch_is_zero() {
        let device = Default::default();
        let logits =
            Tensor::<TestBackend, 3>::from_data(TensorData::new(vec![0.0f32; 2 * 5], [1, 2, 5]), &device);
        let targets =
            Tensor::<TestBackend, 2, Int>::from_data(TensorData::new(vec![0i64, 0], [1, 2]), &device);
        let loss: f64 = sequence_loss(logits, targets).into_scalar().elem();
        assert_eq!(loss, 0.0);
    }
}
