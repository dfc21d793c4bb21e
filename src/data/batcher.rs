// ============================================================
// Layer 4 — Seq2Seq Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<Seq2SeqItem>
// into tensors, producing a batch tagged with the model mode.
//
// Layout of one batch of N items:
//
//   targets      [N, A]       answer tokens + <eos>, <pad> after
//   questions    [N, Q]       question tokens, <pad> after
//                + mask [N, Q] (1.0 real token, 0.0 padding)
//   reviews      [N * S, R]   row-major: item 0 slot 0..S, item 1 ...
//                + mask [N * S, R]
//   review_mask  [N, S]       1.0 where the slot holds a real review
//
// S is the largest review count in the batch. Items with fewer
// reviews get empty padding slots that the review mean ignores.
// Every width is at least 1 so no zero-sized tensor is created.
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §8 (Vectors)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::Seq2SeqItem;
use crate::data::vocabulary::{EOS_INDEX, PAD_INDEX};
use crate::domain::mode::ModelMode;

// ─── Batch types ──────────────────────────────────────────────────────────────
/// Padded token sequences with their validity mask.
#[derive(Debug, Clone)]
pub struct TokenBatch<B: Backend> {
    /// Token indices — shape: [rows, width]
    pub tokens: Tensor<B, 2, Int>,
    /// 1.0 = real token, 0.0 = padding — shape: [rows, width]
    pub mask: Tensor<B, 2>,
}

/// A batch ready for the model forward pass, one variant per mode.
#[derive(Debug, Clone)]
pub enum Seq2SeqBatch<B: Backend> {
    AnswerOnly {
        targets: Tensor<B, 2, Int>,
    },
    QuestionAnswer {
        targets: Tensor<B, 2, Int>,
        questions: TokenBatch<B>,
    },
    QuestionAnswerReview {
        targets: Tensor<B, 2, Int>,
        questions: TokenBatch<B>,
        reviews: TokenBatch<B>,
        review_mask: Tensor<B, 2>,
    },
}

impl<B: Backend> Seq2SeqBatch<B> {
    /// Decoder targets (answers + <eos>) — shape: [batch, steps]
    pub fn targets(&self) -> &Tensor<B, 2, Int> {
        match self {
            Seq2SeqBatch::AnswerOnly { targets }
            | Seq2SeqBatch::QuestionAnswer { targets, .. }
            | Seq2SeqBatch::QuestionAnswerReview { targets, .. } => targets,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.targets().dims()[0]
    }

    pub fn mode(&self) -> ModelMode {
        match self {
            Seq2SeqBatch::AnswerOnly { .. } => ModelMode::AnswerOnly,
            Seq2SeqBatch::QuestionAnswer { .. } => ModelMode::QuestionAnswer,
            Seq2SeqBatch::QuestionAnswerReview { .. } => ModelMode::QuestionAnswerReview,
        }
    }
}

// ─── Seq2SeqBatcher ───────────────────────────────────────────────────────────
/// Holds the target device and the mode that decides which
/// tensors a batch carries.
#[derive(Clone, Debug)]
pub struct Seq2SeqBatcher<B: Backend> {
    pub device: B::Device,
    pub mode: ModelMode,
}

impl<B: Backend> Seq2SeqBatcher<B> {
    pub fn new(device: B::Device, mode: ModelMode) -> Self {
        Self { device, mode }
    }

    fn token_batch(&self, rows: &[&[usize]]) -> TokenBatch<B> {
        let padded = PaddedRows::new(rows, false);
        TokenBatch {
            tokens: padded.tokens(&self.device),
            mask: padded.mask(&self.device),
        }
    }
}

impl<B: Backend> Batcher<Seq2SeqItem, Seq2SeqBatch<B>> for Seq2SeqBatcher<B> {
    fn batch(&self, items: Vec<Seq2SeqItem>) -> Seq2SeqBatch<B> {
        let answers: Vec<&[usize]> = items.iter().map(|i| i.answer.as_slice()).collect();
        let targets = PaddedRows::new(&answers, true).tokens(&self.device);

        match self.mode {
            ModelMode::AnswerOnly => Seq2SeqBatch::AnswerOnly { targets },

            ModelMode::QuestionAnswer => {
                let questions: Vec<&[usize]> =
                    items.iter().map(|i| i.question.as_slice()).collect();
                Seq2SeqBatch::QuestionAnswer {
                    targets,
                    questions: self.token_batch(&questions),
                }
            }

            ModelMode::QuestionAnswerReview => {
                let questions: Vec<&[usize]> =
                    items.iter().map(|i| i.question.as_slice()).collect();

                let slots = items.iter().map(|i| i.reviews.len()).max().unwrap_or(0).max(1);
                let mut review_rows: Vec<&[usize]> = Vec::with_capacity(items.len() * slots);
                let mut slot_mask: Vec<f32> = Vec::with_capacity(items.len() * slots);
                for item in &items {
                    for slot in 0..slots {
                        match item.reviews.get(slot) {
                            Some(review) => {
                                review_rows.push(review.as_slice());
                                slot_mask.push(1.0);
                            }
                            None => {
                                review_rows.push(&[]);
                                slot_mask.push(0.0);
                            }
                        }
                    }
                }

                let review_mask = Tensor::<B, 2>::from_data(
                    TensorData::new(slot_mask, [items.len(), slots]),
                    &self.device,
                );

                Seq2SeqBatch::QuestionAnswerReview {
                    targets,
                    questions: self.token_batch(&questions),
                    reviews: self.token_batch(&review_rows),
                    review_mask,
                }
            }
        }
    }
}

// ─── Padding ──────────────────────────────────────────────────────────────────
/// Row-major padded token values plus mask, before tensor creation.
#[derive(Debug, Clone, PartialEq)]
struct PaddedRows {
    rows: usize,
    width: usize,
    values: Vec<i64>,
    mask: Vec<f32>,
}

impl PaddedRows {
    /// Pad every row to the longest one with <pad>, optionally
    /// appending <eos> to each row first.
    fn new(rows: &[&[usize]], append_eos: bool) -> Self {
        let extra = usize::from(append_eos);
        let width = rows.iter().map(|r| r.len() + extra).max().unwrap_or(0).max(1);

        let mut values = Vec::with_capacity(rows.len() * width);
        let mut mask = Vec::with_capacity(rows.len() * width);
        for row in rows {
            let mut len = 0;
            for &token in row.iter() {
                values.push(token as i64);
                len += 1;
            }
            if append_eos {
                values.push(EOS_INDEX as i64);
                len += 1;
            }
            mask.extend(std::iter::repeat(1.0).take(len));
            values.extend(std::iter::repeat(PAD_INDEX as i64).take(width - len));
            mask.extend(std::iter::repeat(0.0).take(width - len));
        }

        Self { rows: rows.len(), width, values, mask }
    }

    fn tokens<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2, Int> {
        Tensor::from_data(TensorData::new(self.values.clone(), [self.rows, self.width]), device)
    }

    fn mask<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        Tensor::from_data(TensorData::new(self.mask.clone(), [self.rows, self.width]), device)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn item(answer: &[usize], question: &[usize], reviews: &[&[usize]]) -> Seq2SeqItem {
        Seq2SeqItem {
            answer: answer.to_vec(),
            question: question.to_vec(),
            reviews: reviews.iter().map(|r| r.to_vec()).collect(),
        }
    }

    #[test]
    fn test_padding_appends_eos_and_pads() {
        let rows: Vec<&[usize]> = vec![&[5, 6], &[7]];
        let p = PaddedRows::new(&rows, true);
        assert_eq!(p.width, 3);
        assert_eq!(p.values, vec![5, 6, 3, 7, 3, 0]);
        assert_eq!(p.mask, vec![1.0, 1.0, 1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_padding_never_zero_width() {
        let rows: Vec<&[usize]> = vec![&[], &[]];
        let p = PaddedRows::new(&rows, false);
        assert_eq!(p.width, 1);
        assert_eq!(p.values, vec![0, 0]);
        assert_eq!(p.mask, vec![0.0, 0.0]);
    }

    #[test]
    fn test_answer_only_batch_shape() {
        let device = Default::default();
        let batcher = Seq2SeqBatcher::<TestBackend>::new(device, ModelMode::AnswerOnly);
        let batch = batcher.batch(vec![item(&[4, 5, 6], &[], &[]), item(&[7], &[], &[])]);
        assert_eq!(batch.mode(), ModelMode::AnswerOnly);
        assert_eq!(batch.targets().dims(), [2, 4]);
        assert_eq!(batch.batch_size(), 2);
    }

    #[test]
    fn test_full_batch_review_slots() {
        let device = Default::default();
        let batcher =
            Seq2SeqBatcher::<TestBackend>::new(device, ModelMode::QuestionAnswerReview);
        let batch = batcher.batch(vec![
            item(&[4], &[8, 9], &[&[10, 11, 12], &[13]]),
            item(&[5, 6], &[8], &[]),
        ]);
        match batch {
            Seq2SeqBatch::QuestionAnswerReview { targets, questions, reviews, review_mask } => {
                assert_eq!(targets.dims(), [2, 3]);
                assert_eq!(questions.tokens.dims(), [2, 2]);
                assert_eq!(reviews.tokens.dims(), [4, 3]);
                let slots: Vec<f32> = review_mask.into_data().iter::<f32>().collect();
                assert_eq!(slots, vec![1.0, 1.0, 0.0, 0.0]);
            }
            other => panic!("unexpected batch variant {:?}", other.mode()),
        }
    }
}
