// ============================================================
// Layer 5 — Seq2Seq Model
// ============================================================
// Assembles encoders and the decoder for the selected mode:
//
//   lm_answers                   decoder only, zero initial state
//   lm_question_answers          question encoder → decoder
//   lm_question_answers_reviews  question encoder ┐
//                                review encoder   ┴→ concat → decoder
//
// Hidden-size constraints (checked before any weights exist):
//   lm_question_answers          h_answer == h_question
//   lm_question_answers_reviews  h_answer == h_question + h_review
//
// Review conditioning: every selected review is encoded on its
// own, then the per-layer final states of one tuple's reviews are
// averaged over the real (non-padding) review slots:
//
//   r̄ = Σ_s mask[s] · h_s / max(1, Σ_s mask[s])
//
// The decoder starts from concat(h_question, r̄) in every layer.

use burn::prelude::*;

use crate::data::batcher::{Seq2SeqBatch, TokenBatch};
use crate::data::vocabulary::EOS_INDEX;
use crate::domain::{error::PipelineError, mode::ModelMode};
use crate::ml::cell::HiddenState;
use crate::ml::decoder::{Decoder, DecoderConfig};
use crate::ml::encoder::{Encoder, EncoderConfig};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct Seq2SeqConfig {
    pub vocab_size:      usize,
    pub review_hidden:   usize,
    pub question_hidden: usize,
    pub answer_hidden:   usize,
    pub max_len:         usize,
    pub n_layers:        usize,
    pub dropout:         f64,
    pub mode:            ModelMode,
}

impl Seq2SeqConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        let consistent = match self.mode {
            ModelMode::AnswerOnly => true,
            ModelMode::QuestionAnswer => self.answer_hidden == self.question_hidden,
            ModelMode::QuestionAnswerReview => {
                self.answer_hidden == self.question_hidden + self.review_hidden
            }
        };
        if consistent {
            Ok(())
        } else {
            Err(PipelineError::HiddenSizeMismatch {
                mode: self.mode,
                review: self.review_hidden,
                question: self.question_hidden,
                answer: self.answer_hidden,
            })
        }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Seq2Seq<B>, PipelineError> {
        self.validate()?;

        let encoder = |hidden: usize| {
            EncoderConfig::new(self.vocab_size, hidden, self.n_layers)
                .with_dropout(self.dropout)
                .init::<B>(device)
        };
        let question_encoder = self.mode.uses_questions().then(|| encoder(self.question_hidden));
        let review_encoder = self.mode.uses_reviews().then(|| encoder(self.review_hidden));

        let decoder = DecoderConfig::new(self.vocab_size, self.answer_hidden, self.n_layers, self.max_len)
            .with_dropout(self.dropout)
            .init::<B>(device);

        tracing::info!(
            "Model ready: mode={}, layers={}, hidden(r/q/a)={}/{}/{}",
            self.mode, self.n_layers, self.review_hidden, self.question_hidden, self.answer_hidden,
        );

        Ok(Seq2Seq { question_encoder, review_encoder, decoder })
    }
}

#[derive(Module, Debug)]
pub struct Seq2Seq<B: Backend> {
    pub question_encoder: Option<Encoder<B>>,
    pub review_encoder:   Option<Encoder<B>>,
    pub decoder:          Decoder<B>,
}

pub struct Seq2SeqOutput<B: Backend> {
    /// Per-step vocabulary scores — shape: [batch, steps, vocab]
    pub logits: Tensor<B, 3>,
    /// Greedy decoded tokens — shape: [batch, steps]
    pub sequences: Tensor<B, 2, Int>,
}

impl<B: Backend> Seq2Seq<B> {
    /// Decode as many steps as the batch targets have.
    pub fn forward(
        &self,
        batch: &Seq2SeqBatch<B>,
        teacher_forcing: bool,
    ) -> Result<Seq2SeqOutput<B>, PipelineError> {
        let initial = self.initial_state(batch)?;
        let targets = batch.targets();
        let out = self.decoder.forward(
            initial,
            Some(targets),
            batch.batch_size(),
            teacher_forcing,
            &targets.device(),
        );
        Ok(Seq2SeqOutput { logits: out.logits, sequences: out.predictions })
    }

    /// Free-running greedy decoding for `max_len` steps.
    pub fn generate(&self, batch: &Seq2SeqBatch<B>) -> Result<Seq2SeqOutput<B>, PipelineError> {
        let initial = self.initial_state(batch)?;
        let device = batch.targets().device();
        let out = self.decoder.forward(initial, None, batch.batch_size(), false, &device);
        Ok(Seq2SeqOutput { logits: out.logits, sequences: out.predictions })
    }

    fn initial_state(&self, batch: &Seq2SeqBatch<B>) -> Result<Option<HiddenState<B>>, PipelineError> {
        match batch {
            Seq2SeqBatch::AnswerOnly { .. } => Ok(None),

            Seq2SeqBatch::QuestionAnswer { questions, .. } => {
                Ok(Some(self.question_state(batch.mode(), questions)?))
            }

            Seq2SeqBatch::QuestionAnswerReview { questions, reviews, review_mask, .. } => {
                let mode = batch.mode();
                let question = self.question_state(mode, questions)?;
                let encoder = self
                    .review_encoder
                    .as_ref()
                    .ok_or(PipelineError::MissingEncoder { mode, encoder: "review" })?;
                let review = mean_over_slots(encoder.forward(reviews), review_mask);

                Ok(Some(
                    question
                        .into_iter()
                        .zip(review)
                        .map(|(q, r)| Tensor::cat(vec![q, r], 1))
                        .collect(),
                ))
            }
        }
    }

    fn question_state(&self, mode: ModelMode, questions: &TokenBatch<B>) -> Result<HiddenState<B>, PipelineError> {
        let encoder = self
            .question_encoder
            .as_ref()
            .ok_or(PipelineError::MissingEncoder { mode, encoder: "question" })?;
        Ok(encoder.forward(questions))
    }

    /// Human-readable summary written to architecture.txt.
    pub fn architecture(&self) -> String {
        let describe = |name: &str, enc: &Option<Encoder<B>>| match enc {
            Some(e) => format!(
                "  {name}: Encoder(vocab={}, hidden={}, layers={})\n",
                e.vocab_size(), e.d_hidden(), e.n_layers()
            ),
            None => format!("  {name}: none\n"),
        };
        format!(
            "Seq2Seq(\n{}{}  decoder: Decoder(vocab={}, hidden={}, layers={}, max_len={})\n  params: {}\n)\n",
            describe("question_encoder", &self.question_encoder),
            describe("review_encoder", &self.review_encoder),
            self.decoder.vocab_size(),
            self.decoder.d_hidden(),
            self.decoder.n_layers(),
            self.decoder.max_len,
            self.num_params(),
        )
    }
}

/// states: one [batch · slots, H] tensor per layer,
/// slot_mask: [batch, slots] → one [batch, H] tensor per layer
fn mean_over_slots<B: Backend>(states: HiddenState<B>, slot_mask: &Tensor<B, 2>) -> HiddenState<B> {
    let [batch, slots] = slot_mask.dims();
    let counts = slot_mask.clone().sum_dim(1).clamp_min(1.0); // [batch, 1]

    states
        .into_iter()
        .map(|h| {
            let d = h.dims()[1];
            let weights: Tensor<B, 3> = slot_mask.clone().reshape([batch, slots, 1]).expand([batch, slots, d]);
            let summed = (h.reshape([batch, slots, d]) * weights).sum_dim(1).reshape([batch, d]);
            summed / counts.clone().expand([batch, d])
        })
        .collect()
}

impl<B: Backend> Seq2SeqOutput<B> {
    /// Host copy of the decoded tokens, one row per batch item.
    pub fn decoded(&self) -> Vec<Vec<usize>> {
        let [_, steps] = self.sequences.dims();
        let values: Vec<i64> = self.sequences.clone().into_data().iter::<i64>().collect();
        values
            .chunks(steps.max(1))
            .map(|row| {
                row.iter()
                    .map(|&v| {
                        debug_assert!(v >= 0, "negative token id {v} in decoded output");
                        v as usize
                    })
                    .collect()
            })
            .collect()
    }
}

/// Output length of one decoded row: up to and including the first
/// <eos>, or the full step count when none was produced.
pub fn output_length(row: &[usize]) -> usize {
    row.iter()
        .position(|&t| t == EOS_INDEX)
        .map(|i| i + 1)
        .unwrap_or(row.len())
}
