// ============================================================
// Layer 5 — Answer Decoder
// ============================================================
// Generates the answer one token at a time from an initial
// hidden state (or zeros when there is no encoder).
//
// Per step:
//   e_t      = embed(input_t)                  [batch, hidden]
//   o_t, h_t = gru(e_t, h_{t-1})
//   logits_t = W_out · o_t                     [batch, vocab]
//   pred_t   = argmax(logits_t)
//   input_{t+1} = target_t when teacher forcing, else pred_t
//
// The first input is <sos>. Teacher forcing is decided once
// per call and applies to every step of that call.
//
// Reference: Sutskever et al. (2014)
//            Williams & Zipser (1989) teacher forcing

use burn::{
    nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig, Linear, LinearConfig},
    prelude::*,
};

use crate::data::vocabulary::SOS_INDEX;
use crate::ml::cell::{HiddenState, StackedGru, StackedGruConfig};

#[derive(Config, Debug)]
pub struct DecoderConfig {
    pub vocab_size: usize,
    pub d_hidden:   usize,
    pub n_layers:   usize,
    pub max_len:    usize,
    #[config(default = 0.0)]
    pub dropout:    f64,
}

impl DecoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Decoder<B> {
        Decoder {
            embedding: EmbeddingConfig::new(self.vocab_size, self.d_hidden).init(device),
            rnn: StackedGruConfig::new(self.d_hidden, self.d_hidden, self.n_layers)
                .with_dropout(self.dropout)
                .init(device),
            projection: LinearConfig::new(self.d_hidden, self.vocab_size).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            max_len: self.max_len.max(1),
        }
    }
}

#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    pub embedding:  Embedding<B>,
    pub rnn:        StackedGru<B>,
    pub projection: Linear<B>,
    pub dropout:    Dropout,
    pub max_len:    usize,
}

pub struct DecoderOutput<B: Backend> {
    /// Per-step vocabulary scores — shape: [batch, steps, vocab]
    pub logits: Tensor<B, 3>,
    /// Greedy prediction per step — shape: [batch, steps]
    pub predictions: Tensor<B, 2, Int>,
}

impl<B: Backend> Decoder<B> {
    /// Decode `targets.dims()[1]` steps when targets are given,
    /// otherwise `max_len` steps.
    pub fn forward(
        &self,
        initial:         Option<HiddenState<B>>,
        targets:         Option<&Tensor<B, 2, Int>>,
        batch:           usize,
        teacher_forcing: bool,
        device:          &B::Device,
    ) -> DecoderOutput<B> {
        let d = self.rnn.d_hidden();
        let steps = targets.map(|t| t.dims()[1]).unwrap_or(self.max_len);

        let mut state = initial.unwrap_or_else(|| self.rnn.zero_state(batch, device));
        let mut input = Tensor::<B, 1, Int>::full([batch], SOS_INDEX as i64, device);

        let mut all_logits = Vec::with_capacity(steps);
        let mut all_preds  = Vec::with_capacity(steps);

        for t in 0..steps {
            let embedded = self
                .dropout
                .forward(self.embedding.forward(input.reshape([batch, 1])))
                .reshape([batch, d]);
            let (output, next) = self.rnn.step(embedded, state);
            state = next;

            let logits = self.projection.forward(output);
            let predicted: Tensor<B, 1, Int> = logits.clone().argmax(1).reshape([batch]);

            input = match targets {
                Some(targets) if teacher_forcing => {
                    targets.clone().slice([0..batch, t..t + 1]).reshape([batch])
                }
                _ => predicted.clone(),
            };

            all_logits.push(logits);
            all_preds.push(predicted);
        }

        DecoderOutput {
            logits: Tensor::stack(all_logits, 1),
            predictions: Tensor::stack(all_preds, 1),
        }
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
