// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains the Burn model, loss, and training code.
//
// What's in this layer:
//
//   cell.rs      — GRU cell and the stacked multi-layer GRU
//   encoder.rs   — embedding + GRU over a padded token batch,
//                  returns final hidden state per layer
//   decoder.rs   — step-by-step answer decoder with teacher
//                  forcing and greedy argmax
//   model.rs     — Seq2Seq assembly per mode, hidden-size
//                  checks, review mean, decoded outputs
//   loss.rs      — masked cross-entropy, epoch loss, perplexity
//   schedule.rs  — validation-driven learning rate decay
//   evaluator.rs — validation loss and answer generation
//   trainer.rs   — the epoch loop with checkpointing and resume
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Sutskever et al. (2014) Sequence to Sequence Learning

pub mod cell;
pub mod encoder;
pub mod decoder;

/// Seq2Seq model assembled per mode
pub mod model;

pub mod loss;
pub mod schedule;
pub mod evaluator;

/// Full training loop with validation and checkpointing
pub mod trainer;
