// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles all cross-cutting concerns that don't belong in
// any specific business layer:
//
//   checkpoint.rs  — run directory layout; model and optimizer
//                    records via Burn's CompactRecorder, trainer
//                    state and params.json via serde_json
//
//   vocab_store.rs — vocab.json persistence so training and
//                    generation share token indices
//
//   metrics.rs     — best-so-far tracking and the per-epoch
//                    metrics.csv
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Run directory, checkpoints and params.json
pub mod checkpoint;

/// Vocabulary saving and loading
pub mod vocab_store;

/// Best-loss tracking and metrics CSV logger
pub mod metrics;
