// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training a model or generating answers).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - No direct file parsing (that's Layer 4 and 6)
//   - Only workflow coordination
//
//   train_use_case.rs    — TrainConfig + the training pipeline
//   generate_use_case.rs — test-split decoding from a checkpoint

pub mod train_use_case;
pub mod generate_use_case;
