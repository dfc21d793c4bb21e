// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from raw split files all the
// way to tensor batches.
//
// The pipeline flows in this order:
//
//   <split>-<category>.json
//       │
//       ▼
//   JsonSplitLoader   → reads one split into raw rows
//       │
//       ▼
//   TextTokenizer     → splits text into word tokens, truncates
//       │
//       ▼
//   Vocabulary        → built once from train, maps tokens ↔ ids
//       │
//       ▼
//   DatasetBuilder    → entity tables + mode-dependent tuples
//       │               (review pools bounded by PolicySelector)
//       ▼
//   Seq2SeqDataset    → implements Burn's Dataset trait
//       │
//       ▼
//   Seq2SeqBatcher    → pads items into mode-tagged tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Reads train/val/test split files from disk
pub mod loader;

/// Word-level tokenization and truncation
pub mod tokenizer;

/// Token ↔ index mapping with reserved symbols
pub mod vocabulary;

/// Append-only id-indexed entity tables
pub mod arena;

/// Review pool selection policies
pub mod review_selector;

/// Builds entity tables and training tuples per split
pub mod builder;

/// Implements Burn's Dataset trait over training tuples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
