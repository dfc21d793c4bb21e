// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust types that define the core concepts of the system:
// what a raw Q&A/review record looks like, which of the three
// language-model modes is active, what a training tuple is,
// and which errors the pipeline can raise.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Everything mode-dependent downstream (data building, batching,
// model assembly, the forward pass) matches on `ModelMode`
// exhaustively, so adding a mode is a compile error until every
// decision point handles it.
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

// The closed set of model modes
pub mod mode;

// Review selection and non-finite loss policies
pub mod policy;

// Raw per-row question/answer/review records as read from disk
pub mod record;

// Mode-dependent training tuples
pub mod tuple;

// Structured pipeline errors
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
