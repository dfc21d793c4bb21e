// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between the dataset builder and its collaborators:
//
//   RecordSource   — where raw split rows come from
//                    (JsonSplitLoader reads <split>-<category>.json)
//   ReviewSelector — bounds a record's review pool before it is
//                    encoded (PolicySelector implements the
//                    first / random / longest policies)
//
// Programming the builder against these traits keeps it testable
// with in-memory rows and lets a different container format or
// selection strategy be plugged in without touching it.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::record::{RawReview, RawRow, SplitKind};

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can produce the raw rows of a split.
pub trait RecordSource {
    /// Load every row of the given split, in file order.
    /// A missing split file is an error, never an empty result.
    fn load_split(&self, split: SplitKind) -> Result<Vec<RawRow>>;
}

// ─── ReviewSelector ───────────────────────────────────────────────────────────
/// Given a record's review list, return a bounded subset.
///
/// Implementations must return at most their configured number of
/// reviews and must be deterministic for a given construction (seeded randomness
/// only), so that building the same split twice yields identical
/// tables.
pub trait ReviewSelector {
    fn select<'a>(&mut self, reviews: &'a [RawReview]) -> Vec<&'a RawReview>;
}
