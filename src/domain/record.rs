// ============================================================
// Layer 3 — Raw Records
// ============================================================
// The logical shape of one row of a raw split file:
//
//   Row
//     ├── questions: Vec<Question>
//     │      ├── text
//     │      └── answers: Vec<Answer> (each with text)
//     └── reviews:   Vec<Review>      (each with text)
//
// Any extra fields present on disk are ignored by serde.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three dataset splits, each stored in its own file
/// named `<prefix>-<category>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitKind {
    Train,
    Val,
    Test,
}

impl SplitKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            SplitKind::Train => "train",
            SplitKind::Val => "val",
            SplitKind::Test => "test",
        }
    }
}

impl fmt::Display for SplitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub questions: Vec<RawQuestion>,
    #[serde(default)]
    pub reviews: Vec<RawReview>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawQuestion {
    pub text: String,
    #[serde(default)]
    pub answers: Vec<RawAnswer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAnswer {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReview {
    pub text: String,
}

impl RawQuestion {
    pub fn new(text: impl Into<String>, answers: &[&str]) -> Self {
        Self {
            text: text.into(),
            answers: answers.iter().map(|a| RawAnswer { text: a.to_string() }).collect(),
        }
    }
}

impl RawReview {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
