// ============================================================
// Layer 3 — Model Mode
// ============================================================
// The three operating modes of the language model:
//
//   AnswerOnly            — generate answers from prior answer text
//   QuestionAnswer        — condition the decoder on the question
//   QuestionAnswerReview  — condition on the question AND the mean
//                           of the selected reviews
//
// The canonical names (`lm_answers`, ...) are what appears in the
// run configuration, in CLI flags and in run directory paths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelMode {
    #[serde(rename = "lm_answers")]
    AnswerOnly,
    #[serde(rename = "lm_question_answers")]
    QuestionAnswer,
    #[serde(rename = "lm_question_answers_reviews")]
    QuestionAnswerReview,
}

impl ModelMode {
    pub const ALL: [ModelMode; 3] = [
        ModelMode::AnswerOnly,
        ModelMode::QuestionAnswer,
        ModelMode::QuestionAnswerReview,
    ];

    /// Canonical configuration name of this mode
    pub fn name(&self) -> &'static str {
        match self {
            ModelMode::AnswerOnly => "lm_answers",
            ModelMode::QuestionAnswer => "lm_question_answers",
            ModelMode::QuestionAnswerReview => "lm_question_answers_reviews",
        }
    }

    /// Number of elements in a training tuple built for this mode
    pub fn tuple_arity(&self) -> usize {
        match self {
            ModelMode::AnswerOnly => 1,
            ModelMode::QuestionAnswer => 2,
            ModelMode::QuestionAnswerReview => 3,
        }
    }

    pub fn uses_questions(&self) -> bool {
        match self {
            ModelMode::AnswerOnly => false,
            ModelMode::QuestionAnswer | ModelMode::QuestionAnswerReview => true,
        }
    }

    pub fn uses_reviews(&self) -> bool {
        match self {
            ModelMode::AnswerOnly | ModelMode::QuestionAnswer => false,
            ModelMode::QuestionAnswerReview => true,
        }
    }
}

impl fmt::Display for ModelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelMode::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| PipelineError::UnknownMode(s.to_string()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for mode in ModelMode::ALL {
            assert_eq!(mode.name().parse::<ModelMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_unknown_mode_carries_name() {
        let err = "lm_reviews".parse::<ModelMode>().unwrap_err();
        assert!(matches!(err, PipelineError::UnknownMode(ref s) if s == "lm_reviews"));
        assert!(err.to_string().contains("lm_reviews"));
    }

    #[test]
    fn test_tuple_arity() {
        assert_eq!(ModelMode::AnswerOnly.tuple_arity(), 1);
        assert_eq!(ModelMode::QuestionAnswer.tuple_arity(), 2);
        assert_eq!(ModelMode::QuestionAnswerReview.tuple_arity(), 3);
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&ModelMode::QuestionAnswer).unwrap();
        assert_eq!(json, "\"lm_question_answers\"");
    }
}
