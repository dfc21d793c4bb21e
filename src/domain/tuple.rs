// ============================================================
// Layer 3 — Training Tuples
// ============================================================
// One training example, expressed as IDs into the entity tables
// of its split. The shape depends on the model mode:
//
//   AnswerOnly            → (answer_id)
//   QuestionAnswer        → (answer_id, question_id)
//   QuestionAnswerReview  → (answer_id, question_id, review_ids)
//
// The flat list of tuples of a split is what the Burn Dataset
// serves to the DataLoader.

use serde::{Deserialize, Serialize};

use crate::domain::mode::ModelMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingTuple {
    Answer {
        answer_id: usize,
    },
    QuestionAnswer {
        answer_id: usize,
        question_id: usize,
    },
    QuestionAnswerReview {
        answer_id: usize,
        question_id: usize,
        review_ids: Vec<usize>,
    },
}

impl TrainingTuple {
    pub fn answer_id(&self) -> usize {
        match self {
            TrainingTuple::Answer { answer_id }
            | TrainingTuple::QuestionAnswer { answer_id, .. }
            | TrainingTuple::QuestionAnswerReview { answer_id, .. } => *answer_id,
        }
    }

    pub fn question_id(&self) -> Option<usize> {
        match self {
            TrainingTuple::Answer { .. } => None,
            TrainingTuple::QuestionAnswer { question_id, .. }
            | TrainingTuple::QuestionAnswerReview { question_id, .. } => Some(*question_id),
        }
    }

    pub fn review_ids(&self) -> Option<&[usize]> {
        match self {
            TrainingTuple::Answer { .. } | TrainingTuple::QuestionAnswer { .. } => None,
            TrainingTuple::QuestionAnswerReview { review_ids, .. } => Some(review_ids),
        }
    }

    /// Number of elements in the tuple (1, 2 or 3)
    pub fn arity(&self) -> usize {
        self.mode().tuple_arity()
    }

    /// The mode this tuple shape belongs to
    pub fn mode(&self) -> ModelMode {
        match self {
            TrainingTuple::Answer { .. } => ModelMode::AnswerOnly,
            TrainingTuple::QuestionAnswer { .. } => ModelMode::QuestionAnswer,
            TrainingTuple::QuestionAnswerReview { .. } => ModelMode::QuestionAnswerReview,
        }
    }
}
