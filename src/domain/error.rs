// ============================================================
// Layer 3 — Pipeline Errors
// ============================================================
// Structured failures of the data pipeline, model assembly and
// training loop. Every variant aborts the current run; there is
// no retry or degraded mode anywhere.
//
//   configuration  — UnknownMode, UnknownPolicy, HiddenSizeMismatch,
//                    MissingLoader, MissingEncoder, InvalidCheckpointId
//   input          — MissingDataFile
//   data integrity — TableInvariant, TupleArity
//   numeric        — NonFiniteLoss (only under the fail-fast policy)

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::mode::ModelMode;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unimplemented model mode: {0}")]
    UnknownMode(String),

    #[error("Unknown {kind} policy: {value}")]
    UnknownPolicy { kind: &'static str, value: String },

    #[error("Data file not found: {}", .0.display())]
    MissingDataFile(PathBuf),

    #[error(
        "Hidden sizes incompatible with {mode}: review={review}, question={question}, answer={answer}"
    )]
    HiddenSizeMismatch {
        mode: ModelMode,
        review: usize,
        question: usize,
        answer: usize,
    },

    #[error("{table} table has {len} entries but next id is {next_id}")]
    TableInvariant {
        table: &'static str,
        len: usize,
        next_id: usize,
    },

    #[error("Tuple {index} has {found} elements, {mode} expects {expected}")]
    TupleArity {
        mode: ModelMode,
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("No [{0}] data loader")]
    MissingLoader(&'static str),

    #[error("{mode} requires a {encoder} encoder")]
    MissingEncoder {
        mode: ModelMode,
        encoder: &'static str,
    },

    #[error("Non-finite loss {loss} at epoch {epoch}, batch {batch}")]
    NonFiniteLoss { epoch: usize, batch: usize, loss: f64 },

    #[error("Invalid checkpoint id: {0}")]
    InvalidCheckpointId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::HiddenSizeMismatch {
            mode: ModelMode::QuestionAnswer,
            review: 0,
            question: 64,
            answer: 128,
        };
        let msg = err.to_string();
        assert!(msg.contains("lm_question_answers"));
        assert!(msg.contains("question=64"));

        let err = PipelineError::TableInvariant { table: "answers", len: 3, next_id: 4 };
        assert!(err.to_string().contains("answers"));

        let err = PipelineError::MissingDataFile(PathBuf::from("/nope/train-x.json"));
        assert!(err.to_string().contains("/nope/train-x.json"));
    }
}
