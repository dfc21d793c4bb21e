// ============================================================
// Layer 5 — Evaluation and Generation
// ============================================================
// Forward-only passes over a stream of batches:
//
//   validation_loss   — masked cross-entropy per batch, decoder
//                       fed its own predictions (no teacher forcing)
//   generate_answers  — greedy decoding for max_len steps, one
//                       line of text per tuple appended to a file
//
// Both take any backend, so they run on the inner (non-autodiff)
// backend via model.valid() and never build a gradient graph.
//
// A generated line holds the decoded tokens up to the first
// <eos>, with that <eos> left out and tokens joined by spaces.

use anyhow::{Context, Result};
use std::{fs::OpenOptions, io::Write, path::Path};
use burn::{prelude::*, tensor::ElementConversion};

use crate::data::batcher::Seq2SeqBatch;
use crate::data::vocabulary::{Vocabulary, EOS_INDEX};
use crate::ml::loss::{sequence_loss, LossAccumulator};
use crate::ml::model::{output_length, Seq2Seq};

pub fn validation_loss<B: Backend>(
    model:   &Seq2Seq<B>,
    batches: impl Iterator<Item = Seq2SeqBatch<B>>,
) -> Result<LossAccumulator> {
    let mut acc = LossAccumulator::new();
    for batch in batches {
        let output = model.forward(&batch, false)?;
        let loss: f64 = sequence_loss(output.logits, batch.targets().clone())
            .into_scalar()
            .elem::<f64>();
        acc.add(loss);
    }
    Ok(acc)
}

/// Returns the number of lines written.
pub fn generate_answers<B: Backend>(
    model:   &Seq2Seq<B>,
    batches: impl Iterator<Item = Seq2SeqBatch<B>>,
    vocab:   &Vocabulary,
    path:    &Path,
) -> Result<usize> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot open '{}' for writing", path.display()))?;

    let mut lines = 0;
    for batch in batches {
        let output = model.generate(&batch)?;
        for row in output.decoded() {
            writeln!(file, "{}", render_answer(&row, vocab))?;
            lines += 1;
        }
    }
    Ok(lines)
}

pub fn render_answer(row: &[usize], vocab: &Vocabulary) -> String {
    let mut tokens = &row[..output_length(row)];
    if let Some((&EOS_INDEX, rest)) = tokens.split_last() {
        tokens = rest;
    }
    vocab.token_list_from_indices(tokens).join(" ")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::Seq2SeqBatcher;
    use crate::data::dataset::Seq2SeqItem;
    use crate::data::vocabulary::VocabularyBuilder;
    use crate::domain::mode::ModelMode;
    use crate::ml::model::Seq2SeqConfig;
    use burn::data::dataloader::batcher::Batcher;

    type TestBackend = burn::backend::NdArray;

    fn vocab() -> Vocabulary {
        let mut b = VocabularyBuilder::new(10);
        b.add_sequence(&["works", "great", "works"]);
        b.finalize()
    }

    #[test]
    fn test_render_stops_at_first_eos() {
        let v = vocab();
        let works = v.index_of("works").unwrap();
        let great = v.index_of("great").unwrap();
        assert_eq!(render_answer(&[works, great, EOS_INDEX, works], &v), "works great");
        assert_eq!(render_answer(&[great, works], &v), "great works");
        assert_eq!(render_answer(&[EOS_INDEX], &v), "");
    }

    #[test]
    fn test_generate_appends_one_line_per_item() {
        let device = Default::default();
        let v = vocab();
        let model = Seq2SeqConfig::new(v.size(), 0, 4, 4, 4, 1, 0.0, ModelMode::AnswerOnly)
            .init::<TestBackend>(&device)
            .unwrap();
        let batcher = Seq2SeqBatcher::<TestBackend>::new(device, ModelMode::AnswerOnly);
        let items = vec![
            Seq2SeqItem { answer: vec![4], question: vec![], reviews: vec![] },
            Seq2SeqItem { answer: vec![5, 4], question: vec![], reviews: vec![] },
        ];

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("generated_answers_0.txt");
        let n = generate_answers(&model, std::iter::once(batcher.batch(items.clone())), &v, &path).unwrap();
        assert_eq!(n, 2);
        generate_answers(&model, std::iter::once(batcher.batch(items)), &v, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 4);
    }

    #[test]
    fn test_validation_loss_is_finite() {
        let device = Default::default();
        let model = Seq2SeqConfig::new(8, 0, 3, 3, 4, 1, 0.0, ModelMode::QuestionAnswer)
            .init::<TestBackend>(&device)
            .unwrap();
        let batcher = Seq2SeqBatcher::<TestBackend>::new(device, ModelMode::QuestionAnswer);
        let batch = batcher.batch(vec![Seq2SeqItem { answer: vec![4, 5], question: vec![6], reviews: vec![] }]);

        let acc = validation_loss(&model, vec![batch.clone(), batch].into_iter()).unwrap();
        assert_eq!(acc.batches(), 2);
        assert!(acc.epoch_loss().is_finite());
    }
}
