// ============================================================
// Layer 4 — Dataset Builder
// ============================================================
// Converts raw rows into what the model trains on.
//
//   build_vocabulary(train rows)
//       every question, answer and review of the TRAINING split
//       is tokenised + truncated with its own length cap and fed
//       into a fresh VocabularyBuilder
//
//   build_split(rows, vocab) → SplitData
//       for each row, in file order:
//         1. each question  → Questions table   (question_id)
//         2. each answer    → Answers table     (answer_id)
//                             + one partial tuple per answer
//                             + question → answer_ids entry
//         3. full mode only: select reviews, encode each into the
//            Reviews table, attach the review_id list to every
//            tuple produced for this row
//         4. append the row's tuples to the flat tuple list
//
// Questions are always stored, even in answer-only mode, so the
// three tables line up identically across modes.
//
// After a split is built every table is verified against
// len(table) == max assigned id + 1.
//
// Reference: Rust Book §8 (Collections)
//            Rust Book §13 (Iterators and Closures)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::arena::EntityTable;
use crate::data::review_selector::PolicySelector;
use crate::data::tokenizer::TextTokenizer;
use crate::data::vocabulary::{Vocabulary, VocabularyBuilder};
use crate::domain::error::PipelineError;
use crate::domain::mode::ModelMode;
use crate::domain::policy::ReviewSelectMode;
use crate::domain::record::{RawRow, SplitKind};
use crate::domain::traits::{RecordSource, ReviewSelector};
use crate::domain::tuple::TrainingTuple;

// ─── Builder Configuration ────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderConfig {
    pub mode: ModelMode,
    pub max_question_len: usize,
    pub max_answer_len: usize,
    pub max_review_len: usize,
    pub max_vocab_size: usize,
    pub review_select_mode: ReviewSelectMode,
    pub review_select_num: usize,
    /// Seed for the random review selection policy
    pub seed: u64,
}

// ─── SplitData ────────────────────────────────────────────────────────────────
/// The five products of building one split.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitData {
    pub mode: ModelMode,
    pub answers: EntityTable,
    pub questions: EntityTable,
    /// question_id → answer_ids of that question
    pub question_answers: Vec<Vec<usize>>,
    pub reviews: EntityTable,
    pub tuples: Vec<TrainingTuple>,
}

impl SplitData {
    fn new(mode: ModelMode) -> Self {
        Self {
            mode,
            answers: EntityTable::new("answers"),
            questions: EntityTable::new("questions"),
            question_answers: Vec::new(),
            reviews: EntityTable::new("reviews"),
            tuples: Vec::new(),
        }
    }

    /// Check all three entity tables against their assigned IDs.
    /// The reviews table must stay empty in modes without reviews,
    /// and every tuple must have the split mode's shape.
    pub fn verify(&self) -> Result<(), PipelineError> {
        self.answers.verify()?;
        self.questions.verify()?;
        self.reviews.verify()?;
        if !self.mode.uses_reviews() && !self.reviews.is_empty() {
            return Err(PipelineError::TableInvariant {
                table: "reviews",
                len: self.reviews.len(),
                next_id: 0,
            });
        }
        if self.question_answers.len() != self.questions.len() {
            return Err(PipelineError::TableInvariant {
                table: "question_answers",
                len: self.question_answers.len(),
                next_id: self.questions.len(),
            });
        }
        let expected = self.mode.tuple_arity();
        if let Some((index, tuple)) = self.tuples.iter().enumerate().find(|(_, t)| t.arity() != expected) {
            return Err(PipelineError::TupleArity {
                mode: self.mode,
                index,
                expected,
                found: tuple.arity(),
            });
        }
        Ok(())
    }
}

// ─── DatasetBuilder ───────────────────────────────────────────────────────────
pub struct DatasetBuilder {
    cfg: BuilderConfig,
    tokenizer: TextTokenizer,
}

impl DatasetBuilder {
    pub fn new(cfg: BuilderConfig) -> Self {
        Self { cfg, tokenizer: TextTokenizer::new() }
    }

    /// Build the vocabulary from the rows of the training split.
    pub fn build_vocabulary(&self, rows: &[RawRow]) -> Vocabulary {
        let cfg = &self.cfg;
        let mut builder = VocabularyBuilder::new(cfg.max_vocab_size);
        let mut answer_tokens = 0usize;

        for row in rows {
            for question in &row.questions {
                builder.add_sequence(&self.tokenizer.truncate(&question.text, cfg.max_question_len));

                for answer in &question.answers {
                    let tokens = self.tokenizer.truncate(&answer.text, cfg.max_answer_len);
                    answer_tokens += tokens.len();
                    builder.add_sequence(&tokens);
                }
            }

            for review in &row.reviews {
                builder.add_sequence(&self.tokenizer.truncate(&review.text, cfg.max_review_len));
            }
        }

        let distinct = builder.distinct_tokens();
        let vocab = builder.finalize();
        tracing::info!(
            "Train: No. of answer tokens = {}, distinct tokens = {}, Vocab size = {}",
            answer_tokens,
            distinct,
            vocab.size()
        );
        vocab
    }

    /// Build the entity tables and tuple list of one split.
    pub fn build_split(&self, rows: &[RawRow], vocab: &Vocabulary) -> Result<SplitData, PipelineError> {
        let cfg = &self.cfg;
        let mode = cfg.mode;
        let mut split = SplitData::new(mode);
        let mut selector =
            PolicySelector::new(cfg.review_select_mode, cfg.review_select_num, cfg.seed);

        for row in rows {
            // (answer_id, question_id) for every answer of this row
            let mut pairs: Vec<(usize, usize)> = Vec::new();

            for question in &row.questions {
                let ids = self.encode(&question.text, cfg.max_question_len, vocab);
                let question_id = split.questions.push(ids);

                let mut answer_ids = Vec::with_capacity(question.answers.len());
                for answer in &question.answers {
                    let ids = self.encode(&answer.text, cfg.max_answer_len, vocab);
                    let answer_id = split.answers.push(ids);
                    answer_ids.push(answer_id);
                    pairs.push((answer_id, question_id));
                }
                split.question_answers.push(answer_ids);
            }

            let review_ids: Vec<usize> = match mode {
                ModelMode::AnswerOnly | ModelMode::QuestionAnswer => Vec::new(),
                ModelMode::QuestionAnswerReview => selector
                    .select(&row.reviews)
                    .into_iter()
                    .map(|review| {
                        let ids = self.encode(&review.text, cfg.max_review_len, vocab);
                        split.reviews.push(ids)
                    })
                    .collect(),
            };

            split.tuples.extend(pairs.into_iter().map(|(answer_id, question_id)| match mode {
                ModelMode::AnswerOnly => TrainingTuple::Answer { answer_id },
                ModelMode::QuestionAnswer => TrainingTuple::QuestionAnswer { answer_id, question_id },
                ModelMode::QuestionAnswerReview => TrainingTuple::QuestionAnswerReview {
                    answer_id,
                    question_id,
                    review_ids: review_ids.clone(),
                },
            }));
        }

        split.verify()?;
        tracing::info!("Number of samples in the data = {}", split.tuples.len());
        Ok(split)
    }

    fn encode(&self, text: &str, max_length: usize, vocab: &Vocabulary) -> Vec<usize> {
        vocab.indices_from_token_list(&self.tokenizer.truncate(text, max_length))
    }
}

// ─── ReviewQaCorpus ───────────────────────────────────────────────────────────
/// Vocabulary plus the three built splits of one category.
pub struct ReviewQaCorpus {
    pub vocab: Vocabulary,
    pub train: SplitData,
    pub val: SplitData,
    pub test: SplitData,
}

impl ReviewQaCorpus {
    /// Build the vocabulary from the training split, then all
    /// three splits with it. Any missing split file aborts.
    pub fn load(source: &impl RecordSource, builder: &DatasetBuilder) -> Result<Self> {
        let train_rows = source.load_split(SplitKind::Train)?;
        let vocab = builder.build_vocabulary(&train_rows);
        Self::assemble(source, builder, vocab, train_rows)
    }

    /// Same as `load`, but reuse an existing vocabulary (resume).
    pub fn load_with_vocabulary(
        source: &impl RecordSource,
        builder: &DatasetBuilder,
        vocab: Vocabulary,
    ) -> Result<Self> {
        let train_rows = source.load_split(SplitKind::Train)?;
        Self::assemble(source, builder, vocab, train_rows)
    }

    fn assemble(
        source: &impl RecordSource,
        builder: &DatasetBuilder,
        vocab: Vocabulary,
        train_rows: Vec<RawRow>,
    ) -> Result<Self> {
        let train = builder.build_split(&train_rows, &vocab)?;
        let val = builder.build_split(&source.load_split(SplitKind::Val)?, &vocab)?;
        let test = builder.build_split(&source.load_split(SplitKind::Test)?, &vocab)?;
        Ok(Self { vocab, train, val, test })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::vocabulary::UNK_INDEX;
    use crate::domain::record::{RawQuestion, RawReview};

    fn config(mode: ModelMode) -> BuilderConfig {
        BuilderConfig {
            mode,
            max_question_len: 10,
            max_answer_len: 10,
            max_review_len: 10,
            max_vocab_size: 100,
            review_select_mode: ReviewSelectMode::First,
            review_select_num: 2,
            seed: 1,
        }
    }

    /// 3 rows, 1 question (2 tokens) with 2 answers (3 and 5 tokens)
    fn three_rows(reviews_per_row: usize) -> Vec<RawRow> {
        (0..3)
            .map(|i| RawRow {
                questions: vec![RawQuestion::new(
                    format!("question {i}"),
                    &["short answer here", "a five token long answer"],
                )],
                reviews: (0..reviews_per_row)
                    .map(|r| RawReview::new(format!("review {r} of row {i}")))
                    .collect(),
            })
            .collect()
    }

    struct MemorySource(Vec<RawRow>);

    impl RecordSource for MemorySource {
        fn load_split(&self, _split: SplitKind) -> Result<Vec<RawRow>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_answer_only_end_to_end_shapes() {
        let rows = three_rows(0);
        let builder = DatasetBuilder::new(config(ModelMode::AnswerOnly));
        let vocab = builder.build_vocabulary(&rows);
        let split = builder.build_split(&rows, &vocab).unwrap();

        assert_eq!(split.answers.len(), 6);
        assert_eq!(split.questions.len(), 3);
        assert_eq!(split.reviews.len(), 0);
        assert_eq!(split.tuples.len(), 6);
        assert!(split.tuples.iter().all(|t| t.arity() == 1));
        assert_eq!(split.answers.get(0).unwrap().len(), 3);
        assert_eq!(split.answers.get(1).unwrap().len(), 5);
        assert_eq!(split.question_answers, vec![vec![0, 1], vec![2, 3], vec![4, 5]]);
    }

    #[test]
    fn test_question_answer_tuples_link_questions() {
        let rows = three_rows(0);
        let builder = DatasetBuilder::new(config(ModelMode::QuestionAnswer));
        let vocab = builder.build_vocabulary(&rows);
        let split = builder.build_split(&rows, &vocab).unwrap();

        assert!(split.tuples.iter().all(|t| t.arity() == 2));
        assert_eq!(
            split.tuples[3],
            TrainingTuple::QuestionAnswer { answer_id: 3, question_id: 1 }
        );
    }

    #[test]
    fn test_full_mode_attaches_bounded_review_ids() {
        let rows = three_rows(4);
        let builder = DatasetBuilder::new(config(ModelMode::QuestionAnswerReview));
        let vocab = builder.build_vocabulary(&rows);
        let split = builder.build_split(&rows, &vocab).unwrap();

        assert_eq!(split.reviews.len(), 6);
        assert_eq!(split.reviews.max_id(), Some(5));
        for t in &split.tuples {
            assert_eq!(t.arity(), 3);
            assert!(t.review_ids().unwrap().len() <= 2);
        }
        // both answers of row 1 share row 1's reviews
        assert_eq!(split.tuples[2].review_ids(), Some(&[2, 3][..]));
        assert_eq!(split.tuples[3].review_ids(), Some(&[2, 3][..]));
    }

    #[test]
    fn test_reviews_ignored_outside_full_mode() {
        let rows = three_rows(3);
        let builder = DatasetBuilder::new(config(ModelMode::QuestionAnswer));
        let vocab = builder.build_vocabulary(&rows);
        let split = builder.build_split(&rows, &vocab).unwrap();
        assert!(split.reviews.is_empty());
        // ...but review text still feeds the vocabulary
        assert!(vocab.index_of("review").is_some());
    }

    #[test]
    fn test_tables_satisfy_id_invariant() {
        for mode in ModelMode::ALL {
            let rows = three_rows(3);
            let builder = DatasetBuilder::new(config(mode));
            let vocab = builder.build_vocabulary(&rows);
            let split = builder.build_split(&rows, &vocab).unwrap();
            for table in [&split.answers, &split.questions, &split.reviews] {
                assert_eq!(table.len(), table.max_id().map_or(0, |m| m + 1));
            }
        }
    }

    #[test]
    fn test_reviews_in_a_review_free_mode_fail_verification() {
        let rows = three_rows(2);
        let builder = DatasetBuilder::new(config(ModelMode::QuestionAnswerReview));
        let vocab = builder.build_vocabulary(&rows);
        let mut split = builder.build_split(&rows, &vocab).unwrap();
        assert!(split.verify().is_ok());

        split.mode = ModelMode::QuestionAnswer;
        assert!(matches!(
            split.verify(),
            Err(PipelineError::TableInvariant { table: "reviews", next_id: 0, .. })
        ));
    }

    #[test]
    fn test_tuple_of_the_wrong_shape_fails_verification() {
        let rows = three_rows(0);
        let builder = DatasetBuilder::new(config(ModelMode::QuestionAnswer));
        let vocab = builder.build_vocabulary(&rows);
        let mut split = builder.build_split(&rows, &vocab).unwrap();
        split.tuples[4] = TrainingTuple::Answer { answer_id: 4 };
        assert!(matches!(
            split.verify(),
            Err(PipelineError::TupleArity { index: 4, expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn test_build_is_idempotent() {
        let rows = three_rows(5);
        let mut cfg = config(ModelMode::QuestionAnswerReview);
        cfg.review_select_mode = ReviewSelectMode::Random;
        let builder = DatasetBuilder::new(cfg);
        let vocab = builder.build_vocabulary(&rows);
        let a = builder.build_split(&rows, &vocab).unwrap();
        let b = builder.build_split(&rows, &vocab).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_tokens_in_other_splits_map_to_unk() {
        let builder = DatasetBuilder::new(config(ModelMode::AnswerOnly));
        let vocab = builder.build_vocabulary(&three_rows(0));
        let val = vec![RawRow {
            questions: vec![RawQuestion::new("question 0", &["answer zebra"])],
            reviews: vec![],
        }];
        let split = builder.build_split(&val, &vocab).unwrap();
        let ids = split.answers.get(0).unwrap();
        assert_eq!(ids[0], vocab.index_of("answer").unwrap());
        assert_eq!(ids[1], UNK_INDEX);
    }

    #[test]
    fn test_truncation_applies_per_field() {
        let mut cfg = config(ModelMode::AnswerOnly);
        cfg.max_answer_len = 2;
        let builder = DatasetBuilder::new(cfg);
        let rows = three_rows(0);
        let vocab = builder.build_vocabulary(&rows);
        let split = builder.build_split(&rows, &vocab).unwrap();
        assert!((0..split.answers.len()).all(|id| split.answers.get(id).unwrap().len() <= 2));
        assert_eq!(split.questions.get(0).unwrap().len(), 2);
    }

    #[test]
    fn test_corpus_builds_all_splits_with_train_vocabulary() {
        let source = MemorySource(three_rows(2));
        let builder = DatasetBuilder::new(config(ModelMode::QuestionAnswerReview));
        let corpus = ReviewQaCorpus::load(&source, &builder).unwrap();
        assert_eq!(corpus.train, corpus.val);
        assert_eq!(corpus.test.tuples.len(), 6);
        assert!(corpus.vocab.size() > 4);
    }
}
