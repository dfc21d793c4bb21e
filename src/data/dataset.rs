use burn::data::dataset::Dataset;

use crate::data::builder::SplitData;
use crate::domain::tuple::TrainingTuple;

/// One training tuple with its IDs resolved into token indices.
/// `question` is empty and `reviews` is empty when the mode does
/// not use them.
#[derive(Debug, Clone, PartialEq)]
pub struct Seq2SeqItem {
    pub answer: Vec<usize>,
    pub question: Vec<usize>,
    pub reviews: Vec<Vec<usize>>,
}

/// Serves the flat tuple list of one split to Burn's DataLoader.
pub struct Seq2SeqDataset {
    split: SplitData,
}

impl Seq2SeqDataset {
    pub fn new(split: SplitData) -> Self {
        Self { split }
    }

    fn resolve(&self, tuple: &TrainingTuple) -> Option<Seq2SeqItem> {
        let answer = self.split.answers.get(tuple.answer_id())?.to_vec();
        let question = match tuple.question_id() {
            Some(id) => self.split.questions.get(id)?.to_vec(),
            None => Vec::new(),
        };
        let reviews = match tuple.review_ids() {
            Some(ids) => ids
                .iter()
                .map(|&id| self.split.reviews.get(id).map(|r| r.to_vec()))
                .collect::<Option<Vec<_>>>()?,
            None => Vec::new(),
        };
        Some(Seq2SeqItem { answer, question, reviews })
    }
}

impl Dataset<Seq2SeqItem> for Seq2SeqDataset {
    fn get(&self, index: usize) -> Option<Seq2SeqItem> {
        self.split.tuples.get(index).and_then(|t| self.resolve(t))
    }

    fn len(&self) -> usize {
        self.split.tuples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::builder::{BuilderConfig, DatasetBuilder};
    use crate::domain::mode::ModelMode;
    use crate::domain::policy::ReviewSelectMode;
    use crate::domain::record::{RawQuestion, RawReview, RawRow};

    #[test]
    fn test_items_resolve_ids() {
        let rows = vec![RawRow {
            questions: vec![RawQuestion::new("is it loud?", &["very loud", "no"])],
            reviews: vec![RawReview::new("loud fan"), RawReview::new("quiet enough")],
        }];
        let builder = DatasetBuilder::new(BuilderConfig {
            mode: ModelMode::QuestionAnswerReview,
            max_question_len: 10,
            max_answer_len: 10,
            max_review_len: 10,
            max_vocab_size: 100,
            review_select_mode: ReviewSelectMode::First,
            review_select_num: 5,
            seed: 1,
        });
        let vocab = builder.build_vocabulary(&rows);
        let dataset = Seq2SeqDataset::new(builder.build_split(&rows, &vocab).unwrap());

        assert_eq!(dataset.len(), 2);
        let item = dataset.get(1).unwrap();
        assert_eq!(item.answer, vocab.indices_from_token_list(&["no"]));
        assert_eq!(item.question, vocab.indices_from_token_list(&["is", "it", "loud", "?"]));
        assert_eq!(item.reviews.len(), 2);
        assert!(dataset.get(2).is_none());
    }
}
