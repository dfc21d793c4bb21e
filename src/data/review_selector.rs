// ============================================================
// Layer 4 — Review Selector
// ============================================================
// Bounds the review pool of a record before its reviews are
// encoded (question-answer-review mode only).
//
// Policies:
//   first   — the first N reviews, record order
//   random  — N reviews sampled without replacement using a
//             seeded RNG, returned in record order
//   longest — the N reviews with the most tokens, ties broken
//             by record order, returned in record order
//
// A fresh selector is created for every split build, so two
// builds of the same file select exactly the same reviews.

use rand::{rngs::StdRng, seq::index, SeedableRng};

use crate::data::tokenizer::TextTokenizer;
use crate::domain::policy::ReviewSelectMode;
use crate::domain::record::RawReview;
use crate::domain::traits::ReviewSelector;

pub struct PolicySelector {
    mode: ReviewSelectMode,
    count: usize,
    rng: StdRng,
    tokenizer: TextTokenizer,
}

impl PolicySelector {
    pub fn new(mode: ReviewSelectMode, count: usize, seed: u64) -> Self {
        Self {
            mode,
            count,
            rng: StdRng::seed_from_u64(seed),
            tokenizer: TextTokenizer::new(),
        }
    }
}

impl ReviewSelector for PolicySelector {
    fn select<'a>(&mut self, reviews: &'a [RawReview]) -> Vec<&'a RawReview> {
        if reviews.len() <= self.count {
            return reviews.iter().collect();
        }

        let mut picked: Vec<usize> = match self.mode {
            ReviewSelectMode::First => (0..self.count).collect(),
            ReviewSelectMode::Random => {
                index::sample(&mut self.rng, reviews.len(), self.count).into_vec()
            }
            ReviewSelectMode::Longest => {
                let mut by_len: Vec<(usize, usize)> = reviews
                    .iter()
                    .enumerate()
                    .map(|(i, r)| (i, self.tokenizer.tokenize(&r.text).len()))
                    .collect();
                // stable sort keeps record order among equal lengths
                by_len.sort_by(|a, b| b.1.cmp(&a.1));
                by_len.into_iter().take(self.count).map(|(i, _)| i).collect()
            }
        };

        picked.sort_unstable();
        picked.into_iter().map(|i| &reviews[i]).collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn reviews(texts: &[&str]) -> Vec<RawReview> {
        texts.iter().map(|t| RawReview::new(*t)).collect()
    }

    fn texts(selected: &[&RawReview]) -> Vec<String> {
        selected.iter().map(|r| r.text.clone()).collect()
    }

    #[test]
    fn test_short_pool_is_returned_whole() {
        let pool = reviews(&["a", "b"]);
        for mode in [ReviewSelectMode::First, ReviewSelectMode::Random, ReviewSelectMode::Longest] {
            let mut s = PolicySelector::new(mode, 5, 1);
            assert_eq!(s.select(&pool).len(), 2);
        }
    }

    #[test]
    fn test_first_keeps_prefix() {
        let pool = reviews(&["a", "b", "c", "d"]);
        let mut s = PolicySelector::new(ReviewSelectMode::First, 2, 1);
        assert_eq!(texts(&s.select(&pool)), vec!["a", "b"]);
    }

    #[test]
    fn test_longest_prefers_more_tokens() {
        let pool = reviews(&["short", "a much longer review here", "two words", "three words now"]);
        let mut s = PolicySelector::new(ReviewSelectMode::Longest, 2, 1);
        assert_eq!(
            texts(&s.select(&pool)),
            vec!["a much longer review here", "three words now"]
        );
    }

    #[test]
    fn test_random_is_bounded_and_seeded() {
        let pool = reviews(&["a", "b", "c", "d", "e", "f", "g"]);
        let mut s1 = PolicySelector::new(ReviewSelectMode::Random, 3, 7);
        let mut s2 = PolicySelector::new(ReviewSelectMode::Random, 3, 7);
        let a = texts(&s1.select(&pool));
        let b = texts(&s2.select(&pool));
        assert_eq!(a.len(), 3);
        assert_eq!(a, b);
        // returned in record order
        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(a, sorted);
    }

    #[test]
    fn test_zero_count_selects_nothing() {
        let pool = reviews(&["a", "b"]);
        let mut s = PolicySelector::new(ReviewSelectMode::First, 0, 1);
        assert!(s.select(&pool).is_empty());
    }
}
