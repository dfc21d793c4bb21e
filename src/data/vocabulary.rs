// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// Bidirectional token ↔ index mapping built once from the
// training split and frozen afterwards.
//
// Construction is split into two types:
//
//   VocabularyBuilder — counts tokens via add_sequence()
//   Vocabulary        — immutable, produced by finalize()
//
// so "adding after finalisation" cannot be expressed at all.
//
// Index layout:
//   0 <pad>   1 <unk>   2 <sos>   3 <eos>   4.. corpus tokens
//
// Corpus tokens are ranked by descending frequency, ties broken
// by first-seen order, and capped at `max_size` entries (the
// reserved symbols come on top of the cap).
//
// The vocabulary is persisted next to every trained model
// (vocab.json) so indices stay stable between training and
// generation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const PAD_TOKEN: &str = "<pad>";
pub const UNK_TOKEN: &str = "<unk>";
pub const SOS_TOKEN: &str = "<sos>";
pub const EOS_TOKEN: &str = "<eos>";

pub const PAD_INDEX: usize = 0;
pub const UNK_INDEX: usize = 1;
pub const SOS_INDEX: usize = 2;
pub const EOS_INDEX: usize = 3;

/// Reserved symbols in index order
pub const RESERVED_TOKENS: [&str; 4] = [PAD_TOKEN, UNK_TOKEN, SOS_TOKEN, EOS_TOKEN];

// ─── VocabularyBuilder ────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct VocabularyBuilder {
    max_size: usize,
    counts: HashMap<String, usize>,
    /// Tokens in first-seen order, used to break frequency ties
    first_seen: Vec<String>,
}

impl VocabularyBuilder {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            counts: HashMap::new(),
            first_seen: Vec::new(),
        }
    }

    /// Count every token of one sequence.
    pub fn add_sequence<S: AsRef<str>>(&mut self, tokens: &[S]) {
        for token in tokens {
            let token = token.as_ref();
            match self.counts.get_mut(token) {
                Some(count) => *count += 1,
                None => {
                    self.counts.insert(token.to_string(), 1);
                    self.first_seen.push(token.to_string());
                }
            }
        }
    }

    /// Number of distinct tokens seen so far
    pub fn distinct_tokens(&self) -> usize {
        self.first_seen.len()
    }

    /// Freeze the vocabulary: reserved symbols first, then the
    /// `max_size` most frequent tokens.
    pub fn finalize(self) -> Vocabulary {
        let counts = self.counts;
        let mut ranked: Vec<String> = self
            .first_seen
            .into_iter()
            .filter(|t| !RESERVED_TOKENS.contains(&t.as_str()))
            .collect();
        // sort_by is stable, so equal counts keep first-seen order
        ranked.sort_by(|a, b| counts[b].cmp(&counts[a]));
        ranked.truncate(self.max_size);

        let tokens = RESERVED_TOKENS
            .iter()
            .map(|t| t.to_string())
            .chain(ranked)
            .collect();
        Vocabulary::from_tokens(tokens)
    }
}

// ─── Vocabulary ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "VocabularyFile", into = "VocabularyFile")]
pub struct Vocabulary {
    index_to_token: Vec<String>,
    token_to_index: HashMap<String, usize>,
}

/// On-disk form: just the tokens in index order
#[derive(Serialize, Deserialize)]
struct VocabularyFile {
    tokens: Vec<String>,
}

impl From<VocabularyFile> for Vocabulary {
    fn from(file: VocabularyFile) -> Self {
        Vocabulary::from_tokens(file.tokens)
    }
}

impl From<Vocabulary> for VocabularyFile {
    fn from(vocab: Vocabulary) -> Self {
        VocabularyFile { tokens: vocab.index_to_token }
    }
}

impl Vocabulary {
    fn from_tokens(index_to_token: Vec<String>) -> Self {
        let token_to_index = index_to_token
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { index_to_token, token_to_index }
    }

    /// Total number of symbols, reserved ones included
    pub fn size(&self) -> usize {
        self.index_to_token.len()
    }

    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.token_to_index.get(token).copied()
    }

    /// Map tokens to indices; unknown tokens map to UNK_INDEX.
    pub fn indices_from_token_list<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<usize> {
        tokens
            .iter()
            .map(|t| self.index_of(t.as_ref()).unwrap_or(UNK_INDEX))
            .collect()
    }

    /// Inverse of indices_from_token_list for known indices;
    /// out-of-range indices render as the unknown symbol.
    pub fn token_list_from_indices(&self, indices: &[usize]) -> Vec<String> {
        indices
            .iter()
            .map(|&i| {
                self.index_to_token
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| UNK_TOKEN.to_string())
            })
            .collect()
    }
}
