// ============================================================
// Layer 4 — Text Tokenizer / Truncator
// ============================================================
// Turns raw question, answer and review text into token lists.
//
// Tokenisation steps (applied in order):
//   1. Surround every ASCII punctuation character except the
//      apostrophe with spaces, so "it's great!" → "it's great !"
//   2. Split on whitespace
//   3. Lower-case every token that is not all-uppercase, so
//      acronyms and shouted words ("USB", "NOT") survive
//
// Truncation keeps at most `max_length` tokens from the start.
// No end-of-sequence marker is inserted at the cut: a truncated
// answer looks exactly like a complete one downstream.
//
// Reference: Rust Book §8 (Strings in Rust)
//            Rust Book §13 (Iterators)

pub struct TextTokenizer;

impl TextTokenizer {
    /// Create a new TextTokenizer instance
    pub fn new() -> Self {
        Self
    }

    /// Split text into tokens. Pure and deterministic; any input,
    /// including the empty string, yields a (possibly empty) list.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        // ── Step 1: Pad punctuation with spaces ───────────────────────────────
        let mut spaced = String::with_capacity(text.len() + text.len() / 4);
        for c in text.chars() {
            if is_split_punctuation(c) {
                spaced.push(' ');
                spaced.push(c);
                spaced.push(' ');
            } else {
                spaced.push(c);
            }
        }

        // ── Step 2 + 3: Split and normalise case ──────────────────────────────
        spaced
            .split_whitespace()
            .map(|token| {
                if is_all_uppercase(token) {
                    token.to_string()
                } else {
                    token.to_lowercase()
                }
            })
            .collect()
    }

    /// Tokenize, then keep at most `max_length` tokens from the start.
    pub fn truncate(&self, text: &str, max_length: usize) -> Vec<String> {
        let mut tokens = self.tokenize(text);
        tokens.truncate(max_length);
        tokens
    }
}

/// Implement Default so TextTokenizer can be created with TextTokenizer::default()
impl Default for TextTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_split_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() && c != '\''
}

/// True when the token has at least one cased character and no
/// lower-case ones ("USB", "A1", "I'M"); digits alone do not count.
fn is_all_uppercase(token: &str) -> bool {
    let mut has_cased = false;
    for c in token.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}
