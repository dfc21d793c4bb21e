// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Persists the frozen vocabulary as <run_dir>/vocab.json so
// generation (and resumed training) maps tokens to exactly the
// indices the model was trained with.
//
// File format:
//   { "tokens": ["<pad>", "<unk>", "<sos>", "<eos>", "the", ...] }

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::data::vocabulary::Vocabulary;

pub struct VocabStore {
    dir: PathBuf,
}

impl VocabStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join("vocab.json")
    }

    pub fn save(&self, vocab: &Vocabulary) -> Result<()> {
        let path = self.path();
        std::fs::write(&path, serde_json::to_string(vocab)?)
            .with_context(|| format!("Cannot write vocabulary to '{}'", path.display()))?;
        tracing::info!("Vocabulary ({} tokens) saved to '{}'", vocab.size(), path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<Vocabulary> {
        let path = self.path();
        let json = std::fs::read_to_string(&path).with_context(|| {
            format!("Cannot read vocabulary from '{}'. Was this run trained?", path.display())
        })?;
        let vocab: Vocabulary = serde_json::from_str(&json)
            .with_context(|| format!("Malformed vocabulary file '{}'", path.display()))?;
        tracing::info!("Loaded vocabulary ({} tokens)", vocab.size());
        Ok(vocab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::vocabulary::VocabularyBuilder;

    #[test]
    fn test_saved_vocabulary_keeps_indices() {
        let tmp = tempfile::tempdir().unwrap();
        let store = VocabStore::new(tmp.path());
        assert!(!store.path().exists());

        let mut builder = VocabularyBuilder::new(10);
        builder.add_sequence(&["good", "value", "good"]);
        let vocab = builder.finalize();
        store.save(&vocab).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.size(), vocab.size());
        assert_eq!(loaded.index_of("good"), vocab.index_of("good"));
        assert_eq!(loaded.index_of("value"), vocab.index_of("value"));
    }
}
