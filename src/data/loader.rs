// ============================================================
// Layer 4 — Raw Split Loader
// ============================================================
// Loads one raw split file per split kind from the data
// directory:
//
//   <data_dir>/train-<category>.json
//   <data_dir>/val-<category>.json
//   <data_dir>/test-<category>.json
//
// Each file holds a JSON array of rows:
//
//   [
//     {
//       "questions": [
//         { "text": "...", "answers": [ { "text": "..." }, ... ] }
//       ],
//       "reviews": [ { "text": "..." }, ... ]
//     },
//     ...
//   ]
//
// Unlike a best-effort document loader, a missing split file is
// a hard failure: nothing is trained on a partial corpus.
//
// Reference: serde_json documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::error::PipelineError;
use crate::domain::record::{RawRow, SplitKind};
use crate::domain::traits::RecordSource;

/// Reads `<split>-<category>.json` files from a directory.
/// Implements the RecordSource trait from Layer 3.
pub struct JsonSplitLoader {
    dir: PathBuf,
    category: String,
}

impl JsonSplitLoader {
    pub fn new(dir: impl Into<PathBuf>, category: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            category: category.into(),
        }
    }

    /// Full path of a split file
    pub fn split_path(&self, split: SplitKind) -> PathBuf {
        self.dir
            .join(format!("{}-{}.json", split.prefix(), self.category))
    }
}

impl RecordSource for JsonSplitLoader {
    fn load_split(&self, split: SplitKind) -> Result<Vec<RawRow>> {
        let path = self.split_path(split);
        let rows = load_rows(&path)?;
        tracing::info!("Loaded {} rows from '{}'", rows.len(), path.display());
        Ok(rows)
    }
}

/// Parse a single split file into rows, in file order.
fn load_rows(path: &Path) -> Result<Vec<RawRow>> {
    if !path.exists() {
        return Err(PipelineError::MissingDataFile(path.to_path_buf()).into());
    }

    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    let rows: Vec<RawRow> = serde_json::from_str(&json)
        .with_context(|| format!("Malformed split file '{}'", path.display()))?;

    Ok(rows)
}
