// ============================================================
// Layer 6 — Metrics
// ============================================================
// Two concerns live here:
//
//   TrainerMetrics — in-memory record of validation losses that
//                    answers "is the latest epoch the best one?"
//   MetricsLogger  — appends one CSV row per epoch to
//                    <run_dir>/metrics.csv
//
// Best-so-far semantics:
//   - the pre-training baseline, when recorded, is the bar to beat
//   - otherwise the first recorded finite loss is the best
//   - afterwards only a strictly lower loss is a new best
//   - NaN is never best
//
// Example CSV output:
//   epoch,train_loss,train_ppl,val_loss,val_ppl,lr
//   0,5.912000,369.660000,5.601200,270.900000,0.001000
//   1,5.102300,164.410000,5.220100,185.000000,0.001000
//
// How to read the metrics:
//   - val_ppl is exp(val_loss): a uniform guess over the vocab
//     gives ppl ≈ vocab size
//   - lr drops by the decay factor right after an epoch whose
//     val_loss rose
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

// ─── TrainerMetrics ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default)]
pub struct TrainerMetrics {
    history:     Vec<(usize, f64)>,
    best:        Option<f64>,
    latest_best: bool,
}

impl TrainerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validation loss of the untrained model. Sets the bar for the
    /// first epoch without counting as an epoch itself.
    pub fn record_baseline(&mut self, val_loss: f64) {
        if !val_loss.is_nan() {
            self.best = Some(val_loss);
        }
        self.latest_best = false;
    }

    /// Record the validation loss of one epoch.
    pub fn record(&mut self, epoch: usize, val_loss: f64) {
        self.latest_best = !val_loss.is_nan()
            && self.best.map_or(true, |best| val_loss < best);
        if self.latest_best {
            self.best = Some(val_loss);
        }
        self.history.push((epoch, val_loss));
    }

    /// True when the most recent `record` produced a new best.
    pub fn is_best_so_far(&self) -> bool {
        self.latest_best
    }

    pub fn best_loss(&self) -> Option<f64> {
        self.best
    }

    pub fn history(&self) -> &[(usize, f64)] {
        &self.history
    }

    /// Restore the best loss saved with a checkpoint.
    pub fn restore(&mut self, best: Option<f64>) {
        self.best = best.filter(|b| !b.is_nan());
        self.latest_best = false;
    }
}

// ─── EpochMetrics ─────────────────────────────────────────────────────────────
/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub train_loss: f64,
    pub train_ppl:  f64,
    pub val_loss:   f64,
    pub val_ppl:    f64,
    /// Learning rate in effect after this epoch's decay decision
    pub lr:         f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, lr: f64) -> Self {
        Self {
            epoch,
            train_loss,
            train_ppl: train_loss.exp(),
            val_loss,
            val_ppl: val_loss.exp(),
            lr,
        }
    }
}

// ─── MetricsLogger ────────────────────────────────────────────────────────────
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so a
    /// resumed run keeps appending to the same file.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,train_ppl,val_loss,val_ppl,lr")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.train_ppl, m.val_loss, m.val_ppl, m.lr,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch, m.train_loss, m.val_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
