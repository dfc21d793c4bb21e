// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Owns one run directory and everything written into it.
//
// Run directory layout:
//   <base>/<category>/<mode>/<YYYY-mm-dd-HH-MM-SS>/
//     params.json                  ← full TrainConfig
//     vocab.json                   ← frozen vocabulary
//     architecture.txt             ← model summary
//     metrics.csv                  ← one row per epoch
//     model_<id>.mpk               ← model parameters
//     optimizer_<id>.mpk           ← Adam moments
//     trainer_state_<id>.json      ← epoch, lr, losses
//     generated_answers_<id>.txt   ← decoded test answers
//
// <id> is an epoch number or `best`. The `best` files are
// overwritten every time validation loss reaches a new low.
//
// Model and optimizer records go through Burn's CompactRecorder
// (MessagePack, half precision). Loading requires a model built
// with the same config, which is why params.json is saved first.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use burn::{
    optim::Optimizer,
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::domain::{error::PipelineError, mode::ModelMode};
use crate::ml::model::Seq2Seq;

// ─── CheckpointId ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointId {
    Epoch(usize),
    Best,
}

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointId::Epoch(epoch) => write!(f, "{epoch}"),
            CheckpointId::Best => f.write_str("best"),
        }
    }
}

impl FromStr for CheckpointId {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "best" => Ok(CheckpointId::Best),
            other => other
                .parse()
                .map(CheckpointId::Epoch)
                .map_err(|_| PipelineError::InvalidCheckpointId(s.to_string())),
        }
    }
}

// ─── TrainerState ─────────────────────────────────────────────────────────────
/// Scalar trainer state saved next to each model checkpoint.
/// NaN losses are stored as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerState {
    pub epoch:             usize,
    pub lr:                f64,
    pub train_loss:        Option<f64>,
    pub val_loss:          Option<f64>,
    pub previous_val_loss: Option<f64>,
    pub best_val_loss:     Option<f64>,
}

// ─── CheckpointManager ────────────────────────────────────────────────────────
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Use `dir` as the run directory, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create run directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Create a fresh timestamped run directory under `base`.
    pub fn create_run(base: impl AsRef<Path>, category: &str, mode: ModelMode) -> Result<Self> {
        let stamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S").to_string();
        Self::new(run_dir(base.as_ref(), category, mode, &stamp))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ── Model ─────────────────────────────────────────────────────────────────
    pub fn save_model<B: Backend>(&self, model: &Seq2Seq<B>, id: CheckpointId) -> Result<()> {
        let path = self.dir.join(format!("model_{id}"));
        model
            .clone()
            .save_file(path.clone(), &CompactRecorder::new())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;
        tracing::debug!("Saved model checkpoint {}", id);
        Ok(())
    }

    /// `model` must have been built from the same config as the saved one.
    pub fn load_model<B: Backend>(
        &self,
        model:  Seq2Seq<B>,
        id:     CheckpointId,
        device: &B::Device,
    ) -> Result<Seq2Seq<B>> {
        let path = self.dir.join(format!("model_{id}"));
        tracing::info!("Loading model checkpoint {} from '{}'", id, self.dir.display());
        model
            .load_file(path.clone(), &CompactRecorder::new(), device)
            .with_context(|| format!("Cannot load model checkpoint '{}'", path.display()))
    }

    // ── Optimizer ─────────────────────────────────────────────────────────────
    pub fn save_optimizer<B, O>(&self, optim: &O, id: CheckpointId) -> Result<()>
    where
        B: AutodiffBackend,
        O: Optimizer<Seq2Seq<B>, B>,
    {
        let path = self.dir.join(format!("optimizer_{id}"));
        Recorder::<B>::record(&CompactRecorder::new(), optim.to_record(), path.clone())
            .with_context(|| format!("Failed to save optimizer to '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_optimizer<B, O>(&self, optim: O, id: CheckpointId, device: &B::Device) -> Result<O>
    where
        B: AutodiffBackend,
        O: Optimizer<Seq2Seq<B>, B>,
    {
        let path = self.dir.join(format!("optimizer_{id}"));
        let record = Recorder::<B>::load::<O::Record>(&CompactRecorder::new(), path.clone(), device)
            .with_context(|| format!("Cannot load optimizer checkpoint '{}'", path.display()))?;
        Ok(optim.load_record(record))
    }

    // ── Trainer state ─────────────────────────────────────────────────────────
    pub fn save_state(&self, state: &TrainerState, id: CheckpointId) -> Result<()> {
        write_json(&self.dir.join(format!("trainer_state_{id}.json")), state)
    }

    pub fn load_state(&self, id: CheckpointId) -> Result<TrainerState> {
        read_json(&self.dir.join(format!("trainer_state_{id}.json")))
    }

    // ── Run metadata ──────────────────────────────────────────────────────────
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        write_json(&self.dir.join("params.json"), cfg)
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        read_json(&self.dir.join("params.json"))
    }

    pub fn save_architecture(&self, summary: &str) -> Result<()> {
        let path = self.dir.join("architecture.txt");
        fs::write(&path, summary)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }

    /// Path of the generated-answers file for a checkpoint.
    pub fn output_file(&self, id: CheckpointId) -> PathBuf {
        self.dir.join(format!("generated_answers_{id}.txt"))
    }
}

/// <base>/<category>/<mode>/<stamp>
pub fn run_dir(base: &Path, category: &str, mode: ModelMode, stamp: &str) -> PathBuf {
    base.join(category).join(mode.name()).join(stamp)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Cannot write '{}'", path.display()))?;
    tracing::debug!("Wrote '{}'", path.display());
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Malformed JSON in '{}'", path.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::Seq2SeqConfig;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_checkpoint_id_parse_and_display() {
        assert_eq!("best".parse::<CheckpointId>().unwrap(), CheckpointId::Best);
        assert_eq!("12".parse::<CheckpointId>().unwrap(), CheckpointId::Epoch(12));
        assert!(matches!(
            "latest".parse::<CheckpointId>(),
            Err(PipelineError::InvalidCheckpointId(_))
        ));
        assert_eq!(CheckpointId::Epoch(3).to_string(), "3");
        assert_eq!(CheckpointId::Best.to_string(), "best");
    }

    #[test]
    fn test_run_dir_layout() {
        let dir = run_dir(Path::new("saved"), "Baby", ModelMode::QuestionAnswer, "2024-01-02-03-04-05");
        assert_eq!(dir, PathBuf::from("saved/Baby/lm_question_answers/2024-01-02-03-04-05"));
    }

    #[test]
    fn test_state_round_trip_with_nan() {
        let tmp = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        let state = TrainerState {
            epoch: 4,
            lr: 0.0005,
            train_loss: Some(2.5),
            val_loss: None,
            previous_val_loss: None,
            best_val_loss: Some(2.1),
        };
        ckpt.save_state(&state, CheckpointId::Epoch(4)).unwrap();
        assert_eq!(ckpt.load_state(CheckpointId::Epoch(4)).unwrap(), state);
        assert!(ckpt.load_state(CheckpointId::Best).is_err());
    }

    #[test]
    fn test_model_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        let device = Default::default();
        let cfg = Seq2SeqConfig::new(10, 0, 4, 4, 5, 1, 0.0, ModelMode::QuestionAnswer);

        let model = cfg.init::<TestBackend>(&device).unwrap();
        ckpt.save_model(&model, CheckpointId::Best).unwrap();
        assert!(tmp.path().join("model_best.mpk").exists());

        let fresh = cfg.init::<TestBackend>(&device).unwrap();
        let loaded = ckpt.load_model(fresh, CheckpointId::Best, &device).unwrap();
        assert_eq!(loaded.num_params(), model.num_params());
        assert_eq!(ckpt.output_file(CheckpointId::Best), tmp.path().join("generated_answers_best.txt"));
    }
}
