// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load split files            (Layer 4 - data)
//   Step 2: Build / reload vocabulary   (Layer 4 + 6)
//   Step 3: Build the three splits      (Layer 4 - data)
//   Step 4: Open the run directory      (Layer 6 - infra)
//   Step 5: Save params.json            (Layer 6 - infra)
//   Step 6: Build datasets              (Layer 4 - data)
//   Step 7: Run training loop           (Layer 5 - ml)
//
// A fresh run gets a new timestamped directory. A resumed run
// reuses `resume_dir` and its vocab.json so token indices match
// the saved weights.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    builder::{BuilderConfig, DatasetBuilder, ReviewQaCorpus},
    dataset::Seq2SeqDataset,
    loader::JsonSplitLoader,
};
use crate::domain::{
    mode::ModelMode,
    policy::{NonFinitePolicy, ReviewSelectMode},
};
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabStore};
use crate::ml::{
    model::Seq2SeqConfig,
    trainer::{run_training, TrainSummary},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All parameters of a run. Saved verbatim as params.json so
// generation can rebuild the exact model and data pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub category:              String,
    pub data_dir:              String,
    pub base_dir:              String,
    pub mode:                  ModelMode,

    pub max_question_len:      usize,
    pub max_answer_len:        usize,
    pub max_review_len:        usize,
    pub max_vocab_size:        usize,
    pub review_select_mode:    ReviewSelectMode,
    pub review_select_num:     usize,

    pub h_review:              usize,
    pub h_question:            usize,
    pub h_answer:              usize,
    pub n_layers:              usize,
    pub dropout:               f64,

    pub lr:                    f64,
    pub lr_decay:              f64,
    pub resume_lr:             Option<f64>,
    pub teacher_forcing_ratio: f64,
    pub global_norm_max:       f64,
    pub batch_size:            usize,
    pub epochs:                usize,
    pub save_model_every:      usize,
    pub print_every:           usize,
    pub output_max_len:        usize,
    pub seed:                  u64,
    pub non_finite_loss:       NonFinitePolicy,

    pub resume_dir:            Option<String>,
    pub resume_epoch:          Option<usize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            category:              "Baby".to_string(),
            data_dir:              "data/input".to_string(),
            base_dir:              "saved_models".to_string(),
            mode:                  ModelMode::QuestionAnswer,
            max_question_len:      100,
            max_answer_len:        100,
            max_review_len:        100,
            max_vocab_size:        50_000,
            review_select_mode:    ReviewSelectMode::Random,
            review_select_num:     5,
            h_review:              256,
            h_question:            256,
            h_answer:              256,
            n_layers:              1,
            dropout:               0.2,
            lr:                    1e-3,
            lr_decay:              0.5,
            resume_lr:             None,
            teacher_forcing_ratio: 0.5,
            global_norm_max:       5.0,
            batch_size:            64,
            epochs:                20,
            save_model_every:      1,
            print_every:           1000,
            output_max_len:        50,
            seed:                  1,
            non_finite_loss:       NonFinitePolicy::Propagate,
            resume_dir:            None,
            resume_epoch:          None,
        }
    }
}

impl TrainConfig {
    pub fn builder_config(&self) -> BuilderConfig {
        BuilderConfig {
            mode:               self.mode,
            max_question_len:   self.max_question_len,
            max_answer_len:     self.max_answer_len,
            max_review_len:     self.max_review_len,
            max_vocab_size:     self.max_vocab_size,
            review_select_mode: self.review_select_mode,
            review_select_num:  self.review_select_num,
            seed:               self.seed,
        }
    }

    pub fn model_config(&self, vocab_size: usize) -> Seq2SeqConfig {
        Seq2SeqConfig::new(
            vocab_size,
            self.h_review,
            self.h_question,
            self.h_answer,
            self.output_max_len,
            self.n_layers,
            self.dropout,
            self.mode,
        )
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg = &self.config;

        // Hidden sizes are checked before any data is read.
        cfg.model_config(0).validate()?;

        // ── Steps 1–3: Splits and vocabulary ──────────────────────────────────
        tracing::info!("Loading '{}' splits from '{}'", cfg.category, cfg.data_dir);
        let source  = JsonSplitLoader::new(&cfg.data_dir, &cfg.category);
        let builder = DatasetBuilder::new(cfg.builder_config());

        let corpus = match (&cfg.resume_dir, cfg.resume_epoch) {
            (Some(dir), Some(_)) => {
                let vocab = VocabStore::new(dir).load()?;
                ReviewQaCorpus::load_with_vocabulary(&source, &builder, vocab)?
            }
            (Some(dir), None) => bail!("Resuming from '{dir}' needs a resume epoch"),
            (None, Some(epoch)) => bail!("Resume epoch {epoch} given without a run directory"),
            (None, None) => ReviewQaCorpus::load(&source, &builder)?,
        };
        tracing::info!(
            "Tuples: {} train, {} val, {} test",
            corpus.train.tuples.len(),
            corpus.val.tuples.len(),
            corpus.test.tuples.len(),
        );

        // ── Step 4: Run directory, created only once every split loaded ──────
        let ckpt_manager = match &cfg.resume_dir {
            Some(dir) => CheckpointManager::new(dir)?,
            None => {
                let manager = CheckpointManager::create_run(&cfg.base_dir, &cfg.category, cfg.mode)?;
                VocabStore::new(manager.dir()).save(&corpus.vocab)?;
                manager
            }
        };
        tracing::info!("Run directory: '{}'", ckpt_manager.dir().display());

        // ── Step 5: Save params for generation ────────────────────────────────
        ckpt_manager.save_config(cfg)?;

        // ── Steps 6–7: Datasets and training loop (Layer 5) ───────────────────
        let vocab_size    = corpus.vocab.size();
        let train_dataset = Seq2SeqDataset::new(corpus.train);
        let val_dataset   = Seq2SeqDataset::new(corpus.val);

        let summary = run_training(cfg, vocab_size, train_dataset, Some(val_dataset), ckpt_manager)?;
        tracing::info!(
            "Finished after {} epochs, best val_loss={:?}, final lr={:.6}",
            summary.epochs_run, summary.best_val_loss, summary.final_lr,
        );
        Ok(summary)
    }
}
