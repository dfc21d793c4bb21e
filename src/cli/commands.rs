// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `generate`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, ModelMode, ...)
//
// The domain enums parse through their FromStr impls, so an
// unknown mode or policy is rejected before anything runs.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::domain::{
    mode::ModelMode,
    policy::{NonFinitePolicy, ReviewSelectMode},
};
use crate::infra::checkpoint::CheckpointId;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a language model on one product category
    Train(TrainArgs),

    /// Generate test-split answers with a trained checkpoint
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Product category; split files are <split>-<category>.json
    #[arg(long)]
    pub category: String,

    /// lm_answers | lm_question_answers | lm_question_answers_reviews
    #[arg(long, default_value = "lm_question_answers")]
    pub mode: ModelMode,

    /// Directory holding the train/val/test split files
    #[arg(long, default_value = "data/input")]
    pub data_dir: String,

    /// Runs are saved under <base_dir>/<category>/<mode>/<timestamp>
    #[arg(long, default_value = "saved_models")]
    pub base_dir: String,

    #[arg(long, default_value_t = 100)]
    pub max_question_len: usize,

    #[arg(long, default_value_t = 100)]
    pub max_answer_len: usize,

    #[arg(long, default_value_t = 100)]
    pub max_review_len: usize,

    /// Corpus tokens kept, on top of the four reserved symbols
    #[arg(long, default_value_t = 50_000)]
    pub max_vocab_size: usize,

    /// first | random | longest
    #[arg(long, default_value = "random")]
    pub review_select_mode: ReviewSelectMode,

    /// Reviews kept per record in full mode
    #[arg(long, default_value_t = 5)]
    pub review_select_num: usize,

    #[arg(long, default_value_t = 256)]
    pub h_review: usize,

    #[arg(long, default_value_t = 256)]
    pub h_question: usize,

    /// Defaults to h_question, or h_question + h_review in full mode
    #[arg(long)]
    pub h_answer: Option<usize>,

    #[arg(long, default_value_t = 1)]
    pub n_layers: usize,

    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Factor applied when validation loss rises
    #[arg(long, default_value_t = 0.5)]
    pub lr_decay: f64,

    /// Probability of feeding gold tokens to the decoder for a batch
    #[arg(long, default_value_t = 0.5)]
    pub teacher_forcing_ratio: f64,

    /// Global gradient norm clip
    #[arg(long, default_value_t = 5.0)]
    pub global_norm_max: f64,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    /// Write an epoch checkpoint every N epochs (0 = never)
    #[arg(long, default_value_t = 1)]
    pub save_model_every: usize,

    /// Log running training loss every N batches
    #[arg(long, default_value_t = 1000)]
    pub print_every: usize,

    /// Decoding steps during generation
    #[arg(long, default_value_t = 50)]
    pub output_max_len: usize,

    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// propagate | fail-fast | skip-batch
    #[arg(long, default_value = "propagate")]
    pub non_finite_loss: NonFinitePolicy,

    /// Existing run directory to resume
    #[arg(long, requires = "resume_epoch")]
    pub resume_dir: Option<String>,

    /// Epoch checkpoint to resume from
    #[arg(long, requires = "resume_dir")]
    pub resume_epoch: Option<usize>,

    /// Multiply the restored learning rate by this factor
    #[arg(long)]
    pub resume_lr: Option<f64>,
}

impl TrainArgs {
    fn answer_hidden(&self) -> usize {
        self.h_answer.unwrap_or(match self.mode {
            ModelMode::QuestionAnswerReview => self.h_question + self.h_review,
            ModelMode::AnswerOnly | ModelMode::QuestionAnswer => self.h_question,
        })
    }
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            h_answer:              a.answer_hidden(),
            category:              a.category,
            data_dir:              a.data_dir,
            base_dir:              a.base_dir,
            mode:                  a.mode,
            max_question_len:      a.max_question_len,
            max_answer_len:        a.max_answer_len,
            max_review_len:        a.max_review_len,
            max_vocab_size:        a.max_vocab_size,
            review_select_mode:    a.review_select_mode,
            review_select_num:     a.review_select_num,
            h_review:              a.h_review,
            h_question:            a.h_question,
            n_layers:              a.n_layers,
            dropout:               a.dropout,
            lr:                    a.lr,
            lr_decay:              a.lr_decay,
            resume_lr:             a.resume_lr,
            teacher_forcing_ratio: a.teacher_forcing_ratio,
            global_norm_max:       a.global_norm_max,
            batch_size:            a.batch_size,
            epochs:                a.epochs,
            save_model_every:      a.save_model_every,
            print_every:           a.print_every,
            output_max_len:        a.output_max_len,
            seed:                  a.seed,
            non_finite_loss:       a.non_finite_loss,
            resume_dir:            a.resume_dir,
            resume_epoch:          a.resume_epoch,
        }
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Run directory written by `train`
    #[arg(long)]
    pub run_dir: String,

    /// Epoch number or `best`
    #[arg(long, default_value = "best")]
    pub checkpoint: CheckpointId,

    /// Read the test split from here instead of the saved data_dir
    #[arg(long)]
    pub data_dir: Option<String>,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn train_config(args: &[&str]) -> TrainConfig {
        let cli = Cli::try_parse_from(["qar-lm", "train", "--category", "Baby"].iter().chain(args)).unwrap();
        match cli.command {
            Commands::Train(a) => a.into(),
            other => panic!("expected train, got {other:?}"),
        }
    }

    #[test]
    fn test_answer_hidden_follows_mode() {
        let cfg = train_config(&["--mode", "lm_question_answers_reviews", "--h-review", "64", "--h-question", "128"]);
        assert_eq!(cfg.h_answer, 192);

        let cfg = train_config(&["--mode", "lm_answers", "--h-question", "32"]);
        assert_eq!(cfg.h_answer, 32);

        let cfg = train_config(&["--h-answer", "100"]);
        assert_eq!(cfg.h_answer, 100);
    }

    #[test]
    fn test_domain_values_parse() {
        let cfg = train_config(&["--review-select-mode", "longest", "--non-finite-loss", "fail-fast"]);
        assert_eq!(cfg.review_select_mode, ReviewSelectMode::Longest);
        assert_eq!(cfg.non_finite_loss, NonFinitePolicy::FailFast);
        assert_eq!(cfg.mode, ModelMode::QuestionAnswer);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["qar-lm", "train", "--category", "Baby", "--mode", "lm_reviews"]).is_err());
    }

    #[test]
    fn test_resume_flags_come_together() {
        assert!(Cli::try_parse_from(["qar-lm", "train", "--category", "Baby", "--resume-epoch", "3"]).is_err());
        let cfg = train_config(&["--resume-dir", "runs/x", "--resume-epoch", "3", "--resume-lr", "0.1"]);
        assert_eq!(cfg.resume_epoch, Some(3));
        assert_eq!(cfg.resume_lr, Some(0.1));
    }

    #[test]
    fn test_generate_checkpoint_id() {
        let cli = Cli::try_parse_from(["qar-lm", "generate", "--run-dir", "runs/x", "--checkpoint", "7"]).unwrap();
        match cli.command {
            Commands::Generate(a) => assert_eq!(a.checkpoint, CheckpointId::Epoch(7)),
            other => panic!("expected generate, got {other:?}"),
        }
    }
}
