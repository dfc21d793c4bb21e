// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — builds the dataset and trains one model
//   2. `generate` — decodes test answers from a saved run
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, GenerateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "qar-lm",
    version = "0.1.0",
    about = "Train answer-generation models on question/answer/review data, then decode test answers."
)]
pub struct Cli {
    /// The subcommand to run (train or generate)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Generate(args) => run_generate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Training {} on category '{}'", args.mode, args.category);
    let summary = TrainUseCase::new(args.into()).execute()?;

    match summary.best_val_loss {
        Some(loss) => println!("Training complete. Best val_loss={loss:.4}"),
        None => println!("Training complete. No finite validation loss was recorded."),
    }
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    use crate::application::generate_use_case::GenerateUseCase;

    let path = GenerateUseCase::new(&args.run_dir, args.checkpoint, args.data_dir).execute()?;
    println!("Generated answers written to {}", path.display());
    Ok(())
}
