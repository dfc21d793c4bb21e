#![recursion_limit = "256"]

mod cli;
mod application;
mod domain;
mod data;
mod ml;
mod infra;

use anyhow::Result;
use cli::Cli;
use clap::Parser;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("qar_lm=info".parse::<tracing_subscriber::filter::Directive>()?),
        )
        .init();

    let cli = Cli::parse();
    tracing::debug!("qar-lm {} {:?}", env!("CARGO_PKG_VERSION"), cli.command);
    cli.run()
}
