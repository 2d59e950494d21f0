use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use delbind_cli::commands::predict::{self, PredictArgs};
use delbind_cli::commands::train::{self, TrainArgs};
use delbind_cli::config::PipelineConfig;

#[derive(Parser)]
#[command(name = "delbind", version, about = "DEL binding prediction pipeline")]
struct Cli {
    /// Configuration file (defaults to ./delbind.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Draw a balanced sample, train the forest and write the artifact.
    Train(TrainArgs),
    /// Score the test set and append to the submission file.
    Predict(PredictArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("delbind=debug,info")),
        )
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Train(args) => train::run(config, args),
        Command::Predict(args) => predict::run(config, args),
    }
}
