//! Command-line interface for corpus-forge
//!
//! # Usage Examples
//!
//! ```bash
//! # Reproducible corpus of 500 PDFs with a DAT load file
//! corpus-forge generate --count 500 --folders 5 --seed 42 --name demo
//!
//! # Same, from a YAML profile with an override
//! corpus-forge generate --config profiles/mixed.yaml --count 2000
//!
//! # About 2 GB of mixed documents, load file inside the archive
//! corpus-forge generate --count 20000 --file-type mixed --target-size 2GB \
//!   --manifest-in-archive
//!
//! # Entry counts per folder
//! corpus-forge inspect demo.zip
//! ```
//!
//! Log verbosity is controlled with `RUST_LOG`, e.g. `RUST_LOG=corpus_pipeline=debug`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use corpus_forge::generate::run_generate;
use corpus_forge::inspect::{run_inspect, InspectArgs};
use corpus_pipeline::GenerateArgs;

#[derive(Parser)]
#[command(name = "corpus-forge")]
#[command(about = "Generate reproducible synthetic document corpora with load files")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a corpus archive, load file and run manifest
    Generate(Box<GenerateArgs>),

    /// Summarize an archive written by corpus-forge
    Inspect(InspectArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => run_generate(*args)
            .await
            .context("Corpus generation failed")?,
        Commands::Inspect(args) => {
            let path = args.archive.clone();
            run_inspect(args).with_context(|| format!("Failed to inspect {path:?}"))?
        }
    }

    Ok(())
}
