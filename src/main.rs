mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "actseq", version, about, next_line_help(false))]
pub struct Cli {
    #[command(subcommand)]
    pub subcommand: Subcommands,
}

#[derive(Subcommand)]
pub enum Subcommands {
    /// Decodes a notes field and prints its action sequence.
    Parse(cli::parse::ParseArgs),
    /// Plays one action from a scenario file and prints what happened.
    Run(cli::run::RunArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.subcommand {
        Subcommands::Parse(args) => cli::parse::run(&args)?,
        Subcommands::Run(args) => cli::run::run(&args)?,
    }

    Ok(())
}
