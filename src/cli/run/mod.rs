use std::{fs, path::PathBuf};

use actseq::{interpreter::PackChain, scenario::*};
use anyhow::Context as _;
use clap::{Args, ValueEnum};
use tracing::info;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// The path to a scenario file, e.g., "testdata/slash.ron". Files ending
    /// in ".json" are read as JSON, anything else as RON.
    #[arg(index = 1)]
    pub scenario_file: String,

    /// The format to print the report in.
    #[arg(short, long, default_value_t=Format::Json)]
    #[clap(value_enum)]
    pub format: Format,

    /// Give up on the action after this many frames.
    #[arg(long, default_value_t = 3600)]
    pub max_frames: u64,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum Format {
    Json,
    Ron,
}

pub fn run(args: &RunArgs) -> anyhow::Result<()> {
    let scenario_file: PathBuf = args.scenario_file.clone().into();

    let text = fs::read_to_string(&scenario_file)
        .with_context(|| format!("could not read {}", scenario_file.display()))?;
    let scenario: Scenario = match scenario_file.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text)?,
        _ => ron::from_str(&text)?,
    };

    let chain = PackChain::standard();
    let (mut battle, mut runner) = scenario.build()?;
    let frames = runner.run_to_end(&mut battle, &chain, args.max_frames);
    info!("action played out over {} frames", frames);
    scenario.conclude(&mut battle);

    let report = Report::new(&battle, &runner, frames);
    let as_string = match args.format {
        Format::Ron => ron::ser::to_string_pretty(&report, ron::ser::PrettyConfig::default())?,
        Format::Json => serde_json::to_string_pretty(&report)?,
    };
    println!("{as_string}");

    Ok(())
}
