use std::{fs::File, path::PathBuf};

use actseq::{notetag::*, script::Command};
use clap::{Args, ValueEnum};
use serde::Serialize;

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// The path to a text file holding a skill or item notes field.
    #[arg(index = 1)]
    pub notes_file: String,

    /// The format to print the parsed sequence in.
    #[arg(short, long, default_value_t=Format::Json)]
    #[clap(value_enum)]
    pub format: Format,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum Format {
    Json,
    Ron,
}

#[derive(Serialize)]
struct ParsedNotes {
    setup: Vec<Command>,
    whole: Vec<Command>,
    target: Vec<Command>,
    follow: Vec<Command>,
    finish: Vec<Command>,
    declared: Vec<Phase>,
    copy: Option<ItemRef>,
    cooldown: actseq::cooldown::CooldownRules,
}

pub fn run(args: &ParseArgs) -> anyhow::Result<()> {
    let notes_file: PathBuf = args.notes_file.clone().into();

    let file = File::open(notes_file)?;
    let notes = Decoder::new(file).decode()?;

    let commands = |phase: Phase| {
        notes
            .sequence
            .phase(phase)
            .into_iter()
            .map(|line| Command::parse(line))
            .collect::<Vec<_>>()
    };
    let parsed = ParsedNotes {
        setup: commands(Phase::Setup),
        whole: commands(Phase::Whole),
        target: commands(Phase::Target),
        follow: commands(Phase::Follow),
        finish: commands(Phase::Finish),
        declared: notes.declared.clone(),
        copy: notes.copy,
        cooldown: notes.cooldown.clone(),
    };

    let as_string = match args.format {
        Format::Ron => ron::ser::to_string_pretty(&parsed, ron::ser::PrettyConfig::default())?,
        Format::Json => serde_json::to_string_pretty(&parsed)?,
    };
    println!("{as_string}");

    Ok(())
}
