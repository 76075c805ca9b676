use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tally",
    about = "Tally — token ledger with pledges and dividend distribution",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay a scenario and print every step plus final balances
    Run(ScenarioArgs),
    /// Replay a scenario and fail if an expectation or audit does not hold
    Check(ScenarioArgs),
}

#[derive(Args)]
pub struct ScenarioArgs {
    /// Path to a TOML scenario file
    pub path: PathBuf,
}
