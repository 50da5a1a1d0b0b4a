use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use super::logging::LogDestination;

#[derive(Parser, Debug)]
#[command(name = "classify_app", version, about = "Classify log CSV files with a remote service")]
pub struct Cli {
    /// RON file with endpoint and timeout settings.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Classification endpoint; overrides the config file.
    #[arg(long)]
    pub endpoint: Option<String>,
    /// Directory downloads are saved to; overrides the config file.
    #[arg(long)]
    pub download_dir: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = LogDestination::File)]
    pub log: LogDestination,
    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive session (the default).
    Interactive,
    /// Classify one file, print the result and exit.
    Run {
        file: PathBuf,
        /// Save the raw result as classified_logs.csv in this directory.
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
