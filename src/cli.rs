use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Filter JSON-lines records (jobs, nodes, log lines) with a short query
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML config with field aliases and default logic
    #[arg(short, long, global = true, env = "RECORD_FILTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'F', long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// When to use colors
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the records that match a filter
    Filter {
        /// Filter expression, e.g. "state in (running,pending) mem>4G"
        expr: String,

        /// JSON-lines input; stdin when omitted or "-"
        file: Option<PathBuf>,

        /// Print only the number of matching records
        #[arg(long)]
        count: bool,

        /// Columns to show in text output (default: every field seen)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Show how a filter expression is split, parsed and coerced
    Explain {
        /// Filter expression to explain
        expr: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl Cli {
    /// Log level implied by -v / -q
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_maps_to_log_level() {
        let cli = Cli::parse_from(["record-filter", "-vv", "explain", "a=1"]);
        assert_eq!(cli.log_level(), log::LevelFilter::Debug);
        let cli = Cli::parse_from(["record-filter", "explain", "a=1", "-q"]);
        assert_eq!(cli.log_level(), log::LevelFilter::Error);
    }

    #[test]
    fn test_filter_columns_are_comma_separated() {
        let cli = Cli::parse_from([
            "record-filter",
            "filter",
            "state=running",
            "jobs.jsonl",
            "--columns",
            "JobID,State",
        ]);
        match cli.command {
            Commands::Filter { columns, file, .. } => {
                assert_eq!(columns, vec!["JobID", "State"]);
                assert_eq!(file, Some(PathBuf::from("jobs.jsonl")));
            }
            _ => panic!("expected filter command"),
        }
    }
}
