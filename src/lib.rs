pub mod cli;
pub mod config;
pub mod display;
pub mod filter;
pub mod record;

use anyhow::Context;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub use cli::{ColorMode, Commands, OutputFormat, cli_parse};
pub use config::{QueryConfig, load_config};
pub use filter::{
    CompiledFilter, Expression, ExpressionValue, FieldAliases, Filter, FilterOperator,
    FilterParseError, FilterParser, Logic, Record, Scalar, ScalarKind, coerce_value,
    parse_expression, parse_filter, split_respecting_quotes,
};
pub use record::{JsonRecord, RecordError, read_json_lines};

fn init_logging(level: log::LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None);
    // A logger may already be installed when running inside tests
    let _ = builder.try_init();
}

fn apply_color_mode(mode: ColorMode) {
    match mode {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }
}

fn read_records(file: Option<&Path>) -> anyhow::Result<Vec<JsonRecord>> {
    match file {
        Some(path) if path != Path::new("-") => {
            let handle = File::open(path)
                .with_context(|| format!("Failed to open input file '{}'", path.display()))?;
            read_json_lines(BufReader::new(handle))
                .with_context(|| format!("Failed to read records from '{}'", path.display()))
        }
        _ => read_json_lines(std::io::stdin().lock()).context("Failed to read records from stdin"),
    }
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();
    init_logging(cli.log_level());
    apply_color_mode(cli.color);

    let config = load_config(cli.config.as_deref()).context("Failed to load config")?;
    let parser = config.parser();
    log::debug!(
        "using profile '{}' ({} aliases, default logic {})",
        config.profile_name,
        parser.aliases().len(),
        config.default_logic
    );

    match &cli.command {
        Commands::Filter {
            expr,
            file,
            count,
            columns,
        } => {
            let filter = parser
                .parse(expr)
                .with_context(|| format!("Invalid filter expression '{}'", expr))?;
            let records = read_records(file.as_deref())?;
            let matched = filter.filter_records(&records);
            log::info!("{} of {} records match '{}'", matched.len(), records.len(), filter);

            if *count {
                println!("{}", matched.len());
                return Ok(());
            }

            match cli.format {
                OutputFormat::Text => {
                    print!("{}", display::format_records_table(&matched, columns))
                }
                OutputFormat::Json => print!("{}", display::format_records_json(&matched)),
            }
        }
        Commands::Explain { expr } => {
            let clauses = split_respecting_quotes(expr);
            let filter = parser
                .parse(expr)
                .with_context(|| format!("Invalid filter expression '{}'", expr))?;

            match cli.format {
                OutputFormat::Text => {
                    print!("{}", display::format_explain_text(&clauses, &filter))
                }
                OutputFormat::Json => {
                    println!("{}", display::format_explain_json(&clauses, &filter))
                }
            }
        }
    }

    Ok(())
}
