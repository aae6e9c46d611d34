use arcaneflow::{
    cli::{Sink, check_pipeline, infer_schema, run_pipeline},
    config::{DEFAULT_CONFIG_FILE, Settings},
};
use clap::{Parser, Subcommand, builder::styling};
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// arcaneflow: extract a dataset, reshape it with a chain of transformations,
/// validate it against a table model and load it into SQLite
#[derive(Parser)]
#[command(name = "arcaneflow", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source settings overrides from, if it exists
    #[arg(short, long, global = true, default_value = ".env")]
    env: PathBuf,

    /// Settings file with database defaults
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline definition
    Run {
        /// Pipeline definition (YAML)
        pipeline: PathBuf,

        /// Print the first rows instead of loading into the database; --print=N sets how many
        #[arg(
            short,
            long,
            value_name = "N",
            num_args = 0..=1,
            require_equals = true,
            default_missing_value = "10",
            conflicts_with = "ndjson"
        )]
        print: Option<usize>,

        /// Write rows to an NDJSON file instead of loading into the database
        #[arg(short, long)]
        ndjson: Option<PathBuf>,

        /// Remove transformation steps that cancel out before running
        #[arg(long)]
        optimize: bool,
    },

    /// Extract a pipeline's source and print the inferred schema
    Schema {
        /// Pipeline definition (YAML)
        pipeline: PathBuf,
    },

    /// Validate a pipeline definition without reading any data
    Check {
        /// Pipeline definition (YAML)
        pipeline: PathBuf,

        /// Describe the optimized chain
        #[arg(long)]
        optimize: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let env_loaded = load_env(&cli.env)?;

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    if env_loaded {
        log::debug!("Sourced environment from {}", cli.env.display());
    }

    match cli.command {
        Commands::Run {
            pipeline,
            print,
            ndjson,
            optimize,
        } => {
            let settings = Settings::load(&cli.config)?.apply_env()?;
            let sink = match (print, ndjson) {
                (Some(limit), _) => Sink::Print(limit),
                (None, Some(path)) => Sink::Ndjson(path),
                (None, None) => Sink::Database,
            };
            log::info!(
                "Running {} into {}",
                pipeline.display().bright_black(),
                describe_sink(&sink).cyan()
            );

            let report = run_pipeline(&pipeline, &settings, sink, optimize)?;
            log::info!(
                "{} {} extracted, {} transformed, {} loaded",
                report.state.green(),
                report.source_records,
                report.transformed_records,
                report.inserted_records.bold()
            );
        }
        Commands::Schema { pipeline } => {
            log::info!("Inferring schema for {}", pipeline.display().bright_black());
            let schema = infer_schema(&pipeline)?;
            let yaml = serde_yaml::to_string(&schema).context("Failed to serialize schema")?;
            print!("{}", yaml);
        }
        Commands::Check { pipeline, optimize } => {
            log::info!("Checking {}", pipeline.display().bright_black());
            let steps = check_pipeline(&pipeline, optimize)?;
            for step in &steps {
                println!("{}", step);
            }
            log::info!("{} {} step(s) valid", "✓".green(), steps.len());
        }
    }

    Ok(())
}

/// Source the dotenv file if present; a missing file is not an error
fn load_env(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    dotenvy::from_path(path)
        .with_context(|| format!("Failed to load environment from {}", path.display()))?;
    Ok(true)
}

fn describe_sink(sink: &Sink) -> String {
    match sink {
        Sink::Database => "database".to_string(),
        Sink::Print(limit) => format!("stdout (first {} rows)", limit),
        Sink::Ndjson(path) => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> Commands {
        let argv = ["arcaneflow", "run"].iter().chain(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn test_print_flag_does_not_swallow_pipeline() {
        match run_args(&["--print", "pipeline.yml"]) {
            Commands::Run { pipeline, print, .. } => {
                assert_eq!(pipeline, PathBuf::from("pipeline.yml"));
                assert_eq!(print, Some(10));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_print_limit_needs_equals() {
        match run_args(&["pipeline.yml", "--print=3", "--optimize"]) {
            Commands::Run { print, optimize, .. } => {
                assert_eq!(print, Some(3));
                assert!(optimize);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_print_conflicts_with_ndjson() {
        let argv = ["arcaneflow", "run", "p.yml", "--print", "--ndjson", "out.ndjson"];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
