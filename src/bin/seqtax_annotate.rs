use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use seqtax_annotate::app::{App, RunOptions};
use seqtax_annotate::config::{ConfigLoader, ConfigOverrides};
use seqtax_annotate::domain::SourceFormat;
use seqtax_annotate::error::AnnotateError;
use seqtax_annotate::lookup::SqliteLookup;
use seqtax_annotate::output::{JsonOutput, LogOutput, OutputMode};

#[derive(Parser)]
#[command(name = "seqtax-annotate")]
#[command(about = "Annotate Pfam, NCBI and JGI sequences with taxonomy from SQLite stores")]
#[command(version, author)]
struct Cli {
    /// Input sequences (FASTA format)
    #[arg(short, long)]
    input: PathBuf,

    /// Path to (all) SQLite databases; defaults to $SQLITEDB
    #[arg(short, long)]
    dbdir: Option<String>,

    /// Database of origin for ALL sequences (omit for multiple sources)
    #[arg(short, long, value_enum, default_value_t = SourceFormat::Multiple)]
    format: SourceFormat,

    /// JGI species map (CSV)
    #[arg(long)]
    species_map: Option<String>,

    /// Where to write records annotated without a KOG definition
    #[arg(long)]
    failure_output: Option<String>,

    #[arg(long)]
    config: Option<String>,

    /// Skip records that cannot be annotated instead of aborting
    #[arg(long)]
    skip_errors: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<AnnotateError>() {
            return ExitCode::from(err.exit_code());
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let overrides = ConfigOverrides {
        db_dir: cli.dbdir,
        species_map: cli.species_map,
        failure_path: cli.failure_output,
    };
    let config = ConfigLoader::resolve(cli.config.as_deref(), overrides)?;
    let app = App::from_config(config, SqliteLookup::new())?;
    let options = RunOptions {
        format: cli.format,
        skip_errors: cli.skip_errors,
    };

    match output_mode {
        OutputMode::Json => {
            let summary = app.run(&cli.input, options, &JsonOutput)?;
            JsonOutput::print_run(&summary).into_diagnostic()?;
        }
        OutputMode::Text => {
            let summary = app.run(&cli.input, options, &LogOutput)?;
            LogOutput::print_run(&summary).into_diagnostic()?;
        }
    }
    Ok(())
}
