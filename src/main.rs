//! Command line converter for Volca FM / DX7 voice patches.
//!
//! Reads a SYX, JSON or CSV file and writes it back out as TEXT, CSV, JSON
//! or SYX. Logging goes to stderr (`RUST_LOG`, default `warn`) so rendered
//! output on stdout stays clean.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use volca_convert::convert::{self, ConvertOptions};
use volca_convert::VolcaError;

const AFTER_HELP: &str = "\
Input types:  SYX, JSON, CSV, NONE
Output types: TEXT, CSV, JSON, SYX

Use '-i none' to skip reading input, e.g. to write a CSV file holding only
the header rows. No INFILE is needed then; the first file name given is used
as OUTFILE.";

#[derive(Parser)]
#[command(name = "volca-convert", version)]
#[command(about = "Convert Volca FM/FM2 (or DX7) patch files between formats")]
#[command(after_help = AFTER_HELP)]
struct Args {
    /// Type of INFILE; needed unless it ends in .syx, .json or .csv
    #[arg(short = 'i', value_name = "TYPE")]
    input_type: Option<String>,

    /// Type of OUTFILE; detected from its extension, TEXT otherwise
    #[arg(short = 'o', value_name = "TYPE")]
    output_type: Option<String>,

    /// Simple output: no hex names in TEXT, no CSV header rows, compact JSON
    #[arg(short = 's')]
    simple: bool,

    /// File to read
    #[arg(value_name = "INFILE")]
    infile: Option<PathBuf>,

    /// File to write; stdout when omitted
    #[arg(value_name = "OUTFILE")]
    outfile: Option<PathBuf>,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<()> {
    let options = ConvertOptions::resolve(
        args.input_type.as_deref(),
        args.output_type.as_deref(),
        args.infile,
        args.outfile,
        args.simple,
    )?;

    let input = options
        .input
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string());
    let count = convert::run(&options).with_context(|| {
        format!(
            "converting {} ({}) to {}",
            input, options.input_type, options.output_type
        )
    })?;

    tracing::debug!("converted {} voice(s)", count);
    Ok(())
}

fn main() -> ExitCode {
    init_logging();

    let args = Args::parse();
    let no_files = args.infile.is_none() && args.input_type.is_none();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if no_files {
                let _ = Args::command().print_help();
                return ExitCode::SUCCESS;
            }
            if matches!(err.downcast_ref::<VolcaError>(), Some(VolcaError::ConfigError(_))) {
                let _ = Args::command().print_help();
                eprintln!();
            }
            eprintln!("ERROR: {err:#}");
            ExitCode::FAILURE
        }
    }
}
