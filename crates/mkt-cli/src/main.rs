//! # mkt CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use mkt_cli::config::load_options;
use mkt_cli::logging::{install_tracing, LogFormat};
use mkt_cli::schemas::{run_schemas, SchemasArgs};
use mkt_cli::validate::{run_validate, ValidateArgs};
use mkt_cli::EXIT_OPERATIONAL_ERROR;

/// Marketplace tree schema toolchain.
///
/// Validates navigation menus and UI component trees stored as JSON or
/// YAML documents.
#[derive(Parser, Debug)]
#[command(name = "mkt", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log line format on stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Path to a validator options file (YAML or JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a document against a tree schema.
    Validate(ValidateArgs),

    /// List the registered schemas, their variants and fields.
    Schemas(SchemasArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    install_tracing(cli.verbose, cli.log_format);

    tracing::debug!("mkt CLI starting");

    let result = match cli.command {
        Commands::Validate(args) => load_options(cli.config.as_deref())
            .and_then(|options| run_validate(&args, options)),
        Commands::Schemas(args) => run_schemas(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("ERROR: {e:#}");
            ExitCode::from(EXIT_OPERATIONAL_ERROR)
        }
    }
}
