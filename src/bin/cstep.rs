//! Binary entry point for the cstep CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Instrument a file, writing prog.g.c and prog.json next to it
//! cstep rewrite prog.c
//!
//! # Instrument a directory into another one
//! cstep rewrite src/ --out-dir build/instrumented
//!
//! # Check that the CST reproduces every file
//! cstep verify src/
//!
//! # Debug dumps
//! cstep show prog.c --parse-tree --modifications
//! ```
//!
//! Every command prints one JSON document to stdout. Logs go to stderr.

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use cstep::cli::{run_rename, run_rewrite, run_show, run_verify, RewriteArgs, ShowArgs};
use cstep_core::config::Config;
use cstep_core::error::{CstepError, OutputErrorCode};
use cstep_core::output::{emit_response, emit_response_compact, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Instrument C programs for step-through replay.
#[derive(Parser, Debug)]
#[command(name = "cstep", version, about = "Instrument C programs for step-through replay")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Configuration file (default: cstep.toml in the current directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Instrument C files, writing `<stem>.g.c` and `<stem>.json`.
    Rewrite {
        /// Files or directories to instrument.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output directory (default: next to each input).
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Parse tree JSON produced by an external frontend (single input only).
        #[arg(long)]
        parse_tree: Option<PathBuf>,
        /// Put the outputs in the response instead of writing files.
        #[arg(long)]
        stdout: bool,
    },
    /// Check that the source tree of every file reproduces it exactly.
    Verify {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Print debug dumps of one file.
    Show {
        file: PathBuf,
        /// The parse tree, with source excerpts.
        #[arg(long)]
        parse_tree: bool,
        /// The source tree (the default).
        #[arg(long)]
        source_tree: bool,
        /// The planned modifications.
        #[arg(long)]
        modifications: bool,
        /// Show source tree nodes with child placeholders.
        #[arg(long)]
        placeholders: bool,
    },
    /// Rename a variable or parameter throughout one file.
    Rename {
        file: PathBuf,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Write the result back instead of returning it.
        #[arg(long)]
        write: bool,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors are JSON on stdout, like every other response.
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber. `RUST_LOG` overrides `--log-level`.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(global: &GlobalArgs) -> Result<Config, CstepError> {
    let cwd = env::current_dir()?;
    Config::discover(global.config.as_deref(), &cwd)
}

fn emit<T: Serialize>(config: &Config, response: &T) -> Result<(), CstepError> {
    let mut stdout = io::stdout();
    if config.output.pretty {
        emit_response(response, &mut stdout)?;
    } else {
        emit_response_compact(response, &mut stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), CstepError> {
    let config = load_config(&cli.global)?;
    match cli.command {
        Command::Rewrite {
            inputs,
            out_dir,
            parse_tree,
            stdout,
        } => {
            let args = RewriteArgs {
                inputs,
                out_dir,
                parse_tree,
                stdout,
            };
            emit(&config, &run_rewrite(&config, &args)?)
        }
        Command::Verify { inputs } => {
            let response = run_verify(&config, &inputs)?;
            emit(&config, &response)?;
            if response.status != "ok" {
                let failed = response.files.iter().filter(|f| !f.round_trip).count();
                return Err(CstepError::RoundTripFailed {
                    message: format!("{} of {} files did not round-trip", failed, response.files.len()),
                    file: None,
                });
            }
            Ok(())
        }
        Command::Show {
            file,
            parse_tree,
            source_tree,
            modifications,
            placeholders,
        } => {
            let args = ShowArgs {
                parse_tree,
                source_tree,
                modifications,
                placeholders,
            };
            emit(&config, &run_show(&config, &file, args)?)
        }
        Command::Rename { file, from, to, write } => emit(&config, &run_rename(&file, &from, &to, write)?),
    }
}
