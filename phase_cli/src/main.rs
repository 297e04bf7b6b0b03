//! Phase programming language command-line interface
//!
//! Runs a `.phase` source file through the full pipeline (lex, parse,
//! emit, execute), or prints the token stream or syntax tree instead.
//! Exit status is 0 on normal termination and 1 on any diagnostic.

use anyhow::Result;
use clap::Parser as ClapParser;
use phase_cli::{display, pipeline};
use phase_common::{Diagnostic, ErrorKind, Reporter};
use std::io::Write;
use std::path::PathBuf;

/// The Phase programming language interpreter
#[derive(ClapParser)]
#[command(name = "phase")]
#[command(about = "The Phase programming language interpreter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Path to the .phase source file
    input: PathBuf,

    /// Print the token stream instead of running
    #[arg(long)]
    tokens: bool,

    /// Print the syntax tree instead of running
    #[arg(long)]
    ast: bool,

    /// Print the syntax tree as JSON instead of running
    #[arg(long)]
    ast_json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress output
    #[arg(short, long)]
    quiet: bool,
}

fn parse_args() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            clap::error::ErrorKind::MissingRequiredArgument => {
                Reporter::new().report(&Diagnostic::unlocated(ErrorKind::MissingArgument {
                    name: "<input.phase>".to_string(),
                }));
            }
            clap::error::ErrorKind::UnknownArgument => {
                let name = err
                    .get(clap::error::ContextKind::InvalidArg)
                    .map(|value| value.to_string())
                    .unwrap_or_default();
                Reporter::new()
                    .report(&Diagnostic::unlocated(ErrorKind::UnknownArgument { name }));
            }
            _ => err.exit(),
        },
    }
}

fn main() -> Result<()> {
    let cli = parse_args();

    // Initialize logging
    let log_level = if cli.verbose {
        log::LevelFilter::Debug
    } else if cli.quiet {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let reporter = Reporter::with_source(&cli.input);

    let source = match pipeline::load_source(&cli.input) {
        Ok(source) => source,
        Err(diagnostic) => reporter.report(&diagnostic),
    };

    let stdout = std::io::stdout();

    if cli.tokens {
        let tokens = match pipeline::tokenize(&source) {
            Ok(tokens) => tokens,
            Err(diagnostic) => reporter.report(&diagnostic),
        };
        print!("{}", display::render_tokens(&tokens, true));
        return Ok(());
    }

    if cli.ast || cli.ast_json {
        let program = match pipeline::parse(&source) {
            Ok(program) => program,
            Err(diagnostic) => reporter.report(&diagnostic),
        };

        if cli.ast_json {
            let json = serde_json::to_string_pretty(&program)?;
            println!("{json}");
        } else {
            print!("{}", display::render_program(&program, true));
        }
        return Ok(());
    }

    log::debug!("running {}", cli.input.display());

    if let Err(diagnostic) = pipeline::run(&source, stdout.lock()) {
        // Program output may still be buffered; flush it before the
        // diagnostic goes to stderr.
        let _ = stdout.lock().flush();
        reporter.report(&diagnostic);
    }

    Ok(())
}
