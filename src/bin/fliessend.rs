//! Fliessend CLI Binary
//!
//! Command-line interface for editing a directory as an outline.

use anyhow::Context;
use clap::Parser;
use fliessend::logging::{init_logging, resolve_log_file_path};
use fliessend::tooling::cli::{Cli, CliContext};
use std::process;

/// Apply `--log-*` flags on top of the loaded logging config and install it
fn init_cli_logging(cli: &Cli, context: &CliContext) -> anyhow::Result<()> {
    let mut logging = context.config().logging.clone();
    if let Some(level) = &cli.log_level {
        logging.level = level.clone();
    }
    if let Some(format) = cli.log_format {
        logging.format = format;
    }
    if let Some(output) = cli.log_output {
        logging.output = output;
    }
    logging.file = Some(
        resolve_log_file_path(cli.log_file.clone(), logging.file.clone(), Some(context.root()))
            .context("resolving log file")?,
    );
    fliessend::logging::validate(&logging).context("invalid logging options")?;
    init_logging(Some(&logging)).context("initializing logging")?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let context = match CliContext::new(cli.root.clone(), cli.config.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error opening {}: {}", cli.root.display(), e);
            process::exit(1);
        }
    };

    if let Err(e) = init_cli_logging(&cli, &context) {
        eprintln!("Warning: {:#}", e);
    }

    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("{}", fliessend::feedback::status_for_error(&e));
            process::exit(1);
        }
    }
}
