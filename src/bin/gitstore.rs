//! gitstore CLI Binary
//!
//! Command-line interface for the version-controlled object store.

use clap::Parser;
use gitstore::logging::init_logging;
use gitstore::tooling::cli::{Cli, CliContext};
use std::process;

fn main() {
    let cli = Cli::parse();

    let config = match CliContext::load_config(&cli.workspace, cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    let logging = cli.logging_config(&config.logging);
    if let Err(e) = init_logging(Some(&logging), Some(cli.workspace.as_path())) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(1);
    }

    let author = cli.author_override(&config.repository.author);
    let context = match CliContext::from_config(cli.workspace.clone(), config) {
        Ok(ctx) => match author {
            Some(author) => ctx.with_author(author),
            None => ctx,
        },
        Err(e) => {
            eprintln!("Error opening repository: {}", e);
            process::exit(1);
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match context.run(&cli.command, &mut out) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
