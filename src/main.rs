mod cli;
mod config;
mod error;
mod ledger;
mod logging;
mod report;
mod source;
mod updater;
mod utils;
mod workflow;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use source::SourceFactory;
use std::io::{self, BufRead};
use std::process;
use tracing::warn;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = run(&cli);

    if let Err(e) = &result {
        eprintln!("{} {}", "Error:".red().bold(), e);
    }

    if cli.pause {
        println!("\n{}", "Press Enter to exit...".dimmed());
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
    }

    if result.is_err() {
        process::exit(1);
    }
}

fn run(cli: &Cli) -> error::Result<()> {
    let mut registry = SourceFactory::create_registry()?;

    let result = match cli.command.as_ref().unwrap_or(&Commands::Update) {
        Commands::Update => workflow::execute_update(&cli.config, &cli.versions, &registry),
        Commands::Check => workflow::execute_check(&cli.config, &cli.versions, &registry),
        Commands::List => workflow::execute_list(&cli.versions),
    };

    // Sources are closed whatever the outcome; close errors never replace a run error.
    if let Err(e) = registry.close_all() {
        warn!("Failed to release download directories: {}", e);
    }

    result
}
