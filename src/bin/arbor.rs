//! Arbor CLI Binary

use anyhow::Context;
use arbor::error::ApiError;
use arbor::logging::init_logging;
use arbor::tooling::cli::{Cli, CliContext};
use clap::Parser;
use std::process;

fn run(cli: &Cli) -> anyhow::Result<String> {
    let context = CliContext::new(cli.workspace.clone(), cli.config.clone())
        .context("Error initializing workspace")?;
    init_logging(Some(&cli.logging_config(&context.config().logging)))
        .context("Error initializing logging")?;
    Ok(context.execute(&cli.command)?)
}

fn main() {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if let Some(ApiError::Ingest(ingest)) = e.downcast_ref::<ApiError>() {
                if let Some(forest_id) = ingest.forest_id() {
                    eprintln!(
                        "Stored rows were kept. Resume with: arbor import <file> --resume {}",
                        forest_id
                    );
                }
            }
            process::exit(1);
        }
    }
}
