//! visaid: command-line entry point.
//!
//! Parses arguments, configures logging (RUST_LOG or `-v` flags), and
//! dispatches to the command implementations. Exit code 1 on any error.

mod cli;
mod commands;

use std::process;

use clap::Parser;

use crate::cli::{Cli, Commands};

fn main() {
    let args = Cli::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let result = match &args.command {
        Commands::Index(cmd) => commands::index::run(cmd),
        Commands::Extract(cmd) => commands::extract::run(cmd),
        Commands::Visaid(cmd) => commands::visaid::run(cmd),
        Commands::Data(cmd) => commands::data::run(cmd),
    };

    if let Err(e) = result {
        log::error!("{e:#}");
        process::exit(1);
    }
}
