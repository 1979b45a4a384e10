//! Murmur - A voice memo recorder for Linux
//!
//! This is the main entry point for the Murmur application.

mod app;
mod audio;
mod cli;
mod commands;
mod error;
mod format;
mod models;
mod session;
mod settings;
mod state;
mod tokio_runtime;

use app::Murmur;
use clap::Parser;
use cli::Command;
use log::info;
use settings::DataPaths;
use std::process::ExitCode;

fn run(args: cli::Args) -> anyhow::Result<()> {
    if let Command::Config {
        confirm_on_delete,
        microphone,
        set_data_dir,
    } = args.command
    {
        return commands::config(confirm_on_delete, microphone, set_data_dir);
    }

    let paths = DataPaths::resolve(args.data_dir.as_deref());
    info!("Using records directory {:?}", paths.records_dir);
    let mut app = Murmur::open(&paths)?;

    match args.command {
        Command::Record { name, max_seconds } => commands::record(&mut app, name, max_seconds),
        Command::List => commands::list(&app),
        Command::Play { target } => commands::play(&mut app, &target),
        Command::Delete { target, yes } => commands::delete(&mut app, &target, yes),
        Command::Rename { target, name } => commands::rename(&mut app, &target, &name),
        Command::Config { .. } => Ok(()),
    }
}

fn main() -> ExitCode {
    // Parse command-line arguments and initialize logging
    let args = cli::Args::parse();
    cli::init_logging(&args);

    info!("Starting Murmur voice memo recorder");

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("murmur: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
