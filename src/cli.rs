//! Command-line interface for Murmur
//!
//! Handles argument parsing and logging configuration.

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

/// Murmur - Voice memo recorder
#[derive(Parser, Debug)]
#[command(name = "murmur")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Increase logging verbosity
    /// -v = info, -vv = debug, -vvv = trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory holding recordings and their metadata
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record from the microphone until Enter or Ctrl-C
    Record {
        /// Name for the new recording (defaults to its timestamp)
        #[arg(long)]
        name: Option<String>,

        /// Stop automatically after this many seconds
        #[arg(long, value_name = "SECONDS")]
        max_seconds: Option<u64>,
    },

    /// List recordings, newest first
    List,

    /// Play a recording until it ends or Ctrl-C
    Play {
        /// List index, name or file path
        target: String,
    },

    /// Delete a recording and its metadata
    Delete {
        /// List index, name or file path
        target: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Change a recording's name
    Rename {
        /// List index, name or file path
        target: String,

        /// New name
        name: String,
    },

    /// Show or change settings
    Config {
        /// Ask before deleting recordings
        #[arg(long, value_name = "BOOL")]
        confirm_on_delete: Option<bool>,

        /// Allow recording from the microphone
        #[arg(long, value_name = "BOOL")]
        microphone: Option<bool>,

        /// Default data directory
        #[arg(long = "set-data-dir", value_name = "DIR")]
        set_data_dir: Option<PathBuf>,
    },
}

impl Args {
    /// Get the log level filter based on verbosity flags
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else {
            match self.verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }
}

/// Initialize the logging system based on CLI arguments
pub fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    // Base level for all modules - keep at warn to suppress noisy deps
    builder.filter_level(LevelFilter::Warn);

    builder.filter_module("murmur", args.log_level());

    builder.format_timestamp_millis().init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let args = Args::parse_from(["murmur", "list"]);
        assert_eq!(args.log_level(), LevelFilter::Warn);
        let args = Args::parse_from(["murmur", "-vv", "list"]);
        assert_eq!(args.log_level(), LevelFilter::Debug);
        let args = Args::parse_from(["murmur", "list", "-q"]);
        assert_eq!(args.log_level(), LevelFilter::Error);
    }

    #[test]
    fn test_record_options() {
        let args = Args::parse_from(["murmur", "--data-dir", "/tmp/m", "record", "--max-seconds", "5"]);
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/m")));
        match args.command {
            Command::Record { name, max_seconds } => {
                assert_eq!(name, None);
                assert_eq!(max_seconds, Some(5));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_config_flags() {
        let args = Args::parse_from(["murmur", "config", "--confirm-on-delete", "false"]);
        match args.command {
            Command::Config { confirm_on_delete, microphone, set_data_dir } => {
                assert_eq!(confirm_on_delete, Some(false));
                assert_eq!(microphone, None);
                assert_eq!(set_data_dir, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
