mod commands;
mod logging;
mod progress;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use shotlist_core::{DEFAULT_CONCURRENCY, DEFAULT_OUTPUT_DIR, DEFAULT_QUALITY};
use shotlist_engine::DEFAULT_HISTORY_FILENAME;

use crate::logging::LogDestination;

#[derive(Parser, Debug)]
#[command(name = "shotlist", version, about = "Capture a screenshot of every URL in a list")]
struct Cli {
    /// Where log output goes.
    #[arg(long, value_enum, default_value_t = LogDestination::File, global = true)]
    log: LogDestination,

    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Scan history file.
    #[arg(long, default_value = DEFAULT_HISTORY_FILENAME, global = true)]
    history_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture every URL listed in a text file.
    Scan(ScanArgs),
    /// Show recent scans and aggregate statistics.
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// List captured images in an output directory.
    List {
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Text file with one URL per line; `#` starts a comment.
    #[arg(short, long)]
    pub input: PathBuf,

    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Number of concurrent capture workers.
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    pub threads: usize,

    /// JPEG quality, 1 to 100.
    #[arg(long, default_value_t = DEFAULT_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,

    /// Per-capture timeout in milliseconds.
    #[arg(long, default_value_t = 15_000)]
    pub timeout: u64,

    /// Stop dispatching new captures after this many seconds.
    #[arg(long)]
    pub deadline: Option<u64>,

    /// Path to a Chrome or Chromium executable.
    #[arg(long)]
    pub chrome: Option<PathBuf>,

    /// Keep at most this many history entries.
    #[arg(long)]
    pub history_limit: Option<usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::initialize(cli.log, cli.verbose);

    let result = match cli.command {
        Command::Scan(args) => commands::scan(args, &cli.history_file),
        Command::History { limit } => commands::history(&cli.history_file, limit),
        Command::List { output } => commands::list(&output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            shotlist_logging::scan_error!("{err:#}");
            eprintln!("[!] Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scan_defaults() {
        let cli = Cli::parse_from(["shotlist", "scan", "-i", "urls.txt"]);
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.input, PathBuf::from("urls.txt"));
        assert_eq!(args.output, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(args.threads, DEFAULT_CONCURRENCY);
        assert_eq!(args.quality, DEFAULT_QUALITY);
        assert_eq!(args.deadline, None);
        assert_eq!(cli.log, LogDestination::File);
        assert_eq!(cli.history_file, PathBuf::from(DEFAULT_HISTORY_FILENAME));
    }

    #[test]
    fn quality_out_of_range_is_rejected() {
        let parsed = Cli::try_parse_from(["shotlist", "scan", "-i", "u.txt", "--quality", "0"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::parse_from(["shotlist", "history", "--limit", "3", "--log", "both"]);
        assert_eq!(cli.log, LogDestination::Both);
        assert!(matches!(cli.command, Command::History { limit: 3 }));
    }
}
