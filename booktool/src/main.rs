//! booktool: manage EPUB and audiobook files from the command line.
//!
//! Verbosity doubles as the mutation log: `-v` shows every change made (or,
//! with `--dry-run`, every change that would be made); `-vv` adds debug detail.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use booktool::batch::BatchSummary;
use booktool::commands::{self, RunOptions};
use booktool::config::{Config, load_config};
use booktool::logging::{self, resolve_level};
use booktool::report::report_condition;
use booktool::{epub, exit_codes, isbn, sanitize};

#[derive(Parser)]
#[command(name = "booktool", version, about = "Manage EPUB and audiobook files")]
struct Cli {
    /// Increase logging verbosity (`-v` lists changes, `-vv` adds debug detail).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Report changes without applying them.
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    /// TOML configuration file.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Stop at the first file that fails instead of skipping it.
    #[arg(long, global = true)]
    fail_fast: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Set track tags from file names (number) and directory contents (total).
    FixTrackNumbers {
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
    },
    /// Renumber multi-disc audiobooks as a single run of tracks.
    FlattenDiscs {
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
    },
    /// Print the total duration in seconds of audio files and directories.
    Duration {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Rename files to their sanitized names.
    Rename {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Set permission bits.
    Chmod {
        /// Octal mode; defaults to `file_mode` from the config.
        #[arg(long, value_parser = parse_mode)]
        mode: Option<u32>,
        /// Apply to every file under directory arguments.
        #[arg(short = 'R', long)]
        recursive: bool,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print the sanitized form of each argument.
    Sanitize {
        #[arg(required = true)]
        texts: Vec<String>,
    },
    /// Print the ISBN-10 form of each ISBN-13.
    Isbn10 {
        #[arg(required = true)]
        isbns: Vec<String>,
    },
    /// Pack or unpack EPUB containers.
    Epub {
        #[command(subcommand)]
        action: EpubCommand,
    },
}

#[derive(Subcommand)]
enum EpubCommand {
    /// Zip an unpacked EPUB directory.
    Compress {
        source: PathBuf,
        target: PathBuf,
        /// Overwrite an existing target.
        #[arg(short, long)]
        force: bool,
    },
    /// Unpack an EPUB into a directory.
    Decompress { source: PathBuf, target: PathBuf },
}

fn parse_mode(raw: &str) -> Result<u32, String> {
    let digits = raw.trim_start_matches("0o");
    let mode = u32::from_str_radix(digits, 8).map_err(|e| format!("invalid octal mode: {e}"))?;
    if mode > 0o777 {
        return Err(format!("mode {raw} is out of range"));
    }
    Ok(mode)
}

fn main() {
    let cli = Cli::parse();
    let guard = logging::init(resolve_level(cli.verbose));
    tracing::debug!(
        threshold = %guard.level(),
        dry_run = cli.dry_run,
        fail_fast = cli.fail_fast,
        "logging initialized"
    );
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            exit_codes::FAILURE
        }
    };
    drop(guard);
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    let opts = RunOptions::from_config(&config, cli.dry_run, cli.fail_fast);

    let summary = match cli.command {
        Command::FixTrackNumbers { dirs } => commands::fix_track_numbers(&dirs, &opts)?,
        Command::FlattenDiscs { dirs } => commands::flatten_discs(&dirs, &opts)?,
        Command::Duration { paths } => {
            let (total, summary) = commands::total_duration(&paths, &opts)?;
            println!("{}", total.round() as u64);
            summary
        }
        Command::Rename { paths } => commands::rename(&paths, &opts)?,
        Command::Chmod {
            mode,
            recursive,
            paths,
        } => commands::chmod_all(&paths, mode.unwrap_or(config.file_mode), recursive, &opts)?,
        Command::Sanitize { texts } => print_each(&texts, sanitize::sanitize),
        Command::Isbn10 { isbns } => print_each(&isbns, isbn::isbn13_to_10),
        Command::Epub { action } => {
            match action {
                EpubCommand::Compress {
                    source,
                    target,
                    force,
                } => epub::compress(&source, &target, force, opts.dry_run)?,
                EpubCommand::Decompress { source, target } => {
                    epub::decompress(&source, &target, opts.dry_run)?
                }
            }
            BatchSummary {
                processed: 1,
                failed: 0,
            }
        }
    };
    Ok(summary_code(summary))
}

/// Print `convert(input)` for each input; failures are reported and counted.
fn print_each(inputs: &[String], convert: fn(&str) -> Result<String>) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for input in inputs {
        summary.processed += 1;
        match convert(input) {
            Ok(output) => println!("{output}"),
            Err(err) => {
                summary.failed += 1;
                report_condition(&format!("{err:#}"));
            }
        }
    }
    summary
}

fn summary_code(summary: BatchSummary) -> i32 {
    if summary.failed > 0 {
        exit_codes::PARTIAL
    } else {
        exit_codes::OK
    }
}
