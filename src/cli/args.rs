//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::export::Format;

/// starcast - Flatten podcast GitHub mentions into daily star-history tables
#[derive(Parser, Debug)]
#[command(name = "starcast")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if starcast was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; only warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Expand a podcast file into one row per repository per day
    #[command(
        name = "expand",
        long_about = "Expand a podcast file into one row per repository per day.\n\n\
            Reads a podcast JSON file whose references already carry repository \
            data (see `starcast fetch`) and writes a flat table: for every \
            episode-repository pair, one row per calendar day from the start of \
            the repository's history up to the day its data was requested.",
        after_help = "\
EXAMPLES:
    # CSV to stdout
    starcast expand talkpython.json

    # JSON lines to a file
    starcast expand talkpython.json --format jsonl -o rows.jsonl

    # Shorter history before the podcast started
    starcast expand talkpython.json --backfill-days 30"
    )]
    Expand {
        /// Podcast JSON file
        input: PathBuf,

        /// Write the table here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: csv or jsonl
        #[arg(long, default_value_t = Format::Csv)]
        format: Format,

        /// Days of history before the podcast start (overrides config)
        #[arg(long, value_name = "DAYS")]
        backfill_days: Option<i64>,

        /// Language recorded when a repository has none (overrides config)
        #[arg(long, value_name = "NAME")]
        unknown_language: Option<String>,
    },

    /// Fetch repository metadata and star history from GitHub
    #[command(
        name = "fetch",
        long_about = "Fetch repository metadata and star history from GitHub.\n\n\
            Every reference that points into a GitHub repository and has no \
            repository data yet is resolved through the GraphQL API. The token is \
            read from the environment variable named by `github.token_env` \
            (GITHUB_TOKEN by default). References that fail to resolve are \
            reported and left untouched.",
        after_help = "\
EXAMPLES:
    # Update the file in place
    GITHUB_TOKEN=... starcast fetch talkpython.json

    # Keep the input, write a new file
    starcast fetch talkpython.json -o talkpython.resolved.json"
    )]
    Fetch {
        /// Podcast JSON file
        input: PathBuf,

        /// Write the resolved podcast here instead of over the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Date recorded as each repository's request date (default: today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        requested_on: Option<NaiveDate>,

        /// GraphQL endpoint (overrides config)
        #[arg(long)]
        endpoint: Option<String>,

        /// Exit with an error if any reference failed to resolve
        #[arg(long)]
        strict: bool,
    },

    /// Build windowed training, validation and test tables
    #[command(
        name = "dataset",
        long_about = "Build windowed training, validation and test tables.\n\n\
            Expands every input podcast, keeps the days around each mention, \
            and splits rows by episode: per podcast, the newest episodes go to \
            the test split, the ones before them to validation, the rest to \
            training.",
        after_help = "\
EXAMPLES:
    starcast dataset talkpython.json pythonbytes.json --out-dir data/
    starcast dataset *.json --out-dir data/ --format jsonl --holdout-fraction 0.1"
    )]
    Dataset {
        /// Podcast JSON files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for training/validation/test files
        #[arg(long, value_name = "DIR")]
        out_dir: PathBuf,

        /// Output format: csv or jsonl
        #[arg(long, default_value_t = Format::Csv)]
        format: Format,

        /// Date recency is measured from (default: today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        cutoff: Option<NaiveDate>,

        /// Share of each podcast's episodes held out for test, and again for validation
        #[arg(long, value_name = "FRACTION")]
        holdout_fraction: Option<f64>,
    },

    /// Get, set, or list configuration values
    #[command(
        name = "config",
        after_help = "\
EXAMPLES:
    starcast config list
    starcast config get expand.backfill_days
    starcast config set --global github.token_env MY_GITHUB_TOKEN"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective value of a key
    Get {
        /// Configuration key (e.g. expand.backfill_days)
        key: String,
    },
    /// Set a key in the project (or global) config file
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
        /// Write to the global config instead of the project config
        #[arg(long)]
        global: bool,
    },
    /// List every key with its effective value
    List,
}
