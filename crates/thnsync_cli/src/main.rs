//! thnsync CLI
//!
//! Command-line front end for chunking, envelopes, remote chunk sync,
//! transactional apply and TXLOG history.
//!
//! # Commands
//!
//! - `chunk` - Show the content-defined chunks of a file
//! - `validate` - Validate a manifest file
//! - `make` - Build an envelope from a source tree
//! - `inspect` - Summarize an envelope
//! - `push` - Upload the chunks a remote is missing
//! - `apply` - Apply an envelope to a destination
//! - `recover` - Apply a recovery plan to a scaffold
//! - `history` - Show TXLOG transaction history

mod commands;
mod error;
mod output;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use thnsync_chunker::{
    ChunkerConfig, DEFAULT_AVG_CHUNK_SIZE, DEFAULT_MAX_CHUNK_SIZE, DEFAULT_MIN_CHUNK_SIZE,
};
use tracing_subscriber::EnvFilter;

use crate::error::CliResult;

/// Environment variable holding a log filter.
const LOG_ENV: &str = "THNSYNC_LOG";

/// Delta sync, transactional apply and history tools.
#[derive(Parser)]
#[command(name = "thnsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Emit JSON instead of text
    #[arg(global = true, long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Chunk size bounds.
#[derive(Args, Debug, Clone)]
struct ChunkArgs {
    /// Minimum chunk size in bytes
    #[arg(long, default_value_t = DEFAULT_MIN_CHUNK_SIZE)]
    min_size: usize,

    /// Target average chunk size in bytes
    #[arg(long, default_value_t = DEFAULT_AVG_CHUNK_SIZE)]
    avg_size: usize,

    /// Maximum chunk size in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_CHUNK_SIZE)]
    max_size: usize,
}

impl ChunkArgs {
    fn config(&self) -> ChunkerConfig {
        ChunkerConfig::new(self.min_size, self.avg_size, self.max_size)
    }
}

/// Envelope transfer mode.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Every file in full
    RawZip,
    /// Changed files as content-addressed chunks
    CdcDelta,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the content-defined chunks of a file
    Chunk {
        /// File to chunk
        file: PathBuf,

        #[command(flatten)]
        bounds: ChunkArgs,
    },

    /// Validate a manifest file
    Validate {
        /// Manifest JSON file
        manifest: PathBuf,
    },

    /// Build an envelope from a source tree
    Make {
        /// Source directory
        source: PathBuf,

        /// Envelope file to write
        out: PathBuf,

        /// Transfer mode
        #[arg(long, value_enum, default_value = "cdc-delta")]
        mode: Mode,

        /// Target name recorded in the manifest
        #[arg(long, default_value = "web")]
        target: String,

        /// Previous cdc-delta envelope; unchanged files are omitted
        #[arg(long)]
        previous: Option<PathBuf>,

        #[command(flatten)]
        bounds: ChunkArgs,
    },

    /// Summarize an envelope
    Inspect {
        /// Envelope file
        envelope: PathBuf,

        /// Local chunk store to check chunk availability against
        #[arg(long)]
        store: Option<PathBuf>,

        /// Store namespace (defaults to the manifest target)
        #[arg(long)]
        target: Option<String>,

        /// Maximum number of files to list
        #[arg(long, default_value_t = thnsync_manifest::DEFAULT_MAX_SUMMARY_ITEMS)]
        max_items: usize,
    },

    /// Upload the chunks a remote is missing
    Push {
        /// Envelope file (cdc-delta)
        envelope: PathBuf,

        /// Remote base URL
        #[arg(long)]
        url: String,

        /// Remote target name (defaults to the manifest target)
        #[arg(long)]
        target: Option<String>,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 20)]
        timeout: u64,
    },

    /// Apply an envelope to a destination
    Apply {
        /// Envelope file
        envelope: PathBuf,

        /// Destination directory
        #[arg(long)]
        dest: PathBuf,

        /// Target name (defaults to the manifest target, then "web")
        #[arg(long)]
        target: Option<String>,

        /// Keep backups of replaced files under this directory
        #[arg(long)]
        backup: Option<PathBuf>,

        /// Local chunk store for chunks not shipped in the envelope
        #[arg(long)]
        store: Option<PathBuf>,

        /// Check everything, write nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Apply a recovery plan to a scaffold
    Recover {
        /// Plan JSON file
        plan: PathBuf,

        /// Check everything, write nothing
        #[arg(long)]
        dry_run: bool,

        /// Confirm that the plan may modify the scaffold
        #[arg(long)]
        yes: bool,

        /// Allow regeneration of blueprint-owned files
        #[arg(long)]
        regen_owned: bool,

        /// Template directory used for regeneration
        #[arg(long, requires = "regen_owned")]
        templates: Option<PathBuf>,
    },

    /// Show TXLOG transaction history
    History {
        /// Directory to search upward from for a scaffold
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Only transactions for this exact target
        #[arg(long)]
        target: Option<String>,

        /// Only this transaction
        #[arg(long)]
        tx_id: Option<String>,

        /// Maximum number of transactions
        #[arg(long, default_value_t = thnsync_history::DEFAULT_LIMIT as i64)]
        limit: i64,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs a command; `Ok(false)` means it ran and reported a failure.
fn run(cli: Cli) -> CliResult<bool> {
    let json = cli.json;
    match cli.command {
        Commands::Chunk { file, bounds } => commands::chunk::run(&file, bounds.config(), json),
        Commands::Validate { manifest } => commands::validate::run(&manifest, json),
        Commands::Make {
            source,
            out,
            mode,
            target,
            previous,
            bounds,
        } => commands::make::run(
            &source,
            &out,
            mode == Mode::CdcDelta,
            &target,
            previous.as_deref(),
            bounds.config(),
            json,
        ),
        Commands::Inspect {
            envelope,
            store,
            target,
            max_items,
        } => commands::inspect::run(&envelope, store.as_deref(), target, max_items, json),
        Commands::Push {
            envelope,
            url,
            target,
            timeout,
        } => commands::push::run(&envelope, &url, target, timeout, json),
        Commands::Apply {
            envelope,
            dest,
            target,
            backup,
            store,
            dry_run,
        } => commands::apply::run(
            &envelope,
            &dest,
            target,
            backup,
            store.as_deref(),
            dry_run,
            json,
        ),
        Commands::Recover {
            plan,
            dry_run,
            yes,
            regen_owned,
            templates,
        } => commands::recover::run(&plan, dry_run, yes, regen_owned, templates, json),
        Commands::History {
            path,
            target,
            tx_id,
            limit,
        } => commands::history::run(&path, target, tx_id, limit, json),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
