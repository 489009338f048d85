//! mayordomo - conversational front end for the system metrics store.
//!
//! Supports two modes:
//! - Interactive (default): greet, then answer one command per input line
//! - One-shot: answer a single command and exit
//!
//! Usage:
//!   mayordomo                                   # interactive, SQLite store
//!   mayordomo --backend parquet                 # interactive, Parquet snapshots
//!   mayordomo query 1                           # value of metric #1
//!   mayordomo query top_10_cpu --json           # process report as JSON

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

#[cfg(target_os = "linux")]
use mayordomo::collector::RealFs;
#[cfg(not(target_os = "linux"))]
use mayordomo::collector::mock::MockFs;
use mayordomo::collector::ProcfsSampler;
use mayordomo::config::{
    DEFAULT_DB_PATH, DEFAULT_PROC_PATH, DEFAULT_SNAPSHOT_DIR, EngineConfig, StorageConfig,
};
use mayordomo::engine::{QueryEngine, ResponseKind};
use mayordomo::ranker::DEFAULT_PROCESS_LIMIT;
use mayordomo::storage::DEFAULT_TABLE;
use mayordomo::storage::columnar::DEFAULT_PATTERN;

/// Storage backend holding the metrics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Single SQLite database file.
    Sqlite,
    /// Directory of Parquet snapshot files.
    Parquet,
}

/// Ask for the current value of a system metric.
#[derive(Parser)]
#[command(name = "mayordomo", about = "System metrics query bot", version)]
struct Args {
    /// Storage backend to read snapshots from.
    #[arg(long, value_enum, default_value = "sqlite", env = "MAYORDOMO_BACKEND", global = true)]
    backend: Backend,

    /// SQLite database file (sqlite backend).
    #[arg(long, default_value = DEFAULT_DB_PATH, env = "MAYORDOMO_DB_PATH", global = true)]
    db_path: PathBuf,

    /// Directory of snapshot files (parquet backend).
    #[arg(long, default_value = DEFAULT_SNAPSHOT_DIR, env = "MAYORDOMO_SNAPSHOT_DIR", global = true)]
    snapshot_dir: PathBuf,

    /// Glob selecting snapshot files inside --snapshot-dir.
    #[arg(long, default_value = DEFAULT_PATTERN, env = "MAYORDOMO_SNAPSHOT_GLOB", global = true)]
    snapshot_glob: String,

    /// Name of the metrics table.
    #[arg(long, default_value = DEFAULT_TABLE, env = "MAYORDOMO_TABLE", global = true)]
    table: String,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = DEFAULT_PROC_PATH, global = true)]
    proc_path: PathBuf,

    /// Per-process CPU sampling window in milliseconds.
    #[arg(
        long,
        default_value = "100",
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    sample_interval_ms: u64,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Answer a single command and exit.
    Query {
        /// Metric number or name, or 'opciones'.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Print the response as a JSON object.
        #[arg(long)]
        json: bool,
    },
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        let storage = match self.backend {
            Backend::Sqlite => StorageConfig::Sqlite {
                path: self.db_path.clone(),
                table: self.table.clone(),
            },
            Backend::Parquet => StorageConfig::Parquet {
                dir: self.snapshot_dir.clone(),
                pattern: self.snapshot_glob.clone(),
                table: self.table.clone(),
            },
        };
        EngineConfig {
            storage,
            proc_path: self.proc_path.clone(),
            sample_interval: Duration::from_millis(self.sample_interval_ms),
            process_limit: DEFAULT_PROCESS_LIMIT,
        }
    }
}

/// One-shot answer as printed by `query --json`.
#[derive(Serialize)]
struct QueryOutput<'a> {
    input: &'a str,
    kind: ResponseKind,
    text: &'a str,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Logs go to stderr so the conversation on stdout stays clean.
fn init_logging(verbose: u8, quiet: bool) -> anyhow::Result<()> {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("mayordomo={}", level).parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn build_engine(config: &EngineConfig) -> QueryEngine {
    #[cfg(target_os = "linux")]
    let sampler = ProcfsSampler::new(RealFs::new(), &config.proc_path);
    #[cfg(not(target_os = "linux"))]
    let sampler = ProcfsSampler::new(MockFs::typical_system(), &config.proc_path);

    config.build(Box::new(sampler))
}

fn run_query(engine: &mut QueryEngine, text: &[String], json: bool) -> anyhow::Result<()> {
    let input = text.join(" ");
    let response = engine.handle(&input);

    if json {
        let output = QueryOutput {
            input: &input,
            kind: response.kind,
            text: &response.text,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("failed to encode response")?
        );
    } else {
        println!("{}", response.text);
    }
    Ok(())
}

/// Answers one command per input line until EOF.
///
/// Lines are read as bytes; invalid UTF-8 is replaced rather than ending the
/// session.
fn run_session<R: BufRead, W: Write>(
    engine: &mut QueryEngine,
    mut input: R,
    mut output: W,
) -> anyhow::Result<()> {
    writeln!(output, "{}", engine.greeting())?;

    let mut buf = Vec::new();
    loop {
        write!(output, "\n> ")?;
        output.flush()?;

        buf.clear();
        if input.read_until(b'\n', &mut buf).context("failed to read input")? == 0 {
            debug!("end of input");
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        if line.trim().is_empty() {
            continue;
        }

        let response = engine.handle(&line);
        writeln!(output, "{}", response.text)?;
    }

    writeln!(output)?;
    Ok(())
}

fn run_interactive(engine: &mut QueryEngine) -> anyhow::Result<()> {
    run_session(engine, io::stdin().lock(), io::stdout())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet)?;

    let config = args.engine_config();
    info!(
        backend = ?args.backend,
        proc_path = %config.proc_path.display(),
        interval = ?config.sample_interval,
        "starting mayordomo"
    );
    let mut engine = build_engine(&config);

    match &args.mode {
        Some(Mode::Query { text, json }) => run_query(&mut engine, text, *json),
        None => run_interactive(&mut engine),
    }
}
