//! docbind CLI

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use docbind::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Inspect, convert and watch text files the way docbind loads them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, global = true, env = "DOCBIND_CONFIG")]
    config: Option<PathBuf>,

    /// Configuration profile (desktop, strict, large-files, minimal)
    #[arg(short, long, global = true)]
    profile: Option<ConfigProfile>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect the encoding of a file and report how it loads
    Inspect {
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long, action = clap::ArgAction::SetTrue)]
        json: bool,
    },

    /// Re-save a file of any detected encoding as UTF-8
    Convert { src: PathBuf, dst: PathBuf },

    /// Poll a file and print every state change
    Watch {
        file: PathBuf,

        /// Poll interval in milliseconds
        #[arg(long, default_value = "500")]
        interval_ms: u64,

        /// Exit after this many changes
        #[arg(long)]
        count: Option<usize>,

        /// With a file watcher running, poll fully only every N intervals
        #[arg(long, default_value = "20")]
        full_poll_every: u32,
    },
}

impl Command {
    fn file(&self) -> &Path {
        match self {
            Self::Inspect { file, .. } | Self::Watch { file, .. } => file,
            Self::Convert { src, .. } => src,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let file_size = std::fs::metadata(args.command.file()).ok().map(|m| m.len());
    let config = resolve_config(args.config.as_deref(), args.profile, file_size)
        .context("Failed to resolve configuration")?;

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_ascii_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    log::debug!("docbind v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Inspect { file, json } => run_inspect(&file, json, &config),
        Command::Convert { src, dst } => run_convert(&src, &dst, &config),
        Command::Watch {
            file,
            interval_ms,
            count,
            full_poll_every,
        } => run_watch(&file, interval_ms, count, full_poll_every, config),
    }
}

fn run_inspect(file: &Path, json: bool, config: &DocumentConfig) -> anyhow::Result<()> {
    let report = inspect(file, config).with_context(|| format!("Cannot inspect {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("path:         {}", report.path.display());
    println!("encoding:     {} ({:?})", report.encoding, report.detection_source);
    println!("bytes:        {}", report.bytes);
    println!("chunks:       {}", report.chunks);
    println!("characters:   {}", report.chars);
    println!("replacements: {}", if report.had_replacements { "yes" } else { "no" });
    if let Some(modified) = report.modified {
        println!("modified:     {}", modified.to_rfc3339());
    }
    Ok(())
}

fn run_convert(src: &Path, dst: &Path, config: &DocumentConfig) -> anyhow::Result<()> {
    let document = Document::open(src, MemoryBuffer::new(), config.clone())
        .with_context(|| format!("Cannot load {}", src.display()))?;

    if let Some(report) = document.last_load_report()
        && report.had_replacements
    {
        log::warn!(
            "{} contained bytes invalid in {}; they were replaced",
            src.display(),
            report.encoding
        );
    }

    let outcome = document
        .save_copy_as(dst)
        .with_context(|| format!("Cannot write {}", dst.display()))?;
    println!(
        "wrote {} bytes of UTF-8 to {}{}",
        outcome.bytes_written,
        dst.display(),
        if outcome.direct_fallback { " (in place)" } else { "" }
    );
    Ok(())
}

fn run_watch(
    file: &Path,
    interval_ms: u64,
    count: Option<usize>,
    full_poll_every: u32,
    config: DocumentConfig,
) -> anyhow::Result<()> {
    if interval_ms == 0 {
        bail!("--interval-ms must be greater than zero");
    }

    let mut document = Document::open(file, MemoryBuffer::new(), config)
        .with_context(|| format!("Cannot load {}", file.display()))?;

    // Watcher failures only cost latency; polling continues regardless.
    let mut watch = match document.watch() {
        Ok(watch) => watch,
        Err(e) => {
            log::warn!("File watcher unavailable: {}", e);
            None
        }
    };

    println!("watching {}", document.display_name());
    let interval = Duration::from_millis(interval_ms);
    let mut seen = 0usize;
    let mut schedule = PollSchedule::new(full_poll_every);

    loop {
        let change = match watch.as_mut() {
            Some((_, events)) => {
                let signalled = document.check_if_signalled(events);
                if signalled == FileStateChange::NoChange && schedule.full_poll_due() {
                    document.check_for_state_change()
                } else {
                    signalled
                }
            }
            None => document.check_for_state_change(),
        };

        if change != FileStateChange::NoChange {
            println!("{} {}", chrono::Local::now().format("%H:%M:%S"), change);
            seen += 1;

            if change == FileStateChange::Modified {
                document.reload()?;
            }

            if count.is_some_and(|limit| seen >= limit) {
                break;
            }
        }

        std::thread::sleep(interval);
    }

    if let Some((mut watcher, _)) = watch {
        watcher.stop();
    }
    document.close();
    Ok(())
}
