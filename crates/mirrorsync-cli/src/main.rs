//! mirrorsync - one-way periodic directory mirroring
//!
//! Keeps a replica directory identical to a source directory, re-synchronizing
//! on a fixed interval until interrupted.

mod display;
mod json_output;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use mirrorsync_config::{Config, ConfigLoader};
use mirrorsync_sync::{Scheduler, TracingLogger};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

/// mirrorsync - keep a replica directory identical to a source directory
#[derive(Debug, Parser)]
#[command(
    name = "mirrorsync",
    version = env!("CARGO_PKG_VERSION"),
    about = "One-way periodic directory mirroring",
    long_about = "mirrorsync copies new and changed files from a source directory into a replica\n\
                  directory and removes replica files that no longer exist in the source.\n\
                  Changes are detected by BLAKE3 content hashes. The pass repeats on a fixed\n\
                  interval until interrupted with Ctrl-C."
)]
struct Cli {
    /// Source directory
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Replica directory
    #[arg(short, long)]
    replica: Option<PathBuf>,

    /// Log file path (".log" is appended)
    #[arg(short, long)]
    log_file: Option<PathBuf>,

    /// Seconds between the end of one cycle and the start of the next
    #[arg(short, long)]
    interval: Option<u64>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Report what would change without touching the replica
    #[arg(long)]
    dry_run: bool,

    /// Print the single-cycle result as JSON (with --once)
    #[arg(long, requires = "once")]
    json: bool,

    /// Write the default configuration to PATH and exit
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,

    /// Enable debug logging, including trace-level walk and copy details
    #[arg(short, long)]
    debug: bool,

    /// Verbose mode - log every indexed tree and copied file
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.write_default_config {
        ConfigLoader::generate_default_config(path)
            .with_context(|| format!("Failed to write configuration to '{}'", path.display()))?;
        display::display_success(&format!("Default configuration written to {}", path.display()));
        return Ok(());
    }

    let config = load_config(&cli)?;
    bootstrap_directories(&config)?;
    let _guard = init_logging(&config, &cli)?;

    info!(
        "mirrorsync v{} starting: source={}, replica={}, log_file={}, interval={}s",
        env!("CARGO_PKG_VERSION"),
        config.source.display(),
        config.replica.display(),
        config.log_path().display(),
        config.interval_secs
    );
    if config.sync.dry_run {
        info!("Dry run mode - no changes will be made");
    }

    let scheduler = Scheduler::from_config(&config, Arc::new(TracingLogger))?;

    if cli.once {
        once_command(&scheduler, &config, &cli).await
    } else {
        watch_command(&scheduler, &config, cli.quiet).await
    }
}

/// Layer configuration: defaults, file, environment, then command-line flags
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from '{}'", path.display()))?,
        None => ConfigLoader::load_default().context("Failed to load configuration")?,
    };

    apply_overrides(&mut config, cli);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(source) = &cli.source {
        config.source.clone_from(source);
    }
    if let Some(replica) = &cli.replica {
        config.replica.clone_from(replica);
    }
    if let Some(log_file) = &cli.log_file {
        config.log_file.clone_from(log_file);
    }
    if let Some(interval) = cli.interval {
        config.interval_secs = interval;
    }
    if cli.dry_run {
        config.sync.dry_run = true;
    }
}

/// Create the source, replica and log directories if missing
fn bootstrap_directories(config: &Config) -> Result<()> {
    let log_path = config.log_path();
    let log_dir = log_path.parent().filter(|dir| !dir.as_os_str().is_empty());

    for dir in [config.source.as_path(), config.replica.as_path()]
        .into_iter()
        .chain(log_dir)
    {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory '{}'", dir.display()))?;
    }
    Ok(())
}

/// Default filter directive when `RUST_LOG` is unset
fn log_level<'a>(cli: &Cli, configured: &'a str) -> &'a str {
    if cli.debug {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        configured
    }
}

fn init_logging(config: &Config, cli: &Cli) -> Result<WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = log_level(cli, &config.logging.level);

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let log_path = config.log_path();
    let file_name = log_path
        .file_name()
        .with_context(|| format!("Invalid log file path '{}'", log_path.display()))?;
    let log_dir = log_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, file_name));

    let json = config.logging.json_format;
    let json_file_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_writer(file_writer.clone())
            .with_ansi(false)
    });
    let text_file_layer = (!json).then(|| {
        fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_target(false)
    });
    let console_layer = (config.logging.console && !cli.json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_file_layer)
        .with(text_file_layer)
        .with(console_layer)
        .try_init()?;

    Ok(guard)
}

async fn once_command(scheduler: &Scheduler, config: &Config, cli: &Cli) -> Result<()> {
    let report = scheduler.run_once().await?;

    if cli.json {
        let output = json_output::CycleResultJson::new(&report, config);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !cli.quiet {
        display::display_cycle_report(&report, config.sync.dry_run);
    }

    Ok(())
}

async fn watch_command(scheduler: &Scheduler, config: &Config, quiet: bool) -> Result<()> {
    if !quiet {
        println!(
            "{} Mirroring {} into {} every {}",
            style("⟲").blue().bold(),
            style(config.source.display()).cyan(),
            style(config.replica.display()).cyan(),
            style(display::format_duration(config.interval())).blue()
        );
        display::display_info("Press Ctrl-C to stop");
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown requested, stopping after the current cycle");
                cancel.cancel();
            }
        }
    });

    let summary = scheduler.run(cancel).await;

    if !quiet {
        display::display_scheduler_summary(&summary);
    }
    Ok(())
}
