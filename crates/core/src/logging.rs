//! Structured JSON logging for navigation hosts.
//!
//! Log records are written as JSON lines to one file per run,
//! `navstack-<run_id>.json`, inside the configured directory. The run id is a
//! UUID v7, so file names sort chronologically and the oldest runs can be
//! pruned by name once `max_files` is exceeded.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from
//! [`LoggingSettings::level`]:
//!
//! ```bash
//! RUST_LOG=navstack_core::view::navigation=trace,info ./navstack-demo
//! ```
//!
//! ```no_run
//! use navstack_core::settings::LoggingSettings;
//! use navstack_core::logging::{init_logging, shutdown_logging};
//!
//! init_logging(&LoggingSettings::default())?;
//! tracing::info!("host started");
//! shutdown_logging();
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::settings::{LoggingSettings, DEFAULT_LOG_LEVEL};
use anyhow::{Context, Error};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const LOG_FILE_PREFIX: &str = "navstack-";
const LOG_FILE_SUFFIX: &str = "json";
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

static LOG_GUARD: OnceLock<Mutex<Option<WorkerGuard>>> = OnceLock::new();
static RUN_ID: OnceLock<String> = OnceLock::new();

/// Identifier of this process run, generated on first access.
///
/// ```
/// use navstack_core::logging::get_run_id;
///
/// assert_eq!(get_run_id(), get_run_id());
/// ```
pub fn get_run_id() -> &'static str {
    RUN_ID.get_or_init(|| Uuid::now_v7().to_string()).as_str()
}

/// Deletes the oldest run logs in `log_dir` so that at most `max_files`
/// remain. A limit of `0` keeps everything.
fn prune_run_logs(log_dir: &Path, max_files: usize) -> Result<(), Error> {
    if max_files == 0 {
        return Ok(());
    }

    let run_logs = run_logs_oldest_first(log_dir)?;
    let excess = run_logs.len().saturating_sub(max_files);
    for path in &run_logs[..excess] {
        tracing::debug!(path = %path.display(), "removing old run log");
        fs::remove_file(path)
            .with_context(|| format!("can't remove old log file {}", path.display()))?;
    }

    Ok(())
}

/// Run ids are time-ordered, so name order is age order.
fn run_logs_oldest_first(log_dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let entries = fs::read_dir(log_dir)
        .with_context(|| format!("can't read log directory {}", log_dir.display()))?;

    let mut run_logs = entries
        .map(|entry| {
            entry
                .map(|entry| entry.path())
                .context("can't read log directory entry")
        })
        .filter(|path| path.as_ref().map_or(true, |path| is_run_log(path)))
        .collect::<Result<Vec<PathBuf>, Error>>()?;
    run_logs.sort();

    Ok(run_logs)
}

fn is_run_log(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
        && path.extension().is_some_and(|ext| ext == LOG_FILE_SUFFIX)
}

/// Installs the global JSON subscriber.
///
/// Creates the log directory, prunes old run logs and routes every `tracing`
/// event of the process into `navstack-<run_id>.json` through a non-blocking
/// writer. Does nothing when logging is disabled. Call once at startup and
/// pair with [`shutdown_logging`].
///
/// # Errors
///
/// Fails if the log directory can't be prepared, the filter directive is
/// invalid, or a global subscriber is already installed.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), Error> {
    if !settings.enabled {
        return Ok(());
    }

    let log_dir = std::env::current_dir()
        .context("can't get current working directory")?
        .join(&settings.directory);
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("can't create log directory {}", log_dir.display()))?;

    prune_run_logs(&log_dir, settings.max_files)?;

    let appender = tracing_appender::rolling::Builder::new()
        .rotation(tracing_appender::rolling::Rotation::NEVER)
        .filename_prefix(format!("{}{}", LOG_FILE_PREFIX, get_run_id()))
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(&log_dir)
        .context("can't initialize log file appender")?;

    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(Mutex::new(Some(guard)));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(writer)
        .with_current_span(true);

    tracing_subscriber::registry()
        .with(build_filter(settings)?)
        .with(fmt_layer)
        .try_init()
        .context("can't initialize tracing subscriber")?;

    tracing::info!(run_id = get_run_id(), version = VERSION, "logging initialized");

    Ok(())
}

/// Flushes buffered log records, waiting at most a few seconds.
pub fn shutdown_logging() {
    let Some(mutex) = LOG_GUARD.get() else {
        return;
    };

    let Ok(mut slot) = mutex.lock() else {
        return;
    };

    if let Some(guard) = slot.take() {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            drop(guard);
            let _ = tx.send(());
        });
        let _ = rx.recv_timeout(FLUSH_TIMEOUT);
    }
}

/// `RUST_LOG` wins over the configured level; a blank level means `info`.
fn build_filter(settings: &LoggingSettings) -> Result<EnvFilter, Error> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let level = Some(settings.level.trim())
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_LOG_LEVEL);
    level
        .parse::<EnvFilter>()
        .with_context(|| format!("invalid logging level {:?}", level))
}
