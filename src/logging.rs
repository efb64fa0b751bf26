//! Logging setup.
//!
//! Installs a `tracing` subscriber with two outputs: stdout (plain or
//! JSON) and a plain-text log file that rolls over at UTC midnight,
//! `{dir}/{prefix}_{YYYY-MM-DD}.log`.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::MakeWriter;

use crate::config::LoggingConfig;

/// Appends log lines to the file for the current UTC day.
#[derive(Debug, Clone)]
pub struct DailyLogFile {
    dir: PathBuf,
    prefix: String,
}

impl DailyLogFile {
    /// Create the writer, creating `dir` if needed.
    pub fn new(dir: impl AsRef<Path>, prefix: impl Into<String>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
        })
    }

    /// Log file path for `date`.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}_{}.log", self.prefix, date.format("%Y-%m-%d")))
    }

    fn open_today(&self) -> io::Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(Utc::now().date_naive()))
    }
}

/// Writer handed out per event. Falls back to discarding output when
/// the day's file cannot be opened, so logging never fails a cycle.
pub enum DailyWriter {
    File(File),
    Unavailable,
}

impl Write for DailyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            DailyWriter::File(f) => f.write(buf),
            DailyWriter::Unavailable => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            DailyWriter::File(f) => f.flush(),
            DailyWriter::Unavailable => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for DailyLogFile {
    type Writer = DailyWriter;

    fn make_writer(&'a self) -> Self::Writer {
        match self.open_today() {
            Ok(file) => DailyWriter::File(file),
            Err(_) => DailyWriter::Unavailable,
        }
    }
}

/// Initialise the `tracing` subscriber.
///
/// `RUST_LOG` overrides the default `tierdraw=info` filter; setting
/// `TIERDRAW_LOG_JSON` switches stdout to JSON lines.
pub fn init_logging(cfg: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tierdraw=info"));

    let json_logging = std::env::var("TIERDRAW_LOG_JSON").is_ok();

    let daily = DailyLogFile::new(&cfg.dir, cfg.file_prefix.clone())
        .with_context(|| format!("Failed to create log dir {}", cfg.dir.display()))?;

    let stdout_json = json_logging.then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
    });
    let stdout_plain = (!json_logging).then(|| fmt::layer().with_target(true));
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(daily);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_json)
        .with(stdout_plain)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
