//! Logging prelude, subscriber setup and the injected logger capability.
//!
//! Engine components never reach for a global logger to report outcomes.
//! They receive a [`Logger`] from the caller; the production implementation
//! [`TracingLogger`] forwards to `tracing`, and [`RecordingLogger`] keeps
//! every line in memory so tests can assert on what was reported.
//!
//! # Usage
//!
//! ```ignore
//! use crate::logging::*;
//!
//! debug!("Walking {}", dir.display());
//! ```

pub use tracing::{debug, error, info, info_span, warn};

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Sink for user-visible run outcomes
pub trait Logger: Send + Sync {
	fn info(&self, message: &str);
	fn error(&self, message: &str);
}

/// Logger that forwards to the `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
	fn info(&self, message: &str) {
		info!("{}", message);
	}

	fn error(&self, message: &str) {
		error!("{}", message);
	}
}

/// Severity of a recorded line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
	Info,
	Error,
}

/// Logger that keeps every line in memory
#[derive(Debug, Default)]
pub struct RecordingLogger {
	lines: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingLogger {
	pub fn new() -> Self {
		Self::default()
	}

	/// All recorded lines, oldest first
	pub fn lines(&self) -> Vec<(LogLevel, String)> {
		match self.lines.lock() {
			Ok(lines) => lines.clone(),
			Err(poisoned) => poisoned.into_inner().clone(),
		}
	}

	/// Recorded messages at the given level
	pub fn messages(&self, level: LogLevel) -> Vec<String> {
		self.lines().into_iter().filter(|(l, _)| *l == level).map(|(_, m)| m).collect()
	}

	pub fn errors(&self) -> Vec<String> {
		self.messages(LogLevel::Error)
	}

	pub fn contains(&self, needle: &str) -> bool {
		self.lines().iter().any(|(_, m)| m.contains(needle))
	}

	fn push(&self, level: LogLevel, message: &str) {
		let mut lines = match self.lines.lock() {
			Ok(lines) => lines,
			Err(poisoned) => poisoned.into_inner(),
		};
		lines.push((level, message.to_string()));
	}
}

impl Logger for RecordingLogger {
	fn info(&self, message: &str) {
		self.push(LogLevel::Info, message);
	}

	fn error(&self, message: &str) {
		self.push(LogLevel::Error, message);
	}
}

/// Path of the log file for a run started now: `process_YYYYmmdd_HHMMSS.log`
pub fn log_file_path(log_dir: &Path) -> PathBuf {
	let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
	log_dir.join(format!("process_{}.log", timestamp))
}

/// Initialize the tracing subscriber with environment filter support.
///
/// By default, logs at INFO level and above are displayed. Control the log level
/// with the `RUST_LOG` environment variable:
///
/// ```bash
/// RUST_LOG=debug slidesync run
/// RUST_LOG=slidesync::tree=debug slidesync run
/// ```
///
/// When `log_file` is given, every event is also written to that file without
/// ANSI colors. The returned guard flushes the file writer on drop and must be
/// held for the lifetime of the run.
pub fn init_tracing(log_file: Option<&Path>) -> io::Result<Option<WorkerGuard>> {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let stderr_layer = fmt::layer().with_writer(io::stderr);

	match log_file {
		Some(path) => {
			let dir = path.parent().unwrap_or_else(|| Path::new("."));
			std::fs::create_dir_all(dir)?;
			let file_name = path.file_name().ok_or_else(|| {
				io::Error::new(io::ErrorKind::InvalidInput, "log file path has no file name")
			})?;

			let appender = tracing_appender::rolling::never(dir, file_name);
			let (writer, guard) = tracing_appender::non_blocking(appender);
			let file_layer = fmt::layer().with_ansi(false).with_writer(writer);

			tracing_subscriber::registry()
				.with(filter)
				.with(stderr_layer)
				.with(file_layer)
				.try_init()
				.map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
			Ok(Some(guard))
		}
		None => {
			tracing_subscriber::registry()
				.with(filter)
				.with(stderr_layer)
				.try_init()
				.map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
			Ok(None)
		}
	}
}


// vim: ts=4
