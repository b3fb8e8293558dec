//! Error types for slidesync operations

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::folder_name::FolderNameError;

/// Result type used throughout the reconciliation engine
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Main error type for reconciliation operations
#[derive(Debug, Error)]
pub enum ReconcileError {
	/// A directory could not be enumerated; the listing would be incomplete
	#[error("Cannot list directory {}: {source}", .path.display())]
	Listing { path: PathBuf, source: io::Error },

	/// Size or metadata query failed
	#[error("Cannot stat {}: {source}", .path.display())]
	Stat { path: PathBuf, source: io::Error },

	/// Copying (or creating the parent directory for) a file failed
	#[error("Failed to copy {} -> {}: {source}", .from.display(), .to.display())]
	Copy { from: PathBuf, to: PathBuf, source: io::Error },

	/// Removing a file failed; the rest of the batch was not attempted
	#[error("Failed to remove {}: {source}", .path.display())]
	Deletion { path: PathBuf, source: io::Error },

	/// A round folder name does not follow the naming convention
	#[error(transparent)]
	FolderName(#[from] FolderNameError),

	/// Invalid glob pattern in configuration
	#[error("Invalid pattern '{pattern}': {message}")]
	Pattern { pattern: String, message: String },

	/// The copy worker pool could not be started
	#[error("Cannot start copy workers: {message}")]
	Pool { message: String },

	/// Invalid configuration
	#[error(transparent)]
	Config(#[from] ConfigError),
}

impl ReconcileError {
	pub(crate) fn listing(path: impl Into<PathBuf>, source: io::Error) -> Self {
		ReconcileError::Listing { path: path.into(), source }
	}

	pub(crate) fn stat(path: impl Into<PathBuf>, source: io::Error) -> Self {
		ReconcileError::Stat { path: path.into(), source }
	}
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Config file could not be read
	#[error("Cannot read config file {}: {source}", .path.display())]
	Read { path: PathBuf, source: io::Error },

	/// Config file is not valid TOML for the config schema
	#[error("Cannot parse config file {}: {message}", .path.display())]
	Parse { path: PathBuf, message: String },

	/// An environment variable or flag carried an unusable value
	#[error("Invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },

	/// A required setting was never provided
	#[error("Missing required setting: {0}")]
	Missing(&'static str),

	/// Settings are individually valid but inconsistent
	#[error("Invalid configuration: {0}")]
	Invalid(String),
}


// vim: ts=4
