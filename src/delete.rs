//! File removal
//!
//! Removal is unconditional: callers only pass files that a classification
//! pass has already verified as archived.

use std::path::PathBuf;

use crate::error::{ReconcileError, Result};
use crate::fs::FileSystem;
use crate::logging::Logger;

/// Remove `files` in order and return how many were removed
///
/// The first failure stops the batch. Files before it stay removed and files
/// after it are left in place; nothing is retried.
pub fn remove_files(fs: &dyn FileSystem, log: &dyn Logger, files: &[PathBuf]) -> Result<usize> {
	for (removed, path) in files.iter().enumerate() {
		if let Err(source) = fs.remove_file(path) {
			log.error(&format!(
				"Failed to remove {} ({} of {} removed): {}",
				path.display(),
				removed,
				files.len(),
				source
			));
			return Err(ReconcileError::Deletion { path: path.clone(), source });
		}
		log.info(&format!("File {} removed.", path.display()));
	}
	Ok(files.len())
}


// vim: ts=4
