//! Copying planned files to the destination tree
//!
//! Every copy is verified before the next one starts. The first file that
//! fails verification stops the batch; files after it are not attempted.
//! A later run re-plans from live state, so an aborted batch resumes where it
//! stopped.

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::Serialize;

use crate::error::{ReconcileError, Result};
use crate::fs::FileSystem;
use crate::logging::{debug, Logger};
use crate::strategies::VerifyMode;
use crate::tree::RelativePath;

/// Result of a copy batch that ran without I/O errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum CopyOutcome {
	/// All requested files are present and verified at the destination
	Complete { copied: usize },

	/// `failed` did not verify; later files were not started
	Aborted { copied: usize, failed: RelativePath },
}

impl CopyOutcome {
	pub fn is_complete(&self) -> bool {
		matches!(self, CopyOutcome::Complete { .. })
	}

	pub fn copied(&self) -> usize {
		match self {
			CopyOutcome::Complete { copied } | CopyOutcome::Aborted { copied, .. } => *copied,
		}
	}
}

impl fmt::Display for CopyOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CopyOutcome::Complete { copied } => write!(f, "complete ({} files copied)", copied),
			CopyOutcome::Aborted { copied, failed } => {
				write!(f, "aborted at {} ({} files copied)", failed, copied)
			}
		}
	}
}

/// Compare a copy against its source with the configured oracle
pub fn verify_copy(fs: &dyn FileSystem, src: &Path, dst: &Path, mode: VerifyMode) -> io::Result<bool> {
	match mode {
		VerifyMode::Shallow => fs.shallow_equal(src, dst),
		VerifyMode::Content => fs.content_equal(src, dst),
	}
}

/// Copy `files` from `source_root` to `dest_root`, one at a time, in order
pub fn copy_files(
	fs: &dyn FileSystem,
	log: &dyn Logger,
	source_root: &Path,
	dest_root: &Path,
	files: &[RelativePath],
	verify: VerifyMode,
) -> Result<CopyOutcome> {
	let mut copied = 0;
	for rel in files {
		if !copy_one(fs, log, source_root, dest_root, rel, verify)? {
			return Ok(CopyOutcome::Aborted { copied, failed: rel.clone() });
		}
		copied += 1;
	}
	Ok(CopyOutcome::Complete { copied })
}

/// Copy `files` on a pool of `workers` threads
///
/// The first verification failure raises a shared cancellation flag: no file
/// is started after that, while copies already in flight run to completion.
/// The outcome names the earliest failed file in `files` order and counts
/// every file that was copied and verified. With one worker this is
/// [`copy_files`].
pub fn copy_files_parallel(
	fs: &dyn FileSystem,
	log: &dyn Logger,
	source_root: &Path,
	dest_root: &Path,
	files: &[RelativePath],
	verify: VerifyMode,
	workers: usize,
) -> Result<CopyOutcome> {
	if workers <= 1 || files.len() <= 1 {
		return copy_files(fs, log, source_root, dest_root, files, verify);
	}

	let pool = rayon::ThreadPoolBuilder::new()
		.num_threads(workers)
		.thread_name(|i| format!("slidesync-copy-{}", i))
		.build()
		.map_err(|e| ReconcileError::Pool { message: e.to_string() })?;

	let cancelled = AtomicBool::new(false);
	let results: Vec<Option<Result<bool>>> = pool.install(|| {
		files
			.par_iter()
			.map(|rel| {
				if cancelled.load(Ordering::SeqCst) {
					return None;
				}
				let result = copy_one(fs, log, source_root, dest_root, rel, verify);
				if !matches!(result, Ok(true)) {
					cancelled.store(true, Ordering::SeqCst);
				}
				Some(result)
			})
			.collect()
	});

	let skipped = results.iter().filter(|r| r.is_none()).count();
	if skipped > 0 {
		debug!("{} files not started after cancellation", skipped);
	}

	let copied = results.iter().filter(|r| matches!(r, Some(Ok(true)))).count();
	for (rel, result) in files.iter().zip(results) {
		match result {
			Some(Ok(true)) | None => {}
			Some(Ok(false)) => return Ok(CopyOutcome::Aborted { copied, failed: rel.clone() }),
			Some(Err(e)) => return Err(e),
		}
	}
	Ok(CopyOutcome::Complete { copied })
}

/// Copy and verify a single file; `Ok(false)` means verification failed
fn copy_one(
	fs: &dyn FileSystem,
	log: &dyn Logger,
	source_root: &Path,
	dest_root: &Path,
	rel: &RelativePath,
	verify: VerifyMode,
) -> Result<bool> {
	let src = rel.to_path(source_root);
	let dst = rel.to_path(dest_root);
	let copy_error = |source: io::Error| ReconcileError::Copy {
		from: src.clone(),
		to: dst.clone(),
		source,
	};

	if let Some(parent) = dst.parent() {
		fs.make_dirs(parent).map_err(copy_error)?;
	}
	fs.copy_file(&src, &dst, true).map_err(copy_error)?;

	match verify_copy(fs, &src, &dst, verify) {
		Ok(true) => {
			log.info(&format!("Copied: {} -> {}", src.display(), dst.display()));
			Ok(true)
		}
		Ok(false) => {
			log.error(&format!("Failed to copy: {} -> {}", src.display(), dst.display()));
			Ok(false)
		}
		Err(e) => {
			log.error(&format!(
				"Failed to verify copy: {} -> {}: {}",
				src.display(),
				dst.display(),
				e
			));
			Ok(false)
		}
	}
}


// vim: ts=4
