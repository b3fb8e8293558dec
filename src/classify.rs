//! Selection of source files that are safe to delete
//!
//! A file qualifies only when it exists on both sides, matches the pattern,
//! lies inside the restriction set (if one is given), is not the protected
//! alignment file, and its source and destination copies still compare equal.

use std::path::{Path, PathBuf};

use crate::error::{ReconcileError, Result};
use crate::fs::FileSystem;
use crate::logging::{debug, Logger};
use crate::pattern::StructuralPattern;
use crate::plan::dest_files;
use crate::strategies::SymlinkMode;
use crate::tree::list_all_files;
use crate::util::format_size;

/// Source files chosen for deletion and their combined size
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionSelection {
	pub files: Vec<PathBuf>,
	pub total_bytes: u64,
}

impl DeletionSelection {
	pub fn is_empty(&self) -> bool {
		self.files.is_empty()
	}
}

/// Policy shared by every classification pass of a run
#[derive(Debug, Clone, Copy)]
pub struct SelectionPolicy<'a> {
	/// File names ending with this are never selected
	pub protected_suffix: &'a str,
	pub symlinks: SymlinkMode,
}

/// True if `path` lies at or under one of `dirs`
fn within_restriction(fs: &dyn FileSystem, path: &Path, dirs: &[PathBuf]) -> bool {
	dirs.iter().any(|dir| fs.common_path(path, dir).as_deref() == Some(dir.as_path()))
}

/// Files under `source_root` that are verified copies at `dest_root` and
/// match `pattern`; nothing is deleted here
pub fn select_for_deletion(
	fs: &dyn FileSystem,
	log: &dyn Logger,
	source_root: &Path,
	dest_root: &Path,
	pattern: &StructuralPattern,
	policy: SelectionPolicy<'_>,
	restriction: Option<&[PathBuf]>,
) -> Result<DeletionSelection> {
	let source = list_all_files(fs, source_root, policy.symlinks)?;
	let dest = dest_files(fs, dest_root, policy.symlinks)?;

	let mut selection = DeletionSelection::default();
	for rel in source.intersection(&dest) {
		let src = rel.to_path(source_root);

		if let Some(dirs) = restriction {
			if !within_restriction(fs, &src, dirs) {
				continue;
			}
		}
		if !pattern.matches(rel) {
			continue;
		}
		if !policy.protected_suffix.is_empty() && rel.file_name().ends_with(policy.protected_suffix)
		{
			debug!("Keeping protected file {}", src.display());
			continue;
		}

		let dst = rel.to_path(dest_root);
		match fs.shallow_equal(&src, &dst) {
			Ok(true) => {}
			Ok(false) => {
				debug!("Keeping {}: destination copy differs", src.display());
				continue;
			}
			Err(e) => {
				debug!("Keeping {}: cannot compare with destination: {}", src.display(), e);
				continue;
			}
		}

		let size = fs.file_size(&src).map_err(|e| ReconcileError::stat(&src, e))?;
		log.info(&format!("File marked for deletion: {}, {}", src.display(), format_size(size)));
		selection.total_bytes += size;
		selection.files.push(src);
	}

	Ok(selection)
}


// vim: ts=4
