//! Copy planning: which source files are absent at the destination

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{ReconcileError, Result};
use crate::fs::FileSystem;
use crate::strategies::SymlinkMode;
use crate::tree::{list_all_files, RelativePath};

/// Files to copy, in copy order, and their combined source size
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CopyPlan {
	pub missing: Vec<RelativePath>,
	pub total_bytes: u64,
}

impl CopyPlan {
	pub fn is_empty(&self) -> bool {
		self.missing.is_empty()
	}
}

/// Relative paths under `source_root` that do not exist under `dest_root`
///
/// Presence is decided by relative path alone: a destination file with the
/// same path but different content is not reported. The result is sorted by
/// normalized path (plain string order), which fixes the copy order.
pub fn plan_copy(
	fs: &dyn FileSystem,
	source_root: &Path,
	dest_root: &Path,
	symlinks: SymlinkMode,
) -> Result<CopyPlan> {
	let source = list_all_files(fs, source_root, symlinks)?;
	let dest = dest_files(fs, dest_root, symlinks)?;

	// BTreeSet difference iterates in sorted order already
	let missing: Vec<RelativePath> = source.difference(&dest).cloned().collect();

	let mut total_bytes = 0u64;
	for rel in &missing {
		let path = rel.to_path(source_root);
		total_bytes += fs.file_size(&path).map_err(|e| ReconcileError::stat(&path, e))?;
	}

	Ok(CopyPlan { missing, total_bytes })
}

/// Destination listing; a destination that does not exist yet is empty
pub(crate) fn dest_files(
	fs: &dyn FileSystem,
	dest_root: &Path,
	symlinks: SymlinkMode,
) -> Result<BTreeSet<RelativePath>> {
	if !fs.is_dir(dest_root) && !fs.is_file(dest_root) {
		return Ok(BTreeSet::new());
	}
	list_all_files(fs, dest_root, symlinks)
}


// vim: ts=4
