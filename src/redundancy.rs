//! Detection of superseded autofocus repeats
//!
//! When an autofocus round is re-run, the scanner writes a new folder with an
//! incremented repeat suffix (`2.0.1`, `2.0.1.001`, `2.0.1.002`). Only the
//! highest-numbered attempt is authoritative; the others are redundant once
//! archived.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ReconcileError, Result};
use crate::folder_name::{is_baseline, FolderNameDescriptor, RepeatIndex};
use crate::fs::{EntryKind, FileSystem};
use crate::logging::Logger;

/// Autofocus folders of one round
#[derive(Debug, Default)]
struct RoundAttempts {
	folders: Vec<(String, FolderNameDescriptor)>,
}

impl RoundAttempts {
	/// Highest explicit repeat index; `None` when no folder carries one
	fn latest(&self) -> Option<RepeatIndex> {
		self.folders.iter().filter_map(|(_, d)| d.repeat).max()
	}
}

/// Absolute paths of autofocus folders under `source_root/unit_name` that were
/// superseded by a later repeat of the same round
///
/// Baseline rounds (`0.*`, `1.*`) are never considered. A round with a single
/// autofocus folder has nothing redundant. A round whose autofocus folders all
/// lack a repeat index is reported and left alone: there is no evidence of
/// which attempt is the latest.
pub fn find_redundant_repeats(
	fs: &dyn FileSystem,
	log: &dyn Logger,
	source_root: &Path,
	unit_name: &str,
) -> Result<Vec<PathBuf>> {
	let unit_dir = source_root.join(unit_name);
	if !fs.is_dir(&unit_dir) {
		log.info(&format!("No {} directory in {}", unit_name, source_root.display()));
		return Ok(Vec::new());
	}

	let entries = fs.list_entries(&unit_dir).map_err(|e| ReconcileError::listing(&unit_dir, e))?;

	let mut rounds: BTreeMap<u32, RoundAttempts> = BTreeMap::new();
	for entry in entries {
		if entry.kind != EntryKind::Dir || is_baseline(&entry.name) {
			continue;
		}
		let descriptor = FolderNameDescriptor::parse(&entry.name)?;
		if descriptor.is_autofocus() {
			rounds.entry(descriptor.round).or_default().folders.push((entry.name, descriptor));
		}
	}

	let mut redundant = Vec::new();
	for (round, mut attempts) in rounds {
		if attempts.folders.len() < 2 {
			continue;
		}
		attempts.folders.sort_by(|a, b| a.0.cmp(&b.0));

		let latest = match attempts.latest() {
			Some(latest) => latest,
			None => {
				let names: Vec<&str> = attempts.folders.iter().map(|(n, _)| n.as_str()).collect();
				log.error(&format!(
					"Round {} has {} autofocus folders but none has a repeat index ({}); keeping all",
					round,
					names.len(),
					names.join(", ")
				));
				continue;
			}
		};

		for (name, descriptor) in &attempts.folders {
			if descriptor.repeat != Some(latest) {
				redundant.push(unit_dir.join(name));
			}
		}
	}

	Ok(redundant)
}


// vim: ts=4
