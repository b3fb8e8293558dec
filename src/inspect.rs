//! Directory size report
//!
//! Used by operators to check what is left in a slide after pruning: large
//! files are listed one by one, small ones are summed up, and a `raw`
//! directory without tiles is flagged.

use std::fmt::Write as _;
use std::path::Path;

use crate::error::{ReconcileError, Result};
use crate::fs::{EntryKind, FileSystem};
use crate::pattern::RAW_DIR;
use crate::util::{format_size, natural_key};

/// Default size at or above which a file is listed individually
pub const DEFAULT_THRESHOLD: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEntry {
	Dir(DirReport),
	File { name: String, size: u64 },
}

/// Size summary of one directory and everything below it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirReport {
	pub name: String,
	/// Subdirectories and listed files, in natural order
	pub entries: Vec<ReportEntry>,
	pub small_files: usize,
	pub small_bytes: u64,
	/// Set for an empty directory named `raw`
	pub no_tiles: bool,
	/// Bytes of every file below this directory
	pub total_bytes: u64,
	pub total_files: usize,
	pub total_dirs: usize,
}

impl DirReport {
	/// Indented text report, two spaces per level
	pub fn render(&self) -> String {
		let mut out = String::new();
		self.render_into(&mut out, 0);
		out
	}

	fn render_into(&self, out: &mut String, level: usize) {
		let indent = "  ".repeat(level);
		let _ = writeln!(out, "{}{}:", indent, self.name);
		if self.no_tiles {
			let _ = writeln!(out, "{}  No tiles present.", indent);
			return;
		}

		for entry in &self.entries {
			match entry {
				ReportEntry::Dir(sub) => sub.render_into(out, level + 1),
				ReportEntry::File { name, size } => {
					let _ = writeln!(out, "{} {} {}", indent, format_size(*size), name);
				}
			}
		}
		if self.small_files > 0 {
			let _ = writeln!(
				out,
				"{}  {} small files (total: {})",
				indent,
				self.small_files,
				format_size(self.small_bytes)
			);
		}
		let _ = writeln!(out);
		let _ = writeln!(out, "{}Total size: {}", indent, format_size(self.total_bytes));
		let _ = writeln!(out);
		let _ = writeln!(out);
	}
}

/// Scan `dir` recursively without following symlinks
pub fn scan_directory(fs: &dyn FileSystem, dir: &Path, threshold: u64) -> Result<DirReport> {
	let name = dir
		.file_name()
		.map(|n| n.to_string_lossy().into_owned())
		.unwrap_or_else(|| dir.display().to_string());

	let mut entries = fs.list_entries(dir).map_err(|e| ReconcileError::listing(dir, e))?;
	let mut report = DirReport { name, ..DirReport::default() };

	if report.name == RAW_DIR && entries.is_empty() {
		report.no_tiles = true;
		return Ok(report);
	}

	entries.sort_by_cached_key(|e| natural_key(&e.name));
	for entry in entries {
		match entry.kind {
			EntryKind::Dir => {
				let sub = scan_directory(fs, &entry.path, threshold)?;
				report.total_bytes += sub.total_bytes;
				report.total_files += sub.total_files;
				report.total_dirs += 1 + sub.total_dirs;
				report.entries.push(ReportEntry::Dir(sub));
			}
			EntryKind::File => {
				let size =
					fs.file_size(&entry.path).map_err(|e| ReconcileError::stat(&entry.path, e))?;
				report.total_bytes += size;
				report.total_files += 1;
				if size >= threshold {
					report.entries.push(ReportEntry::File { name: entry.name, size });
				} else {
					report.small_files += 1;
					report.small_bytes += size;
				}
			}
			EntryKind::Symlink | EntryKind::Other => {}
		}
	}

	Ok(report)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fs::LocalFs;
	use std::fs;
	use tempfile::TempDir;

	fn write_sized(path: &Path, size: usize) {
		fs::create_dir_all(path.parent().unwrap()).unwrap();
		fs::write(path, vec![0u8; size]).unwrap();
	}

	#[test]
	fn test_large_and_small_files() {
		let dir = TempDir::new().unwrap();
		let slide = dir.path().join("BLCA-1");
		write_sized(&slide.join("big.tif"), 2048);
		write_sized(&slide.join("a.txt"), 10);
		write_sized(&slide.join("b.txt"), 20);

		let report = scan_directory(&LocalFs::new(), &slide, 1024).unwrap();
		assert_eq!(report.name, "BLCA-1");
		assert_eq!(report.entries, vec![ReportEntry::File { name: "big.tif".into(), size: 2048 }]);
		assert_eq!(report.small_files, 2);
		assert_eq!(report.small_bytes, 30);
		assert_eq!(report.total_bytes, 2078);
		assert_eq!(report.total_files, 3);
	}

	#[test]
	fn test_natural_order_and_nesting() {
		let dir = TempDir::new().unwrap();
		let unit = dir.path().join("CD02011");
		write_sized(&unit.join("10.0.4/s.tif"), 1);
		write_sized(&unit.join("2.0.4/s.tif"), 1);
		write_sized(&unit.join("2.0.4/raw/t.tif"), 1);

		let report = scan_directory(&LocalFs::new(), &unit, 1024).unwrap();
		let names: Vec<&str> = report
			.entries
			.iter()
			.map(|e| match e {
				ReportEntry::Dir(d) => d.name.as_str(),
				ReportEntry::File { name, .. } => name.as_str(),
			})
			.collect();
		assert_eq!(names, vec!["2.0.4", "10.0.4"]);
		assert_eq!(report.total_dirs, 3);
		assert_eq!(report.total_files, 3);
	}

	#[test]
	fn test_empty_raw_flagged() {
		let dir = TempDir::new().unwrap();
		let folder = dir.path().join("3.0.4");
		fs::create_dir_all(folder.join("raw")).unwrap();
		write_sized(&folder.join("stitched.tif"), 4);

		let report = scan_directory(&LocalFs::new(), &folder, 1024).unwrap();
		let text = report.render();
		assert!(text.starts_with("3.0.4:\n"));
		assert!(text.contains("  raw:\n    No tiles present.\n"));
		assert!(text.contains("  1 small files (total: 4.00 bytes)"));
		assert!(text.contains("Total size: 4.00 bytes"));
	}

	#[test]
	fn test_render_lists_large_file() {
		let dir = TempDir::new().unwrap();
		let folder = dir.path().join("slide");
		write_sized(&folder.join("region.tif"), 2048);

		let text = scan_directory(&LocalFs::new(), &folder, 1024).unwrap().render();
		assert!(text.contains(" 2.00 KB region.tif\n"));
	}

	#[test]
	fn test_missing_directory_is_listing_error() {
		let dir = TempDir::new().unwrap();
		let result = scan_directory(&LocalFs::new(), &dir.path().join("nope"), DEFAULT_THRESHOLD);
		assert!(matches!(result, Err(ReconcileError::Listing { .. })));
	}
}

// vim: ts=4
