//! Relative file sets of directory trees
//!
//! Paths are normalized to `/`-joined component strings so that listings of
//! two different roots (or platforms) compare by identity.

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{ReconcileError, Result};
use crate::fs::{EntryKind, FileSystem};
use crate::logging::*;
use crate::strategies::SymlinkMode;

/// Separator used in normalized relative paths
pub const SEPARATOR: char = '/';

/// A file path relative to a tree root, in normalized form
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RelativePath(String);

impl RelativePath {
	/// Normalize a relative path
	///
	/// `.` components are dropped. Returns `None` for absolute paths, paths
	/// that climb with `..`, paths with no components, and paths that are not
	/// valid UTF-8.
	pub fn new(path: &Path) -> Option<Self> {
		let mut segments = Vec::new();
		for component in path.components() {
			match component {
				Component::Normal(s) => segments.push(s.to_str()?),
				Component::CurDir => {}
				Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
			}
		}
		if segments.is_empty() {
			return None;
		}
		Some(RelativePath(segments.join(&SEPARATOR.to_string())))
	}

	/// Relative path of `path` under `root`
	pub fn from_root(root: &Path, path: &Path) -> Option<Self> {
		path.strip_prefix(root).ok().and_then(RelativePath::new)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn segments(&self) -> impl Iterator<Item = &str> {
		self.0.split(SEPARATOR)
	}

	/// Final segment
	pub fn file_name(&self) -> &str {
		self.0.rsplit(SEPARATOR).next().unwrap_or(&self.0)
	}

	/// Absolute location of this path under `root`
	pub fn to_path(&self, root: &Path) -> PathBuf {
		let mut path = root.to_path_buf();
		path.extend(self.segments());
		path
	}
}

impl fmt::Display for RelativePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Every regular file under `root`, as relative paths
///
/// An unreadable directory anywhere in the tree fails the whole listing;
/// callers diff these sets and a partial set would look like missing data.
/// A file name that is not valid UTF-8 fails the listing the same way.
pub fn list_all_files(
	fs: &dyn FileSystem,
	root: &Path,
	symlinks: SymlinkMode,
) -> Result<BTreeSet<RelativePath>> {
	let mut walker = Walker { fs, root, symlinks, files: BTreeSet::new(), visited: HashSet::new() };
	if symlinks == SymlinkMode::Follow {
		let canonical = fs.canonicalize(root).map_err(|e| ReconcileError::listing(root, e))?;
		walker.visited.insert(canonical);
	}
	walker.walk(root)?;
	debug!("Listed {} files under {}", walker.files.len(), root.display());
	Ok(walker.files)
}

struct Walker<'a> {
	fs: &'a dyn FileSystem,
	root: &'a Path,
	symlinks: SymlinkMode,
	files: BTreeSet<RelativePath>,
	/// Canonical directories already entered; only tracked when following links
	visited: HashSet<PathBuf>,
}

impl<'a> Walker<'a> {
	fn walk(&mut self, dir: &Path) -> Result<()> {
		let entries = self.fs.list_entries(dir).map_err(|e| ReconcileError::listing(dir, e))?;

		for entry in entries {
			match entry.kind {
				EntryKind::File => self.record(&entry.path)?,
				EntryKind::Dir => self.walk(&entry.path)?,
				EntryKind::Symlink => match self.symlinks {
					SymlinkMode::Ignore => {
						debug!("Skipping symlink {}", entry.path.display());
					}
					SymlinkMode::Files => {
						if self.fs.is_file(&entry.path) {
							self.record(&entry.path)?;
						} else {
							debug!("Skipping symlink {} (not a file)", entry.path.display());
						}
					}
					SymlinkMode::Follow => self.follow(&entry.path)?,
				},
				EntryKind::Other => {
					debug!("Skipping special file {}", entry.path.display());
				}
			}
		}
		Ok(())
	}

	fn follow(&mut self, link: &Path) -> Result<()> {
		if self.fs.is_dir(link) {
			let target = self.fs.canonicalize(link).map_err(|e| ReconcileError::listing(link, e))?;
			if self.visited.insert(target) {
				self.walk(link)?;
			} else {
				debug!("Not re-entering {} (already walked)", link.display());
			}
		} else if self.fs.is_file(link) {
			self.record(link)?;
		} else {
			debug!("Skipping dangling symlink {}", link.display());
		}
		Ok(())
	}

	fn record(&mut self, path: &Path) -> Result<()> {
		let rel = RelativePath::from_root(self.root, path).ok_or_else(|| {
			ReconcileError::listing(
				path,
				io::Error::new(io::ErrorKind::InvalidData, "file name is not valid UTF-8"),
			)
		})?;
		self.files.insert(rel);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fs::LocalFs;
	use std::fs;
	use tempfile::TempDir;

	fn touch(root: &Path, rel: &str) {
		let path = root.join(rel);
		fs::create_dir_all(path.parent().unwrap()).unwrap();
		fs::write(path, b"x").unwrap();
	}

	fn names(set: &BTreeSet<RelativePath>) -> Vec<&str> {
		set.iter().map(|p| p.as_str()).collect()
	}

	#[test]
	fn test_relative_path_normalization() {
		let p = RelativePath::new(Path::new("./CD02011/2.0.1/raw/tile_001.tif")).unwrap();
		assert_eq!(p.as_str(), "CD02011/2.0.1/raw/tile_001.tif");
		assert_eq!(p.file_name(), "tile_001.tif");
		assert_eq!(p.segments().count(), 4);
		assert!(RelativePath::new(Path::new("../escape")).is_none());
		assert!(RelativePath::new(Path::new("/abs")).is_none());
		assert!(RelativePath::new(Path::new(".")).is_none());
	}

	#[test]
	fn test_relative_path_to_path() {
		let p = RelativePath::new(Path::new("a/b/c.txt")).unwrap();
		assert_eq!(p.to_path(Path::new("/root")), PathBuf::from("/root/a/b/c.txt"));
	}

	#[test]
	fn test_list_all_files_recurses() {
		let dir = TempDir::new().unwrap();
		touch(dir.path(), "a/1.txt");
		touch(dir.path(), "a/b/2.txt");
		touch(dir.path(), ".hidden");
		fs::create_dir_all(dir.path().join("empty/dir")).unwrap();

		let files = list_all_files(&LocalFs::new(), dir.path(), SymlinkMode::Ignore).unwrap();
		assert_eq!(names(&files), vec![".hidden", "a/1.txt", "a/b/2.txt"]);
	}

	#[test]
	fn test_list_all_files_missing_root_is_listing_error() {
		let dir = TempDir::new().unwrap();
		let err = list_all_files(&LocalFs::new(), &dir.path().join("nope"), SymlinkMode::Ignore)
			.unwrap_err();
		assert!(matches!(err, ReconcileError::Listing { .. }));
	}

	#[cfg(unix)]
	fn linked_tree() -> TempDir {
		let dir = TempDir::new().unwrap();
		touch(dir.path(), "real/file.txt");
		std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();
		std::os::unix::fs::symlink(dir.path().join("real/file.txt"), dir.path().join("flink"))
			.unwrap();
		std::os::unix::fs::symlink(dir.path().join("gone.txt"), dir.path().join("dangling")).unwrap();
		dir
	}

	#[cfg(unix)]
	#[test]
	fn test_default_lists_file_links_without_descending() {
		let dir = linked_tree();
		let files = list_all_files(&LocalFs::new(), dir.path(), SymlinkMode::default()).unwrap();
		assert_eq!(names(&files), vec!["flink", "real/file.txt"]);
	}

	#[cfg(unix)]
	#[test]
	fn test_symlinks_ignored() {
		let dir = linked_tree();
		let files = list_all_files(&LocalFs::new(), dir.path(), SymlinkMode::Ignore).unwrap();
		assert_eq!(names(&files), vec!["real/file.txt"]);
	}

	#[cfg(unix)]
	#[test]
	fn test_non_utf8_name_fails_listing() {
		use std::ffi::OsStr;
		use std::os::unix::ffi::OsStrExt;

		let dir = TempDir::new().unwrap();
		touch(dir.path(), "tiles/ok.tif");
		let tiles = dir.path().join("tiles");
		fs::write(tiles.join(OsStr::from_bytes(b"tile_\xff.tif")), b"a").unwrap();
		fs::write(tiles.join(OsStr::from_bytes(b"tile_\xfe.tif")), b"b").unwrap();

		assert!(RelativePath::new(Path::new(OsStr::from_bytes(b"tiles/tile_\xff.tif"))).is_none());
		match list_all_files(&LocalFs::new(), dir.path(), SymlinkMode::default()) {
			Err(ReconcileError::Listing { path, source }) => {
				assert!(path.starts_with(&tiles));
				assert_eq!(source.kind(), io::ErrorKind::InvalidData);
			}
			other => panic!("expected listing error, got {:?}", other),
		}
	}

	#[cfg(unix)]
	#[test]
	fn test_symlinks_followed_without_cycles() {
		let dir = TempDir::new().unwrap();
		touch(dir.path(), "real/file.txt");
		std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();
		// Cycle back to the root
		std::os::unix::fs::symlink(dir.path(), dir.path().join("real/loop")).unwrap();

		let files = list_all_files(&LocalFs::new(), dir.path(), SymlinkMode::Follow).unwrap();
		assert!(files.contains(&RelativePath::new(Path::new("real/file.txt")).unwrap()));
		assert!(files.contains(&RelativePath::new(Path::new("link/file.txt")).unwrap()));
		assert_eq!(files.len(), 2);
	}
}

// vim: ts=4
