//! Filesystem capability consumed by the reconciliation engine
//!
//! All engine components reach the disk only through [`FileSystem`], so tests
//! can wrap [`LocalFs`] to inject failures and alternative backends can be
//! slotted in without touching the planning or deletion logic.

use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime};

use filetime::FileTime;

/// Read buffer size for content hashing
const HASH_BUFFER_SIZE: usize = 1 << 20;

/// Kind of a directory entry, as reported without following symlinks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
	File,
	Dir,
	Symlink,
	/// Sockets, FIFOs, device nodes
	Other,
}

/// One entry returned by [`FileSystem::list_entries`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
	pub path: PathBuf,
	pub name: String,
	pub kind: EntryKind,
}

/// Filesystem operations the engine depends on
pub trait FileSystem: Send + Sync {
	/// List the direct children of `dir`
	fn list_entries(&self, dir: &Path) -> io::Result<Vec<DirEntry>>;

	/// True if `path` is a directory (follows symlinks)
	fn is_dir(&self, path: &Path) -> bool;

	/// True if `path` is a regular file (follows symlinks)
	fn is_file(&self, path: &Path) -> bool;

	/// Size of the file at `path` in bytes
	fn file_size(&self, path: &Path) -> io::Result<u64>;

	/// Copy file content, and timestamps when `preserve_metadata` is set
	fn copy_file(&self, src: &Path, dst: &Path, preserve_metadata: bool) -> io::Result<()>;

	/// Shallow comparison: same size and same modification time
	fn shallow_equal(&self, a: &Path, b: &Path) -> io::Result<bool>;

	/// Full comparison: same size and same BLAKE3 digest
	fn content_equal(&self, a: &Path, b: &Path) -> io::Result<bool>;

	/// Create `path` and all missing parents; succeeds if it already exists
	fn make_dirs(&self, path: &Path) -> io::Result<()>;

	/// Remove a single file
	fn remove_file(&self, path: &Path) -> io::Result<()>;

	/// Resolve `path` to an absolute path with symlinks resolved
	fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

	/// Longest shared leading path of `a` and `b`, compared component-wise
	///
	/// Returns `None` when the paths share nothing, or when one is absolute
	/// and the other relative.
	fn common_path(&self, a: &Path, b: &Path) -> Option<PathBuf> {
		common_path(a, b)
	}
}

/// Component-wise common prefix of two paths
pub fn common_path(a: &Path, b: &Path) -> Option<PathBuf> {
	if a.is_absolute() != b.is_absolute() {
		return None;
	}

	let shared: PathBuf = a
		.components()
		.filter(|c| !matches!(c, Component::CurDir))
		.zip(b.components().filter(|c| !matches!(c, Component::CurDir)))
		.take_while(|(x, y)| x == y)
		.map(|(x, _)| x)
		.collect();

	if shared.as_os_str().is_empty() {
		None
	} else {
		Some(shared)
	}
}

/// The local disk
#[derive(Debug, Clone, Default)]
pub struct LocalFs {
	/// Allowed modification-time difference for shallow comparison
	mtime_tolerance: Duration,
}

impl LocalFs {
	pub fn new() -> Self {
		Self::default()
	}

	/// Accept modification times that differ by at most `tolerance`
	///
	/// Needed for destinations with coarse timestamps (FAT, some SMB shares).
	pub fn with_mtime_tolerance(tolerance: Duration) -> Self {
		LocalFs { mtime_tolerance: tolerance }
	}

	fn mtimes_match(&self, a: SystemTime, b: SystemTime) -> bool {
		let diff = match a.duration_since(b) {
			Ok(d) => d,
			Err(e) => e.duration(),
		};
		diff <= self.mtime_tolerance
	}
}

impl FileSystem for LocalFs {
	fn list_entries(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
		let mut entries = Vec::new();
		for entry in fs::read_dir(dir)? {
			let entry = entry?;
			let file_type = entry.file_type()?;
			let kind = if file_type.is_symlink() {
				EntryKind::Symlink
			} else if file_type.is_dir() {
				EntryKind::Dir
			} else if file_type.is_file() {
				EntryKind::File
			} else {
				EntryKind::Other
			};

			entries.push(DirEntry {
				path: entry.path(),
				name: entry.file_name().to_string_lossy().into_owned(),
				kind,
			});
		}
		Ok(entries)
	}

	fn is_dir(&self, path: &Path) -> bool {
		path.is_dir()
	}

	fn is_file(&self, path: &Path) -> bool {
		path.is_file()
	}

	fn file_size(&self, path: &Path) -> io::Result<u64> {
		Ok(fs::metadata(path)?.len())
	}

	fn copy_file(&self, src: &Path, dst: &Path, preserve_metadata: bool) -> io::Result<()> {
		// fs::copy carries permission bits over already
		fs::copy(src, dst)?;
		if preserve_metadata {
			let meta = fs::metadata(src)?;
			let atime = FileTime::from_last_access_time(&meta);
			let mtime = FileTime::from_last_modification_time(&meta);
			filetime::set_file_times(dst, atime, mtime)?;
		}
		Ok(())
	}

	fn shallow_equal(&self, a: &Path, b: &Path) -> io::Result<bool> {
		let meta_a = fs::metadata(a)?;
		let meta_b = fs::metadata(b)?;
		if !meta_a.is_file() || !meta_b.is_file() || meta_a.len() != meta_b.len() {
			return Ok(false);
		}
		Ok(self.mtimes_match(meta_a.modified()?, meta_b.modified()?))
	}

	fn content_equal(&self, a: &Path, b: &Path) -> io::Result<bool> {
		if fs::metadata(a)?.len() != fs::metadata(b)?.len() {
			return Ok(false);
		}
		Ok(hash_file(a)? == hash_file(b)?)
	}

	fn make_dirs(&self, path: &Path) -> io::Result<()> {
		fs::create_dir_all(path)
	}

	fn remove_file(&self, path: &Path) -> io::Result<()> {
		fs::remove_file(path)
	}

	fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
		fs::canonicalize(path)
	}
}

/// BLAKE3 digest of a file's content
pub fn hash_file(path: &Path) -> io::Result<blake3::Hash> {
	let mut file = fs::File::open(path)?;
	let mut hasher = blake3::Hasher::new();
	let mut buf = vec![0u8; HASH_BUFFER_SIZE];
	loop {
		let n = file.read(&mut buf)?;
		if n == 0 {
			break;
		}
		hasher.update(&buf[..n]);
	}
	Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn test_common_path_shared_prefix() {
		assert_eq!(
			common_path(Path::new("/data/s1/CD02011/2.0.1/a.tif"), Path::new("/data/s1/CD02011/2.0.1")),
			Some(PathBuf::from("/data/s1/CD02011/2.0.1"))
		);
		assert_eq!(
			common_path(Path::new("/data/s1/CD02011/2.0.10/a.tif"), Path::new("/data/s1/CD02011/2.0.1")),
			Some(PathBuf::from("/data/s1/CD02011"))
		);
	}

	#[test]
	fn test_common_path_mixed_kinds() {
		assert_eq!(common_path(Path::new("/data"), Path::new("data")), None);
		assert_eq!(common_path(Path::new("a/b"), Path::new("c/d")), None);
		assert_eq!(common_path(Path::new("./a/b"), Path::new("a/c")), Some(PathBuf::from("a")));
	}

	#[test]
	fn test_list_entries_kinds() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("file.txt"), b"x").unwrap();
		fs::create_dir(dir.path().join("sub")).unwrap();

		let mut entries = LocalFs::new().list_entries(dir.path()).unwrap();
		entries.sort_by(|a, b| a.name.cmp(&b.name));

		assert_eq!(entries.len(), 2);
		assert_eq!(entries[0].name, "file.txt");
		assert_eq!(entries[0].kind, EntryKind::File);
		assert_eq!(entries[1].name, "sub");
		assert_eq!(entries[1].kind, EntryKind::Dir);
	}

	#[test]
	fn test_list_entries_missing_dir_fails() {
		let dir = TempDir::new().unwrap();
		assert!(LocalFs::new().list_entries(&dir.path().join("absent")).is_err());
	}

	#[test]
	fn test_copy_preserves_mtime_and_compares_equal() {
		let dir = TempDir::new().unwrap();
		let src = dir.path().join("src.bin");
		let dst = dir.path().join("dst.bin");
		fs::write(&src, b"tile data").unwrap();
		filetime::set_file_mtime(&src, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();

		let lfs = LocalFs::new();
		lfs.copy_file(&src, &dst, true).unwrap();

		assert!(lfs.shallow_equal(&src, &dst).unwrap());
		assert!(lfs.content_equal(&src, &dst).unwrap());
	}

	#[test]
	fn test_shallow_equal_detects_mtime_difference() {
		let dir = TempDir::new().unwrap();
		let a = dir.path().join("a");
		let b = dir.path().join("b");
		fs::write(&a, b"same").unwrap();
		fs::write(&b, b"same").unwrap();
		filetime::set_file_mtime(&a, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();
		filetime::set_file_mtime(&b, FileTime::from_unix_time(1_600_000_005, 0)).unwrap();

		assert!(!LocalFs::new().shallow_equal(&a, &b).unwrap());
		assert!(LocalFs::with_mtime_tolerance(Duration::from_secs(5)).shallow_equal(&a, &b).unwrap());
		assert!(LocalFs::new().content_equal(&a, &b).unwrap());
	}

	#[test]
	fn test_content_equal_detects_same_size_difference() {
		let dir = TempDir::new().unwrap();
		let a = dir.path().join("a");
		let b = dir.path().join("b");
		fs::write(&a, b"aaaa").unwrap();
		fs::write(&b, b"bbbb").unwrap();

		assert!(!LocalFs::new().content_equal(&a, &b).unwrap());
	}
}

// vim: ts=4
