/// Property tests for copy planning over random tree pairs
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use slidesync::copy::copy_files;
use slidesync::fs::{FileSystem, LocalFs};
use slidesync::logging::RecordingLogger;
use slidesync::plan::plan_copy;
use slidesync::strategies::{SymlinkMode, VerifyMode};

/// Directory names are single letters and file names end in `.f`, so no
/// generated path is both a file and a directory
fn tree_strategy() -> impl Strategy<Value = BTreeMap<String, (bool, usize)>> {
	prop::collection::btree_map("([a-c]/){0,2}[a-d]\\.f", (any::<bool>(), 0usize..64), 0..16)
}

fn write(root: &Path, rel: &str, size: usize) {
	let path = root.join(rel);
	fs::create_dir_all(path.parent().unwrap()).unwrap();
	fs::write(path, vec![b'x'; size]).unwrap();
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(32))]

	#[test]
	fn test_plan_is_sorted_set_difference(tree in tree_strategy()) {
		let src = TempDir::new().unwrap();
		let dst = TempDir::new().unwrap();
		for (rel, (in_dest, size)) in &tree {
			write(src.path(), rel, *size);
			if *in_dest {
				// Different content at the destination still counts as present
				write(dst.path(), rel, size + 1);
			}
		}

		let plan = plan_copy(&LocalFs::new(), src.path(), dst.path(), SymlinkMode::Ignore).unwrap();

		let expected: Vec<&str> = tree
			.iter()
			.filter(|(_, (in_dest, _))| !in_dest)
			.map(|(rel, _)| rel.as_str())
			.collect();
		let missing: Vec<&str> = plan.missing.iter().map(|p| p.as_str()).collect();
		prop_assert_eq!(&missing, &expected);

		let expected_bytes: u64 = tree
			.values()
			.filter(|(in_dest, _)| !in_dest)
			.map(|(_, size)| *size as u64)
			.sum();
		prop_assert_eq!(plan.total_bytes, expected_bytes);
	}

	#[test]
	fn test_copy_then_replan_is_empty(tree in tree_strategy()) {
		let src = TempDir::new().unwrap();
		let dst = TempDir::new().unwrap();
		for (rel, (in_dest, size)) in &tree {
			write(src.path(), rel, *size);
			if *in_dest {
				write(dst.path(), rel, *size);
			}
		}

		let fs_ = LocalFs::new();
		let log = RecordingLogger::new();
		let plan = plan_copy(&fs_, src.path(), dst.path(), SymlinkMode::Ignore).unwrap();
		let outcome =
			copy_files(&fs_, &log, src.path(), dst.path(), &plan.missing, VerifyMode::Shallow)
				.unwrap();
		prop_assert!(outcome.is_complete());

		for rel in &plan.missing {
			prop_assert!(fs_
				.shallow_equal(&rel.to_path(src.path()), &rel.to_path(dst.path()))
				.unwrap());
		}

		let replan = plan_copy(&fs_, src.path(), dst.path(), SymlinkMode::Ignore).unwrap();
		prop_assert!(replan.is_empty());
		prop_assert_eq!(replan.total_bytes, 0);
	}
}

// vim: ts=4
