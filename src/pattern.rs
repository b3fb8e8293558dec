//! Structural path patterns selecting deletable intermediate artifacts
//!
//! A pattern looks for the unit directory (e.g. `CD02011`) among a relative
//! path's segments, checks the round folder directly below it, and then
//! checks where inside that folder the file sits.
//!
//! ```text
//! CD02011 / 3.0.4.001 / raw / tile_0001.tif
//!  unit     folder    content
//! ```

use serde::{Deserialize, Serialize};

use crate::folder_name::{is_baseline, ArtifactType, FolderNameDescriptor};
use crate::tree::RelativePath;

/// Name of the per-folder subdirectory holding unstitched tiles
pub const RAW_DIR: &str = "raw";

/// Which round folders a pattern accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FolderRule {
	/// Any folder outside the baseline rounds; the name need not parse
	NonBaseline,

	/// Folders of round 1 or later with this stage and artifact code
	Artifact { stage: u32, artifact: ArtifactType },
}

impl FolderRule {
	pub fn matches(&self, name: &str) -> bool {
		match self {
			FolderRule::NonBaseline => !is_baseline(name),
			FolderRule::Artifact { stage, artifact } => match FolderNameDescriptor::parse(name) {
				Ok(d) => d.round >= 1 && d.stage == *stage && d.artifact == *artifact,
				Err(_) => false,
			},
		}
	}
}

/// Which files inside a matched folder a pattern accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentRule {
	/// Files anywhere under the folder's `raw/` directory
	Raw,

	/// Files in the folder that are not under its `raw/` directory
	Stitched,
}

impl ContentRule {
	/// `rest` is the list of segments below the folder, ending with the file name
	fn matches(&self, rest: &[&str]) -> bool {
		// A lone segment is the file itself, so it cannot be the raw directory
		let under_raw = rest.len() > 1 && rest[0] == RAW_DIR;
		match self {
			ContentRule::Raw => under_raw,
			ContentRule::Stitched => !rest.is_empty() && !under_raw,
		}
	}
}

/// Compiled matcher over relative path segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralPattern {
	unit: String,
	folder: FolderRule,
	content: ContentRule,
}

impl StructuralPattern {
	pub fn new(unit: impl Into<String>, folder: FolderRule, content: ContentRule) -> Self {
		StructuralPattern { unit: unit.into(), folder, content }
	}

	/// Unstitched tiles of every non-baseline folder
	pub fn raw_tiles(unit: &str) -> Self {
		Self::new(unit, FolderRule::NonBaseline, ContentRule::Raw)
	}

	/// Stitched images of a given artifact class (stage 0)
	pub fn stitched(unit: &str, artifact: ArtifactType) -> Self {
		Self::new(unit, FolderRule::Artifact { stage: 0, artifact }, ContentRule::Stitched)
	}

	pub fn unit(&self) -> &str {
		&self.unit
	}

	/// True if any occurrence of the unit directory in `path` satisfies the
	/// folder and content rules
	pub fn matches(&self, path: &RelativePath) -> bool {
		let segments: Vec<&str> = path.segments().collect();
		segments.iter().enumerate().any(|(i, segment)| {
			if *segment != self.unit {
				return false;
			}
			match segments.get(i + 1) {
				Some(folder) => {
					self.folder.matches(folder) && self.content.matches(&segments[i + 2..])
				}
				None => false,
			}
		})
	}
}


// vim: ts=4
