//! Round folder naming convention
//!
//! Each imaging round writes its output into a folder named
//! `round.stage.artifact[.repeat]`, e.g. `2.0.1` for the first autofocus
//! stitch of round 2 and `2.0.1.002` for its third attempt.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator between the fields of a round folder name
pub const FIELD_SEPARATOR: char = '.';

/// Minimum width of an explicit repeat index (`001`)
pub const REPEAT_WIDTH: usize = 3;

/// Name prefixes of the baseline rounds, which are never re-attempted
pub const BASELINE_PREFIXES: [&str; 2] = ["0.", "1."];

/// True when a folder name belongs to a baseline round
pub fn is_baseline(name: &str) -> bool {
	BASELINE_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Error raised for folder names that do not follow the convention
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FolderNameError {
	#[error("Folder name '{name}' has {found} fields, expected 3 or 4")]
	FieldCount { name: String, found: usize },

	#[error("Folder name '{name}': {field} field '{value}' is not a number")]
	NotNumeric { name: String, field: &'static str, value: String },

	#[error("Folder name '{name}': repeat index '{value}' must be at least {} digits", REPEAT_WIDTH)]
	RepeatWidth { name: String, value: String },
}

/// Kind of artifact a round folder holds, from the third name field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum ArtifactType {
	/// Stitched autofocus-channel images (code 1)
	Autofocus,
	/// Stitched signal-channel images (code 4)
	Signal,
	Other(u32),
}

impl ArtifactType {
	pub const AUTOFOCUS_CODE: u32 = 1;
	pub const SIGNAL_CODE: u32 = 4;

	pub fn from_code(code: u32) -> Self {
		match code {
			Self::AUTOFOCUS_CODE => ArtifactType::Autofocus,
			Self::SIGNAL_CODE => ArtifactType::Signal,
			other => ArtifactType::Other(other),
		}
	}

	pub fn code(self) -> u32 {
		match self {
			ArtifactType::Autofocus => Self::AUTOFOCUS_CODE,
			ArtifactType::Signal => Self::SIGNAL_CODE,
			ArtifactType::Other(code) => code,
		}
	}
}

impl From<u32> for ArtifactType {
	fn from(code: u32) -> Self {
		ArtifactType::from_code(code)
	}
}

impl From<ArtifactType> for u32 {
	fn from(artifact: ArtifactType) -> Self {
		artifact.code()
	}
}

/// Explicit attempt number carried by a repeated round folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepeatIndex(pub u32);

impl fmt::Display for RepeatIndex {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:0width$}", self.0, width = REPEAT_WIDTH)
	}
}

/// Typed view of a round folder name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FolderNameDescriptor {
	pub round: u32,
	pub stage: u32,
	pub artifact: ArtifactType,
	pub repeat: Option<RepeatIndex>,
}

impl FolderNameDescriptor {
	/// Parse a folder name such as `3.0.4` or `3.0.1.002`
	pub fn parse(name: &str) -> Result<Self, FolderNameError> {
		let fields: Vec<&str> = name.split(FIELD_SEPARATOR).collect();
		if fields.len() != 3 && fields.len() != 4 {
			return Err(FolderNameError::FieldCount { name: name.to_string(), found: fields.len() });
		}

		let round = parse_field(name, "round", fields[0])?;
		let stage = parse_field(name, "stage", fields[1])?;
		let artifact = ArtifactType::from_code(parse_field(name, "artifact", fields[2])?);

		let repeat = match fields.get(3) {
			Some(value) => {
				let index = parse_field(name, "repeat", value)?;
				if value.len() < REPEAT_WIDTH {
					return Err(FolderNameError::RepeatWidth {
						name: name.to_string(),
						value: value.to_string(),
					});
				}
				Some(RepeatIndex(index))
			}
			None => None,
		};

		Ok(FolderNameDescriptor { round, stage, artifact, repeat })
	}

	pub fn is_autofocus(&self) -> bool {
		self.artifact == ArtifactType::Autofocus
	}
}

impl FromStr for FolderNameDescriptor {
	type Err = FolderNameError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		FolderNameDescriptor::parse(s)
	}
}

impl fmt::Display for FolderNameDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}.{}", self.round, self.stage, self.artifact.code())?;
		if let Some(repeat) = self.repeat {
			write!(f, ".{}", repeat)?;
		}
		Ok(())
	}
}

fn parse_field(name: &str, field: &'static str, value: &str) -> Result<u32, FolderNameError> {
	let not_numeric = || FolderNameError::NotNumeric {
		name: name.to_string(),
		field,
		value: value.to_string(),
	};

	// u32::from_str accepts a leading '+'
	if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
		return Err(not_numeric());
	}
	value.parse().map_err(|_| not_numeric())
}


// vim: ts=4
