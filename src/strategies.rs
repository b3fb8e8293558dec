//! Consolidated strategy and mode enums
//!
//! Each enum includes a FromStr implementation for CLI and config parsing
//! and a Display implementation that round-trips through it.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// VERIFY MODE
// ============================================================================

/// How a copied file is checked against its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VerifyMode {
	/// Size and modification time only (default)
	#[default]
	Shallow,

	/// Size plus BLAKE3 digest of the full content
	Content,
}

impl FromStr for VerifyMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"shallow" | "metadata" => Ok(Self::Shallow),
			"content" | "checksum" | "hash" => Ok(Self::Content),
			_ => Err(format!("Unknown verify mode: {}. Valid options: shallow, content", s)),
		}
	}
}

impl std::fmt::Display for VerifyMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Shallow => write!(f, "shallow"),
			Self::Content => write!(f, "content"),
		}
	}
}

// ============================================================================
// SYMLINK MODE
// ============================================================================

/// Symlink handling during tree walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SymlinkMode {
	/// Neither follow nor list symlinks
	Ignore,

	/// List links to files, do not descend into linked directories (default)
	#[default]
	Files,

	/// List links to files and walk links to directories
	Follow,
}

impl FromStr for SymlinkMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"ignore" | "skip" => Ok(Self::Ignore),
			"files" | "file-links" => Ok(Self::Files),
			"follow" => Ok(Self::Follow),
			_ => Err(format!("Unknown symlink mode: {}. Valid options: ignore, files, follow", s)),
		}
	}
}

impl std::fmt::Display for SymlinkMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Ignore => write!(f, "ignore"),
			Self::Files => write!(f, "files"),
			Self::Follow => write!(f, "follow"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_verify_mode_from_str() {
		assert_eq!(VerifyMode::from_str("shallow").unwrap(), VerifyMode::Shallow);
		assert_eq!(VerifyMode::from_str("Content").unwrap(), VerifyMode::Content);
		assert_eq!(VerifyMode::from_str("checksum").unwrap(), VerifyMode::Content);
		assert!(VerifyMode::from_str("deep").is_err());
	}

	#[test]
	fn test_symlink_mode_from_str() {
		assert_eq!(SymlinkMode::from_str("ignore").unwrap(), SymlinkMode::Ignore);
		assert_eq!(SymlinkMode::from_str("skip").unwrap(), SymlinkMode::Ignore);
		assert_eq!(SymlinkMode::from_str("files").unwrap(), SymlinkMode::Files);
		assert_eq!(SymlinkMode::from_str("follow").unwrap(), SymlinkMode::Follow);
		assert_eq!(SymlinkMode::default(), SymlinkMode::Files);
		assert!(SymlinkMode::from_str("preserve").is_err());
	}

	#[test]
	fn test_display_round_trips() {
		for mode in [VerifyMode::Shallow, VerifyMode::Content] {
			assert_eq!(VerifyMode::from_str(&mode.to_string()).unwrap(), mode);
		}
		for mode in [SymlinkMode::Ignore, SymlinkMode::Files, SymlinkMode::Follow] {
			assert_eq!(SymlinkMode::from_str(&mode.to_string()).unwrap(), mode);
		}
	}
}

// vim: ts=4
