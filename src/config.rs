//! Configuration for slidesync runs
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (Config::default())
//! 2. Config file (`--config` or `SLIDESYNC_CONFIG`, TOML)
//! 3. Environment variables (SLIDESYNC_* prefix)
//! 4. CLI flags (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::folder_name::ArtifactType;
use crate::pattern::{ContentRule, FolderRule, StructuralPattern};
use crate::strategies::{SymlinkMode, VerifyMode};

/// Environment variable naming the config file
pub const ENV_CONFIG: &str = "SLIDESYNC_CONFIG";
pub const ENV_SOURCE: &str = "SLIDESYNC_SOURCE";
pub const ENV_DEST: &str = "SLIDESYNC_DEST";
pub const ENV_LOG_DIR: &str = "SLIDESYNC_LOG_DIR";
pub const ENV_WORKERS: &str = "SLIDESYNC_WORKERS";

// ============================================================================
// MAIN CONFIGURATION STRUCT
// ============================================================================

/// Settings of one run over a source tree of slides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	// ========================================================================
	// LOCATIONS
	// ========================================================================
	/// Directory holding one subdirectory per slide (scanner output)
	pub source_root: Option<PathBuf>,

	/// Archive directory mirroring `source_root`
	pub dest_root: Option<PathBuf>,

	/// Where run logs go (defaults to `<destRoot>/logs`)
	pub log_dir: Option<PathBuf>,

	// ========================================================================
	// SLIDE LAYOUT
	// ========================================================================
	/// Name of the imaging-unit directory inside each slide
	pub unit_name: String,

	/// Files whose name ends with this are never deleted
	pub protected_suffix: String,

	/// Glob patterns of slide directory names to skip
	pub exclude_slides: Vec<String>,

	/// Process only these slides (all discovered slides when empty)
	pub slides: Vec<String>,

	// ========================================================================
	// COPY BEHAVIOR
	// ========================================================================
	/// How each copy is verified
	pub verify: VerifyMode,

	/// Symlink handling during tree walks
	pub symlinks: SymlinkMode,

	/// Number of parallel copy workers
	pub copy_workers: usize,

	/// Ignore modification time differences up to this many seconds
	pub mtime_tolerance_secs: u64,

	// ========================================================================
	// DELETION
	// ========================================================================
	/// Log what would be copied and removed without touching any file
	pub dry_run: bool,

	/// Run deletion phases for a slide even if its copy phase aborted
	pub delete_after_failed_copy: bool,

	/// Deletion rules, applied in order after the copy phase
	pub rules: Vec<DeletionRule>,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			// Locations
			source_root: None,
			dest_root: None,
			log_dir: None,

			// Layout
			unit_name: "CD02011".to_string(),
			protected_suffix: "AutoAlignment.zip".to_string(),
			exclude_slides: vec!["*checkpoint*".to_string()],
			slides: vec![],

			// Copy
			verify: VerifyMode::Shallow,
			symlinks: SymlinkMode::Files,
			copy_workers: 1,
			mtime_tolerance_secs: 0,

			// Deletion
			dry_run: false,
			delete_after_failed_copy: false,
			rules: DeletionRule::builtin(),
		}
	}
}

impl Config {
	/// Load a TOML config file on top of the defaults
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path)
			.map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
		Self::from_toml(&text).map_err(|message| ConfigError::Parse { path: path.to_path_buf(), message })
	}

	pub fn from_toml(text: &str) -> Result<Self, String> {
		toml::from_str(text).map_err(|e| e.to_string())
	}

	/// Defaults, then the config file, then environment overrides
	///
	/// `explicit` is the `--config` flag; without it `SLIDESYNC_CONFIG` is
	/// consulted. No file at all is fine.
	pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
		let env = |key: &str| std::env::var(key).ok();
		Self::resolve_with(explicit, env)
	}

	/// [`Config::resolve`] with an injectable environment lookup
	pub fn resolve_with<F>(explicit: Option<&Path>, env: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let file = explicit.map(Path::to_path_buf).or_else(|| env(ENV_CONFIG).map(PathBuf::from));
		let mut config = match file {
			Some(path) => Self::load(&path)?,
			None => Self::default(),
		};
		config.apply_env(env)?;
		Ok(config)
	}

	/// Override settings from `SLIDESYNC_*` variables
	pub fn apply_env<F>(&mut self, env: F) -> Result<(), ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(v) = env(ENV_SOURCE) {
			self.source_root = Some(PathBuf::from(v));
		}
		if let Some(v) = env(ENV_DEST) {
			self.dest_root = Some(PathBuf::from(v));
		}
		if let Some(v) = env(ENV_LOG_DIR) {
			self.log_dir = Some(PathBuf::from(v));
		}
		if let Some(v) = env(ENV_WORKERS) {
			self.copy_workers = v.trim().parse().map_err(|e| ConfigError::InvalidValue {
				key: ENV_WORKERS.to_string(),
				message: format!("{}: {}", v, e),
			})?;
		}
		Ok(())
	}

	pub fn source_root(&self) -> Result<&Path, ConfigError> {
		self.source_root.as_deref().ok_or(ConfigError::Missing("sourceRoot"))
	}

	pub fn dest_root(&self) -> Result<&Path, ConfigError> {
		self.dest_root.as_deref().ok_or(ConfigError::Missing("destRoot"))
	}

	/// Effective log directory
	pub fn log_dir(&self) -> Result<PathBuf, ConfigError> {
		match &self.log_dir {
			Some(dir) => Ok(dir.clone()),
			None => Ok(self.dest_root()?.join("logs")),
		}
	}

	/// Check that the settings describe a runnable job
	pub fn validate(&self) -> Result<(), ConfigError> {
		let source = self.source_root()?;
		let dest = self.dest_root()?;
		if source == dest {
			return Err(ConfigError::Invalid(format!(
				"sourceRoot and destRoot are the same directory: {}",
				source.display()
			)));
		}
		if self.copy_workers == 0 {
			return Err(ConfigError::InvalidValue {
				key: "copyWorkers".to_string(),
				message: "must be at least 1".to_string(),
			});
		}
		if self.unit_name.is_empty() {
			return Err(ConfigError::InvalidValue {
				key: "unitName".to_string(),
				message: "must not be empty".to_string(),
			});
		}
		for pattern in &self.exclude_slides {
			glob::Pattern::new(pattern).map_err(|e| ConfigError::InvalidValue {
				key: "excludeSlides".to_string(),
				message: format!("{}: {}", pattern, e),
			})?;
		}
		for (i, rule) in self.rules.iter().enumerate() {
			if rule.name.trim().is_empty() {
				return Err(ConfigError::InvalidValue {
					key: format!("rules[{}].name", i),
					message: "must not be empty".to_string(),
				});
			}
		}
		Ok(())
	}
}

// ============================================================================
// DELETION RULES
// ============================================================================

/// One class of intermediate files to prune once archived
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionRule {
	/// Human-readable name used in log lines
	pub name: String,

	pub folder: FolderRule,

	pub content: ContentRule,

	/// Only delete inside autofocus folders superseded by a later repeat
	#[serde(default)]
	pub restrict_to_redundant_repeats: bool,
}

impl DeletionRule {
	/// Raw tiles, stitched signal images, stitched redundant AF images
	pub fn builtin() -> Vec<DeletionRule> {
		vec![
			DeletionRule {
				name: "raw tiles".to_string(),
				folder: FolderRule::NonBaseline,
				content: ContentRule::Raw,
				restrict_to_redundant_repeats: false,
			},
			DeletionRule {
				name: "stitched signal images".to_string(),
				folder: FolderRule::Artifact { stage: 0, artifact: ArtifactType::Signal },
				content: ContentRule::Stitched,
				restrict_to_redundant_repeats: false,
			},
			DeletionRule {
				name: "stitched redundant AF images".to_string(),
				folder: FolderRule::Artifact { stage: 0, artifact: ArtifactType::Autofocus },
				content: ContentRule::Stitched,
				restrict_to_redundant_repeats: true,
			},
		]
	}

	pub fn pattern(&self, unit: &str) -> StructuralPattern {
		StructuralPattern::new(unit, self.folder.clone(), self.content)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> =
			pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		move |key| map.get(key).cloned()
	}

	#[test]
	fn test_config_default() {
		let config = Config::default();
		assert_eq!(config.unit_name, "CD02011");
		assert_eq!(config.protected_suffix, "AutoAlignment.zip");
		assert_eq!(config.exclude_slides, vec!["*checkpoint*"]);
		assert_eq!(config.copy_workers, 1);
		assert_eq!(config.rules.len(), 3);
		assert!(config.rules[2].restrict_to_redundant_repeats);
		assert!(!config.dry_run);
	}

	#[test]
	fn test_partial_toml_keeps_defaults() {
		let config = Config::from_toml(
			r#"
			sourceRoot = "/data/celldive"
			destRoot = "/archive/celldive"
			copyWorkers = 4
			verify = "content"
			"#,
		)
		.unwrap();
		assert_eq!(config.source_root, Some(PathBuf::from("/data/celldive")));
		assert_eq!(config.copy_workers, 4);
		assert_eq!(config.verify, VerifyMode::Content);
		assert_eq!(config.unit_name, "CD02011");
		assert_eq!(config.rules, DeletionRule::builtin());
	}

	#[test]
	fn test_custom_rules_replace_builtin() {
		let config = Config::from_toml(
			r#"
			[[rules]]
			name = "raw tiles only"
			folder = { kind = "non-baseline" }
			content = "raw"
			"#,
		)
		.unwrap();
		assert_eq!(config.rules.len(), 1);
		assert_eq!(config.rules[0].content, ContentRule::Raw);
		assert!(!config.rules[0].restrict_to_redundant_repeats);
	}

	#[test]
	fn test_unknown_field_value_is_parse_error() {
		assert!(Config::from_toml("verify = \"sometimes\"").is_err());
	}

	#[test]
	fn test_env_overrides() {
		let mut config = Config::default();
		config
			.apply_env(env_of(&[
				(ENV_SOURCE, "/src"),
				(ENV_DEST, "/dst"),
				(ENV_WORKERS, "8"),
			]))
			.unwrap();
		assert_eq!(config.source_root, Some(PathBuf::from("/src")));
		assert_eq!(config.dest_root, Some(PathBuf::from("/dst")));
		assert_eq!(config.copy_workers, 8);
		assert_eq!(config.log_dir().unwrap(), PathBuf::from("/dst/logs"));
	}

	#[test]
	fn test_env_bad_workers() {
		let mut config = Config::default();
		let err = config.apply_env(env_of(&[(ENV_WORKERS, "many")])).unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { .. }));
		assert!(err.to_string().contains(ENV_WORKERS));
	}

	#[test]
	fn test_validate() {
		let mut config = Config::default();
		assert!(matches!(config.validate(), Err(ConfigError::Missing("sourceRoot"))));

		config.source_root = Some(PathBuf::from("/data"));
		assert!(matches!(config.validate(), Err(ConfigError::Missing("destRoot"))));

		config.dest_root = Some(PathBuf::from("/data"));
		assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

		config.dest_root = Some(PathBuf::from("/archive"));
		assert!(config.validate().is_ok());

		config.copy_workers = 0;
		assert!(config.validate().is_err());
		config.copy_workers = 2;

		config.rules[0].name = "  ".to_string();
		let err = config.validate().unwrap_err();
		assert!(err.to_string().contains("rules[0].name"));
		config.rules[0].name = "raw".to_string();

		config.exclude_slides.push("[".to_string());
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_config_serialization() {
		let mut config = Config::default();
		config.source_root = Some(PathBuf::from("/data"));
		let json = serde_json::to_string(&config).expect("Failed to serialize");
		let parsed: Config = serde_json::from_str(&json).expect("Failed to deserialize");
		assert_eq!(config, parsed);
	}
}

// vim: ts=4
