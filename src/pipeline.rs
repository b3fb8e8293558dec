//! Per-slide reconciliation and the run over all slides
//!
//! Each slide goes through plan, copy, and then one classify/remove pass per
//! deletion rule. A phase finishes for every file before the next phase
//! starts.

use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::classify::{select_for_deletion, SelectionPolicy};
use crate::config::{Config, DeletionRule};
use crate::copy::{copy_files_parallel, CopyOutcome};
use crate::delete::remove_files;
use crate::error::{ReconcileError, Result};
use crate::fs::{EntryKind, FileSystem};
use crate::logging::{debug, info_span, Logger};
use crate::plan::{plan_copy, CopyPlan};
use crate::redundancy::find_redundant_repeats;
use crate::util::format_size;

/// Collaborators shared by every phase of a run
#[derive(Clone, Copy)]
pub struct Context<'a> {
	pub fs: &'a dyn FileSystem,
	pub log: &'a dyn Logger,
}

impl<'a> Context<'a> {
	pub fn new(fs: &'a dyn FileSystem, log: &'a dyn Logger) -> Self {
		Context { fs, log }
	}
}

/// What one deletion rule did for a slide
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleReport {
	pub rule: String,
	pub selected: usize,
	pub selected_bytes: u64,
	/// Zero in dry-run mode
	pub removed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideReport {
	pub slide: String,
	pub planned_files: usize,
	pub planned_bytes: u64,
	/// `None` in dry-run mode
	pub copy: Option<CopyOutcome>,
	/// Set when deletion phases were skipped after an aborted copy
	pub deletion_skipped: bool,
	pub rules: Vec<RuleReport>,
}

impl SlideReport {
	pub fn copy_aborted(&self) -> bool {
		matches!(self.copy, Some(CopyOutcome::Aborted { .. }))
	}

	pub fn removed(&self) -> usize {
		self.rules.iter().map(|r| r.removed).sum()
	}
}

/// Result of one slide within a run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideResult {
	pub slide: String,
	pub report: Option<SlideReport>,
	pub error: Option<String>,
}

impl SlideResult {
	/// False if the slide failed outright or its copy aborted
	pub fn is_ok(&self) -> bool {
		self.error.is_none() && self.report.as_ref().map_or(false, |r| !r.copy_aborted())
	}
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
	pub run_id: Uuid,
	pub slides: Vec<SlideResult>,
}

impl RunReport {
	pub fn succeeded(&self) -> bool {
		self.slides.iter().all(SlideResult::is_ok)
	}

	pub fn failed(&self) -> impl Iterator<Item = &SlideResult> {
		self.slides.iter().filter(|s| !s.is_ok())
	}
}

/// Copy plan of one slide, for `plan` output
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlidePlan {
	pub slide: String,
	pub plan: CopyPlan,
}

/// Sorted names of slide directories directly under `source_root`
///
/// Names matching any of `exclude` (glob patterns) are skipped. Symlinks to
/// directories count as slides.
pub fn discover_slides(
	fs: &dyn FileSystem,
	source_root: &Path,
	exclude: &[String],
) -> Result<Vec<String>> {
	let patterns = exclude
		.iter()
		.map(|p| {
			glob::Pattern::new(p)
				.map_err(|e| ReconcileError::Pattern { pattern: p.clone(), message: e.to_string() })
		})
		.collect::<Result<Vec<_>>>()?;

	let entries =
		fs.list_entries(source_root).map_err(|e| ReconcileError::listing(source_root, e))?;
	let mut slides: Vec<String> = entries
		.into_iter()
		.filter(|e| match e.kind {
			EntryKind::Dir => true,
			EntryKind::Symlink => fs.is_dir(&e.path),
			EntryKind::File | EntryKind::Other => false,
		})
		.map(|e| e.name)
		.filter(|name| {
			let excluded = patterns.iter().any(|p| p.matches(name));
			if excluded {
				debug!("Skipping excluded slide {}", name);
			}
			!excluded
		})
		.collect();
	slides.sort();
	Ok(slides)
}

/// Slides selected by the configuration: discovered ones, narrowed to
/// `config.slides` when that is set
fn selected_slides(ctx: Context<'_>, config: &Config) -> Result<Vec<String>> {
	if !config.slides.is_empty() {
		return Ok(config.slides.clone());
	}
	discover_slides(ctx.fs, config.source_root()?, &config.exclude_slides)
}

/// Copy plans for every selected slide, without copying anything
pub fn plan_slides(ctx: Context<'_>, config: &Config) -> Result<Vec<SlidePlan>> {
	let source_root = config.source_root()?;
	let dest_root = config.dest_root()?;

	selected_slides(ctx, config)?
		.into_iter()
		.map(|slide| -> Result<SlidePlan> {
			let plan = plan_copy(
				ctx.fs,
				&source_root.join(&slide),
				&dest_root.join(&slide),
				config.symlinks,
			)?;
			Ok(SlidePlan { slide, plan })
		})
		.collect()
}

/// Bring one slide's archive up to date and prune its verified intermediates
pub fn reconcile_slide(ctx: Context<'_>, config: &Config, slide: &str) -> Result<SlideReport> {
	let source = config.source_root()?.join(slide);
	let dest = config.dest_root()?.join(slide);
	let log = ctx.log;

	log.info(&format!("Processing {}", slide));

	let plan = plan_copy(ctx.fs, &source, &dest, config.symlinks)?;
	log.info(&format!(
		"Total size of files to copy: {} ({} files)",
		format_size(plan.total_bytes),
		plan.missing.len()
	));

	let mut report = SlideReport {
		slide: slide.to_string(),
		planned_files: plan.missing.len(),
		planned_bytes: plan.total_bytes,
		copy: None,
		deletion_skipped: false,
		rules: Vec::new(),
	};

	if config.dry_run {
		for rel in &plan.missing {
			log.info(&format!(
				"Would copy: {} -> {}",
				rel.to_path(&source).display(),
				rel.to_path(&dest).display()
			));
		}
	} else {
		let outcome = copy_files_parallel(
			ctx.fs,
			log,
			&source,
			&dest,
			&plan.missing,
			config.verify,
			config.copy_workers,
		)?;
		log.info(&format!("Copy status: {}", outcome));
		let aborted = !outcome.is_complete();
		report.copy = Some(outcome);

		if aborted && !config.delete_after_failed_copy {
			log.error(&format!("Copy of {} did not complete; skipping deletion", slide));
			report.deletion_skipped = true;
			return Ok(report);
		}
	}

	let policy =
		SelectionPolicy { protected_suffix: &config.protected_suffix, symlinks: config.symlinks };
	let mut redundant: Option<Vec<PathBuf>> = None;

	for rule in &config.rules {
		let rule_report =
			apply_rule(ctx, config, rule, &source, &dest, policy, &mut redundant)?;
		report.rules.push(rule_report);
	}

	Ok(report)
}

fn apply_rule(
	ctx: Context<'_>,
	config: &Config,
	rule: &DeletionRule,
	source: &Path,
	dest: &Path,
	policy: SelectionPolicy<'_>,
	redundant: &mut Option<Vec<PathBuf>>,
) -> Result<RuleReport> {
	let log = ctx.log;
	log.info(&format!("Mark {} for deletion.", rule.name));

	let restriction = if rule.restrict_to_redundant_repeats {
		if redundant.is_none() {
			*redundant = Some(find_redundant_repeats(ctx.fs, log, source, &config.unit_name)?);
		}
		redundant.as_deref()
	} else {
		None
	};

	let pattern = rule.pattern(&config.unit_name);
	let selection =
		select_for_deletion(ctx.fs, log, source, dest, &pattern, policy, restriction)?;
	log.info(&format!(
		"Total size of {} to delete: {}",
		rule.name,
		format_size(selection.total_bytes)
	));

	let removed = if config.dry_run {
		for file in &selection.files {
			log.info(&format!("Would remove {}", file.display()));
		}
		0
	} else {
		remove_files(ctx.fs, log, &selection.files)?
	};

	Ok(RuleReport {
		rule: rule.name.clone(),
		selected: selection.files.len(),
		selected_bytes: selection.total_bytes,
		removed,
	})
}

/// Reconcile every selected slide, one after another
///
/// A slide that fails is reported and does not stop the slides after it.
/// Configuration and slide discovery errors abort the run.
pub fn run(ctx: Context<'_>, config: &Config) -> Result<RunReport> {
	config.validate()?;

	let run_id = Uuid::new_v4();
	let span = info_span!("run", %run_id);
	let _enter = span.enter();

	let slides = selected_slides(ctx, config)?;
	ctx.log.info(&format!(
		"Run {}: {} slides from {} to {}",
		run_id,
		slides.len(),
		config.source_root()?.display(),
		config.dest_root()?.display()
	));

	let mut results = Vec::with_capacity(slides.len());
	for slide in slides {
		let result = match reconcile_slide(ctx, config, &slide) {
			Ok(report) => SlideResult { slide, report: Some(report), error: None },
			Err(e) => {
				ctx.log.error(&format!("Slide {} failed: {}", slide, e));
				SlideResult { slide, report: None, error: Some(e.to_string()) }
			}
		};
		results.push(result);
	}

	Ok(RunReport { run_id, slides: results })
}


// vim: ts=4
