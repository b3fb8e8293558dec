use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use slidesync::config::Config;
use slidesync::fs::LocalFs;
use slidesync::inspect::{scan_directory, DEFAULT_THRESHOLD};
use slidesync::logging::{init_tracing, log_file_path, TracingLogger};
use slidesync::pipeline::{plan_slides, run, Context};
use slidesync::redundancy::find_redundant_repeats;
use slidesync::strategies::VerifyMode;
use slidesync::util::format_size;

///////////////////////
// Argument builders //
///////////////////////

fn source_arg() -> Arg {
	Arg::new("source")
		.long("source")
		.value_name("DIR")
		.value_parser(value_parser!(PathBuf))
		.help("Source root holding one directory per slide")
}

fn dest_arg() -> Arg {
	Arg::new("dest")
		.long("dest")
		.value_name("DIR")
		.value_parser(value_parser!(PathBuf))
		.help("Archive root mirroring the source")
}

fn cli() -> Command {
	Command::new("slidesync")
		.version(env!("CARGO_PKG_VERSION"))
		.author("Szilard Hajba <szilu@symbion.hu>")
		.about("Archive slide imaging output and prune verified intermediates")
		.subcommand_required(true)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.value_parser(value_parser!(PathBuf))
				.global(true)
				.help("TOML config file (default: $SLIDESYNC_CONFIG)"),
		)
		.subcommand(
			Command::new("run")
				.about("Copy missing files, then delete archived intermediates")
				.arg(source_arg())
				.arg(dest_arg())
				.arg(
					Arg::new("log-dir")
						.long("log-dir")
						.value_name("DIR")
						.value_parser(value_parser!(PathBuf))
						.help("Directory for the run log (default: <dest>/logs)"),
				)
				.arg(
					Arg::new("dry-run")
						.long("dry-run")
						.action(ArgAction::SetTrue)
						.help("Log planned copies and deletions without performing them"),
				)
				.arg(
					Arg::new("workers")
						.long("workers")
						.value_name("N")
						.value_parser(value_parser!(usize))
						.help("Parallel copy workers"),
				)
				.arg(
					Arg::new("verify")
						.long("verify")
						.value_name("MODE")
						.help("Copy verification: shallow or content"),
				)
				.arg(
					Arg::new("slide")
						.long("slide")
						.value_name("NAME")
						.action(ArgAction::Append)
						.help("Only process this slide (repeatable)"),
				)
				.arg(
					Arg::new("json")
						.long("json")
						.action(ArgAction::SetTrue)
						.help("Print the run report as JSON"),
				),
		)
		.subcommand(
			Command::new("plan")
				.about("Show what each slide still needs to copy")
				.arg(source_arg())
				.arg(dest_arg())
				.arg(Arg::new("json").long("json").action(ArgAction::SetTrue).help("JSON output")),
		)
		.subcommand(
			Command::new("redundant")
				.about("List superseded autofocus repeat folders of a slide")
				.arg(source_arg())
				.arg(Arg::new("slide").required(true)),
		)
		.subcommand(
			Command::new("report")
				.about("Directory size report")
				.arg(Arg::new("dir").required(true).value_parser(value_parser!(PathBuf)))
				.arg(
					Arg::new("threshold-mb")
						.long("threshold-mb")
						.value_name("N")
						.value_parser(value_parser!(u64))
						.help("List files of at least N MB individually (default 10)"),
				),
		)
}

/// Apply the location flags shared by several subcommands
fn apply_locations(config: &mut Config, matches: &ArgMatches) {
	if let Some(source) = matches.try_get_one::<PathBuf>("source").ok().flatten() {
		config.source_root = Some(source.clone());
	}
	if let Some(dest) = matches.try_get_one::<PathBuf>("dest").ok().flatten() {
		config.dest_root = Some(dest.clone());
	}
}

fn local_fs(config: &Config) -> LocalFs {
	LocalFs::with_mtime_tolerance(Duration::from_secs(config.mtime_tolerance_secs))
}

//////////////
// Commands //
//////////////

fn cmd_run(mut config: Config, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
	apply_locations(&mut config, matches);
	if let Some(dir) = matches.get_one::<PathBuf>("log-dir") {
		config.log_dir = Some(dir.clone());
	}
	if matches.get_flag("dry-run") {
		config.dry_run = true;
	}
	if let Some(workers) = matches.get_one::<usize>("workers") {
		config.copy_workers = *workers;
	}
	if let Some(mode) = matches.get_one::<String>("verify") {
		config.verify = mode.parse::<VerifyMode>()?;
	}
	if let Some(slides) = matches.get_many::<String>("slide") {
		config.slides = slides.cloned().collect();
	}
	config.validate()?;

	let log_file = log_file_path(&config.log_dir()?);
	let _guard = init_tracing(Some(&log_file))?;

	let fs = local_fs(&config);
	let log = TracingLogger;
	let report = run(Context::new(&fs, &log), &config)?;

	if matches.get_flag("json") {
		println!("{}", serde_json::to_string_pretty(&report)?);
	}

	let failed: Vec<&str> = report.failed().map(|s| s.slide.as_str()).collect();
	if !failed.is_empty() {
		return Err(format!(
			"{} of {} slides did not complete: {}",
			failed.len(),
			report.slides.len(),
			failed.join(", ")
		)
		.into());
	}
	Ok(())
}

fn cmd_plan(mut config: Config, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
	apply_locations(&mut config, matches);
	init_tracing(None)?;

	let fs = local_fs(&config);
	let log = TracingLogger;
	let plans = plan_slides(Context::new(&fs, &log), &config)?;

	if matches.get_flag("json") {
		println!("{}", serde_json::to_string_pretty(&plans)?);
	} else {
		for p in &plans {
			println!(
				"{}: {} files, {}",
				p.slide,
				p.plan.missing.len(),
				format_size(p.plan.total_bytes)
			);
		}
	}
	Ok(())
}

fn cmd_redundant(mut config: Config, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
	apply_locations(&mut config, matches);
	init_tracing(None)?;
	let slide = matches.get_one::<String>("slide").ok_or("redundant: slide argument required")?;

	let fs = local_fs(&config);
	let log = TracingLogger;
	let source = config.source_root()?.join(slide);
	for dir in find_redundant_repeats(&fs, &log, &source, &config.unit_name)? {
		println!("{}", dir.display());
	}
	Ok(())
}

fn cmd_report(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
	init_tracing(None)?;
	let dir: &Path = matches.get_one::<PathBuf>("dir").ok_or("report: directory argument required")?;
	let threshold = matches
		.get_one::<u64>("threshold-mb")
		.map(|mb| mb * 1024 * 1024)
		.unwrap_or(DEFAULT_THRESHOLD);

	let report = scan_directory(&LocalFs::new(), dir, threshold)?;
	print!("{}", report.render());
	Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
	let matches = cli().get_matches();
	let config = Config::resolve(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

	match matches.subcommand() {
		Some(("run", sub)) => cmd_run(config, sub),
		Some(("plan", sub)) => cmd_plan(config, sub),
		Some(("redundant", sub)) => cmd_redundant(config, sub),
		Some(("report", sub)) => cmd_report(sub),
		_ => Err("unknown subcommand".into()),
	}
}


// vim: ts=4
