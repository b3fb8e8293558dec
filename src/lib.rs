//! # slidesync - Archive Slide Imaging Output Safely
//!
//! slidesync copies a scanner's per-slide output tree to archive storage and
//! then removes intermediate files from the source that are verified present
//! at the destination: raw tiles, stitched signal images, and autofocus
//! images superseded by a later repeat of the same round.
//!
//! Every run recomputes its work from the live filesystem, so an interrupted
//! run is resumed by running again.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use slidesync::config::Config;
//! use slidesync::fs::LocalFs;
//! use slidesync::logging::TracingLogger;
//! use slidesync::pipeline::{run, Context};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.source_root = Some("/data/celldive".into());
//!     config.dest_root = Some("/archive/celldive".into());
//!
//!     let report = run(Context::new(&LocalFs::new(), &TracingLogger), &config)?;
//!     println!("{} slides processed", report.slides.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Using the Phases Directly
//!
//! ```rust,ignore
//! use slidesync::plan::plan_copy;
//! use slidesync::copy::copy_files;
//!
//! let plan = plan_copy(&fs, &source, &dest, SymlinkMode::Files)?;
//! let outcome = copy_files(&fs, &log, &source, &dest, &plan.missing, VerifyMode::Shallow)?;
//! ```

pub mod classify;
pub mod config;
pub mod copy;
pub mod delete;
pub mod error;
pub mod folder_name;
pub mod fs;
pub mod inspect;
pub mod logging;
pub mod pattern;
pub mod pipeline;
pub mod plan;
pub mod redundancy;
pub mod strategies;
pub mod tree;
pub mod util;

// Re-export commonly used types and functions
pub use config::{Config, DeletionRule};
pub use copy::CopyOutcome;
pub use error::{ConfigError, ReconcileError, Result};
pub use folder_name::{FolderNameDescriptor, FolderNameError};
pub use fs::{FileSystem, LocalFs};
pub use logging::{Logger, RecordingLogger, TracingLogger};
pub use pipeline::{run, Context, RunReport, SlideReport};
pub use tree::RelativePath;

// vim: ts=4
