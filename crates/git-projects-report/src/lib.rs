//! # git-projects-report
//!
//! Finds every Git repository below one or more root directories and writes
//! a sorted report of where each one lives, where its `origin` points, and
//! when it was last committed to.
//!
//! ## Features
//!
//! - **Recursive discovery** of repository roots by their `.git` directory
//! - **Metadata extraction** through the `git` executable, with a timeout per call
//! - **Parallel extraction** across repositories, without affecting report order
//! - **Deterministic ordering**: by remote URL, newest commit first within a remote
//! - **CSV or JSON** output
//! - **Localization support** via Fluent (English and German)
//!
//! ## Quick Start
//!
//! ```no_run
//! use git_projects_report::{DefaultLocator, ReportBuilder, ReportFormat, RepositoryLocator, ScanConfig};
//! use std::path::{Path, PathBuf};
//!
//! let config = ScanConfig::new(vec![PathBuf::from("/home/user/projects")]);
//! let outcome = DefaultLocator::from_config(&config).locate(&config)?;
//!
//! let builder = ReportBuilder::new(ReportFormat::Csv);
//! let records = builder.build(outcome.records);
//! builder.write_to_file(&records, Path::new("git_projects_report.csv"))?;
//! # Ok::<(), git_projects_report::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`models`] - Records, scan configuration and scan outcome
//! - [`fs`] - Directory listing capability (real and in-memory)
//! - [`vcs`] - Interface to the version-control tool and its `git` implementation
//! - [`extractor`] - Per-repository metadata extraction
//! - [`scanner`] - Repository locator
//! - [`report`] - Sorting and serialization
//! - [`error`] - Custom error types
//! - [`l10n`] - Localization utilities
//!
//! ## CLI Binary
//!
//! This crate also provides a `git-projects-report` binary. See its `--help`
//! output for details.

pub mod error;
pub mod extractor;
pub mod fs;
pub mod l10n;
pub mod models;
pub mod report;
pub mod scanner;
pub mod vcs;

// Re-export commonly used types for convenience
pub use error::{Error, Result};
pub use extractor::MetadataExtractor;
pub use models::{
    FailureKind, ReportFormat, RepositoryMetadata, RepositoryRecord, ScanConfig, ScanFailure,
    ScanOutcome,
};
pub use report::ReportBuilder;
pub use scanner::{DefaultLocator, RepositoryLocator};
pub use vcs::{GitCli, VersionControl};

/// Library version, derived from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
