//! Core data models for the repository report.
//!
//! All record types are serde-serializable so the report can be emitted as
//! CSV or JSON from the same structures.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the directory whose presence marks a repository root.
pub const VCS_MARKER_DIR: &str = ".git";

/// Default per-invocation limit for the version-control tool, in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// One discovered repository, as it appears in the report.
///
/// Records are built once through [`RepositoryRecord::new`] and never
/// modified afterwards; the report builder only reorders them.
///
/// # Example
///
/// ```
/// # use git_projects_report::{RepositoryMetadata, RepositoryRecord};
/// # use chrono::DateTime;
/// let metadata = RepositoryMetadata {
///     remote_url: Some("git@host:org/a.git".to_string()),
///     last_commit_time: DateTime::parse_from_rfc3339("2024-01-10T10:00:00-05:00").unwrap(),
/// };
/// let record = RepositoryRecord::new("/data/repoA", metadata);
/// assert_eq!(record.name, "repoA");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryRecord {
    /// Final path segment of `path`.
    pub name: String,

    /// Repository root (the directory that contains `.git`).
    pub path: PathBuf,

    /// URL of the `origin` remote, `None` when no remote is configured
    /// or the lookup failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    /// Timestamp of the most recent commit, with the offset git reported.
    pub last_commit_time: DateTime<FixedOffset>,
}

impl RepositoryRecord {
    /// Binds extracted metadata to the repository root it came from.
    pub fn new(path: impl Into<PathBuf>, metadata: RepositoryMetadata) -> Self {
        let path = path.into();
        Self {
            name: repository_name(&path),
            path,
            remote_url: metadata.remote_url.filter(|url| !url.is_empty()),
            last_commit_time: metadata.last_commit_time,
        }
    }

    /// The remote URL, or `""` when there is none.
    pub fn remote_or_empty(&self) -> &str {
        self.remote_url.as_deref().unwrap_or("")
    }
}

/// Derives the display name of a repository from its root path.
///
/// Uses the last path component; paths without one (`/`, `.`) fall back
/// to their full rendering so the name is never empty.
pub fn repository_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// What the metadata extractor learns about a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryMetadata {
    /// Best-effort remote URL.
    pub remote_url: Option<String>,
    /// Required commit timestamp.
    pub last_commit_time: DateTime<FixedOffset>,
}

/// Configuration for a scan.
///
/// # Example
///
/// ```
/// # use git_projects_report::ScanConfig;
/// # use std::path::PathBuf;
/// let config = ScanConfig {
///     root_paths: vec![PathBuf::from("/srv/checkouts"), PathBuf::from("/home/ci/cache")],
///     max_depth: Some(6),
///     ..ScanConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanConfig {
    /// Directories to search, processed in order.
    pub root_paths: Vec<PathBuf>,

    /// Maximum recursion depth below each root.
    ///
    /// - `None` → unlimited
    /// - `Some(0)` → only check the roots themselves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    /// Whether symlinked directories are descended into.
    ///
    /// Off by default; following links can revisit trees or loop.
    pub follow_symlinks: bool,

    /// Number of repositories extracted concurrently.
    ///
    /// `None` lets the thread pool pick one worker per logical CPU.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,

    /// Limit for each version-control tool invocation.
    #[serde(with = "duration_secs")]
    pub command_timeout: Duration,
}

impl ScanConfig {
    /// Creates a configuration for `root_paths` with default settings.
    pub fn new(root_paths: Vec<PathBuf>) -> Self {
        Self {
            root_paths,
            ..Self::default()
        }
    }

    /// Checks that the configuration can drive a scan.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRootPaths`] when no root directory was given.
    pub fn validate(&self) -> Result<()> {
        if self.root_paths.is_empty() {
            return Err(Error::NoRootPaths);
        }
        Ok(())
    }
}

impl Default for ScanConfig {
    /// No roots, unlimited depth, symlinks not followed, one worker per CPU,
    /// 30 second tool timeout.
    fn default() -> Self {
        Self {
            root_paths: Vec::new(),
            max_depth: None,
            follow_symlinks: false,
            jobs: None,
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Which stage a recovered failure happened in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// A root or sub-directory could not be listed.
    Traversal,
    /// A repository's commit timestamp could not be obtained.
    Extraction,
}

/// A per-root or per-repository failure that did not stop the scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanFailure {
    /// The directory or repository the failure belongs to.
    pub path: PathBuf,
    /// The stage that failed.
    pub kind: FailureKind,
    /// Human-readable cause.
    pub message: String,
}

impl ScanFailure {
    /// Records `error` against `path`.
    pub fn new(path: impl Into<PathBuf>, kind: FailureKind, error: &Error) -> Self {
        Self {
            path: path.into(),
            kind,
            message: error.to_string(),
        }
    }
}

/// Everything a scan produced: records in discovery order plus the
/// failures that were skipped over.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Successfully extracted repositories, in discovery order.
    pub records: Vec<RepositoryRecord>,
    /// Recovered failures, in the order they were encountered.
    pub failures: Vec<ScanFailure>,
}

impl ScanOutcome {
    /// Appends another outcome, such as the extraction phase's, after this
    /// one, keeping the order of both.
    pub fn merge(&mut self, mut other: ScanOutcome) {
        self.records.append(&mut other.records);
        self.failures.append(&mut other.failures);
    }

    /// Number of failures of the given kind.
    pub fn failure_count(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }
}

/// Output format of the report file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Comma-separated values with a fixed header row.
    #[default]
    Csv,
    /// A pretty-printed JSON array of records.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(remote: Option<&str>) -> RepositoryMetadata {
        RepositoryMetadata {
            remote_url: remote.map(str::to_string),
            last_commit_time: DateTime::parse_from_rfc3339("2024-01-10T10:00:00-05:00").unwrap(),
        }
    }

    #[test]
    fn test_record_name_from_path() {
        let record = RepositoryRecord::new("/data/repoA", metadata(None));
        assert_eq!(record.name, "repoA");
        assert_eq!(record.path, PathBuf::from("/data/repoA"));
    }

    #[test]
    fn test_record_name_never_empty() {
        assert_eq!(repository_name(Path::new("/")), "/");
        assert_eq!(repository_name(Path::new("relative/repo")), "repo");
    }

    #[test]
    fn test_empty_remote_is_no_remote() {
        let record = RepositoryRecord::new("/data/repoC", metadata(Some("")));
        assert_eq!(record.remote_url, None);
        assert_eq!(record.remote_or_empty(), "");
    }

    #[test]
    fn test_record_serialization_keeps_offset() {
        let record = RepositoryRecord::new("/data/repoA", metadata(Some("git@host:org/a.git")));
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("2024-01-10T10:00:00-05:00"));

        let back: RepositoryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.last_commit_time.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn test_scan_config_default() {
        let config = ScanConfig::default();
        assert!(config.root_paths.is_empty());
        assert_eq!(config.max_depth, None);
        assert!(!config.follow_symlinks);
        assert_eq!(config.command_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_scan_config_requires_roots() {
        assert!(matches!(
            ScanConfig::default().validate(),
            Err(Error::NoRootPaths)
        ));
        assert!(ScanConfig::new(vec![PathBuf::from(".")]).validate().is_ok());
    }

    #[test]
    fn test_scan_config_timeout_in_seconds() {
        let config = ScanConfig::new(vec![PathBuf::from("/srv")]);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"command_timeout\":30"));
    }

    #[test]
    fn test_outcome_merge_and_counts() {
        let mut outcome = ScanOutcome::default();
        let mut other = ScanOutcome::default();
        other.records.push(RepositoryRecord::new("/a", metadata(None)));
        other.failures.push(ScanFailure::new(
            "/b",
            FailureKind::Extraction,
            &Error::command_failed("/b", "git log", "no commits"),
        ));
        outcome.merge(other);

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.failure_count(FailureKind::Extraction), 1);
        assert_eq!(outcome.failure_count(FailureKind::Traversal), 0);
    }

    #[test]
    fn test_report_format_serialization() {
        assert_eq!(serde_json::to_string(&ReportFormat::Csv).unwrap(), "\"csv\"");
        assert_eq!(ReportFormat::default(), ReportFormat::Csv);
    }
}
