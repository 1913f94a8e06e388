//! Error types for git-projects-report.
//!
//! The library reports failures through a single [`Error`] enum built with
//! `thiserror`. Only [`Error::NoRootPaths`] and [`Error::Output`] are fatal
//! to a run; traversal and extraction errors are recovered per root or per
//! repository by the scanner. The CLI wraps everything in `anyhow`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A specialized Result type for git-projects-report operations.
///
/// # Example
///
/// ```
/// use git_projects_report::Result;
///
/// fn count_roots() -> Result<usize> {
///     Ok(1)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while locating repositories and building the report.
#[derive(Error, Debug)]
pub enum Error {
    /// No root directory was supplied.
    #[error("No root directories given; pass at least one path to scan")]
    NoRootPaths,

    /// A root or one of its sub-directories could not be read.
    #[error("Failed to traverse {path}: {source}")]
    Traversal {
        /// The directory that could not be listed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The version-control tool could not be started or exited unsuccessfully.
    #[error("`{command}` failed in {path}: {message}")]
    CommandFailed {
        /// Working directory of the invocation.
        path: PathBuf,
        /// The command line that was run.
        command: String,
        /// stderr of the tool, or the spawn error.
        message: String,
    },

    /// The version-control tool did not finish in time and was killed.
    #[error("`{command}` timed out after {timeout:?} in {path}")]
    CommandTimedOut {
        /// Working directory of the invocation.
        path: PathBuf,
        /// The command line that was run.
        command: String,
        /// The limit that was exceeded.
        timeout: Duration,
    },

    /// The tool printed something that is not a commit timestamp.
    #[error("Failed to parse commit date {value:?} in {path}: {source}")]
    InvalidCommitTime {
        /// The repository whose output was parsed.
        path: PathBuf,
        /// The raw tool output.
        value: String,
        /// The underlying chrono error.
        #[source]
        source: chrono::ParseError,
    },

    /// A value of the report's date column is not in the report layout.
    #[error("Invalid report date {value:?}: {source}")]
    InvalidReportDate {
        /// The column value.
        value: String,
        /// The underlying chrono error.
        #[source]
        source: chrono::ParseError,
    },

    /// Metadata extraction failed for a repository.
    ///
    /// Wraps the tool or parse error that caused the required commit
    /// timestamp to be unavailable.
    #[error("Failed to extract metadata for {path}: {source}")]
    Extraction {
        /// The repository root.
        path: PathBuf,
        /// What went wrong.
        #[source]
        source: Box<Error>,
    },

    /// The report file could not be created or written.
    #[error("Failed to write report to {path}: {source}")]
    Output {
        /// The report path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An I/O error outside of the cases above.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Localization system error.
    #[error("Localization error: {0}")]
    L10n(String),
}

// Helper constructors for common error cases
impl Error {
    /// Creates a Traversal error.
    pub fn traversal(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Traversal {
            path: path.into(),
            source,
        }
    }

    /// Creates a CommandFailed error.
    pub fn command_failed(
        path: impl Into<PathBuf>,
        command: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::CommandFailed {
            path: path.into(),
            command: command.into(),
            message: message.into(),
        }
    }

    /// Creates a CommandTimedOut error.
    pub fn command_timed_out(
        path: impl Into<PathBuf>,
        command: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Error::CommandTimedOut {
            path: path.into(),
            command: command.into(),
            timeout,
        }
    }

    /// Creates an InvalidCommitTime error.
    pub fn invalid_commit_time(
        path: impl Into<PathBuf>,
        value: impl Into<String>,
        source: chrono::ParseError,
    ) -> Self {
        Error::InvalidCommitTime {
            path: path.into(),
            value: value.into(),
            source,
        }
    }

    /// Creates an InvalidReportDate error.
    pub fn invalid_report_date(value: impl Into<String>, source: chrono::ParseError) -> Self {
        Error::InvalidReportDate {
            value: value.into(),
            source,
        }
    }

    /// Wraps `source` as the reason extraction failed for `path`.
    pub fn extraction(path: impl Into<PathBuf>, source: Error) -> Self {
        Error::Extraction {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Creates an Output error.
    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Output {
            path: path.into(),
            source,
        }
    }

    /// Creates an L10n error.
    pub fn l10n(message: impl Into<String>) -> Self {
        Error::L10n(message.into())
    }

    /// Whether this error should abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::NoRootPaths | Error::Output { .. })
    }
}
