//! Ordering and serialization of the final report.
//!
//! Records are sorted by [`compare_records`] with a stable sort and written
//! once, after the scan, either as CSV (the default) or as JSON.

use crate::error::{Error, Result};
use crate::models::{RepositoryRecord, ReportFormat};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Default report file name, relative to the working directory.
pub const DEFAULT_REPORT_FILE: &str = "git_projects_report.csv";

/// Column labels of the CSV header row.
pub const CSV_HEADER: [&str; 4] = ["Project name", "Path", "Remote repository", "Last commit date"];

/// Layout of the commit date column.
pub const COMMIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Report ordering.
///
/// Two records that both have a remote are ordered by URL, and by newest
/// commit first when the URLs match. Any pair where at least one side has
/// no remote is ordered by name.
///
/// # Examples
///
/// ```
/// # use git_projects_report::{report::compare_records, RepositoryMetadata, RepositoryRecord};
/// # use chrono::DateTime;
/// # use std::cmp::Ordering;
/// let at = |s| DateTime::parse_from_rfc3339(s).unwrap();
/// let older = RepositoryRecord::new("/a/one", RepositoryMetadata {
///     remote_url: Some("git@host:org/x.git".into()),
///     last_commit_time: at("2024-03-01T00:00:00+00:00"),
/// });
/// let newer = RepositoryRecord::new("/b/two", RepositoryMetadata {
///     remote_url: Some("git@host:org/x.git".into()),
///     last_commit_time: at("2024-06-01T00:00:00+00:00"),
/// });
/// assert_eq!(compare_records(&newer, &older), Ordering::Less);
/// ```
pub fn compare_records(a: &RepositoryRecord, b: &RepositoryRecord) -> Ordering {
    match (a.remote_url.as_deref(), b.remote_url.as_deref()) {
        (Some(url_a), Some(url_b)) if url_a == url_b => {
            b.last_commit_time.cmp(&a.last_commit_time)
        }
        (Some(url_a), Some(url_b)) => url_a.cmp(url_b),
        _ => a.name.cmp(&b.name),
    }
}

/// Sorts `records` in report order. Equal records keep their relative order.
///
/// [`compare_records`] is not transitive once records with and without a
/// remote are mixed (`a < b` and `b < c` by name, `c < a` by URL), and
/// `slice::sort_by` may panic on such a comparator. [`stable_sort_by`] never
/// panics and leaves every adjacent pair of records in order.
pub fn sort_records(records: &mut [RepositoryRecord]) {
    stable_sort_by(records, compare_records);
}

/// Insertion sort that only requires `compare` to be antisymmetric.
///
/// Elements move by swapping with a strictly greater neighbour, so two
/// elements that compare equal are never reordered and every adjacent pair
/// of the result satisfies `compare(x, y) != Greater`. Quadratic in the
/// worst case, which is fine for the few thousand checkouts a machine holds.
pub fn stable_sort_by<T, F>(items: &mut [T], mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && compare(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Renders a commit time in its own offset, without the offset.
pub fn format_commit_time(time: &DateTime<FixedOffset>) -> String {
    time.format(COMMIT_DATE_FORMAT).to_string()
}

/// Reads back a value of the commit date column.
pub fn parse_report_date(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, COMMIT_DATE_FORMAT)
        .map_err(|e| Error::invalid_report_date(value, e))
}

/// Writes `records` as CSV with the fixed header row.
///
/// Fields containing commas, quotes or line breaks are quoted.
pub fn write_csv<W: Write>(records: &[RepositoryRecord], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;
    for record in records {
        let path = record.path.display().to_string();
        let date = format_commit_time(&record.last_commit_time);
        csv.write_record([
            record.name.as_str(),
            path.as_str(),
            record.remote_or_empty(),
            date.as_str(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes `records` as a pretty-printed JSON array.
pub fn write_json<W: Write>(records: &[RepositoryRecord], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    Ok(())
}

/// Sorts records and writes them in one of the [`ReportFormat`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportBuilder {
    format: ReportFormat,
}

impl ReportBuilder {
    /// Creates a builder for `format`.
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// The output format.
    pub fn format(&self) -> ReportFormat {
        self.format
    }

    /// Returns `records` in report order.
    pub fn build(&self, mut records: Vec<RepositoryRecord>) -> Vec<RepositoryRecord> {
        sort_records(&mut records);
        records
    }

    /// Serializes already ordered records to `writer`.
    pub fn serialize<W: Write>(&self, records: &[RepositoryRecord], writer: W) -> Result<()> {
        match self.format {
            ReportFormat::Csv => write_csv(records, writer),
            ReportFormat::Json => write_json(records, writer),
        }
    }

    /// Creates (or truncates) `path` and writes the report to it in one go.
    ///
    /// # Errors
    ///
    /// Any failure to create or write the file is reported as
    /// [`Error::Output`].
    pub fn write_to_file(&self, records: &[RepositoryRecord], path: &Path) -> Result<()> {
        debug!(path = %path.display(), rows = records.len(), "writing report");
        let file = File::create(path).map_err(|e| Error::output(path, e))?;
        let mut writer = BufWriter::new(file);
        self.serialize(records, &mut writer)
            .map_err(|e| into_output_error(path, e))?;
        writer.flush().map_err(|e| Error::output(path, e))
    }
}

fn into_output_error(path: &Path, error: Error) -> Error {
    match error {
        Error::Io(e) => Error::output(path, e),
        Error::Csv(e) => Error::output(path, e.into()),
        Error::Json(e) => Error::output(path, e.into()),
        other => other,
    }
}
