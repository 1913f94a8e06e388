//! Per-repository metadata extraction.

use crate::error::{Error, Result};
use crate::models::RepositoryMetadata;
use crate::vcs::VersionControl;
use std::path::Path;
use tracing::debug;

/// Collects the report fields for one repository root.
///
/// The remote lookup is best-effort; the commit timestamp is required.
#[derive(Debug, Clone)]
pub struct MetadataExtractor<V> {
    vcs: V,
}

impl<V: VersionControl> MetadataExtractor<V> {
    /// Creates an extractor that queries `vcs`.
    pub fn new(vcs: V) -> Self {
        Self { vcs }
    }

    /// The underlying tool.
    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    /// Queries the remote URL, then the last commit time, for `repo_path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Extraction`] carrying the path and cause when the
    /// commit timestamp cannot be obtained. A failed remote lookup only
    /// leaves `remote_url` empty.
    pub fn extract(&self, repo_path: &Path) -> Result<RepositoryMetadata> {
        let remote_url = match self.vcs.remote_url(repo_path) {
            Ok(url) => url,
            Err(e) => {
                debug!(path = %repo_path.display(), error = %e, "no remote url");
                None
            }
        };

        let last_commit_time = self
            .vcs
            .last_commit_time(repo_path)
            .map_err(|e| Error::extraction(repo_path, e))?;

        Ok(RepositoryMetadata {
            remote_url,
            last_commit_time,
        })
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted [`VersionControl`] used by tests across the crate.

    use super::*;
    use chrono::{DateTime, FixedOffset};
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[derive(Debug, Clone, Default)]
    pub struct FakeVcs {
        remotes: HashMap<PathBuf, String>,
        commits: HashMap<PathBuf, String>,
    }

    impl FakeVcs {
        pub fn new() -> Self {
            Self::default()
        }

        /// Registers a repository; `commit` is raw tool output.
        pub fn repo(mut self, path: &str, remote: Option<&str>, commit: Option<&str>) -> Self {
            if let Some(remote) = remote {
                self.remotes.insert(PathBuf::from(path), remote.to_string());
            }
            if let Some(commit) = commit {
                self.commits.insert(PathBuf::from(path), commit.to_string());
            }
            self
        }
    }

    impl VersionControl for FakeVcs {
        fn remote_url(&self, repo_path: &Path) -> Result<Option<String>> {
            self.remotes
                .get(repo_path)
                .map(|url| Some(url.clone()))
                .ok_or_else(|| {
                    Error::command_failed(repo_path, "git remote get-url origin", "No such remote 'origin'")
                })
        }

        fn last_commit_time(&self, repo_path: &Path) -> Result<DateTime<FixedOffset>> {
            let raw = self.commits.get(repo_path).ok_or_else(|| {
                Error::command_failed(
                    repo_path,
                    "git log -1",
                    "your current branch 'main' does not have any commits yet",
                )
            })?;
            crate::vcs::parse_commit_time(repo_path, raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeVcs;
    use super::*;

    #[test]
    fn test_extract_with_remote() {
        let vcs = FakeVcs::new().repo(
            "/data/repoA",
            Some("git@host:org/a.git"),
            Some("2024-01-10 10:00:00 -0500"),
        );
        let metadata = MetadataExtractor::new(vcs)
            .extract(Path::new("/data/repoA"))
            .unwrap();
        assert_eq!(metadata.remote_url.as_deref(), Some("git@host:org/a.git"));
        assert_eq!(
            metadata.last_commit_time.to_rfc3339(),
            "2024-01-10T10:00:00-05:00"
        );
    }

    #[test]
    fn test_missing_remote_is_not_an_error() {
        let vcs = FakeVcs::new().repo("/data/repoC", None, Some("2023-05-01 09:00:00 +0000"));
        let metadata = MetadataExtractor::new(vcs)
            .extract(Path::new("/data/repoC"))
            .unwrap();
        assert_eq!(metadata.remote_url, None);
    }

    #[test]
    fn test_missing_commit_fails_with_path() {
        let vcs = FakeVcs::new().repo("/data/empty", Some("git@host:org/e.git"), None);
        let err = MetadataExtractor::new(vcs)
            .extract(Path::new("/data/empty"))
            .unwrap_err();
        match err {
            Error::Extraction { path, source } => {
                assert_eq!(path, Path::new("/data/empty"));
                assert!(source.to_string().contains("does not have any commits"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unparseable_commit_fails() {
        let vcs = FakeVcs::new().repo("/data/odd", None, Some("not a date"));
        let err = MetadataExtractor::new(vcs)
            .extract(Path::new("/data/odd"))
            .unwrap_err();
        match err {
            Error::Extraction { source, .. } => {
                assert!(matches!(*source, Error::InvalidCommitTime { .. }))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
