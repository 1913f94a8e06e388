//! Repository discovery.
//!
//! This module walks the configured roots, identifies repository roots by
//! their `.git` directory and hands each one to the metadata extractor. The
//! main entry point is the [`RepositoryLocator`] trait, with a default
//! implementation in [`DefaultLocator`].

use crate::error::{Error, Result};
use crate::extractor::MetadataExtractor;
use crate::fs::{DirectoryLister, OsLister};
use crate::models::{
    FailureKind, RepositoryMetadata, RepositoryRecord, ScanConfig, ScanFailure, ScanOutcome,
    VCS_MARKER_DIR,
};
use crate::vcs::{GitCli, VersionControl};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Finds repositories below a set of roots and extracts their metadata.
///
/// # Example
///
/// ```no_run
/// use git_projects_report::{DefaultLocator, RepositoryLocator, ScanConfig};
/// use std::path::PathBuf;
///
/// let config = ScanConfig::new(vec![PathBuf::from("/home/user/projects")]);
/// let locator = DefaultLocator::from_config(&config);
/// let outcome = locator.locate(&config)?;
/// println!("Found {} repositories", outcome.records.len());
/// # Ok::<(), git_projects_report::Error>(())
/// ```
pub trait RepositoryLocator {
    /// Scans every root in `config.root_paths`, in order.
    ///
    /// Unreadable roots and repositories whose extraction fails are recorded
    /// in [`ScanOutcome::failures`] and skipped; they never abort the scan.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRootPaths`] if the configuration has no roots.
    fn locate(&self, config: &ScanConfig) -> Result<ScanOutcome>;
}

/// Default implementation of [`RepositoryLocator`].
///
/// Works in two phases:
/// - a depth-first walk over the [`DirectoryLister`] that collects
///   repository roots in discovery order
/// - metadata extraction for all roots on a `rayon` pool, collected back
///   into discovery order
///
/// The walk does not enter `.git` directories but keeps descending into the
/// rest of a repository, so nested repositories are reported as well.
#[derive(Debug, Clone)]
pub struct DefaultLocator<L, V> {
    lister: L,
    extractor: MetadataExtractor<V>,
}

impl DefaultLocator<OsLister, GitCli> {
    /// Locator over the real filesystem that shells out to `git`.
    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(
            OsLister::new(config.follow_symlinks),
            GitCli::new(config.command_timeout),
        )
    }
}

impl<L: DirectoryLister, V: VersionControl> DefaultLocator<L, V> {
    /// Creates a locator from a directory lister and a version-control tool.
    pub fn new(lister: L, vcs: V) -> Self {
        Self {
            lister,
            extractor: MetadataExtractor::new(vcs),
        }
    }

    /// Collects repository roots below `root` in depth-first pre-order.
    ///
    /// Directories that cannot be listed are pushed to `failures`; only
    /// their subtree is skipped. A directory reached again through a
    /// followed symlink is not walked a second time.
    pub fn discover(
        &self,
        root: &Path,
        max_depth: Option<usize>,
        failures: &mut Vec<ScanFailure>,
    ) -> Vec<PathBuf> {
        let mut repos = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(root.to_path_buf(), 0usize)];

        while let Some((dir, depth)) = stack.pop() {
            if !visited.insert(self.lister.identity(&dir)) {
                debug!(path = %dir.display(), "already visited");
                continue;
            }

            let entries = match self.lister.list(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    let err = Error::traversal(&dir, e);
                    warn!(path = %dir.display(), error = %err, "cannot traverse directory");
                    failures.push(ScanFailure::new(&dir, FailureKind::Traversal, &err));
                    continue;
                }
            };

            if entries.iter().any(|e| e.is_dir && e.name == VCS_MARKER_DIR) {
                debug!(path = %dir.display(), "found repository");
                repos.push(dir.clone());
            }

            if max_depth.map_or(true, |max| depth < max) {
                // Reversed so the stack pops children in name order.
                stack.extend(
                    entries
                        .into_iter()
                        .rev()
                        .filter(|e| e.is_dir && e.name != VCS_MARKER_DIR)
                        .map(|e| (e.path, depth + 1)),
                );
            }
        }

        repos
    }

    /// Extracts metadata for `repos`, keeping their order in the outcome.
    pub fn extract_all(&self, repos: &[PathBuf], jobs: Option<usize>) -> ScanOutcome {
        let results: Vec<Result<RepositoryMetadata>> = match jobs {
            Some(1) => repos.iter().map(|p| self.extractor.extract(p)).collect(),
            _ => match rayon::ThreadPoolBuilder::new()
                .num_threads(jobs.unwrap_or(0))
                .build()
            {
                Ok(pool) => pool.install(|| {
                    repos
                        .par_iter()
                        .map(|p| self.extractor.extract(p))
                        .collect()
                }),
                Err(e) => {
                    warn!(error = %e, "thread pool unavailable, extracting sequentially");
                    repos.iter().map(|p| self.extractor.extract(p)).collect()
                }
            },
        };

        let mut outcome = ScanOutcome::default();
        for (path, result) in repos.iter().zip(results) {
            match result {
                Ok(metadata) => outcome.records.push(RepositoryRecord::new(path, metadata)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping repository");
                    outcome
                        .failures
                        .push(ScanFailure::new(path, FailureKind::Extraction, &e));
                }
            }
        }
        outcome
    }
}

impl<L: DirectoryLister, V: VersionControl> RepositoryLocator for DefaultLocator<L, V> {
    fn locate(&self, config: &ScanConfig) -> Result<ScanOutcome> {
        config.validate()?;

        let mut failures = Vec::new();
        let mut repos = Vec::new();
        for root in &config.root_paths {
            info!(root = %root.display(), "scanning");
            let found = self.discover(root, config.max_depth, &mut failures);
            debug!(root = %root.display(), count = found.len(), "discovery finished");
            repos.extend(found);
        }

        let mut outcome = ScanOutcome {
            records: Vec::new(),
            failures,
        };
        outcome.merge(self.extract_all(&repos, config.jobs));

        info!(
            repositories = outcome.records.len(),
            failures = outcome.failures.len(),
            "scan complete"
        );
        Ok(outcome)
    }
}
