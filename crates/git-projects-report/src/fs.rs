//! Directory listing capability used by the repository walk.
//!
//! The scanner never touches the filesystem directly; it asks a
//! [`DirectoryLister`] for the entries of one directory at a time. This keeps
//! the walk itself testable against the in-memory [`MemoryLister`].

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    /// File name of the entry.
    pub name: OsString,
    /// Full path of the entry.
    pub path: PathBuf,
    /// Whether the entry is a directory that may be descended into.
    pub is_dir: bool,
}

/// Lists the direct children of a directory.
pub trait DirectoryLister: Send + Sync {
    /// Returns the entries of `dir`, sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns an error when `dir` does not exist, is not a directory, or
    /// cannot be read.
    fn list(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>>;

    /// Identity of the directory behind `dir`.
    ///
    /// Two paths with the same identity are the same directory; the walk
    /// visits each identity once. Defaults to the path itself.
    fn identity(&self, dir: &Path) -> PathBuf {
        dir.to_path_buf()
    }
}

/// [`DirectoryLister`] over the real filesystem, built on `walkdir`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsLister {
    follow_symlinks: bool,
}

impl OsLister {
    /// Creates a lister; symlinked directories count as directories only
    /// when `follow_symlinks` is set.
    pub fn new(follow_symlinks: bool) -> Self {
        Self { follow_symlinks }
    }
}

impl DirectoryLister for OsLister {
    fn list(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>> {
        if !std::fs::metadata(dir)?.is_dir() {
            return Err(io::Error::new(io::ErrorKind::Other, "not a directory"));
        }

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name();

        let mut entries = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                // Opening `dir` itself failed: the whole listing fails.
                Err(e) if e.depth() == 0 => return Err(e.into()),
                // A single child could not be resolved (broken link, loop).
                Err(e) => {
                    debug!(error = %e, "skipping entry");
                    continue;
                }
            };
            entries.push(DirEntryInfo {
                name: entry.file_name().to_os_string(),
                path: entry.path().to_path_buf(),
                is_dir: entry.file_type().is_dir(),
            });
        }

        Ok(entries)
    }

    /// Resolves links when they are followed, so a link back to an
    /// ancestor maps onto a directory that was already visited.
    fn identity(&self, dir: &Path) -> PathBuf {
        if self.follow_symlinks {
            std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf())
        } else {
            dir.to_path_buf()
        }
    }
}

/// In-memory directory tree.
///
/// # Example
///
/// ```
/// use git_projects_report::fs::{DirectoryLister, MemoryLister};
/// use std::path::Path;
///
/// let fs = MemoryLister::new()
///     .with_dir("/data/repoA/.git")
///     .with_file("/data/notes.txt");
/// let names: Vec<_> = fs
///     .list(Path::new("/data"))
///     .unwrap()
///     .into_iter()
///     .map(|e| e.name)
///     .collect();
/// assert_eq!(names, ["notes.txt", "repoA"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryLister {
    dirs: BTreeMap<PathBuf, BTreeMap<OsString, bool>>,
    denied: BTreeSet<PathBuf>,
}

impl MemoryLister {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `path` and all of its ancestors as directories.
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.insert_dir(path.as_ref());
        self
    }

    /// Adds a regular file, creating its parent directories.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            self.insert_dir(parent);
            self.dirs
                .entry(parent.to_path_buf())
                .or_default()
                .entry(name.to_os_string())
                .or_insert(false);
        }
        self
    }

    /// Makes listing `path` fail with `PermissionDenied`.
    pub fn with_denied(mut self, path: impl AsRef<Path>) -> Self {
        self.insert_dir(path.as_ref());
        self.denied.insert(path.as_ref().to_path_buf());
        self
    }

    fn insert_dir(&mut self, path: &Path) {
        self.dirs.entry(path.to_path_buf()).or_default();
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            self.dirs
                .entry(parent.to_path_buf())
                .or_default()
                .insert(name.to_os_string(), true);
            self.insert_dir(parent);
        }
    }
}

impl DirectoryLister for MemoryLister {
    fn list(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>> {
        if self.denied.contains(dir) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        let children = self
            .dirs
            .get(dir)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such directory"))?;
        Ok(children
            .iter()
            .map(|(name, is_dir)| DirEntryInfo {
                name: name.clone(),
                path: dir.join(name),
                is_dir: *is_dir,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(entries: &[DirEntryInfo]) -> Vec<String> {
        entries
            .iter()
            .map(|e| e.name.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_os_lister_sorted_and_typed() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("zeta")).unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        fs::write(temp.path().join("alpha.txt"), "x").unwrap();

        let entries = OsLister::new(false).list(temp.path()).unwrap();
        assert_eq!(names(&entries), [".git", "alpha.txt", "zeta"]);
        assert!(entries[0].is_dir);
        assert!(!entries[1].is_dir);
        assert_eq!(entries[2].path, temp.path().join("zeta"));
    }

    #[test]
    fn test_os_lister_missing_dir() {
        let temp = TempDir::new().unwrap();
        let err = OsLister::default()
            .list(&temp.path().join("missing"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_os_lister_rejects_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(OsLister::default().list(&file).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_os_lister_symlinks() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("real")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("real"), temp.path().join("link")).unwrap();

        let entries = OsLister::new(false).list(temp.path()).unwrap();
        let link = entries.iter().find(|e| e.name == "link").unwrap();
        assert!(!link.is_dir);

        let entries = OsLister::new(true).list(temp.path()).unwrap();
        let link = entries.iter().find(|e| e.name == "link").unwrap();
        assert!(link.is_dir);
    }

    #[cfg(unix)]
    #[test]
    fn test_os_lister_identity_resolves_links_when_followed() {
        let temp = TempDir::new().unwrap();
        let real = temp.path().join("real");
        fs::create_dir(&real).unwrap();
        std::os::unix::fs::symlink(&real, temp.path().join("link")).unwrap();

        let link = temp.path().join("link");
        assert_eq!(OsLister::new(true).identity(&link), fs::canonicalize(&real).unwrap());
        assert_eq!(OsLister::new(false).identity(&link), link);
    }

    #[test]
    fn test_memory_lister_tree() {
        let fs = MemoryLister::new()
            .with_dir("/data/repoA/.git")
            .with_dir("/data/repoB/src")
            .with_file("/data/repoB/README.md");

        assert_eq!(names(&fs.list(Path::new("/data")).unwrap()), ["repoA", "repoB"]);
        let repo_b = fs.list(Path::new("/data/repoB")).unwrap();
        assert_eq!(names(&repo_b), ["README.md", "src"]);
        assert!(!repo_b[0].is_dir);
        assert!(fs.list(Path::new("/data/repoA/.git")).unwrap().is_empty());
    }

    #[test]
    fn test_memory_lister_errors() {
        let fs = MemoryLister::new().with_denied("/locked");
        assert_eq!(
            fs.list(Path::new("/locked")).unwrap_err().kind(),
            io::ErrorKind::PermissionDenied
        );
        assert_eq!(
            fs.list(Path::new("/nowhere")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
