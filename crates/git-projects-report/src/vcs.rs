//! Access to the external version-control tool.
//!
//! The rest of the crate talks to git only through the [`VersionControl`]
//! trait. [`GitCli`] implements it by running the `git` executable as a
//! subprocess inside the repository, one bounded invocation per query.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Arguments that print the URL of the `origin` remote.
pub const REMOTE_URL_ARGS: &[&str] = &["remote", "get-url", "origin"];

/// Arguments that print the committer date of `HEAD` in ISO format with offset.
pub const LAST_COMMIT_ARGS: &[&str] = &["log", "-1", "--format=%cd", "--date=iso"];

/// Layout of `git log --date=iso`, e.g. `2024-01-10 10:00:00 -0500`.
pub const GIT_ISO_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// The two queries the report needs from a version-control tool.
///
/// Implementations must be usable from several worker threads at once.
pub trait VersionControl: Send + Sync {
    /// URL of the default remote, `Ok(None)` when the tool prints nothing.
    ///
    /// # Errors
    ///
    /// Returns an error when the tool cannot be run or reports a failure,
    /// for example because no remote is configured.
    fn remote_url(&self, repo_path: &Path) -> Result<Option<String>>;

    /// Timestamp of the most recent commit reachable from `HEAD`.
    ///
    /// # Errors
    ///
    /// Returns an error when the tool fails (no commits, not a repository,
    /// timeout) or its output is not a timestamp.
    fn last_commit_time(&self, repo_path: &Path) -> Result<DateTime<FixedOffset>>;
}

/// [`VersionControl`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
    timeout: Duration,
}

impl GitCli {
    /// Runs `git` from `PATH` with the given per-invocation timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "git".to_string(),
            timeout,
        }
    }

    /// Uses a different executable, e.g. an absolute path to git.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// The per-invocation timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs the tool in `repo_path` and returns its trimmed stdout.
    fn run(&self, repo_path: &Path, args: &[&str]) -> Result<String> {
        let command_line = format!("{} {}", self.program, args.join(" "));
        debug!(path = %repo_path.display(), command = %command_line, "running");

        let child = Command::new(&self.program)
            .args(args)
            .current_dir(repo_path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::command_failed(repo_path, &command_line, e.to_string()))?;

        let output = wait_with_timeout(child, self.timeout)
            .map_err(|e| Error::command_failed(repo_path, &command_line, e.to_string()))?;

        match output {
            Some(output) if output.success => Ok(output.stdout.trim().to_string()),
            Some(output) => {
                let stderr = output.stderr.trim();
                let message = if stderr.is_empty() {
                    format!("exited with status {}", output.code.unwrap_or(-1))
                } else {
                    stderr.to_string()
                };
                Err(Error::command_failed(repo_path, command_line, message))
            }
            None => Err(Error::command_timed_out(repo_path, command_line, self.timeout)),
        }
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::models::DEFAULT_COMMAND_TIMEOUT_SECS))
    }
}

impl VersionControl for GitCli {
    fn remote_url(&self, repo_path: &Path) -> Result<Option<String>> {
        let url = self.run(repo_path, REMOTE_URL_ARGS)?;
        Ok(Some(url).filter(|u| !u.is_empty()))
    }

    fn last_commit_time(&self, repo_path: &Path) -> Result<DateTime<FixedOffset>> {
        let raw = self.run(repo_path, LAST_COMMIT_ARGS)?;
        parse_commit_time(repo_path, &raw)
    }
}

/// Parses a commit date printed by git, keeping its UTC offset.
///
/// Accepts the `--date=iso` layout and, failing that, `--date=iso-strict`
/// (RFC 3339).
///
/// # Examples
///
/// ```
/// # use git_projects_report::vcs::parse_commit_time;
/// # use std::path::Path;
/// let t = parse_commit_time(Path::new("/repo"), "2024-01-10 10:00:00 -0500").unwrap();
/// assert_eq!(t.to_rfc3339(), "2024-01-10T10:00:00-05:00");
/// ```
pub fn parse_commit_time(repo_path: &Path, raw: &str) -> Result<DateTime<FixedOffset>> {
    let value = raw.trim();
    DateTime::parse_from_str(value, GIT_ISO_FORMAT)
        .or_else(|iso_err| DateTime::parse_from_rfc3339(value).map_err(|_| iso_err))
        .map_err(|e| Error::invalid_commit_time(repo_path, value, e))
}

struct ProcessOutput {
    success: bool,
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

/// Waits for `child`, killing it once `timeout` has elapsed.
///
/// Returns `Ok(None)` on timeout. stdout and stderr are drained on helper
/// threads so a chatty child cannot block on a full pipe. After a kill the
/// readers are detached rather than joined: a grandchild that inherited the
/// pipes may keep them open long after `child` is gone.
fn wait_with_timeout(mut child: Child, timeout: Duration) -> std::io::Result<Option<ProcessOutput>> {
    let stdout = child.stdout.take().map(spawn_reader);
    let stderr = child.stderr.take().map(spawn_reader);
    let start = Instant::now();

    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None if start.elapsed() >= timeout => {
                // The child may have exited between the poll and the kill.
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    };

    Ok(Some(ProcessOutput {
        success: status.success(),
        code: status.code(),
        stdout: stdout.map(join_reader).unwrap_or_default(),
        stderr: stderr.map(join_reader).unwrap_or_default(),
    }))
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}
