//! Command-line interface for git-projects-report.
//!
//! Scans the given roots for Git repositories and writes the sorted report
//! to a file in the current directory.

use anyhow::{Context, Result};
use clap::Parser;
use git_projects_report::{
    l10n::Localizer, report::DEFAULT_REPORT_FILE, DefaultLocator, Error, ReportBuilder,
    ReportFormat, RepositoryLocator, ScanConfig,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit status for invocation mistakes, matching clap's own usage errors.
const EXIT_USAGE: u8 = 2;

/// git-projects-report - Audit the Git checkouts on this machine
#[derive(Parser, Debug)]
#[command(
    name = "git-projects-report",
    version,
    about = "Find Git repositories and report their remotes and last commit dates",
    long_about = None
)]
struct Cli {
    /// Root directories to scan
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Root directory to scan (can be specified multiple times)
    #[arg(short = 'r', long = "root", value_name = "PATH")]
    roots: Vec<PathBuf>,

    /// Report file to write
    #[arg(short = 'o', long = "output", value_name = "FILE", default_value = DEFAULT_REPORT_FILE)]
    output: PathBuf,

    /// Report format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = ReportFormat::Csv)]
    format: ReportFormat,

    /// Maximum recursion depth below each root (default: unlimited)
    #[arg(short = 'd', long = "depth", value_name = "N")]
    max_depth: Option<usize>,

    /// Descend into symbolically linked directories
    #[arg(long = "follow-symlinks")]
    follow_symlinks: bool,

    /// Number of repositories to inspect in parallel (default: one per CPU)
    #[arg(short = 'j', long = "jobs", value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    jobs: Option<u16>,

    /// Seconds to wait for each git invocation
    #[arg(long = "timeout", value_name = "SECS", default_value_t = git_projects_report::models::DEFAULT_COMMAND_TIMEOUT_SECS)]
    timeout: u64,

    /// Show progress; repeat for debug output
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Locale for messages (e.g., en, de)
    #[arg(short = 'l', long = "locale", value_name = "LOCALE")]
    locale: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let localizer = match load_localizer(cli.locale.as_deref()) {
        Ok(localizer) => localizer,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &localizer) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<Error>() {
            Some(Error::NoRootPaths) => {
                eprintln!("{}", localizer.get("error-no-roots", None));
                eprintln!("{}", localizer.get("error-usage-hint", None));
                ExitCode::from(EXIT_USAGE)
            }
            _ => {
                let error = format!("{:#}", e);
                eprintln!(
                    "{}",
                    localizer.get("report-failed", Some(&[("error", error.as_str())]))
                );
                ExitCode::FAILURE
            }
        },
    }
}

fn run(cli: &Cli, localizer: &Localizer) -> Result<()> {
    let config = build_scan_config(cli);
    config.validate()?;

    if cli.verbose > 0 {
        eprintln!("{}", localizer.get("scan-started", None));
        for root in &config.root_paths {
            let path = root.display().to_string();
            eprintln!(
                "{}",
                localizer.get("scan-started-path", Some(&[("path", path.as_str())]))
            );
        }
    }

    let outcome = DefaultLocator::from_config(&config).locate(&config)?;

    if cli.verbose > 0 {
        eprintln!(
            "{}",
            localizer.get_count("scan-complete", outcome.records.len(), None)
        );
    }
    if !outcome.failures.is_empty() {
        eprintln!(
            "{}",
            localizer.get_count("scan-failures", outcome.failures.len(), None)
        );
    }

    let builder = ReportBuilder::new(cli.format);
    let records = builder.build(outcome.records);
    builder
        .write_to_file(&records, &cli.output)
        .with_context(|| format!("Could not create {}", cli.output.display()))?;

    let path = cli.output.display().to_string();
    println!(
        "{}",
        localizer.get_count("report-saved", records.len(), Some(&[("path", path.as_str())]))
    );
    Ok(())
}

/// Builds a ScanConfig from CLI arguments.
///
/// `--root` values come first, then positional paths.
fn build_scan_config(cli: &Cli) -> ScanConfig {
    let root_paths = cli
        .roots
        .iter()
        .chain(&cli.paths)
        .map(|p| expand_tilde(p))
        .collect();

    ScanConfig {
        root_paths,
        max_depth: cli.max_depth,
        follow_symlinks: cli.follow_symlinks,
        jobs: cli.jobs.map(usize::from),
        command_timeout: Duration::from_secs(cli.timeout),
    }
}

/// Replaces a leading `~` with the home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

fn load_localizer(locale: Option<&str>) -> Result<Localizer> {
    match locale {
        Some(locale) => {
            Localizer::new(locale).with_context(|| format!("Failed to load locale: {}", locale))
        }
        None => Localizer::from_system().context("Failed to load system locale"),
    }
}

/// Installs the stderr log subscriber.
///
/// `-v` selects `info`, `-vv` `debug`; otherwise `RUST_LOG` applies, with
/// `warn` as the default so skipped repositories are always visible.
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
