// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! lintwatch CLI.
//!
//! `lintwatch watch` lints files as they change on disk, waiting for edits
//! to settle before each run. `lintwatch check` lints a single file once.

#![allow(clippy::print_stdout, reason = "CLI tool needs to output to stdout")]

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use lintwatch::cli::{self, ColorConfig};
use lintwatch::config::{Config, Overrides, ReloadingSettings};
use lintwatch::coordinator::{FileRegistry, PollLoop, WorkerHandle};
use lintwatch::editor::{FsEditor, stdout_writer};
use lintwatch::lint::{CommandLinter, LintService, collect_reports};

/// Command-line arguments for lintwatch.
#[derive(Parser, Debug)]
#[command(name = "lintwatch")]
#[command(about = "Debounced background linting for files being edited")]
#[command(version = env!("LINTWATCH_VERSION"))]
struct Args {
    /// The subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,

    /// Linter command line (e.g., "golint -json"). The file path is
    /// appended and the contents are sent on stdin.
    #[arg(short, long = "lint", global = true)]
    lint: Option<String>,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Quiet period after the last edit before linting, in milliseconds.
    /// Overrides config file if set (default in config is 500).
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Start with linting disabled.
    #[arg(long, global = true)]
    disable: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    nocolor: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            disable: self.disable,
            timeout_ms: self.timeout,
            linter: self.lint.clone(),
        }
    }
}

/// Subcommands supported by lintwatch.
#[derive(Subcommand, Debug)]
enum Command {
    /// Watch files and directories, linting each file once edits settle
    /// (default if no subcommand given, watching the current directory).
    Watch {
        /// Files or directories to watch.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Lint a single file once and print its reports.
    /// Exits with status 1 if any report was found.
    Check {
        /// The file to lint.
        file: PathBuf,
    },
}

/// Entry point for the lintwatch binary.
///
/// # Errors
///
/// Returns an error if the subcommand fails.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lintwatch=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match &args.command {
        None => run_watch(&args, vec![PathBuf::from(".")]).await,
        Some(Command::Watch { paths }) => run_watch(&args, paths.clone()).await,
        Some(Command::Check { file }) => run_check(&args, file),
    }
}

/// Runs the poll loop until interrupted.
///
/// # Errors
///
/// Returns an error if configuration is invalid, no linter is configured,
/// or a watched path does not exist.
async fn run_watch(args: &Args, paths: Vec<PathBuf>) -> Result<ExitCode> {
    let settings = Arc::new(ReloadingSettings::new(
        args.config.clone(),
        args.overrides(),
    )?);
    let config = settings.config();
    let linter = configured_linter(&config)?;

    info!("Starting lintwatch");
    info!("Linter: {} {}", linter.command(), linter.args().join(" "));
    info!("Debounce timeout: {}ms", config.timeout_ms);

    let colors = ColorConfig::new(args.nocolor);
    let out = stdout_writer();
    let editor = Arc::new(FsEditor::new(&paths, &config.extensions, &out, colors)?);
    info!("Watching {} file(s)", editor.views().len());

    let registry = FileRegistry::new();
    let wake = Arc::new(Notify::new());
    let redraw = wake.clone();
    let worker = WorkerHandle::new(registry.clone(), Arc::new(linter))
        .with_completion_hook(Arc::new(move |path: &Path| {
            debug!("Reports ready for {}", path.display());
            redraw.notify_one();
        }));

    let poll = PollLoop::new(editor, settings, registry, worker)
        .with_cadence(config.cadence())
        .with_extensions(config.extensions.clone());

    tokio::select! {
        () = poll.run(wake) => {}
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for shutdown signal")?;
            info!("Received shutdown signal");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Lints one file and prints `path:row:col: message` lines.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the linter fails.
fn run_check(args: &Args, file: &Path) -> Result<ExitCode> {
    let mut config = Config::load(args.config.as_deref())?;
    args.overrides().apply(&mut config);
    let linter = configured_linter(&config)?;

    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let output = linter
        .lint(file, &source)
        .with_context(|| format!("Failed to lint {}", file.display()))?;

    if !output.aux.is_null() {
        debug!("Linter returned extra data: {}", output.aux);
    }

    let reports = collect_reports(output.diagnostics);
    let colors = ColorConfig::new(args.nocolor);
    for report in reports.values() {
        println!(
            "{}",
            cli::report_line(&colors, file, report.row(), report.col(), report.message())
        );
    }

    if reports.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

fn configured_linter(config: &Config) -> Result<CommandLinter> {
    config.linter().ok_or_else(|| {
        anyhow!("No linter configured. Pass --lint or add a [linter] section to config.toml")
    })
}
