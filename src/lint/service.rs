// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! The lint service boundary.
//!
//! The coordinator only needs one operation from a linter: given a file and
//! the current buffer contents, return diagnostics. [`CommandLinter`] provides
//! that by running an external process; tests usually pass a closure.

use serde_json::Value;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, trace};

use super::report::RawDiagnostic;

/// Errors returned by a [`LintService`].
#[derive(Debug, Error)]
pub enum LintError {
    /// The linter process could not be started.
    #[error("failed to spawn linter `{command}`: {source}")]
    Spawn {
        /// The command that failed to start.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// I/O error while talking to the linter.
    #[error("linter I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The linter exited unsuccessfully without usable output.
    #[error("linter exited with status {status:?}: {stderr}")]
    Failed {
        /// Exit code, if the process was not killed by a signal.
        status: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },
    /// The linter produced output that is not a diagnostics list.
    #[error("unreadable lint output: {0}")]
    Parse(String),
}

/// Result of one lint invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LintOutput {
    /// Diagnostics in the order the linter reported them.
    pub diagnostics: Vec<RawDiagnostic>,
    /// Any extra data the linter returned alongside the diagnostics.
    pub aux: Value,
}

impl LintOutput {
    /// Creates an output with diagnostics and no auxiliary data.
    #[must_use]
    pub const fn new(diagnostics: Vec<RawDiagnostic>) -> Self {
        Self {
            diagnostics,
            aux: Value::Null,
        }
    }
}

/// Runs a lint analysis over a source snapshot.
///
/// Implementations may be slow and are called from the background worker
/// thread, never from the poll loop.
pub trait LintService: Send + Sync {
    /// Lints `source`, the current contents of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the analysis could not be performed at all.
    fn lint(&self, path: &Path, source: &str) -> Result<LintOutput, LintError>;
}

impl<F> LintService for F
where
    F: Fn(&Path, &str) -> Result<LintOutput, LintError> + Send + Sync,
{
    fn lint(&self, path: &Path, source: &str) -> Result<LintOutput, LintError> {
        self(path, source)
    }
}

/// Lints by running an external command.
///
/// The command is invoked as `<command> <args..> <path>` with the buffer
/// contents on stdin. Standard output must be a JSON array of diagnostics,
/// or an object whose `diagnostics` field holds that array.
#[derive(Debug, Clone)]
pub struct CommandLinter {
    command: String,
    args: Vec<String>,
}

impl CommandLinter {
    /// Creates a new `CommandLinter`.
    #[must_use]
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// Parses a whitespace separated command line such as `"golint -json"`.
    ///
    /// Returns `None` for an empty string.
    #[must_use]
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let command = parts.next()?;
        Some(Self::new(
            command,
            parts.map(std::string::ToString::to_string).collect(),
        ))
    }

    /// The program being run.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Arguments placed before the file path.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl LintService for CommandLinter {
    fn lint(&self, path: &Path, source: &str) -> Result<LintOutput, LintError> {
        debug!("Running {} on {}", self.command, path.display());

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| LintError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::other("linter stdin unavailable"))?;

        // Feed stdin from a separate thread so a linter that writes a lot
        // before draining its input cannot deadlock us.
        let input = source.to_owned();
        let feeder = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child.wait_with_output()?;

        match feeder.join() {
            Ok(Err(e)) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e.into()),
            Err(_) => return Err(std::io::Error::other("stdin feeder panicked").into()),
            _ => {}
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        trace!("Linter stdout: {stdout}");

        let failed = || LintError::Failed {
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };

        // Silence only means "clean" when the linter also exited cleanly.
        if stdout.trim().is_empty() && !output.status.success() {
            return Err(failed());
        }

        // Most linters exit non-zero when they found something, so usable
        // output wins over the exit status.
        match parse_output(&stdout) {
            Ok(parsed) => Ok(parsed),
            Err(e) if output.status.success() => Err(e),
            Err(_) => Err(failed()),
        }
    }
}

/// Parses linter output into a [`LintOutput`].
///
/// Entries that do not deserialize as a diagnostic are skipped individually.
///
/// # Errors
///
/// Returns [`LintError::Parse`] if the output is not JSON, or is JSON of the
/// wrong shape.
pub fn parse_output(stdout: &str) -> Result<LintOutput, LintError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(LintOutput::default());
    }

    let value: Value = serde_json::from_str(trimmed).map_err(|e| LintError::Parse(e.to_string()))?;

    match value {
        Value::Array(entries) => Ok(LintOutput::new(parse_entries(entries))),
        Value::Object(mut fields) => {
            let diagnostics = match fields.remove("diagnostics") {
                Some(Value::Array(entries)) => parse_entries(entries),
                None | Some(Value::Null) => Vec::new(),
                Some(other) => {
                    return Err(LintError::Parse(format!(
                        "`diagnostics` must be an array, got {other}"
                    )));
                }
            };
            let aux = if fields.is_empty() {
                Value::Null
            } else {
                Value::Object(fields)
            };
            Ok(LintOutput { diagnostics, aux })
        }
        other => Err(LintError::Parse(format!(
            "expected an array or object, got {other}"
        ))),
    }
}

fn parse_entries(entries: Vec<Value>) -> Vec<RawDiagnostic> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(diag) => Some(diag),
            Err(e) => {
                debug!("Skipping malformed diagnostic: {e}");
                None
            }
        })
        .collect()
}
