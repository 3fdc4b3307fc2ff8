// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! A configurable mock linter for testing.
//!
//! Reads source on stdin and reports every line matching one of the
//! `--pattern` regexes as a JSON diagnostic. CLI flags control timing,
//! output shape, and failure modes.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};

/// Mock linter for integration testing.
#[derive(Parser, Debug)]
#[command(name = "mocklint")]
#[allow(
    clippy::struct_excessive_bools,
    reason = "CLI flags are inherently boolean"
)]
struct Args {
    /// Report lines matching this regex (repeatable).
    #[arg(long, default_value = "unused")]
    pattern: Vec<String>,

    /// Sleep before reporting (milliseconds).
    #[arg(long, default_value_t = 0)]
    delay: u64,

    /// Print garbage and exit with status 2.
    #[arg(long)]
    fail: bool,

    /// Print nothing on stdout and exit with status 4.
    #[arg(long)]
    crash: bool,

    /// Mix entries the coordinator must drop into the output.
    #[arg(long)]
    malformed: bool,

    /// Wrap diagnostics in an object with extra fields.
    #[arg(long)]
    envelope: bool,

    /// Path of the file being linted. Only echoed back.
    path: Option<PathBuf>,
}

/// One reported line.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct Diagnostic {
    row: usize,
    col: usize,
    msg: String,
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|p| Regex::new(p)).collect()
}

/// Report the first match of any pattern on each line. Columns count chars.
fn scan(source: &str, patterns: &[Regex]) -> Vec<Diagnostic> {
    source
        .lines()
        .enumerate()
        .filter_map(|(row, line)| {
            patterns.iter().find_map(|re| {
                re.find(line).map(|m| Diagnostic {
                    row,
                    col: line[..m.start()].chars().count(),
                    msg: format!("mocklint: matched `{}`", m.as_str()),
                })
            })
        })
        .collect()
}

fn render(args: &Args, diagnostics: &[Diagnostic]) -> Result<String, serde_json::Error> {
    let mut entries: Vec<Value> = diagnostics
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()?;

    if args.malformed {
        entries.push(json!({ "row": "first", "col": 0, "msg": "wrong type" }));
        entries.push(json!({ "row": -1, "col": 0, "msg": "negative row" }));
        entries.push(json!({ "row": 0, "col": 0, "msg": "" }));
        entries.push(json!("not an object"));
    }

    let value = if args.envelope {
        json!({
            "diagnostics": entries,
            "linter": "mocklint",
            "path": args.path.as_ref().map(|p| p.display().to_string()),
        })
    } else {
        Value::Array(entries)
    };

    serde_json::to_string(&value)
}

fn run(args: &Args, source: &str, out: &mut dyn Write) -> std::io::Result<ExitCode> {
    if args.delay > 0 {
        std::thread::sleep(Duration::from_millis(args.delay));
    }

    if args.crash {
        let mut err = std::io::stderr().lock();
        writeln!(err, "mocklint: crashed")?;
        return Ok(ExitCode::from(4));
    }

    if args.fail {
        writeln!(out, "mocklint: internal error")?;
        let mut err = std::io::stderr().lock();
        writeln!(err, "mocklint: failure requested")?;
        return Ok(ExitCode::from(2));
    }

    let patterns = compile(&args.pattern).map_err(std::io::Error::other)?;
    let diagnostics = scan(source, &patterns);
    let rendered = render(args, &diagnostics).map_err(std::io::Error::other)?;
    writeln!(out, "{rendered}")?;
    out.flush()?;

    if diagnostics.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut source = String::new();
    if std::io::stdin().lock().read_to_string(&mut source).is_err() {
        return ExitCode::from(3);
    }

    let mut stdout = std::io::stdout().lock();
    run(&args, &source, &mut stdout).unwrap_or(ExitCode::from(3))
}
