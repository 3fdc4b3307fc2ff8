// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Diagnostic records produced by a lint run.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Reports for one file, keyed by zero-based row.
///
/// At most one report surfaces per line, so a later record for a row that
/// is already present replaces the earlier one.
pub type Reports = BTreeMap<usize, ReportRecord>;

/// A single diagnostic attached to a row of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRecord {
    row: usize,
    col: usize,
    message: String,
}

impl ReportRecord {
    /// Creates a new `ReportRecord`.
    #[must_use]
    pub fn new(row: usize, col: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            col,
            message: message.into(),
        }
    }

    /// Zero-based row.
    #[must_use]
    pub const fn row(&self) -> usize {
        self.row
    }

    /// Zero-based column.
    #[must_use]
    pub const fn col(&self) -> usize {
        self.col
    }

    /// Diagnostic text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A diagnostic as emitted by a lint service, before validation.
///
/// Every field is optional on the wire: `row` and `col` default to 0 and
/// `msg` to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawDiagnostic {
    /// Zero-based row; negative rows are discarded.
    #[serde(default)]
    pub row: i64,
    /// Zero-based column; negative columns are clamped to 0.
    #[serde(default)]
    pub col: i64,
    /// Diagnostic text; empty messages are discarded.
    #[serde(default, alias = "message")]
    pub msg: String,
}

impl RawDiagnostic {
    /// Creates a new `RawDiagnostic`.
    #[must_use]
    pub fn new(row: i64, col: i64, msg: impl Into<String>) -> Self {
        Self {
            row,
            col,
            msg: msg.into(),
        }
    }

    /// Converts into a [`ReportRecord`], or `None` if the entry is malformed.
    #[must_use]
    pub fn into_record(self) -> Option<ReportRecord> {
        if self.msg.is_empty() {
            return None;
        }
        let row = usize::try_from(self.row).ok()?;
        let col = usize::try_from(self.col).unwrap_or(0);
        Some(ReportRecord::new(row, col, self.msg))
    }
}

/// Builds a row-keyed report set, dropping malformed entries.
pub fn collect_reports<I>(diagnostics: I) -> Reports
where
    I: IntoIterator<Item = RawDiagnostic>,
{
    diagnostics
        .into_iter()
        .filter_map(RawDiagnostic::into_record)
        .map(|record| (record.row(), record))
        .collect()
}
