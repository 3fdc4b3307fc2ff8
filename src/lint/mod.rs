// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

/// Diagnostic records and validation.
pub mod report;
/// The lint service trait and the external command implementation.
pub mod service;

pub use report::{RawDiagnostic, ReportRecord, Reports, collect_reports};
pub use service::{CommandLinter, LintError, LintOutput, LintService, parse_output};
