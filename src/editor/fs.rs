// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! A filesystem-backed editor for running outside a host editor.
//!
//! Every watched file is a view whose buffer is the file on disk. The
//! most recently modified file counts as the active view, so saving a file
//! "focuses" it. Status changes and markers are written as lines to a
//! shared writer, normally the terminal.

use anyhow::{Result, anyhow};
use chrono::Local;
use ignore::WalkBuilder;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;
use tracing::{debug, warn};

use super::view::{Editor, EditorView, Marker, MarkerStyle, ViewId, ViewRef};
use crate::cli::{self, ColorConfig};

/// Thread-safe line sink. Wraps `std::io::Stdout` in the binary, or a
/// shared buffer in tests.
pub type Writer = Arc<Mutex<Box<dyn Write + Send>>>;

/// Create a writer that forwards to stdout.
#[must_use]
pub fn stdout_writer() -> Writer {
    Arc::new(Mutex::new(Box::new(std::io::stdout())))
}

/// A file on disk presented as an editor view.
pub struct FsView {
    id: ViewId,
    path: PathBuf,
    out: Writer,
    colors: ColorConfig,
    statuses: Mutex<HashMap<String, String>>,
}

impl FsView {
    /// Creates a view of `path`.
    #[must_use]
    pub fn new(id: ViewId, path: PathBuf, out: Writer, colors: ColorConfig) -> Self {
        Self {
            id,
            path,
            out,
            colors,
            statuses: Mutex::new(HashMap::new()),
        }
    }

    /// The watched path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modified(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    fn emit(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            debug!("Failed to write status line: {e}");
        }
    }
}

impl EditorView for FsView {
    fn id(&self) -> ViewId {
        self.id
    }

    fn file_name(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }

    fn is_loading(&self) -> bool {
        false
    }

    fn has_window(&self) -> bool {
        self.path.is_file()
    }

    fn text(&self) -> String {
        match std::fs::read(&self.path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!("Failed to read {}: {e}", self.path.display());
                String::new()
            }
        }
    }

    fn cursor_row(&self) -> usize {
        0
    }

    fn line_len(&self, row: usize) -> Option<usize> {
        self.text().lines().nth(row).map(|line| line.chars().count())
    }

    fn set_status(&self, key: &str, text: &str) {
        {
            let mut statuses = self.statuses.lock().unwrap_or_else(PoisonError::into_inner);
            let previous = statuses.get(key).map_or("", String::as_str);
            if previous == text {
                return;
            }
            statuses.insert(key.to_string(), text.to_string());
        }

        let time = Local::now().format("%H:%M:%S").to_string();
        let path = self.path.display().to_string();
        let budget = cli::terminal_width()
            .saturating_sub(time.chars().count() + path.chars().count() + 3)
            .max(20);
        let text = cli::truncate(text, budget);

        let shown = if text.is_empty() {
            self.colors.green("ok")
        } else if text.starts_with('\u{231B}') {
            self.colors.yellow(&text)
        } else {
            text
        };
        self.emit(&format!(
            "{} {}: {shown}",
            self.colors.dim(&time),
            self.colors.cyan(&path),
        ));
    }

    fn add_markers(&self, _key: &str, markers: &[Marker], _style: MarkerStyle) {
        for marker in markers {
            let line = cli::report_line(
                &self.colors,
                &self.path,
                marker.row,
                marker.col,
                &marker.message,
            );
            self.emit(&format!("  {line}"));
        }
    }

    fn erase_markers(&self, _key: &str) {
        // Lines already written to a terminal stay there.
    }
}

/// A set of watched files.
pub struct FsEditor {
    views: Vec<Arc<FsView>>,
}

impl FsEditor {
    /// Watches `paths`. Directories are walked recursively, honouring
    /// ignore files, and contribute the files whose extension is in
    /// `extensions` (every file when empty). Files named directly are
    /// always watched.
    ///
    /// # Errors
    ///
    /// Returns an error if a path does not exist or nothing is left to watch.
    pub fn new(
        paths: &[PathBuf],
        extensions: &[String],
        out: &Writer,
        colors: ColorConfig,
    ) -> Result<Self> {
        let mut files = Vec::new();
        for path in paths {
            if path.is_dir() {
                files.extend(walk(path, extensions));
            } else if path.is_file() {
                files.push(path.clone());
            } else {
                return Err(anyhow!("No such file or directory: {}", path.display()));
            }
        }
        files.sort();
        files.dedup();

        if files.is_empty() {
            return Err(anyhow!("Nothing to watch"));
        }

        let views = files
            .into_iter()
            .zip(1..)
            .map(|(path, id)| Arc::new(FsView::new(id, path, out.clone(), colors)))
            .collect();

        Ok(Self { views })
    }

    /// The watched views.
    #[must_use]
    pub fn views(&self) -> &[Arc<FsView>] {
        &self.views
    }
}

impl Editor for FsEditor {
    fn active_view(&self) -> Option<ViewRef> {
        self.views
            .iter()
            .filter_map(|view| view.modified().map(|mtime| (mtime, view)))
            .max_by_key(|(mtime, _)| *mtime)
            .map(|(_, view)| -> ViewRef { view.clone() })
    }
}

fn walk(dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkBuilder::new(dir).build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {e}", dir.display());
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.into_path();
        let wanted = extensions.is_empty()
            || path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| extensions.iter().any(|e| e.trim_start_matches('.') == ext));
        if wanted {
            files.push(path);
        }
    }
    files
}
