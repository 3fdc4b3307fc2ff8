/*
 * Copyright (C) 2026 Mark Wells Dev
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Host editor abstractions.

use std::path::PathBuf;
use std::sync::Arc;

/// Identifies a view instance. Two views showing the same file (split
/// panes) have different ids.
pub type ViewId = u64;

/// Shared handle to a view.
pub type ViewRef = Arc<dyn EditorView>;

/// How a batch of markers is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    /// A gutter dot for the whole line.
    Dot,
    /// A caret at the reported column.
    Caret,
}

/// A marker placed at a buffer position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Zero-based row.
    pub row: usize,
    /// Zero-based column, already clamped to the line length.
    pub col: usize,
    /// The message the marker stands for.
    pub message: String,
}

/// A buffer displayed by the host editor.
///
/// Reads are cheap snapshots. Drawing methods are only called by the
/// [`Presenter`](super::Presenter).
pub trait EditorView: Send + Sync {
    /// The view instance id.
    fn id(&self) -> ViewId;

    /// The file shown in this view, if it has one.
    fn file_name(&self) -> Option<PathBuf>;

    /// Whether the buffer is still loading.
    fn is_loading(&self) -> bool;

    /// Whether the view is still attached to a window. A view with no
    /// window has been closed.
    fn has_window(&self) -> bool;

    /// The full buffer text.
    fn text(&self) -> String;

    /// Row of the primary cursor.
    fn cursor_row(&self) -> usize;

    /// Length of `row` in characters, or `None` past the end of the buffer.
    fn line_len(&self, row: usize) -> Option<usize>;

    /// Sets the status text stored under `key`. An empty string clears it.
    fn set_status(&self, key: &str, text: &str);

    /// Replaces the markers stored under `key`.
    fn add_markers(&self, key: &str, markers: &[Marker], style: MarkerStyle);

    /// Removes the markers stored under `key`.
    fn erase_markers(&self, key: &str);
}

/// The host editor.
pub trait Editor: Send + Sync {
    /// The focused, valid view, if any.
    fn active_view(&self) -> Option<ViewRef>;
}
