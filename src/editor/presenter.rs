// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Renders a file's reports onto its view.

use super::view::{EditorView, Marker, MarkerStyle};
use crate::lint::Reports;

/// Status and marker key used when none is given.
pub const DEFAULT_DOMAIN: &str = "lintwatch";

const BUSY_PREFIX: &str = "\u{231B}";

/// What the poll loop hands to the presenter for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Current reports for the file.
    pub reports: Reports,
    /// A completed analysis is being shown for the first time; markers are
    /// redrawn.
    pub fresh: bool,
    /// An analysis is queued or running.
    pub busy: bool,
}

/// Draws status text and markers.
#[derive(Debug, Clone)]
pub struct Presenter {
    domain: String,
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new(DEFAULT_DOMAIN)
    }
}

impl Presenter {
    /// Creates a presenter that draws under `domain`.
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    /// The status/marker key.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Renders `frame` onto `view`.
    pub fn present(&self, view: &dyn EditorView, frame: &Frame) {
        if frame.fresh {
            // Only markers are cleared here; the status is rewritten below.
            view.erase_markers(&self.domain);
            let (markers, style) = markers_for(view, &frame.reports);
            if !markers.is_empty() {
                view.add_markers(&self.domain, &markers, style);
            }
        }

        let status = self.status_text(&frame.reports, view.cursor_row(), frame.busy);
        view.set_status(&self.domain, &status);
    }

    /// Clears everything this presenter drew on `view`.
    pub fn cleanup(&self, view: &dyn EditorView) {
        view.set_status(&self.domain, "");
        view.erase_markers(&self.domain);
    }

    /// Builds the status line, e.g. `lintwatch (2): unused import`.
    #[must_use]
    pub fn status_text(&self, reports: &Reports, cursor_row: usize, busy: bool) -> String {
        let mut msg = String::new();
        if !reports.is_empty() {
            msg = format!("{} ({})", self.domain, reports.len());
            if let Some(report) = reports.get(&cursor_row) {
                msg = format!("{msg}: {}", report.message());
            }
        }

        if busy {
            if msg.is_empty() {
                return BUSY_PREFIX.to_string();
            }
            msg = format!("{BUSY_PREFIX} {msg}");
        }
        msg
    }
}

/// Positions markers on the view, clamping columns to line ends.
fn markers_for(view: &dyn EditorView, reports: &Reports) -> (Vec<Marker>, MarkerStyle) {
    let mut style = MarkerStyle::Dot;
    let mut markers = Vec::with_capacity(reports.len());

    for report in reports.values() {
        let Some(len) = view.line_len(report.row()) else {
            continue;
        };
        if report.col() > 0 {
            style = MarkerStyle::Caret;
        }
        markers.push(Marker {
            row: report.row(),
            col: report.col().min(len),
            message: report.message().to_string(),
        });
    }

    (markers, style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::view::ViewId;
    use crate::lint::ReportRecord;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingView {
        lines: Vec<usize>,
        cursor: usize,
        status: Mutex<String>,
        history: Mutex<Vec<String>>,
        markers: Mutex<Option<(Vec<Marker>, MarkerStyle)>>,
        erased: Mutex<usize>,
    }

    impl EditorView for RecordingView {
        fn id(&self) -> ViewId {
            1
        }
        fn file_name(&self) -> Option<PathBuf> {
            Some(PathBuf::from("a.go"))
        }
        fn is_loading(&self) -> bool {
            false
        }
        fn has_window(&self) -> bool {
            true
        }
        fn text(&self) -> String {
            String::new()
        }
        fn cursor_row(&self) -> usize {
            self.cursor
        }
        fn line_len(&self, row: usize) -> Option<usize> {
            self.lines.get(row).copied()
        }
        fn set_status(&self, _key: &str, text: &str) {
            *self.status.lock().unwrap_or_else(std::sync::PoisonError::into_inner) =
                text.to_string();
            self.history
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(text.to_string());
        }
        fn add_markers(&self, _key: &str, markers: &[Marker], style: MarkerStyle) {
            *self.markers.lock().unwrap_or_else(std::sync::PoisonError::into_inner) =
                Some((markers.to_vec(), style));
        }
        fn erase_markers(&self, _key: &str) {
            *self.markers.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
            *self.erased.lock().unwrap_or_else(std::sync::PoisonError::into_inner) += 1;
        }
    }

    fn reports(items: &[(usize, usize, &str)]) -> Reports {
        items
            .iter()
            .map(|&(row, col, msg)| (row, ReportRecord::new(row, col, msg)))
            .collect()
    }

    #[test]
    fn test_status_text() {
        let presenter = Presenter::default();
        let set = reports(&[(2, 0, "unused import"), (5, 1, "shadowed")]);

        assert_eq!(presenter.status_text(&Reports::new(), 0, false), "");
        assert_eq!(presenter.status_text(&set, 0, false), "lintwatch (2)");
        assert_eq!(
            presenter.status_text(&set, 2, false),
            "lintwatch (2): unused import"
        );
        assert_eq!(
            presenter.status_text(&set, 5, true),
            "\u{231B} lintwatch (2): shadowed"
        );
        assert_eq!(presenter.status_text(&Reports::new(), 0, true), "\u{231B}");
    }

    #[test]
    fn test_fresh_frame_draws_clamped_markers() {
        let view = RecordingView {
            lines: vec![10, 3, 8],
            cursor: 1,
            ..RecordingView::default()
        };
        let frame = Frame {
            reports: reports(&[(1, 7, "too far"), (2, 0, "dot"), (9, 0, "past end")]),
            fresh: true,
            busy: false,
        };

        Presenter::default().present(&view, &frame);

        let drawn = view
            .markers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        let (markers, style) = drawn.unwrap_or((Vec::new(), MarkerStyle::Dot));
        assert_eq!(style, MarkerStyle::Caret);
        assert_eq!(markers.len(), 2);
        assert_eq!((markers[0].row, markers[0].col), (1, 3));
        assert_eq!((markers[1].row, markers[1].col), (2, 0));
        assert_eq!(
            *view.status.lock().unwrap_or_else(std::sync::PoisonError::into_inner),
            "lintwatch (3): too far"
        );
    }

    #[test]
    fn test_stale_frame_keeps_markers() {
        let view = RecordingView {
            lines: vec![4],
            ..RecordingView::default()
        };
        let frame = Frame {
            reports: reports(&[(0, 0, "x")]),
            fresh: false,
            busy: false,
        };

        Presenter::default().present(&view, &frame);

        assert_eq!(
            *view.erased.lock().unwrap_or_else(std::sync::PoisonError::into_inner),
            0
        );
        assert!(
            view.markers
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .is_none()
        );
    }

    #[test]
    fn test_fresh_empty_frame_erases() {
        let view = RecordingView::default();
        let frame = Frame {
            fresh: true,
            ..Frame::default()
        };

        Presenter::default().present(&view, &frame);

        assert!(
            *view.erased.lock().unwrap_or_else(std::sync::PoisonError::into_inner) >= 1
        );
        assert_eq!(
            *view.status.lock().unwrap_or_else(std::sync::PoisonError::into_inner),
            ""
        );
    }

    #[test]
    fn test_fresh_frame_never_blanks_status() {
        let view = RecordingView {
            lines: vec![9, 0, 12],
            ..RecordingView::default()
        };
        let presenter = Presenter::default();

        presenter.present(
            &view,
            &Frame {
                busy: true,
                ..Frame::default()
            },
        );
        presenter.present(
            &view,
            &Frame {
                reports: reports(&[(2, 7, "unused")]),
                fresh: true,
                busy: false,
            },
        );

        assert_eq!(
            *view.history.lock().unwrap_or_else(std::sync::PoisonError::into_inner),
            vec!["\u{231B}".to_string(), "lintwatch (1)".to_string()]
        );
        assert!(
            view.markers
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .is_some()
        );
    }
}
