// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Foreground poll loop and debounce state machine.
//!
//! Each tick looks at the active view, records edits, and hands a file to
//! the worker once its contents have been unchanged for the configured
//! timeout:
//!
//! ```text
//! Idle --(settled)--> Queued --(worker done)--> Ready --(rendered)--> Idle
//! ```
//!
//! While linting is disabled the loop drops every tracked file and backs
//! off to the idle cadence, only checking whether it was re-enabled.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::{debug, warn};

use super::registry::{FileRegistry, FileState, Lifecycle};
use super::worker::WorkerHandle;
use crate::config::SettingsSource;
use crate::editor::{Editor, EditorView, Frame, Presenter, ViewRef};

/// Poll intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    /// Interval while linting is enabled.
    pub active: Duration,
    /// Interval while linting is disabled.
    pub idle: Duration,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            active: Duration::from_millis(500),
            idle: Duration::from_millis(2000),
        }
    }
}

/// Drives the per-file state machine from the foreground.
pub struct PollLoop {
    editor: Arc<dyn Editor>,
    settings: Arc<dyn SettingsSource>,
    registry: FileRegistry,
    worker: WorkerHandle,
    presenter: Presenter,
    cadence: Cadence,
    extensions: Vec<String>,
}

impl PollLoop {
    /// Creates a poll loop with the default presenter and cadence.
    #[must_use]
    pub fn new(
        editor: Arc<dyn Editor>,
        settings: Arc<dyn SettingsSource>,
        registry: FileRegistry,
        worker: WorkerHandle,
    ) -> Self {
        Self {
            editor,
            settings,
            registry,
            worker,
            presenter: Presenter::default(),
            cadence: Cadence::default(),
            extensions: Vec::new(),
        }
    }

    /// Uses `presenter` for drawing.
    #[must_use]
    pub fn with_presenter(mut self, presenter: Presenter) -> Self {
        self.presenter = presenter;
        self
    }

    /// Uses `cadence` for rescheduling.
    #[must_use]
    pub const fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// Restricts linting to files with one of `extensions`. An empty list
    /// accepts every file.
    #[must_use]
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_string())
            .collect();
        self
    }

    /// The shared registry.
    #[must_use]
    pub const fn registry(&self) -> &FileRegistry {
        &self.registry
    }

    /// The worker handle.
    #[must_use]
    pub const fn worker(&self) -> &WorkerHandle {
        &self.worker
    }

    /// Runs one tick now. Returns the delay before the next tick.
    pub fn tick(&self) -> Duration {
        self.tick_at(Instant::now())
    }

    /// Runs one tick as if the current time were `now`.
    pub fn tick_at(&self, now: Instant) -> Duration {
        let settings = self.settings.settings();
        if !settings.enabled {
            let views = self.registry.clear();
            if !views.is_empty() {
                debug!("Linting disabled, dropping {} file(s)", views.len());
            }
            for view in views {
                self.presenter.cleanup(view.as_ref());
            }
            return self.cadence.idle;
        }

        let Some(view) = self.editor.active_view().filter(|v| !v.is_loading()) else {
            return self.cadence.active;
        };
        let Some(path) = view.file_name() else {
            return self.cadence.active;
        };
        if !self.is_eligible(&path) {
            return self.cadence.active;
        }

        let frame = if self.registry.prune_and_contains(&path) {
            self.registry.update(&path, |state| observe(state, &view))
        } else {
            debug!("Tracking {}", path.display());
            self.registry.set(path.clone(), FileState::new(view.clone()));
            None
        };

        let idle = match &frame {
            Some(frame) => {
                self.presenter.present(view.as_ref(), frame);
                !frame.busy
            }
            None => true,
        };

        if idle {
            self.debounce(&path, view.as_ref(), settings.timeout, now);
        }

        self.cadence.active
    }

    /// Ticks forever. `wake` cuts the current wait short, e.g. when the
    /// worker has stored new reports.
    pub async fn run(self, wake: Arc<Notify>) {
        loop {
            let delay = self.tick();
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = wake.notified() => {
                    debug!("Redraw requested");
                }
            }
        }
    }

    fn is_eligible(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    fn debounce(&self, path: &Path, view: &dyn EditorView, timeout: Duration, now: Instant) {
        let source = view.text();
        let Some(changed_at) = self
            .registry
            .update(path, |state| settle(state, source, now, timeout))
            .flatten()
        else {
            return;
        };

        if let Err(e) = self.worker.ensure_started() {
            warn!("Failed to start lint worker: {e}");
            self.registry.update(path, |state| {
                state.lifecycle = Lifecycle::Idle;
                state.last_change = Some(changed_at);
            });
            return;
        }

        if self.worker.try_enqueue(path.to_path_buf()) {
            debug!("Queued {}", path.display());
        } else {
            debug!("{} already pending", path.display());
        }
    }
}

/// Binds the entry to the active view and consumes a pending render.
fn observe(state: &mut FileState, view: &ViewRef) -> Frame {
    if state.view.id() != view.id() {
        debug!("Rebinding to view {}", view.id());
        state.view = view.clone();
    }

    let fresh = state.lifecycle == Lifecycle::Ready;
    if fresh {
        state.lifecycle = Lifecycle::Idle;
    }

    Frame {
        reports: state.reports.clone(),
        fresh,
        busy: state.lifecycle == Lifecycle::Queued,
    }
}

/// Records `source` and decides whether the file has settled.
///
/// On settle the entry moves to `Queued` and the time of the change that
/// settled is returned.
fn settle(
    state: &mut FileState,
    source: String,
    now: Instant,
    timeout: Duration,
) -> Option<Instant> {
    if state.lifecycle != Lifecycle::Idle {
        return None;
    }

    if source != state.last_source {
        state.last_source = source;
        state.last_change = Some(now);
    }

    let changed_at = state.last_change?;
    if now.saturating_duration_since(changed_at) < timeout {
        return None;
    }

    state.last_change = None;
    state.lifecycle = Lifecycle::Queued;
    Some(changed_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LintSettings;
    use crate::editor::{Marker, MarkerStyle, ViewId};
    use crate::lint::{LintError, LintOutput, ReportRecord};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Mutex, PoisonError, RwLock};

    const TIMEOUT: Duration = Duration::from_millis(500);

    struct FakeView {
        id: ViewId,
        file: Option<PathBuf>,
        text: Mutex<String>,
        loading: AtomicBool,
        open: AtomicBool,
        status: Mutex<String>,
        cleanups: Mutex<usize>,
        drawn: Mutex<usize>,
    }

    impl FakeView {
        fn new(id: ViewId, file: &str, text: &str) -> Arc<Self> {
            Arc::new(Self {
                id,
                file: Some(PathBuf::from(file)),
                text: Mutex::new(text.to_string()),
                loading: AtomicBool::new(false),
                open: AtomicBool::new(true),
                status: Mutex::new(String::new()),
                cleanups: Mutex::new(0),
                drawn: Mutex::new(0),
            })
        }

        fn edit(&self, text: &str) {
            *self.text.lock().unwrap_or_else(PoisonError::into_inner) = text.to_string();
        }

        fn status(&self) -> String {
            self.status.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }

        fn counts(&self) -> (usize, usize) {
            (
                *self.cleanups.lock().unwrap_or_else(PoisonError::into_inner),
                *self.drawn.lock().unwrap_or_else(PoisonError::into_inner),
            )
        }
    }

    impl EditorView for FakeView {
        fn id(&self) -> ViewId {
            self.id
        }
        fn file_name(&self) -> Option<PathBuf> {
            self.file.clone()
        }
        fn is_loading(&self) -> bool {
            self.loading.load(Ordering::SeqCst)
        }
        fn has_window(&self) -> bool {
            self.open.load(Ordering::SeqCst)
        }
        fn text(&self) -> String {
            self.text.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }
        fn cursor_row(&self) -> usize {
            0
        }
        fn line_len(&self, _row: usize) -> Option<usize> {
            Some(40)
        }
        fn set_status(&self, _key: &str, text: &str) {
            *self.status.lock().unwrap_or_else(PoisonError::into_inner) = text.to_string();
        }
        fn add_markers(&self, _key: &str, _markers: &[Marker], _style: MarkerStyle) {
            *self.drawn.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        }
        fn erase_markers(&self, _key: &str) {
            *self.cleanups.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        }
    }

    #[derive(Default)]
    struct FakeEditor {
        active: Mutex<Option<ViewRef>>,
    }

    impl FakeEditor {
        fn focus(&self, view: Option<Arc<FakeView>>) {
            *self.active.lock().unwrap_or_else(PoisonError::into_inner) =
                view.map(|v| -> ViewRef { v });
        }
    }

    impl Editor for FakeEditor {
        fn active_view(&self) -> Option<ViewRef> {
            self.active.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }
    }

    struct Switch(RwLock<LintSettings>);

    impl SettingsSource for Switch {
        fn settings(&self) -> LintSettings {
            *self.0.read().unwrap_or_else(PoisonError::into_inner)
        }
    }

    struct Harness {
        editor: Arc<FakeEditor>,
        settings: Arc<Switch>,
        poll: PollLoop,
    }

    impl Harness {
        /// A poll loop whose worker is marked started but never runs, so
        /// queued paths stay in the queue for inspection.
        fn new() -> Self {
            let editor = Arc::new(FakeEditor::default());
            let settings = Arc::new(Switch(RwLock::new(LintSettings {
                enabled: true,
                timeout: TIMEOUT,
            })));
            let registry = FileRegistry::new();
            let worker = WorkerHandle::new(
                registry.clone(),
                Arc::new(|_: &Path, _: &str| -> Result<LintOutput, LintError> {
                    Ok(LintOutput::default())
                }),
            );
            worker.hold();
            let poll = PollLoop::new(editor.clone(), settings.clone(), registry, worker);
            Self {
                editor,
                settings,
                poll,
            }
        }

        fn state(&self, path: &str) -> Option<FileState> {
            self.poll.registry().get(Path::new(path))
        }

        fn lifecycle(&self, path: &str) -> Option<Lifecycle> {
            self.state(path).map(|s| s.lifecycle)
        }

        fn queued(&self) -> usize {
            self.poll.worker().queue().len()
        }
    }

    #[test]
    fn test_debounce_waits_for_timeout() {
        let h = Harness::new();
        let view = FakeView::new(1, "a.go", "package a");
        h.editor.focus(Some(view));
        let t0 = Instant::now();

        assert_eq!(h.poll.tick_at(t0), Duration::from_millis(500));
        assert_eq!(h.lifecycle("a.go"), Some(Lifecycle::Idle));
        assert_eq!(
            h.state("a.go").map(|s| s.last_source),
            Some("package a".to_string())
        );

        h.poll.tick_at(t0 + Duration::from_millis(300));
        assert_eq!(h.lifecycle("a.go"), Some(Lifecycle::Idle));
        assert_eq!(h.queued(), 0);

        h.poll.tick_at(t0 + Duration::from_millis(600));
        assert_eq!(h.lifecycle("a.go"), Some(Lifecycle::Queued));
        assert_eq!(h.queued(), 1);
        assert!(h.state("a.go").is_some_and(|s| s.last_change.is_none()));
    }

    #[test]
    fn test_settles_exactly_at_timeout() {
        let h = Harness::new();
        h.editor.focus(Some(FakeView::new(1, "a.go", "x")));
        let t0 = Instant::now();

        h.poll.tick_at(t0);
        h.poll.tick_at(t0 + TIMEOUT - Duration::from_millis(1));
        assert_eq!(h.queued(), 0);
        h.poll.tick_at(t0 + TIMEOUT);
        assert_eq!(h.queued(), 1);
    }

    #[test]
    fn test_rapid_edits_enqueue_once() {
        let h = Harness::new();
        let view = FakeView::new(1, "a.go", "p");
        h.editor.focus(Some(view.clone()));
        let t0 = Instant::now();

        for (i, text) in ["pa", "pac", "pack", "packa"].iter().enumerate() {
            view.edit(text);
            h.poll
                .tick_at(t0 + Duration::from_millis(400 * u64::try_from(i).unwrap_or(0)));
            assert_eq!(h.queued(), 0, "enqueued while still typing");
        }

        // Last edit at t0 + 1200ms.
        h.poll.tick_at(t0 + Duration::from_millis(1600));
        assert_eq!(h.queued(), 0);
        h.poll.tick_at(t0 + Duration::from_millis(1700));
        assert_eq!(h.queued(), 1);
        h.poll.tick_at(t0 + Duration::from_millis(5000));
        assert_eq!(h.queued(), 1);
    }

    #[test]
    fn test_queued_file_not_reread() {
        let h = Harness::new();
        let view = FakeView::new(1, "a.go", "v1");
        h.editor.focus(Some(view.clone()));
        let t0 = Instant::now();

        h.poll.tick_at(t0);
        h.poll.tick_at(t0 + TIMEOUT);
        assert_eq!(h.lifecycle("a.go"), Some(Lifecycle::Queued));

        view.edit("v2");
        h.poll.tick_at(t0 + TIMEOUT * 3);
        assert_eq!(
            h.state("a.go").map(|s| s.last_source),
            Some("v1".to_string())
        );
        assert!(view.status().starts_with('\u{231B}'));
    }

    #[test]
    fn test_ready_rendered_once() {
        let h = Harness::new();
        let view = FakeView::new(1, "a.go", "package a");
        h.editor.focus(Some(view.clone()));
        let t0 = Instant::now();
        h.poll.tick_at(t0);

        h.poll.registry().update(Path::new("a.go"), |s| {
            s.reports = [(2, ReportRecord::new(2, 0, "unused import"))].into();
            s.lifecycle = Lifecycle::Ready;
        });

        h.poll.tick_at(t0 + Duration::from_millis(100));
        assert_eq!(h.lifecycle("a.go"), Some(Lifecycle::Idle));
        assert_eq!(view.status(), "lintwatch (1)");
        let redraws = *view.cleanups.lock().unwrap_or_else(PoisonError::into_inner);

        h.poll.tick_at(t0 + Duration::from_millis(200));
        assert_eq!(
            *view.cleanups.lock().unwrap_or_else(PoisonError::into_inner),
            redraws
        );
    }

    #[test]
    fn test_disable_clears_everything() {
        let h = Harness::new();
        let a = FakeView::new(1, "a.go", "a");
        let b = FakeView::new(2, "b.go", "b");
        let t0 = Instant::now();

        h.editor.focus(Some(a.clone()));
        h.poll.tick_at(t0);
        h.editor.focus(Some(b.clone()));
        h.poll.tick_at(t0);
        assert_eq!(h.poll.registry().len(), 2);

        h.settings
            .0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .enabled = false;

        assert_eq!(h.poll.tick_at(t0), Duration::from_millis(2000));
        assert!(h.poll.registry().is_empty());
        for view in [&a, &b] {
            assert_eq!(
                *view.cleanups.lock().unwrap_or_else(PoisonError::into_inner),
                1
            );
        }

        // Stays idle while disabled.
        assert_eq!(h.poll.tick_at(t0), Duration::from_millis(2000));
        assert!(h.poll.registry().is_empty());
    }

    #[test]
    fn test_split_view_rebinds() {
        let h = Harness::new();
        let left = FakeView::new(1, "a.go", "a");
        let right = FakeView::new(2, "a.go", "a");
        let t0 = Instant::now();

        h.editor.focus(Some(left));
        h.poll.tick_at(t0);
        h.editor.focus(Some(right));
        h.poll.tick_at(t0);

        assert_eq!(h.poll.registry().len(), 1);
        assert_eq!(h.state("a.go").map(|s| s.view.id()), Some(2));
    }

    #[test]
    fn test_split_view_takes_over_pending_render() {
        let h = Harness::new();
        let left = FakeView::new(1, "a.go", "package a");
        let right = FakeView::new(2, "a.go", "package a");
        let t0 = Instant::now();

        h.editor.focus(Some(left.clone()));
        h.poll.tick_at(t0);
        h.poll.registry().update(Path::new("a.go"), |s| {
            s.reports = [(2, ReportRecord::new(2, 0, "unused import"))].into();
            s.lifecycle = Lifecycle::Ready;
        });

        h.editor.focus(Some(right.clone()));
        h.poll.tick_at(t0 + Duration::from_millis(100));

        assert_eq!(h.state("a.go").map(|s| s.view.id()), Some(2));
        assert_eq!(h.lifecycle("a.go"), Some(Lifecycle::Idle));
        assert_eq!(right.status(), "lintwatch (1)");
        assert_eq!(right.counts(), (1, 1));
        assert_eq!(left.counts(), (0, 0));

        h.poll.tick_at(t0 + Duration::from_millis(200));
        assert_eq!(right.counts(), (1, 1), "pending render consumed once");
    }

    #[test]
    fn test_closed_views_pruned() {
        let h = Harness::new();
        let a = FakeView::new(1, "a.go", "a");
        let b = FakeView::new(2, "b.go", "b");
        let t0 = Instant::now();

        h.editor.focus(Some(a.clone()));
        h.poll.tick_at(t0);
        a.open.store(false, Ordering::SeqCst);

        h.editor.focus(Some(b));
        h.poll.tick_at(t0);

        assert!(h.state("a.go").is_none());
        assert!(h.state("b.go").is_some());
    }

    #[test]
    fn test_skips_loading_and_unnamed_views() {
        let h = Harness::new();
        let loading = FakeView::new(1, "a.go", "a");
        loading.loading.store(true, Ordering::SeqCst);
        h.editor.focus(Some(loading));
        assert_eq!(h.poll.tick_at(Instant::now()), Duration::from_millis(500));
        assert!(h.poll.registry().is_empty());

        h.editor.focus(None);
        assert_eq!(h.poll.tick_at(Instant::now()), Duration::from_millis(500));
        assert!(h.poll.registry().is_empty());
    }

    #[test]
    fn test_extension_filter() {
        let mut h = Harness::new();
        h.poll = h.poll.with_extensions(vec![".go".to_string()]);

        h.editor.focus(Some(FakeView::new(1, "notes.md", "x")));
        h.poll.tick_at(Instant::now());
        assert!(h.poll.registry().is_empty());

        h.editor.focus(Some(FakeView::new(2, "a.go", "x")));
        h.poll.tick_at(Instant::now());
        assert_eq!(h.poll.registry().len(), 1);
    }

    #[test]
    fn test_empty_buffer_never_settles() {
        let h = Harness::new();
        h.editor.focus(Some(FakeView::new(1, "a.go", "")));
        let t0 = Instant::now();
        h.poll.tick_at(t0);
        h.poll.tick_at(t0 + TIMEOUT * 4);
        assert_eq!(h.queued(), 0);
    }
}
