// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Background analysis worker.
//!
//! One long-lived thread pulls paths off the [`DedupQueue`], lints the
//! latest source snapshot for each, and writes the reports back into the
//! [`FileRegistry`]. The thread is started lazily through
//! [`WorkerHandle::ensure_started`] and is never joined.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use super::queue::DedupQueue;
use super::registry::{FileRegistry, Lifecycle};
use crate::lint::{LintService, Reports, collect_reports};

/// Called with the path after reports were stored, to request a redraw.
pub type CompletionHook = Arc<dyn Fn(&Path) + Send + Sync>;

/// Processes queued paths one at a time.
pub struct AnalysisWorker {
    registry: FileRegistry,
    queue: Arc<DedupQueue<PathBuf>>,
    linter: Arc<dyn LintService>,
    on_complete: Option<CompletionHook>,
}

impl AnalysisWorker {
    /// Creates a worker over the given registry and queue.
    #[must_use]
    pub fn new(
        registry: FileRegistry,
        queue: Arc<DedupQueue<PathBuf>>,
        linter: Arc<dyn LintService>,
    ) -> Self {
        Self {
            registry,
            queue,
            linter,
            on_complete: None,
        }
    }

    /// Sets the hook invoked after each stored result.
    #[must_use]
    pub fn with_completion_hook(mut self, hook: Option<CompletionHook>) -> Self {
        self.on_complete = hook;
        self
    }

    /// Runs forever, blocking on the queue between jobs.
    pub fn run(&self) {
        loop {
            let path = self.queue.dequeue();
            self.process(&path);
        }
    }

    /// Lints `path` once and stores the result.
    ///
    /// Returns `false` if the file stopped being tracked before or during
    /// the analysis; the result is discarded in that case.
    pub fn process(&self, path: &Path) -> bool {
        let Some(state) = self.registry.get(path) else {
            debug!("Discarding job for untracked {}", path.display());
            return false;
        };

        let reports = self.analyse(path, &state.last_source);
        let count = reports.len();

        let stored = self
            .registry
            .update(path, |state| {
                state.reports = reports;
                state.lifecycle = Lifecycle::Ready;
            })
            .is_some();

        if !stored {
            debug!("{} closed during analysis, dropping result", path.display());
            return false;
        }

        debug!("Stored {count} report(s) for {}", path.display());
        if let Some(hook) = &self.on_complete {
            hook(path);
        }
        true
    }

    /// Runs the linter outside every lock. Any failure yields no reports.
    fn analyse(&self, path: &Path, source: &str) -> Reports {
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| self.linter.lint(path, source)));
        match result {
            Ok(Ok(output)) => collect_reports(output.diagnostics),
            Ok(Err(e)) => {
                warn!("Lint failed for {}: {e}", path.display());
                Reports::new()
            }
            Err(_) => {
                warn!("Linter panicked on {}", path.display());
                Reports::new()
            }
        }
    }
}

/// Owns the queue and lazily starts the single worker thread.
pub struct WorkerHandle {
    registry: FileRegistry,
    queue: Arc<DedupQueue<PathBuf>>,
    linter: Arc<dyn LintService>,
    on_complete: Option<CompletionHook>,
    started: AtomicBool,
}

impl WorkerHandle {
    /// Creates a handle. No thread is started yet.
    #[must_use]
    pub fn new(registry: FileRegistry, linter: Arc<dyn LintService>) -> Self {
        Self {
            registry,
            queue: Arc::new(DedupQueue::new()),
            linter,
            on_complete: None,
            started: AtomicBool::new(false),
        }
    }

    /// Sets the hook the worker invokes after each stored result.
    #[must_use]
    pub fn with_completion_hook(mut self, hook: CompletionHook) -> Self {
        self.on_complete = Some(hook);
        self
    }

    /// Starts the worker thread unless it is already running.
    ///
    /// Returns `Ok(true)` if this call started it.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refused to spawn the thread. A later call
    /// will try again.
    pub fn ensure_started(&self) -> std::io::Result<bool> {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }

        let worker = AnalysisWorker::new(
            self.registry.clone(),
            self.queue.clone(),
            self.linter.clone(),
        )
        .with_completion_hook(self.on_complete.clone());

        match std::thread::Builder::new()
            .name("lintwatch-worker".to_string())
            .spawn(move || worker.run())
        {
            Ok(_) => {
                info!("Started lint worker");
                Ok(true)
            }
            Err(e) => {
                self.started.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    /// Marks the worker as started without spawning it, so queued paths
    /// stay put (for testing).
    #[cfg(test)]
    pub(crate) fn hold(&self) {
        self.started.store(true, Ordering::Release);
    }

    /// Whether the worker thread has been started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Queues `path` for analysis; `false` if it is already waiting.
    pub fn try_enqueue(&self, path: PathBuf) -> bool {
        self.queue.try_enqueue(path)
    }

    /// The underlying queue.
    #[must_use]
    pub const fn queue(&self) -> &Arc<DedupQueue<PathBuf>> {
        &self.queue
    }
}
