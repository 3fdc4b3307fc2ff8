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

//! Per-file lint state shared between the poll loop and the worker.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::debug;

use crate::editor::ViewRef;
use crate::lint::Reports;

/// Where a file is in the debounce → lint → render cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// No work pending. Edits are being observed.
    #[default]
    Idle,
    /// Handed to the worker, waiting or being analysed.
    Queued,
    /// Fresh reports are waiting to be rendered once.
    Ready,
}

/// Tracked state for one file.
#[derive(Clone)]
pub struct FileState {
    /// The view currently displaying the file.
    pub view: ViewRef,
    /// Buffer contents at the last observed change.
    pub last_source: String,
    /// When `last_source` last changed; `None` once the change has been
    /// handed to the worker.
    pub last_change: Option<Instant>,
    /// Position in the lint cycle.
    pub lifecycle: Lifecycle,
    /// Reports from the latest completed analysis.
    pub reports: Reports,
}

impl FileState {
    /// Creates an idle state with no observed source.
    #[must_use]
    pub fn new(view: ViewRef) -> Self {
        Self {
            view,
            last_source: String::new(),
            last_change: None,
            lifecycle: Lifecycle::Idle,
            reports: Reports::new(),
        }
    }
}

impl fmt::Debug for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileState")
            .field("view", &self.view.id())
            .field("last_source_len", &self.last_source.len())
            .field("last_change", &self.last_change)
            .field("lifecycle", &self.lifecycle)
            .field("reports", &self.reports.len())
            .finish()
    }
}

/// Lock-guarded map from file path to [`FileState`].
///
/// Cloning yields another handle to the same map. The lock is only held
/// for the duration of each call.
#[derive(Clone, Default)]
pub struct FileRegistry {
    files: Arc<Mutex<HashMap<PathBuf, FileState>>>,
}

impl FileRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, FileState>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a snapshot of the state for `path` without pruning.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<FileState> {
        self.lock().get(path).cloned()
    }

    /// Inserts or replaces the state for `path`.
    pub fn set(&self, path: PathBuf, state: FileState) {
        self.lock().insert(path, state);
    }

    /// Removes the state for `path`.
    pub fn remove(&self, path: &Path) -> Option<FileState> {
        self.lock().remove(path)
    }

    /// Drops entries whose view was closed or now shows another file, then
    /// returns a snapshot of the state for `path`.
    #[must_use]
    pub fn prune_and_get(&self, path: &Path) -> Option<FileState> {
        let mut files = self.lock();
        prune(&mut files);
        files.get(path).cloned()
    }

    /// Like [`prune_and_get`](Self::prune_and_get), but only reports whether
    /// `path` is still tracked.
    #[must_use]
    pub fn prune_and_contains(&self, path: &Path) -> bool {
        let mut files = self.lock();
        prune(&mut files);
        files.contains_key(path)
    }

    /// Runs `f` on the live entry for `path` while holding the lock.
    ///
    /// Returns `None` if there is no entry.
    pub fn update<R>(&self, path: &Path, f: impl FnOnce(&mut FileState) -> R) -> Option<R> {
        self.lock().get_mut(path).map(f)
    }

    /// Removes every entry, returning their views so drawings can be
    /// cleaned up outside the lock.
    pub fn clear(&self) -> Vec<ViewRef> {
        self.lock().drain().map(|(_, state)| state.view).collect()
    }

    /// Number of tracked files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no file is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn prune(files: &mut HashMap<PathBuf, FileState>) {
    files.retain(|key, state| {
        let live =
            state.view.has_window() && state.view.file_name().as_deref() == Some(key.as_path());
        if !live {
            debug!("Pruning stale entry for {}", key.display());
        }
        live
    });
}
