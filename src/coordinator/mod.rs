// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

/// Foreground poll loop and debounce logic.
pub mod poll;
/// Single-flight work queue.
pub mod queue;
/// Shared per-file state.
pub mod registry;
/// Background analysis worker.
pub mod worker;

pub use poll::{Cadence, PollLoop};
pub use queue::DedupQueue;
pub use registry::{FileRegistry, FileState, Lifecycle};
pub use worker::{AnalysisWorker, CompletionHook, WorkerHandle};
