// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! lintwatch lints live buffers in the background.
//!
//! A poll loop watches the active editor view and waits for edits to
//! settle. Settled files are handed to a single background worker through
//! a deduplicating queue; the worker runs the linter and stores the
//! results in a shared registry, which the poll loop renders on its next
//! tick.

/// Command-line interface utilities.
pub mod cli;
/// Configuration loading and the per-tick settings source.
pub mod config;
/// Debounce state machine, work queue, worker and shared registry.
pub mod coordinator;
/// Editor abstractions, presenter and the filesystem editor.
pub mod editor;
/// Lint service boundary and diagnostic records.
pub mod lint;
