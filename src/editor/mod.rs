// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

/// Filesystem-backed editor for standalone use.
pub mod fs;
/// Rendering of reports onto views.
pub mod presenter;
/// Editor and view traits.
pub mod view;

pub use fs::{FsEditor, FsView, Writer, stdout_writer};
pub use presenter::{DEFAULT_DOMAIN, Frame, Presenter};
pub use view::{Editor, EditorView, Marker, MarkerStyle, ViewId, ViewRef};
