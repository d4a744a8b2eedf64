// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! Editing model: mask painting, debounce, undo, and the session

pub mod debounce;
pub mod mask;
pub mod session;
pub mod stroke;
pub mod undo;

pub use debounce::Debouncer;
pub use mask::{MaskBuffer, PixelRect};
pub use session::{EditSession, SessionState, SessionStatus, SessionUpdate};
pub use stroke::{Stroke, StrokeController};
pub use undo::UndoHistory;
