// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! What the UI is allowed to see of a session.

use std::time::Duration;

/// Status bar state
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    Idle,
    Processing,
    Done(Duration),
    Error(String),
}

impl SessionStatus {
    /// Main status text
    pub fn label(&self) -> String {
        match self {
            SessionStatus::Idle => "Ready".to_string(),
            SessionStatus::Processing => "Processing...".to_string(),
            SessionStatus::Done(_) => "Done".to_string(),
            SessionStatus::Error(message) => format!("Error: {message}"),
        }
    }

    /// Latency text shown next to the label, e.g. "0.52s"
    pub fn latency_label(&self) -> Option<String> {
        match self {
            SessionStatus::Done(elapsed) => Some(format!("{:.2}s", elapsed.as_secs_f64())),
            _ => None,
        }
    }

    /// Whether a spinner should be shown
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionStatus::Processing)
    }
}

/// Change notifications produced by the session for the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    StatusChanged(SessionStatus),
    /// Image or mask changed visibly; redraw
    CanvasInvalidated,
    UndoAvailabilityChanged(bool),
}
