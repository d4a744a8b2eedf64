// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! Event loop that owns an [`EditSession`].
//!
//! UI commands, debounce deadlines, and inference outcomes are all handled
//! on this one task, so the session never needs a lock. Inference runs on
//! tokio's blocking pool and reports back over a channel; a panicking
//! backend becomes an ordinary failure outcome.
//!
//! When the command channel closes the loop keeps running until the
//! pending debounce and any request in flight have been reconciled, then
//! returns the session.

use crate::editing::{EditSession, SessionUpdate};
use crate::inference::{InferenceBackend, InferenceError, InferenceOutcome, InferenceRequest, RequestId};
use image::RgbaImage;
use kurbo::Point;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

/// Input from the UI layer
#[derive(Debug, Clone)]
pub enum UiCommand {
    OpenImage(RgbaImage),
    DragBegin(Point),
    DragUpdate(Point),
    DragEnd(Point),
    BrushSizeChanged(f64),
    Undo,
    Reset,
}

type OutcomeMessage = (RequestId, InferenceOutcome);

/// Drive `session` until `commands` closes and all work has settled.
pub async fn run(
    mut session: EditSession,
    backend: Arc<dyn InferenceBackend>,
    mut commands: mpsc::UnboundedReceiver<UiCommand>,
    updates: mpsc::UnboundedSender<SessionUpdate>,
) -> EditSession {
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<OutcomeMessage>();
    let mut accepting = true;

    forward_updates(&mut session, &updates);

    loop {
        if !accepting && !session.has_pending_work() {
            break;
        }
        let deadline = session.debounce_deadline();

        tokio::select! {
            command = commands.recv(), if accepting => match command {
                Some(command) => handle_command(&mut session, command),
                None => {
                    tracing::debug!("Command channel closed, finishing pending work");
                    accepting = false;
                }
            },
            Some((id, outcome)) = outcome_rx.recv() => {
                session.apply_outcome(id, outcome, Instant::now());
            }
            _ = wait_for(deadline) => {
                if let Some(request) = session.poll_debounce(Instant::now()) {
                    spawn_inference(Arc::clone(&backend), request, outcome_tx.clone());
                }
            }
        }

        forward_updates(&mut session, &updates);
    }

    session
}

fn handle_command(session: &mut EditSession, command: UiCommand) {
    match command {
        UiCommand::OpenImage(image) => session.open_image(image),
        UiCommand::DragBegin(point) => session.drag_begin(point),
        UiCommand::DragUpdate(point) => session.drag_update(point),
        UiCommand::DragEnd(point) => session.drag_end(point, Instant::now()),
        UiCommand::BrushSizeChanged(size) => session.set_brush_size(size),
        UiCommand::Undo => {
            session.undo();
        }
        UiCommand::Reset => session.reset(),
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn spawn_inference(
    backend: Arc<dyn InferenceBackend>,
    request: InferenceRequest,
    outcomes: mpsc::UnboundedSender<OutcomeMessage>,
) {
    let id = request.id();
    tokio::spawn(async move {
        let outcome = match tokio::task::spawn_blocking(move || backend.submit(&request)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Inference worker for request {} failed: {}", id, e);
                InferenceOutcome::failure(InferenceError::Worker(e.to_string()))
            }
        };
        // The loop may already have returned; nothing left to tell.
        let _ = outcomes.send((id, outcome));
    });
}

fn forward_updates(session: &mut EditSession, updates: &mpsc::UnboundedSender<SessionUpdate>) {
    for update in session.take_events() {
        if updates.send(update).is_err() {
            // Nobody is listening; keep running headless.
            break;
        }
    }
}
