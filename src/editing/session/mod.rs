// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! Edit session - the erase workflow for one image
//!
//! Owns the image, the mask, the undo history and the brush, and decides
//! when an inference request is sent and what happens when its outcome
//! comes back. The session never blocks and never touches a thread: the
//! event loop feeds it commands, timer ticks, and outcomes, and drains the
//! resulting [`SessionUpdate`]s.
//!
//! State machine:
//!
//! ```text
//! Idle --stroke--> AwaitingDebounce --debounce--> Processing --outcome--> Idle
//!                        ^                            |
//!                        +---- deferred retry --------+
//! ```

mod status;

pub use status::{SessionStatus, SessionUpdate};

use super::debounce::Debouncer;
use super::mask::{MaskBuffer, PixelRect};
use super::stroke::StrokeController;
use super::undo::UndoHistory;
use crate::config::EraserConfig;
use crate::image_io;
use crate::inference::{InferenceError, InferenceOutcome, InferenceRequest, RequestId, crop};
use crate::settings;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use kurbo::Point;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Where the session is in the erase cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// A stroke was committed; waiting for the quiet period
    AwaitingDebounce,
    /// A request with this id is in flight
    Processing(RequestId),
}

/// What the session remembers about the request in flight
#[derive(Debug, Clone)]
struct InFlight {
    id: RequestId,
    mask: MaskBuffer,
    crop: Option<PixelRect>,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    /// Current image; `None` until one is opened
    image: Option<Arc<RgbaImage>>,
    mask: MaskBuffer,
    stroke: StrokeController,
    debouncer: Debouncer,
    history: UndoHistory,

    /// Brush diameter in canvas pixels
    brush_size: f64,

    state: SessionState,
    status: SessionStatus,
    in_flight: Option<InFlight>,
    /// Debounce fired while processing; run once more afterwards
    retry_deferred: bool,
    next_request_id: RequestId,

    canvas_size: Option<u32>,
    crop_to_mask: bool,
    model: String,
    prompt: String,

    updates: Vec<SessionUpdate>,
    /// Last undo availability reported to the UI
    undo_available: bool,
}

impl EditSession {
    pub fn new(config: &EraserConfig) -> Self {
        Self {
            image: None,
            mask: MaskBuffer::new(0, 0),
            stroke: StrokeController::new(),
            debouncer: Debouncer::new(config.editor.debounce_interval()),
            history: UndoHistory::new(config.editor.undo_limit()),
            brush_size: clamp_brush_size(config.editor.brush_size),
            state: SessionState::Idle,
            status: SessionStatus::Idle,
            in_flight: None,
            retry_deferred: false,
            next_request_id: 1,
            canvas_size: config.editor.canvas_size,
            crop_to_mask: config.editor.crop_to_mask,
            model: config.inference.model.clone(),
            prompt: config.inference.prompt.clone(),
            updates: Vec::new(),
            undo_available: false,
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn image(&self) -> Option<&Arc<RgbaImage>> {
        self.image.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn mask(&self) -> &MaskBuffer {
        &self.mask
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.state, SessionState::Processing(_))
    }

    pub fn brush_size(&self) -> f64 {
        self.brush_size
    }

    pub fn brush_radius(&self) -> f64 {
        self.brush_size / 2.0
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.history.len()
    }

    pub fn debounce_interval(&self) -> Duration {
        self.debouncer.interval()
    }

    /// When the event loop should next call [`Self::poll_debounce`]
    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// True while a debounce is pending or a request is in flight
    pub fn has_pending_work(&self) -> bool {
        self.debouncer.is_pending() || self.is_processing()
    }

    /// Image with the mask overlay, for drawing while painting.
    pub fn preview(&self) -> Option<RgbaImage> {
        let image = self.image.as_ref()?;
        if self.mask.is_empty() {
            Some(image.as_ref().clone())
        } else {
            Some(self.mask.overlay_onto(image))
        }
    }

    /// Drain the updates produced since the last call.
    pub fn take_events(&mut self) -> Vec<SessionUpdate> {
        std::mem::take(&mut self.updates)
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    /// Start a new edit lineage with `image`.
    ///
    /// Accepted in every state. A request still in flight is not cancelled
    /// but its outcome will be ignored.
    pub fn open_image(&mut self, image: RgbaImage) {
        let image = match self.canvas_size {
            Some(size) if image.dimensions() != (size, size) => image_io::letterbox(&image, size),
            _ => image,
        };
        let (width, height) = image.dimensions();
        tracing::info!("Opened {}x{} image", width, height);

        self.abandon_cycle();
        self.image = Some(Arc::new(image));
        self.mask = MaskBuffer::new(width, height);
        self.history.clear();
        self.set_status(SessionStatus::Idle);
        self.updates.push(SessionUpdate::CanvasInvalidated);
        self.announce_undo_availability();
    }

    /// Unload the image entirely.
    pub fn reset(&mut self) {
        tracing::info!("Session reset");
        self.abandon_cycle();
        self.image = None;
        self.mask = MaskBuffer::new(0, 0);
        self.history.clear();
        self.set_status(SessionStatus::Idle);
        self.updates.push(SessionUpdate::CanvasInvalidated);
        self.announce_undo_availability();
    }

    pub fn set_brush_size(&mut self, size: f64) {
        if !size.is_finite() {
            tracing::debug!("Ignoring non-finite brush size");
            return;
        }
        self.brush_size = clamp_brush_size(size);
    }

    pub fn drag_begin(&mut self, point: Point) {
        if self.image.is_none() {
            tracing::debug!("Ignoring stroke with no image loaded");
            return;
        }
        let radius = self.brush_radius();
        self.stroke.on_drag_begin(point, &mut self.mask, radius);
        self.updates.push(SessionUpdate::CanvasInvalidated);
    }

    pub fn drag_update(&mut self, point: Point) {
        if self.image.is_none() {
            return;
        }
        let radius = self.brush_radius();
        if self.stroke.on_drag_update(point, &mut self.mask, radius) {
            self.updates.push(SessionUpdate::CanvasInvalidated);
        }
    }

    pub fn drag_end(&mut self, point: Point, now: Instant) {
        if self.image.is_none() {
            return;
        }
        let radius = self.brush_radius();
        let Some(stroke) = self.stroke.on_drag_end(point, &mut self.mask, radius) else {
            return;
        };
        tracing::debug!("Stroke committed ({} points)", stroke.points.len());
        self.updates.push(SessionUpdate::CanvasInvalidated);
        self.on_stroke_committed(now);
    }

    /// Revert to the image before the last applied result.
    ///
    /// Only accepted while Idle: a committed stroke waiting for its quiet
    /// period or a request in flight must not be thrown away. Returns false
    /// when rejected or when there is nothing to undo. The status is left
    /// alone either way.
    pub fn undo(&mut self) -> bool {
        if self.state != SessionState::Idle {
            tracing::debug!("Ignoring undo in state {:?}", self.state);
            return false;
        }
        let Some(previous) = self.history.pop() else {
            tracing::debug!("Nothing to undo");
            return false;
        };

        self.stroke.cancel();
        self.image = Some(previous);
        self.mask.clear();
        self.updates.push(SessionUpdate::CanvasInvalidated);
        self.announce_undo_availability();
        true
    }

    // ========================================================================
    // DEBOUNCE AND INFERENCE
    // ========================================================================

    fn on_stroke_committed(&mut self, now: Instant) {
        match self.state {
            SessionState::Idle | SessionState::AwaitingDebounce => {
                self.state = SessionState::AwaitingDebounce;
                self.debouncer.trigger(now);
            }
            // Picked up by the next cycle once the current one is reconciled
            SessionState::Processing(_) => self.debouncer.trigger(now),
        }
    }

    /// Called by the event loop when the debounce deadline passes.
    ///
    /// Returns the request to run, if any. Never returns a request while
    /// another one is in flight.
    pub fn poll_debounce(&mut self, now: Instant) -> Option<InferenceRequest> {
        if !self.debouncer.poll(now) {
            return None;
        }

        if let SessionState::Processing(id) = self.state {
            tracing::debug!("Debounce fired while request {} in flight, deferring", id);
            self.retry_deferred = true;
            return None;
        }

        self.start_request()
    }

    fn start_request(&mut self) -> Option<InferenceRequest> {
        let Some(image) = self.image.clone() else {
            self.state = SessionState::Idle;
            return None;
        };
        if self.mask.is_empty() {
            tracing::debug!("Mask is empty, nothing to send");
            self.state = SessionState::Idle;
            return None;
        }

        let id = self.next_request_id;
        self.next_request_id += 1;

        let crop = if self.crop_to_mask {
            crop::plan_crop(&self.mask)
        } else {
            None
        };
        let mask = self.mask.clone();

        match crop {
            Some(r) => tracing::info!(
                "Sending request {}: {}x{} crop at ({}, {})",
                id,
                r.width,
                r.height,
                r.x,
                r.y
            ),
            None => tracing::info!(
                "Sending request {}: full {}x{} image",
                id,
                mask.width(),
                mask.height()
            ),
        }

        self.in_flight = Some(InFlight {
            id,
            mask: mask.clone(),
            crop,
        });
        self.state = SessionState::Processing(id);
        self.set_status(SessionStatus::Processing);

        Some(InferenceRequest::new(
            id,
            image,
            mask,
            crop,
            self.model.clone(),
            self.prompt.clone(),
        ))
    }

    /// Reconcile the outcome of request `id`.
    ///
    /// Outcomes for anything but the request in flight are stale and
    /// ignored. Returns whether the outcome was applied.
    pub fn apply_outcome(&mut self, id: RequestId, outcome: InferenceOutcome, now: Instant) -> bool {
        let Some(in_flight) = self.in_flight.take_if(|f| f.id == id) else {
            tracing::debug!("Ignoring stale outcome for request {}", id);
            return false;
        };
        let deferred = std::mem::take(&mut self.retry_deferred);

        match outcome {
            InferenceOutcome::Success { image, elapsed } => {
                let Some(previous) = self.image.take() else {
                    self.state = SessionState::Idle;
                    return false;
                };
                let result = compose_result(&previous, image, in_flight.crop);
                tracing::info!("Request {} done in {:.2}s", id, elapsed.as_secs_f64());

                self.history.push(previous);
                self.image = Some(Arc::new(result));
                self.mask.subtract(&in_flight.mask);
                self.set_status(SessionStatus::Done(elapsed));
                self.updates.push(SessionUpdate::CanvasInvalidated);
                self.announce_undo_availability();

                if deferred {
                    self.debouncer.trigger(now);
                }
                self.state = if self.debouncer.is_pending() {
                    SessionState::AwaitingDebounce
                } else {
                    SessionState::Idle
                };
            }
            InferenceOutcome::Failure { error, .. } => {
                tracing::warn!("Request {} failed: {}", id, error);
                // No automatic retry against a failing server
                self.debouncer.cancel_pending();
                self.set_status(SessionStatus::Error(status_message(&error)));
                self.state = SessionState::Idle;
            }
        }
        true
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    /// Forget the current cycle: pending debounce, active stroke, and the
    /// request in flight (whose outcome becomes stale).
    fn abandon_cycle(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            tracing::info!("Request {} will be discarded", in_flight.id);
        }
        self.stroke.cancel();
        self.debouncer.cancel_pending();
        self.retry_deferred = false;
        self.state = SessionState::Idle;
    }

    fn set_status(&mut self, status: SessionStatus) {
        self.status = status.clone();
        self.updates.push(SessionUpdate::StatusChanged(status));
    }

    fn announce_undo_availability(&mut self) {
        let available = self.can_undo();
        if available != self.undo_available {
            self.undo_available = available;
            self.updates
                .push(SessionUpdate::UndoAvailabilityChanged(available));
        }
    }
}

fn clamp_brush_size(size: f64) -> f64 {
    if size.is_finite() {
        size.clamp(settings::brush::MIN_SIZE, settings::brush::MAX_SIZE)
    } else {
        settings::brush::DEFAULT_SIZE
    }
}

/// Fit the backend's result into the canvas it was computed for.
///
/// Full-canvas results are resized to the canvas if the backend returned
/// another size. Cropped results are resized to the crop and pasted over
/// a copy of the previous image.
fn compose_result(previous: &RgbaImage, result: RgbaImage, crop: Option<PixelRect>) -> RgbaImage {
    let fit = |image: RgbaImage, width: u32, height: u32| {
        if image.dimensions() == (width, height) {
            image
        } else {
            tracing::debug!(
                "Resizing {}x{} result to {}x{}",
                image.width(),
                image.height(),
                width,
                height
            );
            imageops::resize(&image, width, height, FilterType::Triangle)
        }
    };

    match crop {
        Some(r) => {
            let patch = fit(result, r.width, r.height);
            let mut out = previous.clone();
            imageops::replace(&mut out, &patch, r.x as i64, r.y as i64);
            out
        }
        None => fit(result, previous.width(), previous.height()),
    }
}

/// Short error text for the status bar.
fn status_message(error: &InferenceError) -> String {
    let text = error.to_string();
    let max = settings::inference::STATUS_MESSAGE_MAX_CHARS;
    if text.chars().count() <= max {
        text
    } else {
        let mut short: String = text.chars().take(max.saturating_sub(3)).collect();
        short.push_str("...");
        short
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn config() -> EraserConfig {
        let mut config = EraserConfig::default();
        config.editor.crop_to_mask = false;
        config
    }

    fn solid(size: u32, color: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(size, size, color)
    }

    fn session_with_image(size: u32) -> EditSession {
        let mut session = EditSession::new(&config());
        session.open_image(solid(size, WHITE));
        session.take_events();
        session
    }

    fn paint(session: &mut EditSession, point: Point, now: Instant) {
        session.drag_begin(point);
        session.drag_end(point, now);
    }

    /// Paint one dab and let the debounce fire.
    fn paint_and_fire(session: &mut EditSession, point: Point) -> InferenceRequest {
        let now = Instant::now();
        paint(session, point, now);
        session
            .poll_debounce(now + session.debounce_interval())
            .expect("request")
    }

    fn success(image: RgbaImage, ms: u64) -> InferenceOutcome {
        InferenceOutcome::Success {
            image,
            elapsed: Duration::from_millis(ms),
        }
    }

    fn statuses(events: &[SessionUpdate]) -> Vec<SessionStatus> {
        events
            .iter()
            .filter_map(|e| match e {
                SessionUpdate::StatusChanged(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_stroke_schedules_debounce() {
        let mut session = session_with_image(128);
        let now = Instant::now();

        paint(&mut session, Point::new(20.0, 20.0), now);

        assert_eq!(session.state(), SessionState::AwaitingDebounce);
        assert_eq!(session.debounce_deadline(), Some(now + Duration::from_millis(400)));
        assert!(session.poll_debounce(now + Duration::from_millis(399)).is_none());
        assert!(session.mask().is_marked(20, 20));
        assert!(session.take_events().contains(&SessionUpdate::CanvasInvalidated));
    }

    #[test]
    fn test_debounce_fire_starts_request() {
        let mut session = session_with_image(128);
        let request = paint_and_fire(&mut session, Point::new(40.0, 40.0));

        assert_eq!(session.state(), SessionState::Processing(request.id()));
        assert_eq!(session.status(), &SessionStatus::Processing);
        assert!(request.mask().is_marked(40, 40));
        assert_eq!(request.image().dimensions(), (128, 128));
        assert_eq!(request.model(), "sd-turbo");
        assert_eq!(request.crop(), None);
        assert_eq!(statuses(&session.take_events()), vec![SessionStatus::Processing]);
    }

    #[test]
    fn test_request_snapshot_ignores_later_strokes() {
        let mut session = session_with_image(128);
        let request = paint_and_fire(&mut session, Point::new(20.0, 20.0));

        paint(&mut session, Point::new(100.0, 100.0), Instant::now());

        assert!(session.mask().is_marked(100, 100));
        assert!(!request.mask().is_marked(100, 100));
    }

    #[test]
    fn test_success_replaces_image_and_pushes_history() {
        let mut session = session_with_image(64);
        let before = Arc::clone(session.image().unwrap());
        let request = paint_and_fire(&mut session, Point::new(10.0, 10.0));
        session.take_events();

        assert!(session.apply_outcome(request.id(), success(solid(64, RED), 500), Instant::now()));

        assert_eq!(session.undo_len(), 1);
        assert!(Arc::ptr_eq(session.history.peek().unwrap(), &before));
        assert_eq!(session.image().unwrap().as_ref(), &solid(64, RED));
        assert!(session.mask().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.status(), &SessionStatus::Done(Duration::from_millis(500)));

        let events = session.take_events();
        assert!(events.contains(&SessionUpdate::CanvasInvalidated));
        assert!(events.contains(&SessionUpdate::UndoAvailabilityChanged(true)));
    }

    #[test]
    fn test_failure_keeps_image_mask_and_history() {
        let mut session = session_with_image(64);
        let before = Arc::clone(session.image().unwrap());
        let request = paint_and_fire(&mut session, Point::new(10.0, 10.0));
        let mask_before = session.mask().clone();

        let outcome = InferenceOutcome::Failure {
            error: InferenceError::Timeout(Duration::from_secs(15)),
            elapsed: Some(Duration::from_secs(15)),
        };
        assert!(session.apply_outcome(request.id(), outcome, Instant::now()));

        assert_eq!(session.undo_len(), 0);
        assert!(Arc::ptr_eq(session.image().unwrap(), &before));
        assert_eq!(session.mask(), &mask_before);
        assert_eq!(session.state(), SessionState::Idle);
        match session.status() {
            SessionStatus::Error(message) => assert!(message.contains("timed out")),
            other => panic!("expected error status, got {other:?}"),
        }
    }

    #[test]
    fn test_long_errors_are_shortened() {
        let mut session = session_with_image(32);
        let request = paint_and_fire(&mut session, Point::new(5.0, 5.0));
        let error = InferenceError::Network("x".repeat(500));
        session.apply_outcome(request.id(), InferenceOutcome::failure(error), Instant::now());

        match session.status() {
            SessionStatus::Error(message) => {
                assert_eq!(message.chars().count(), settings::inference::STATUS_MESSAGE_MAX_CHARS);
                assert!(message.ends_with("..."));
            }
            other => panic!("expected error status, got {other:?}"),
        }
    }

    #[test]
    fn test_debounce_while_processing_defers_one_retry() {
        let mut session = session_with_image(128);
        let first = paint_and_fire(&mut session, Point::new(20.0, 20.0));

        // Stroke and debounce fire while the first request is in flight
        let now = Instant::now();
        paint(&mut session, Point::new(100.0, 100.0), now);
        assert!(session.is_processing());
        assert!(session.poll_debounce(now + session.debounce_interval()).is_none());
        assert!(session.retry_deferred);

        let done_at = Instant::now();
        session.apply_outcome(first.id(), success(solid(128, RED), 100), done_at);
        assert_eq!(session.state(), SessionState::AwaitingDebounce);
        assert_eq!(session.debounce_deadline(), Some(done_at + session.debounce_interval()));

        // Only the stroke painted during processing is left in the mask
        assert!(!session.mask().is_marked(20, 20));
        assert!(session.mask().is_marked(100, 100));

        let second = session
            .poll_debounce(done_at + session.debounce_interval())
            .unwrap();
        assert_eq!(second.id(), first.id() + 1);
        assert!(second.mask().is_marked(100, 100));
        assert!(!second.mask().is_marked(20, 20));
    }

    #[test]
    fn test_pending_debounce_survives_success() {
        let mut session = session_with_image(128);
        let first = paint_and_fire(&mut session, Point::new(20.0, 20.0));

        let now = Instant::now();
        paint(&mut session, Point::new(100.0, 100.0), now);
        session.apply_outcome(first.id(), success(solid(128, RED), 100), now);

        assert_eq!(session.state(), SessionState::AwaitingDebounce);
        assert!(session.poll_debounce(now + session.debounce_interval()).is_some());
    }

    #[test]
    fn test_failure_drops_deferred_retry() {
        let mut session = session_with_image(128);
        let first = paint_and_fire(&mut session, Point::new(20.0, 20.0));

        let now = Instant::now();
        paint(&mut session, Point::new(100.0, 100.0), now);
        session.poll_debounce(now + session.debounce_interval());

        let error = InferenceError::Server {
            status: 500,
            body: String::new(),
        };
        session.apply_outcome(first.id(), InferenceOutcome::failure(error), now);

        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.has_pending_work());
        // Both strokes are still waiting in the mask for the next attempt
        assert!(session.mask().is_marked(20, 20));
        assert!(session.mask().is_marked(100, 100));
    }

    #[test]
    fn test_stale_outcome_after_open_is_ignored() {
        let mut session = session_with_image(64);
        let request = paint_and_fire(&mut session, Point::new(10.0, 10.0));

        session.open_image(solid(32, BLUE));
        assert!(!session.apply_outcome(request.id(), success(solid(64, RED), 100), Instant::now()));

        assert_eq!(session.image().unwrap().as_ref(), &solid(32, BLUE));
        assert_eq!(session.undo_len(), 0);
        assert_eq!(session.status(), &SessionStatus::Idle);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut session = session_with_image(32);
        let request = paint_and_fire(&mut session, Point::new(5.0, 5.0));
        session.apply_outcome(
            request.id(),
            InferenceOutcome::failure(InferenceError::Decode("bad".into())),
            Instant::now(),
        );
        let status = session.status().clone();
        session.take_events();

        assert!(!session.undo());
        assert_eq!(session.status(), &status);
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn test_undo_restores_previous_image() {
        let mut session = session_with_image(64);
        let before = Arc::clone(session.image().unwrap());
        let first = paint_and_fire(&mut session, Point::new(10.0, 10.0));
        session.apply_outcome(first.id(), success(solid(64, RED), 100), Instant::now());

        // A failed second attempt leaves the session Idle with its mask kept
        let second = paint_and_fire(&mut session, Point::new(30.0, 30.0));
        let error = InferenceError::Connection("refused".into());
        session.apply_outcome(second.id(), InferenceOutcome::failure(error), Instant::now());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.mask().is_marked(30, 30));
        session.take_events();

        assert!(session.undo());
        assert!(Arc::ptr_eq(session.image().unwrap(), &before));
        assert!(session.mask().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.undo_len(), 0);
        assert!(matches!(session.status(), SessionStatus::Error(_)));

        let events = session.take_events();
        assert!(events.contains(&SessionUpdate::UndoAvailabilityChanged(false)));
        assert!(statuses(&events).is_empty());
    }

    #[test]
    fn test_undo_ignored_while_awaiting_debounce() {
        let mut session = session_with_image(64);
        let request = paint_and_fire(&mut session, Point::new(10.0, 10.0));
        session.apply_outcome(request.id(), success(solid(64, RED), 100), Instant::now());

        let now = Instant::now();
        paint(&mut session, Point::new(30.0, 30.0), now);
        assert_eq!(session.state(), SessionState::AwaitingDebounce);
        session.take_events();

        assert!(!session.undo());
        assert_eq!(session.state(), SessionState::AwaitingDebounce);
        assert!(session.mask().is_marked(30, 30));
        assert_eq!(session.undo_len(), 1);
        assert!(session.take_events().is_empty());

        // The committed stroke still goes out
        let next = session.poll_debounce(now + session.debounce_interval()).unwrap();
        assert!(next.mask().is_marked(30, 30));
    }

    #[test]
    fn test_undo_rejected_while_processing() {
        let mut session = session_with_image(64);
        let first = paint_and_fire(&mut session, Point::new(10.0, 10.0));
        session.apply_outcome(first.id(), success(solid(64, RED), 100), Instant::now());

        let _second = paint_and_fire(&mut session, Point::new(40.0, 40.0));
        assert!(!session.undo());
        assert_eq!(session.undo_len(), 1);
        assert!(session.is_processing());
    }

    #[test]
    fn test_empty_mask_sends_nothing() {
        let mut session = session_with_image(64);
        let now = Instant::now();
        paint(&mut session, Point::new(-500.0, -500.0), now);

        assert_eq!(session.state(), SessionState::AwaitingDebounce);
        assert!(session.poll_debounce(now + session.debounce_interval()).is_none());
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.status(), &SessionStatus::Idle);
    }

    #[test]
    fn test_strokes_without_image_are_ignored() {
        let mut session = EditSession::new(&config());
        paint(&mut session, Point::new(1.0, 1.0), Instant::now());

        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn test_open_image_letterboxes_to_canvas_size() {
        let mut config = config();
        config.editor.canvas_size = Some(256);
        let mut session = EditSession::new(&config);

        session.open_image(RgbaImage::from_pixel(512, 256, WHITE));

        assert_eq!(session.image().unwrap().dimensions(), (256, 256));
        assert_eq!(session.mask().dimensions(), (256, 256));
        assert_eq!(session.image().unwrap().get_pixel(128, 10).0, [0, 0, 0, 255]);
        assert_eq!(statuses(&session.take_events()), vec![SessionStatus::Idle]);
    }

    #[test]
    fn test_open_image_starts_fresh_lineage() {
        let mut session = session_with_image(64);
        let request = paint_and_fire(&mut session, Point::new(10.0, 10.0));
        session.apply_outcome(request.id(), success(solid(64, RED), 100), Instant::now());
        assert!(session.can_undo());

        session.open_image(solid(64, BLUE));
        assert!(!session.can_undo());
        assert!(session.mask().is_empty());
        assert!(session.take_events().contains(&SessionUpdate::UndoAvailabilityChanged(false)));
    }

    #[test]
    fn test_cropped_result_is_pasted_back() {
        let mut config = EraserConfig::default();
        config.editor.crop_to_mask = true;
        let mut session = EditSession::new(&config);
        session.open_image(solid(1024, WHITE));
        session.set_brush_size(60.0);

        let request = paint_and_fire(&mut session, Point::new(100.0, 100.0));
        assert_eq!(request.crop(), Some(PixelRect::new(0, 0, 512, 512)));

        // Backend answers at a lower resolution
        session.apply_outcome(request.id(), success(solid(256, BLUE), 100), Instant::now());

        let image = session.image().unwrap();
        assert_eq!(image.dimensions(), (1024, 1024));
        assert_eq!(image.get_pixel(100, 100).0, BLUE.0);
        assert_eq!(image.get_pixel(511, 511).0, BLUE.0);
        assert_eq!(image.get_pixel(600, 600).0, WHITE.0);
    }

    #[test]
    fn test_full_result_of_other_size_is_resized() {
        let mut session = session_with_image(128);
        let request = paint_and_fire(&mut session, Point::new(10.0, 10.0));
        session.apply_outcome(request.id(), success(solid(64, RED), 100), Instant::now());

        assert_eq!(session.image().unwrap().dimensions(), (128, 128));
        assert_eq!(session.image().unwrap().get_pixel(127, 127).0, RED.0);
    }

    #[test]
    fn test_brush_size_is_clamped() {
        let mut session = EditSession::new(&config());
        assert_eq!(session.brush_size(), 30.0);
        assert_eq!(session.brush_radius(), 15.0);

        session.set_brush_size(1000.0);
        assert_eq!(session.brush_size(), 150.0);
        session.set_brush_size(1.0);
        assert_eq!(session.brush_size(), 5.0);
        session.set_brush_size(f64::NAN);
        assert_eq!(session.brush_size(), 5.0);
    }

    #[test]
    fn test_preview_shows_overlay_while_masked() {
        let mut session = session_with_image(32);
        assert_eq!(session.preview().unwrap(), solid(32, WHITE));

        session.drag_begin(Point::new(16.0, 16.0));
        let preview = session.preview().unwrap();
        assert_ne!(preview.get_pixel(16, 16).0, WHITE.0);
        assert_eq!(preview.get_pixel(0, 0).0, WHITE.0);
    }

    #[test]
    fn test_reset_unloads_image() {
        let mut session = session_with_image(32);
        session.reset();

        assert!(!session.has_image());
        assert!(session.preview().is_none());
        assert_eq!(session.mask().dimensions(), (0, 0));
    }
}
