// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! Freehand brush strokes.
//!
//! Converts a drag (begin, updates, end) into stamps on a [`MaskBuffer`].
//! Pointer samples can be far apart on fast strokes, so each segment is
//! filled with interpolated stamps spaced at most half a radius apart.

use super::mask::MaskBuffer;
use crate::settings;
use kurbo::Point;

/// A stroke in progress or just committed.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Pointer samples in the order they arrived
    pub points: Vec<Point>,
    /// Radius used for the most recent stamp
    pub radius: f64,
}

impl Stroke {
    fn start(point: Point, radius: f64) -> Self {
        Self {
            points: vec![point],
            radius,
        }
    }

    pub fn last_point(&self) -> Option<Point> {
        self.points.last().copied()
    }
}

#[derive(Debug, Clone, Default)]
enum StrokeState {
    #[default]
    Idle,
    Dragging(Stroke),
}

/// Drag state machine: `Idle` <-> `Dragging`.
///
/// The brush radius is passed on every call so a size change during a
/// drag applies to the very next stamp.
#[derive(Debug, Clone, Default)]
pub struct StrokeController {
    state: StrokeState,
}

impl StrokeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, StrokeState::Dragging(_))
    }

    /// Start a stroke and stamp its first point.
    ///
    /// A begin while already dragging abandons the old stroke; its stamps
    /// stay in the mask.
    pub fn on_drag_begin(&mut self, point: Point, mask: &mut MaskBuffer, radius: f64) {
        if self.is_dragging() {
            tracing::debug!("Drag begin while dragging, restarting stroke");
        }
        mask.stamp_circle(point, radius);
        self.state = StrokeState::Dragging(Stroke::start(point, radius));
    }

    /// Extend the stroke to `point`. Returns false (and does nothing) when
    /// no stroke is active.
    pub fn on_drag_update(&mut self, point: Point, mask: &mut MaskBuffer, radius: f64) -> bool {
        let StrokeState::Dragging(stroke) = &mut self.state else {
            tracing::debug!("Ignoring drag update with no active stroke");
            return false;
        };
        extend_stroke(stroke, point, mask, radius);
        true
    }

    /// Stamp the final point and commit the stroke.
    pub fn on_drag_end(
        &mut self,
        point: Point,
        mask: &mut MaskBuffer,
        radius: f64,
    ) -> Option<Stroke> {
        match std::mem::take(&mut self.state) {
            StrokeState::Dragging(mut stroke) => {
                extend_stroke(&mut stroke, point, mask, radius);
                Some(stroke)
            }
            StrokeState::Idle => {
                tracing::debug!("Ignoring drag end with no active stroke");
                None
            }
        }
    }

    /// Drop the active stroke without committing it.
    pub fn cancel(&mut self) {
        self.state = StrokeState::Idle;
    }
}

fn extend_stroke(stroke: &mut Stroke, point: Point, mask: &mut MaskBuffer, radius: f64) {
    let from = stroke.last_point().unwrap_or(point);
    stamp_segment(mask, from, point, radius);
    stroke.points.push(point);
    stroke.radius = radius;
}

/// Stamp along `from -> to`, excluding `from` (already stamped).
fn stamp_segment(mask: &mut MaskBuffer, from: Point, to: Point, radius: f64) {
    let length = (to - from).hypot();
    if !length.is_finite() || length == 0.0 {
        mask.stamp_circle(to, radius);
        return;
    }

    // Only the part that can touch the buffer is stamped, which also keeps
    // the stamp count bounded for samples far off the canvas.
    let Some((t0, t1)) = visible_span(mask, from, to, radius) else {
        return;
    };
    let start = from.lerp(to, t0);
    let end = from.lerp(to, t1);

    let spacing = (radius * settings::brush::STAMP_SPACING).max(0.5);
    let steps = ((end - start).hypot() / spacing).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        mask.stamp_circle(start.lerp(end, t), radius);
    }
}

/// Parameter range of `from..to` inside the buffer grown by `radius`
/// (Liang-Barsky clipping), or `None` if the segment misses it.
fn visible_span(mask: &MaskBuffer, from: Point, to: Point, radius: f64) -> Option<(f64, f64)> {
    let margin = radius.max(1.0);
    let (min_x, min_y) = (-margin, -margin);
    let max_x = mask.width() as f64 + margin;
    let max_y = mask.height() as f64 + margin;
    let d = to - from;

    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    for (p, q) in [
        (-d.x, from.x - min_x),
        (d.x, max_x - from.x),
        (-d.y, from.y - min_y),
        (d.y, max_y - from.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_stamps_first_point() {
        let mut mask = MaskBuffer::new(100, 100);
        let mut stroke = StrokeController::new();

        stroke.on_drag_begin(Point::new(20.0, 20.0), &mut mask, 4.0);

        assert!(stroke.is_dragging());
        assert!(mask.is_marked(20, 20));
        assert!(mask.is_marked(24, 20));
    }

    #[test]
    fn test_fast_update_leaves_no_gap() {
        let mut mask = MaskBuffer::new(256, 200);
        let mut stroke = StrokeController::new();
        let radius = 5.0;

        stroke.on_drag_begin(Point::new(50.0, 100.0), &mut mask, radius);
        // One jump 30x the radius
        assert!(stroke.on_drag_update(Point::new(200.0, 100.0), &mut mask, radius));

        for x in 50..=200 {
            for dy in -3i32..=3 {
                let y = (100 + dy) as u32;
                assert!(mask.is_marked(x, y), "gap at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_diagonal_update_leaves_no_gap() {
        let mut mask = MaskBuffer::new(200, 200);
        let mut stroke = StrokeController::new();

        stroke.on_drag_begin(Point::new(10.0, 10.0), &mut mask, 3.0);
        stroke.on_drag_update(Point::new(150.0, 120.0), &mut mask, 3.0);

        for i in 0..=100 {
            let p = Point::new(10.0, 10.0).lerp(Point::new(150.0, 120.0), i as f64 / 100.0);
            let (x, y) = (p.x.round() as u32, p.y.round() as u32);
            assert!(mask.is_marked(x, y), "gap at ({x}, {y})");
        }
    }

    #[test]
    fn test_segment_to_far_off_canvas_point_leaves_no_gap() {
        let mut mask = MaskBuffer::new(512, 512);
        let mut stroke = StrokeController::new();
        let radius = 2.5;

        stroke.on_drag_begin(Point::new(0.0, 256.0), &mut mask, radius);
        stroke.on_drag_update(Point::new(2_000_000.0, 256.0), &mut mask, radius);

        let gaps: Vec<u32> = (0..512).filter(|&x| !mask.is_marked(x, 256)).collect();
        assert!(gaps.is_empty(), "unmarked: {gaps:?}");
        assert!(!mask.is_marked(100, 250));
    }

    #[test]
    fn test_segment_entering_from_outside_is_clipped() {
        let mut mask = MaskBuffer::new(100, 100);
        let mut stroke = StrokeController::new();

        stroke.on_drag_begin(Point::new(-1e9, -1e9), &mut mask, 3.0);
        assert!(mask.is_empty());
        stroke.on_drag_update(Point::new(50.0, 50.0), &mut mask, 3.0);

        for i in 0..=50 {
            assert!(mask.is_marked(i, i), "gap at {i}");
        }
        assert!(!mask.is_marked(60, 60));
    }

    #[test]
    fn test_segment_missing_canvas_marks_nothing() {
        let mut mask = MaskBuffer::new(100, 100);
        let mut stroke = StrokeController::new();

        stroke.on_drag_begin(Point::new(-1e9, -50.0), &mut mask, 3.0);
        stroke.on_drag_end(Point::new(1e9, -50.0), &mut mask, 3.0);

        assert!(mask.is_empty());
    }

    #[test]
    fn test_update_while_idle_is_noop() {
        let mut mask = MaskBuffer::new(50, 50);
        let mut stroke = StrokeController::new();

        assert!(!stroke.on_drag_update(Point::new(10.0, 10.0), &mut mask, 5.0));
        assert!(stroke.on_drag_end(Point::new(10.0, 10.0), &mut mask, 5.0).is_none());
        assert!(mask.is_empty());
    }

    #[test]
    fn test_end_commits_stroke() {
        let mut mask = MaskBuffer::new(100, 100);
        let mut stroke = StrokeController::new();

        stroke.on_drag_begin(Point::new(10.0, 10.0), &mut mask, 2.0);
        stroke.on_drag_update(Point::new(20.0, 10.0), &mut mask, 2.0);
        let committed = stroke
            .on_drag_end(Point::new(30.0, 10.0), &mut mask, 2.0)
            .unwrap();

        assert!(!stroke.is_dragging());
        assert_eq!(committed.points.len(), 3);
        assert_eq!(committed.last_point(), Some(Point::new(30.0, 10.0)));
        assert!(mask.is_marked(30, 10));
        assert!(mask.is_marked(25, 10));
    }

    #[test]
    fn test_radius_change_applies_mid_stroke() {
        let mut mask = MaskBuffer::new(100, 100);
        let mut stroke = StrokeController::new();

        stroke.on_drag_begin(Point::new(20.0, 50.0), &mut mask, 2.0);
        assert!(!mask.is_marked(20, 58));

        stroke.on_drag_update(Point::new(60.0, 50.0), &mut mask, 10.0);
        assert!(mask.is_marked(60, 58));
        // The begin stamp was small and stays small
        assert!(!mask.is_marked(12, 50));
    }

    #[test]
    fn test_cancel_keeps_stamps() {
        let mut mask = MaskBuffer::new(50, 50);
        let mut stroke = StrokeController::new();

        stroke.on_drag_begin(Point::new(25.0, 25.0), &mut mask, 3.0);
        stroke.cancel();

        assert!(!stroke.is_dragging());
        assert!(mask.is_marked(25, 25));
        assert!(stroke.on_drag_end(Point::new(25.0, 25.0), &mut mask, 3.0).is_none());
    }
}
