// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! Inference requests, outcomes, and the backend seam.
//!
//! A request is an immutable snapshot of the image and mask taken when the
//! debounce fired. Backends run on a worker thread and always hand back an
//! [`InferenceOutcome`]; failures are values, never panics.

pub mod client;
pub mod crop;
pub mod wire;

use crate::editing::mask::{MaskBuffer, PixelRect};
use image::RgbaImage;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use client::HttpInferenceClient;

/// Identity of a request, used to detect stale outcomes.
pub type RequestId = u64;

// ============================================================================
// REQUEST
// ============================================================================

/// Snapshot sent to the backend.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    id: RequestId,
    image: Arc<RgbaImage>,
    mask: MaskBuffer,
    crop: Option<PixelRect>,
    model: String,
    prompt: String,
}

impl InferenceRequest {
    pub fn new(
        id: RequestId,
        image: Arc<RgbaImage>,
        mask: MaskBuffer,
        crop: Option<PixelRect>,
        model: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            id,
            image,
            mask,
            crop,
            model: model.into(),
            prompt: prompt.into(),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Full image as it was when the request was built
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Full mask as it was when the request was built
    pub fn mask(&self) -> &MaskBuffer {
        &self.mask
    }

    /// Region sent to the backend, `None` for the whole canvas
    pub fn crop(&self) -> Option<PixelRect> {
        self.crop
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Image pixels actually transmitted (cropped when a region is set).
    pub fn payload_image(&self) -> RgbaImage {
        match self.crop {
            Some(r) => image::imageops::crop_imm(self.image.as_ref(), r.x, r.y, r.width, r.height)
                .to_image(),
            None => self.image.as_ref().clone(),
        }
    }

    /// Mask pixels actually transmitted (cropped when a region is set).
    pub fn payload_mask(&self) -> MaskBuffer {
        match self.crop {
            Some(r) => self.mask.crop(r),
            None => self.mask.clone(),
        }
    }
}

// ============================================================================
// OUTCOME
// ============================================================================

/// Why an inference call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("Request timed out after {:.1}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("Connection error: is the inference server running? ({0})")]
    Connection(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned HTTP {status}")]
    Server { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Could not encode request: {0}")]
    Encode(String),

    #[error("Inference worker failed: {0}")]
    Worker(String),
}

/// Result of one inference call.
#[derive(Debug, Clone)]
pub enum InferenceOutcome {
    Success {
        image: RgbaImage,
        elapsed: Duration,
    },
    Failure {
        error: InferenceError,
        elapsed: Option<Duration>,
    },
}

impl InferenceOutcome {
    pub fn failure(error: InferenceError) -> Self {
        Self::Failure {
            error,
            elapsed: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            Self::Success { elapsed, .. } => Some(*elapsed),
            Self::Failure { elapsed, .. } => *elapsed,
        }
    }
}

// ============================================================================
// BACKEND
// ============================================================================

/// Something that can turn a request into an outcome.
///
/// Called from a blocking worker thread; implementations may block for as
/// long as their own timeout allows.
pub trait InferenceBackend: Send + Sync {
    fn submit(&self, request: &InferenceRequest) -> InferenceOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use kurbo::Point;

    #[test]
    fn test_payload_respects_crop() {
        let mut image = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255]));
        image.put_pixel(40, 40, Rgba([9, 9, 9, 255]));
        let mut mask = MaskBuffer::new(64, 64);
        mask.stamp_circle(Point::new(40.0, 40.0), 1.0);

        let request = InferenceRequest::new(
            7,
            Arc::new(image),
            mask,
            Some(PixelRect::new(32, 32, 16, 16)),
            "m",
            "p",
        );

        let payload = request.payload_image();
        assert_eq!(payload.dimensions(), (16, 16));
        assert_eq!(payload.get_pixel(8, 8).0, [9, 9, 9, 255]);
        assert!(request.payload_mask().is_marked(8, 8));
        assert_eq!(request.image().dimensions(), (64, 64));
    }

    #[test]
    fn test_snapshot_is_independent_of_later_edits() {
        let mut live_mask = MaskBuffer::new(32, 32);
        live_mask.stamp_circle(Point::new(4.0, 4.0), 2.0);
        let image = Arc::new(RgbaImage::new(32, 32));

        let request = InferenceRequest::new(1, image, live_mask.clone(), None, "m", "p");
        live_mask.stamp_circle(Point::new(20.0, 20.0), 2.0);

        assert!(request.mask().is_marked(4, 4));
        assert!(!request.mask().is_marked(20, 20));
    }

    #[test]
    fn test_error_messages_are_readable() {
        let timeout = InferenceError::Timeout(Duration::from_secs(15));
        assert_eq!(timeout.to_string(), "Request timed out after 15.0s");

        let server = InferenceError::Server {
            status: 503,
            body: String::new(),
        };
        assert_eq!(server.to_string(), "Server returned HTTP 503");
    }
}
