// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! Compiled-in defaults and tuning constants.
//!
//! Everything here can be overridden at runtime through `EraserConfig`
//! (TOML file or command line). Values that are not user-facing stay
//! private to this module's public sub-modules.

use std::time::Duration;

// ============================================================================
// BRUSH SETTINGS
// ============================================================================
/// Smallest brush diameter the slider allows (pixels)
const BRUSH_MIN_SIZE: f64 = 5.0;

/// Largest brush diameter the slider allows (pixels)
const BRUSH_MAX_SIZE: f64 = 150.0;

/// Brush diameter on startup (pixels)
const BRUSH_DEFAULT_SIZE: f64 = 30.0;

/// Interpolated stamps are placed at most `radius * SPACING` apart.
/// Anything at or below 1.0 leaves no gap; 0.5 keeps the edge smooth.
const BRUSH_STAMP_SPACING: f64 = 0.5;

// ============================================================================
// DEBOUNCE SETTINGS
// ============================================================================
/// Quiet period after the last committed stroke before a request is sent
const DEBOUNCE_INTERVAL_MS: u64 = 400;

// ============================================================================
// INFERENCE SETTINGS
// ============================================================================
const INFERENCE_ENDPOINT: &str = "http://localhost:8000/v1/images/edits";
const INFERENCE_MODEL: &str = "sd-turbo";
const INFERENCE_PROMPT: &str = "clean background";

/// Total request timeout, connect included
const INFERENCE_TIMEOUT_SECS: u64 = 15;

/// Error text shown in the status bar is cut to this many characters
const STATUS_MESSAGE_MAX_CHARS: usize = 60;

// ============================================================================
// CROP SETTINGS
// ============================================================================
// Small edits are sent as a square crop around the mask instead of the
// whole canvas. The crop grows with the mask and falls back to the full
// image once it would cover most of the canvas.

/// Context kept around the mask bounding box (pixels)
const CROP_PADDING: u32 = 64;

/// Inpainting models want a reasonable input size
const CROP_MIN_SIZE: u32 = 512;

/// Send the full image once the crop exceeds this share of the canvas side
const CROP_FULL_IMAGE_RATIO: f64 = 0.75;

// ============================================================================
// HISTORY SETTINGS
// ============================================================================
/// Oldest undo snapshots are dropped beyond this many entries
const UNDO_LIMIT: usize = 32;

// ============================================================================
// PREVIEW SETTINGS
// ============================================================================
/// Overlay color for marked pixels while painting (RGB)
const MASK_OVERLAY_RGB: [u8; 3] = [0xff, 0x00, 0x00];

/// Overlay opacity, ~40%
const MASK_OVERLAY_ALPHA: u8 = 102;

// ============================================================================
// PUBLIC API - Don't edit below this line unless you know what you're doing
// ============================================================================

/// Brush size limits (diameter, in canvas pixels)
pub mod brush {
    pub const MIN_SIZE: f64 = super::BRUSH_MIN_SIZE;
    pub const MAX_SIZE: f64 = super::BRUSH_MAX_SIZE;
    pub const DEFAULT_SIZE: f64 = super::BRUSH_DEFAULT_SIZE;

    /// Stamp spacing as a fraction of the brush radius
    pub const STAMP_SPACING: f64 = super::BRUSH_STAMP_SPACING;
}

/// Debounce between the last stroke and the inference request
pub mod debounce {
    use super::Duration;

    pub const INTERVAL: Duration = Duration::from_millis(super::DEBOUNCE_INTERVAL_MS);
}

/// Inference endpoint defaults
pub mod inference {
    use super::Duration;

    pub const ENDPOINT: &str = super::INFERENCE_ENDPOINT;
    pub const MODEL: &str = super::INFERENCE_MODEL;
    pub const PROMPT: &str = super::INFERENCE_PROMPT;
    pub const TIMEOUT: Duration = Duration::from_secs(super::INFERENCE_TIMEOUT_SECS);
    pub const STATUS_MESSAGE_MAX_CHARS: usize = super::STATUS_MESSAGE_MAX_CHARS;
}

/// Crop-to-mask planning
pub mod crop {
    pub const PADDING: u32 = super::CROP_PADDING;
    pub const MIN_SIZE: u32 = super::CROP_MIN_SIZE;
    pub const FULL_IMAGE_RATIO: f64 = super::CROP_FULL_IMAGE_RATIO;
}

/// Undo history
pub mod history {
    pub const UNDO_LIMIT: usize = super::UNDO_LIMIT;
}

/// Mask overlay drawn over the image while painting
pub mod preview {
    pub const OVERLAY_RGB: [u8; 3] = super::MASK_OVERLAY_RGB;
    pub const OVERLAY_ALPHA: u8 = super::MASK_OVERLAY_ALPHA;
}
