// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! Crop planning: send a square around the mask instead of the whole canvas.

use crate::editing::mask::{MaskBuffer, PixelRect};
use crate::settings;

/// Square region to send for `mask`, or `None` to send the full image.
///
/// The mask bounds are padded, squared to the larger side (never smaller
/// than the model's minimum input), centred on the mask, and clamped inside
/// the canvas. Once the square would cover most of the canvas the full
/// image is cheaper to reason about and is sent instead.
pub fn plan_crop(mask: &MaskBuffer) -> Option<PixelRect> {
    let (width, height) = mask.dimensions();
    let bounds = mask.bounds()?;
    let pad = settings::crop::PADDING;

    let min_x = bounds.x.saturating_sub(pad);
    let min_y = bounds.y.saturating_sub(pad);
    let max_x = (bounds.right() - 1 + pad).min(width - 1);
    let max_y = (bounds.bottom() - 1 + pad).min(height - 1);

    let side = (max_x - min_x + 1)
        .max(max_y - min_y + 1)
        .max(settings::crop::MIN_SIZE);

    let shorter = width.min(height);
    if side > shorter || side as f64 > shorter as f64 * settings::crop::FULL_IMAGE_RATIO {
        return None;
    }

    let center_x = (min_x + max_x) as f64 / 2.0;
    let center_y = (min_y + max_y) as f64 / 2.0;
    let half = side as f64 / 2.0;
    let x = (center_x - half).round().clamp(0.0, (width - side) as f64) as u32;
    let y = (center_y - half).round().clamp(0.0, (height - side) as f64) as u32;

    Some(PixelRect::new(x, y, side, side))
}
