// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! Erase mask painted by the brush.
//!
//! A marked pixel (255) means "replace this". The mask always matches the
//! dimensions of the image it was created for; stamps that fall outside the
//! buffer are clipped rather than rejected.

use crate::settings;
use image::{GrayImage, Luma, Rgb, RgbImage, RgbaImage};
use kurbo::Point;

const MARKED: u8 = 255;
const UNMARKED: u8 = 0;

/// Smallest effective stamp radius. Every point inside the buffer is within
/// 1/sqrt(2) of some pixel coordinate, so a stamp always marks something.
const MIN_STAMP_RADIUS: f64 = 0.75;

// ============================================================================
// PIXEL RECT
// ============================================================================

/// Axis-aligned rectangle in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

// ============================================================================
// MASK BUFFER
// ============================================================================

/// Raster of erase marks, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskBuffer {
    pixels: GrayImage,
}

impl MaskBuffer {
    /// Create a blank (all unmarked) mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: GrayImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Mark every pixel within `radius` of `center`.
    ///
    /// Stamping is idempotent. Pixels outside the buffer are skipped, and a
    /// center that is not a finite point is ignored.
    pub fn stamp_circle(&mut self, center: Point, radius: f64) {
        let (width, height) = self.dimensions();
        if width == 0 || height == 0 || !center.is_finite() {
            return;
        }

        let r = if radius.is_finite() {
            radius.max(MIN_STAMP_RADIUS)
        } else {
            MIN_STAMP_RADIUS
        };
        let r_sq = r * r;

        // Clip the stamp's bounding box to the buffer
        let min_x = (center.x - r).floor().max(0.0);
        let min_y = (center.y - r).floor().max(0.0);
        let max_x = (center.x + r).ceil().min((width - 1) as f64);
        let max_y = (center.y + r).ceil().min((height - 1) as f64);
        if min_x > max_x || min_y > max_y {
            return;
        }

        for y in min_y as u32..=max_y as u32 {
            let dy = y as f64 - center.y;
            for x in min_x as u32..=max_x as u32 {
                let dx = x as f64 - center.x;
                if dx * dx + dy * dy <= r_sq {
                    self.pixels.put_pixel(x, y, Luma([MARKED]));
                }
            }
        }
    }

    /// Reset every pixel to unmarked.
    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            pixel.0[0] = UNMARKED;
        }
    }

    /// Whether (x, y) is marked. Out-of-bounds coordinates are unmarked.
    pub fn is_marked(&self, x: u32, y: u32) -> bool {
        self.pixels
            .get_pixel_checked(x, y)
            .is_some_and(|p| p.0[0] != UNMARKED)
    }

    pub fn marked_count(&self) -> usize {
        self.pixels.as_raw().iter().filter(|&&v| v != UNMARKED).count()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.as_raw().iter().all(|&v| v == UNMARKED)
    }

    /// Tight bounding box of all marked pixels.
    pub fn bounds(&self) -> Option<PixelRect> {
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        let mut found = false;

        for (x, y, pixel) in self.pixels.enumerate_pixels() {
            if pixel.0[0] != UNMARKED {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
                found = true;
            }
        }

        found.then(|| PixelRect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Unmark every pixel that is marked in `other`.
    ///
    /// Masks of different dimensions are left untouched.
    pub fn subtract(&mut self, other: &MaskBuffer) {
        if self.dimensions() != other.dimensions() {
            tracing::warn!(
                "Ignoring mask subtract with mismatched sizes {:?} vs {:?}",
                self.dimensions(),
                other.dimensions()
            );
            return;
        }
        for (mine, theirs) in self.pixels.pixels_mut().zip(other.pixels.pixels()) {
            if theirs.0[0] != UNMARKED {
                mine.0[0] = UNMARKED;
            }
        }
    }

    /// Copy of the sub-rectangle `region`, clipped to the buffer.
    pub fn crop(&self, region: PixelRect) -> MaskBuffer {
        let pixels = image::imageops::crop_imm(
            &self.pixels,
            region.x,
            region.y,
            region.width,
            region.height,
        )
        .to_image();
        Self { pixels }
    }

    /// Standalone raster for transmission: white = erase, black = keep.
    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width(), self.height(), |x, y| {
            if self.is_marked(x, y) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    /// Composite a translucent overlay on the marked pixels of `image`.
    ///
    /// Used while painting so the user sees what will be erased. Returns
    /// a plain copy when the sizes don't match.
    pub fn overlay_onto(&self, image: &RgbaImage) -> RgbaImage {
        let mut out = image.clone();
        if image.dimensions() != self.dimensions() {
            return out;
        }

        let [or, og, ob] = settings::preview::OVERLAY_RGB;
        let alpha = settings::preview::OVERLAY_ALPHA as u32;
        let blend = |base: u8, over: u8| -> u8 {
            ((base as u32 * (255 - alpha) + over as u32 * alpha + 127) / 255) as u8
        };

        for (x, y, pixel) in out.enumerate_pixels_mut() {
            if self.is_marked(x, y) {
                let [r, g, b, a] = pixel.0;
                pixel.0 = [blend(r, or), blend(g, og), blend(b, ob), a];
            }
        }
        out
    }
}
