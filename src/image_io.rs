// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! Image loading, saving, and canvas fitting.
//!
//! Decoding itself is the `image` crate's job; this module only turns
//! files into RGBA8 rasters and letterboxes them onto a square canvas.

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageIoError {
    #[error("Failed to load image {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to save image {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Decode an image file to RGBA8.
pub fn load_image(path: &Path) -> Result<RgbaImage, ImageIoError> {
    let image = image::open(path).map_err(|source| ImageIoError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = image.to_rgba8();
    tracing::info!(
        "Loaded image {} ({}x{})",
        path.display(),
        rgba.width(),
        rgba.height()
    );
    Ok(rgba)
}

/// Save an image; the format follows the file extension.
///
/// Formats without an alpha channel (JPEG) get the RGB channels only.
pub fn save_image(image: &RgbaImage, path: &Path) -> Result<(), ImageIoError> {
    let result = match ImageFormat::from_path(path) {
        Ok(ImageFormat::Jpeg) => DynamicImage::ImageRgba8(image.clone()).to_rgb8().save(path),
        _ => image.save(path),
    };
    result.map_err(|source| ImageIoError::Save {
        path: path.to_path_buf(),
        source,
    })
}

/// Scale `image` to fit a `size` x `size` black canvas, preserving aspect
/// ratio and centring it.
pub fn letterbox(image: &RgbaImage, size: u32) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 255]));
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || size == 0 {
        return canvas;
    }

    let scale = (size as f64 / width as f64).min(size as f64 / height as f64);
    let fit_w = ((width as f64 * scale).round() as u32).clamp(1, size);
    let fit_h = ((height as f64 * scale).round() as u32).clamp(1, size);

    let fitted = if (fit_w, fit_h) == (width, height) {
        image.clone()
    } else {
        imageops::resize(image, fit_w, fit_h, FilterType::Triangle)
    };

    let x = (size - fit_w) / 2;
    let y = (size - fit_h) / 2;
    imageops::overlay(&mut canvas, &fitted, x as i64, y as i64);
    canvas
}
