// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! JSON wire format of the `/v1/images/edits` endpoint.
//!
//! Request: `{model, prompt, image, mask}` where image and mask are PNG
//! data URLs. Response: `{data: [{b64_json}]}`.

use super::{InferenceError, InferenceRequest};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditRequestBody {
    pub model: String,
    pub prompt: String,
    pub image: String,
    pub mask: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditResponseBody {
    #[serde(default)]
    pub data: Vec<EditResponseDatum>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditResponseDatum {
    #[serde(default)]
    pub b64_json: Option<String>,
}

impl EditRequestBody {
    /// Encode the request's payload (cropped image and mask) as PNG data URLs.
    pub fn from_request(request: &InferenceRequest) -> Result<Self, InferenceError> {
        let image = encode_png_data_url(DynamicImage::ImageRgba8(request.payload_image()))?;
        let mask = encode_png_data_url(DynamicImage::ImageRgb8(request.payload_mask().to_image()))?;
        Ok(Self {
            model: request.model().to_string(),
            prompt: request.prompt().to_string(),
            image,
            mask,
        })
    }
}

/// PNG-encode and wrap as `data:image/png;base64,...`.
pub fn encode_png_data_url(image: DynamicImage) -> Result<String, InferenceError> {
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| InferenceError::Encode(e.to_string()))?;
    Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(png)))
}

/// Pull the first result image out of a response body.
pub fn decode_response(body: &[u8]) -> Result<RgbaImage, InferenceError> {
    let parsed: EditResponseBody = serde_json::from_slice(body)
        .map_err(|e| InferenceError::Decode(format!("invalid JSON: {e}")))?;

    let b64 = parsed
        .data
        .into_iter()
        .next()
        .ok_or_else(|| InferenceError::Decode("response has no data".to_string()))?
        .b64_json
        .ok_or_else(|| InferenceError::Decode("result has no b64_json".to_string()))?;

    decode_base64_image(&b64)
}

/// Decode a base64 image, with or without a data-URL prefix.
pub fn decode_base64_image(encoded: &str) -> Result<RgbaImage, InferenceError> {
    let encoded = encoded.trim();
    let payload = encoded
        .split_once(";base64,")
        .map_or(encoded, |(_, rest)| rest);

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| InferenceError::Decode(format!("invalid base64: {e}")))?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| InferenceError::Decode(format!("invalid image: {e}")))?;
    Ok(image.to_rgba8())
}
