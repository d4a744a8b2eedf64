// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! HTTP backend for an OpenAI-style image edit endpoint.
//!
//! Uses the blocking reqwest client: the call already runs on a dedicated
//! worker thread, and the total timeout covers connect, upload, and the
//! response body.

use super::wire::{self, EditRequestBody};
use super::{InferenceBackend, InferenceError, InferenceOutcome, InferenceRequest};
use crate::config::InferenceConfig;
use image::RgbaImage;
use std::time::{Duration, Instant};

/// Longest server error body kept for logging
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct HttpInferenceClient {
    endpoint: String,
    timeout: Duration,
}

impl HttpInferenceClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn from_config(config: &InferenceConfig) -> Self {
        Self::new(config.endpoint.clone(), config.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn send(&self, body: &EditRequestBody) -> Result<RgbaImage, InferenceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        let response = client
            .post(&self.endpoint)
            .json(body)
            .send()
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            return Err(InferenceError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().map_err(|e| self.classify(e))?;
        wire::decode_response(&bytes)
    }

    fn classify(&self, error: reqwest::Error) -> InferenceError {
        if error.is_timeout() {
            InferenceError::Timeout(self.timeout)
        } else if error.is_connect() {
            InferenceError::Connection(error.to_string())
        } else {
            InferenceError::Network(error.to_string())
        }
    }
}

impl InferenceBackend for HttpInferenceClient {
    fn submit(&self, request: &InferenceRequest) -> InferenceOutcome {
        let body = match EditRequestBody::from_request(request) {
            Ok(body) => body,
            Err(error) => return InferenceOutcome::failure(error),
        };

        tracing::debug!(
            "POST {} (request {}, {}x{})",
            self.endpoint,
            request.id(),
            request.payload_mask().width(),
            request.payload_mask().height()
        );

        let started = Instant::now();
        match self.send(&body) {
            Ok(image) => InferenceOutcome::Success {
                image,
                elapsed: started.elapsed(),
            },
            Err(error) => {
                if let InferenceError::Server { status, body } = &error {
                    tracing::warn!("Inference server returned {}: {}", status, body);
                }
                InferenceOutcome::Failure {
                    error,
                    elapsed: Some(started.elapsed()),
                }
            }
        }
    }
}
