// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! Runtime configuration.
//!
//! Defaults come from [`crate::settings`]. A TOML file may override any
//! subset of fields:
//!
//! ```toml
//! [inference]
//! endpoint = "http://localhost:8000/v1/images/edits"
//! model = "sd-turbo"
//! timeout_secs = 15
//!
//! [editor]
//! debounce_ms = 400
//! canvas_size = 1024
//! ```

use crate::settings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Inference endpoint settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceConfig {
    pub endpoint: String,
    pub model: String,
    pub prompt: String,
    pub timeout_secs: f64,
}

impl InferenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: settings::inference::ENDPOINT.to_string(),
            model: settings::inference::MODEL.to_string(),
            prompt: settings::inference::PROMPT.to_string(),
            timeout_secs: settings::inference::TIMEOUT.as_secs_f64(),
        }
    }
}

/// Editing session settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Quiet period after the last stroke before a request is sent
    pub debounce_ms: u64,
    /// Letterbox opened images onto a square canvas of this size
    pub canvas_size: Option<u32>,
    /// Undo snapshots kept; 0 keeps all of them
    pub undo_limit: usize,
    /// Send a crop around the mask instead of the whole canvas
    pub crop_to_mask: bool,
    /// Initial brush diameter
    pub brush_size: f64,
}

impl EditorConfig {
    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn undo_limit(&self) -> Option<usize> {
        (self.undo_limit > 0).then_some(self.undo_limit)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: settings::debounce::INTERVAL.as_millis() as u64,
            canvas_size: None,
            undo_limit: settings::history::UNDO_LIMIT,
            crop_to_mask: true,
            brush_size: settings::brush::DEFAULT_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EraserConfig {
    pub inference: InferenceConfig,
    pub editor: EditorConfig,
}

impl EraserConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = &self.inference.endpoint;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "inference.endpoint",
                reason: format!("expected an http(s) URL, got {endpoint:?}"),
            });
        }
        let timeout = self.inference.timeout_secs;
        if !timeout.is_finite() || timeout <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "inference.timeout_secs",
                reason: format!("must be a positive number of seconds, got {timeout}"),
            });
        }
        if self.inference.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "inference.model",
                reason: "must not be empty".to_string(),
            });
        }
        if self.editor.canvas_size == Some(0) {
            return Err(ConfigError::Invalid {
                field: "editor.canvas_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.editor.brush_size.is_finite() {
            return Err(ConfigError::Invalid {
                field: "editor.brush_size",
                reason: "must be a number".to_string(),
            });
        }
        Ok(())
    }
}
