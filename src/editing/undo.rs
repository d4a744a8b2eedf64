// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! Undo history of applied inference results.
//!
//! Each entry is the image as it was right before a result replaced it.
//! Snapshots are shared `Arc`s, so pushing never copies pixels.

use image::RgbaImage;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct UndoHistory {
    entries: VecDeque<Arc<RgbaImage>>,
    /// `None` keeps every entry
    limit: Option<usize>,
}

impl UndoHistory {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Save a snapshot, dropping the oldest entry when over the limit.
    pub fn push(&mut self, snapshot: Arc<RgbaImage>) {
        if self.limit == Some(0) {
            return;
        }
        self.entries.push_back(snapshot);
        if let Some(limit) = self.limit {
            while self.entries.len() > limit {
                self.entries.pop_front();
            }
        }
    }

    pub fn pop(&mut self) -> Option<Arc<RgbaImage>> {
        self.entries.pop_back()
    }

    /// The snapshot `pop` would return
    pub fn peek(&self) -> Option<&Arc<RgbaImage>> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(Some(crate::settings::history::UNDO_LIMIT))
    }
}
