// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Working-session serialization and deserialization.
//!
//! A session file captures enough to resume exactly where work stopped:
//! the image index, the boxes and both history stacks of the current
//! image, the approval map, and the editing options.

use crate::models::annotation::BoxStore;
use crate::models::approval::{ApprovalStatus, WorkMode};
use crate::models::progress::ProgressStyle;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

pub const LINE_WIDTH_RANGE: RangeInclusive<u32> = 1..=10;
pub const FONT_SIZE_RANGE: RangeInclusive<u32> = 8..=32;
pub const LOG_LINES_RANGE: RangeInclusive<u32> = 1..=20;

/// Operator-tunable editing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    pub line_width: u32,
    pub font_size: u32,
    pub log_lines: u32,
    pub target_count: usize,
    pub progress_style: ProgressStyle,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            line_width: 2,
            font_size: 12,
            log_lines: 4,
            target_count: 0,
            progress_style: ProgressStyle::Bar,
        }
    }
}

impl EditorOptions {
    /// Pull every value back into its allowed range.
    pub fn clamped(self) -> Self {
        let clamp =
            |value: u32, range: RangeInclusive<u32>| value.clamp(*range.start(), *range.end());
        Self {
            line_width: clamp(self.line_width, LINE_WIDTH_RANGE),
            font_size: clamp(self.font_size, FONT_SIZE_RANGE),
            log_lines: clamp(self.log_lines, LOG_LINES_RANGE),
            ..self
        }
    }
}

/// Complete session data for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub project_dir: PathBuf,
    pub image_dir: PathBuf,
    pub labels_dir: PathBuf,
    pub current_image_index: usize,
    /// File name at `current_image_index` when saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_image: Option<String>,
    pub boxes: BoxStore,
    pub undo_stack: Vec<BoxStore>,
    pub redo_stack: Vec<BoxStore>,
    #[serde(default, alias = "annotation_status")]
    pub approval_status: ApprovalStatus,
    #[serde(default)]
    pub options: EditorOptions,
}

impl SessionRecord {
    /// Index to resume at within a working set of `len` images.
    ///
    /// Out-of-range indices fall back to the start. Review modes also
    /// restart when the saved index is the last item, since that image
    /// was most likely just finished.
    pub fn resume_index(&self, len: usize, mode: WorkMode) -> usize {
        let index = self.current_image_index;
        if index >= len {
            return 0;
        }
        if mode.is_review() && index + 1 == len {
            return 0;
        }
        index
    }
}

/// Write a session file without clobbering the previous one on failure.
pub fn save_session(record: &SessionRecord, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(record)?;
    crate::io::write_replace(path, json.as_bytes())
        .with_context(|| format!("Failed to save session {}", path.display()))
}

/// Read a session file.
pub fn load_session(path: &Path) -> Result<SessionRecord> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session {}", path.display()))?;
    let record = serde_json::from_str(&json)
        .with_context(|| format!("Malformed session {}", path.display()))?;
    Ok(record)
}
