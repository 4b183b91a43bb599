// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Work progress tracking for the active mode.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How progress is drawn in the side panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStyle {
    #[default]
    Bar,
    Pie,
}

/// Progress of the current working session.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    /// Images in the working set that are done for the mode.
    pub annotated: usize,
    /// Size of the working set.
    pub total: usize,
    /// Operator-chosen goal; 0 means "the whole working set".
    pub target: usize,
    /// Annotated count when the mode started, for pace calculation.
    session_start: Option<usize>,
    celebrated: bool,
}

impl Progress {
    pub fn new(total: usize, target: usize) -> Self {
        Self {
            total,
            target,
            ..Self::default()
        }
    }

    /// Record a fresh annotated count.
    ///
    /// Returns true exactly once each time a positive target is reached;
    /// dropping below the target re-arms it.
    pub fn update(&mut self, annotated: usize) -> bool {
        self.annotated = annotated;
        self.session_start.get_or_insert(annotated);

        if self.target == 0 {
            return false;
        }
        if annotated >= self.target {
            let first = !self.celebrated;
            self.celebrated = true;
            first
        } else {
            self.celebrated = false;
            false
        }
    }

    /// Completion ratio in `0.0..=1.0`.
    pub fn ratio(&self) -> f32 {
        let goal = if self.target > 0 {
            self.target
        } else {
            self.total.max(1)
        };
        (self.annotated as f32 / goal as f32).min(1.0)
    }

    /// Images annotated since the mode started.
    pub fn processed_this_session(&self) -> usize {
        self.session_start
            .map(|start| self.annotated.saturating_sub(start))
            .unwrap_or(0)
    }

    /// Average seconds per image, once at least one image was done.
    pub fn pace(&self, elapsed: Duration) -> Option<f64> {
        match self.processed_this_session() {
            0 => None,
            n => Some(elapsed.as_secs_f64() / n as f64),
        }
    }
}

/// Format a duration as `HH:MM:SS`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
