// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Operator-facing activity log.
//!
//! Messages go to the `log` facade, to a per-mode log file in the
//! project directory, and to a short in-memory history shown in the UI.
//! A failing log file never interrupts work; the failure is reported
//! through `log::error!` instead.

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Lines kept for the UI log panel.
pub const MAX_LINES: usize = 200;

#[derive(Debug, Default)]
pub struct ActivityLog {
    file: Option<PathBuf>,
    lines: VecDeque<String>,
}

/// Log file name for a mode started at `started`.
pub fn log_file_name(started: DateTime<Local>, folder: &str, mode: &str) -> String {
    format!("{}_{}_{}.log", started.format("%Y%m%d_%H%M%S"), folder, mode)
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start writing to a fresh log file inside `project_dir`.
    pub fn open_file(&mut self, project_dir: &Path, folder: &str, mode: &str) {
        let path = project_dir.join(log_file_name(Local::now(), folder, mode));
        log::debug!("Activity log file: {}", path.display());
        self.file = Some(path);
    }

    pub fn close_file(&mut self) {
        self.file = None;
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Record an operator-facing message.
    pub fn record(&mut self, message: impl Into<String>) {
        self.record_at(Local::now(), message.into());
    }

    fn record_at(&mut self, at: DateTime<Local>, message: String) {
        log::info!("{}", message);
        let entry = format!("[{}] {}", at.format("%H:%M:%S"), message);

        if let Some(path) = &self.file {
            let written = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut f| writeln!(f, "{}", entry));
            if let Err(e) = written {
                log::error!("Log file writing error ({}): {}", path.display(), e);
            }
        }

        self.lines.push_back(entry);
        while self.lines.len() > MAX_LINES {
            self.lines.pop_front();
        }
    }

    /// The most recent `n` lines, oldest first.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &str> {
        let skip = self.lines.len().saturating_sub(n);
        self.lines.iter().skip(skip).map(String::as_str)
    }
}
