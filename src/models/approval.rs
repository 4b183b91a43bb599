// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Review workflow: per-image approval status and working modes.
//!
//! Every image is implicitly unconfirmed until a reviewer approves or
//! rejects it. Saving fresh labels over a rejected image marks it fixed,
//! which queues it for re-approval.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Review state of a single image. Absence from [`ApprovalStatus`] means
/// unconfirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalState {
    Approved,
    Rejected,
    Fixed,
}

impl ApprovalState {
    pub fn label(state: Option<Self>) -> &'static str {
        match state {
            None => "unconfirmed",
            Some(Self::Approved) => "approved",
            Some(Self::Rejected) => "rejected",
            Some(Self::Fixed) => "fixed",
        }
    }
}

/// Map from image file name to its review state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalStatus {
    entries: BTreeMap<String, ApprovalState>,
}

impl ApprovalStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the sidecar file, treating a missing file as empty.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let status = serde_json::from_str(&json)
            .with_context(|| format!("Malformed approval file {}", path.display()))?;
        Ok(status)
    }

    /// Write the sidecar file, replacing the previous one atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        crate::io::write_replace(path, json.as_bytes())
    }

    pub fn get(&self, filename: &str) -> Option<ApprovalState> {
        self.entries.get(filename).copied()
    }

    pub fn set(&mut self, filename: &str, state: ApprovalState) {
        self.entries.insert(filename.to_string(), state);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ApprovalState)> {
        self.entries.iter().map(|(name, state)| (name.as_str(), *state))
    }

    /// Record that labels were saved for `filename`.
    ///
    /// A rejected image becomes fixed; anything else is left alone.
    /// Returns true when the status changed.
    pub fn mark_saved(&mut self, filename: &str) -> bool {
        if self.get(filename) == Some(ApprovalState::Rejected) {
            self.set(filename, ApprovalState::Fixed);
            true
        } else {
            false
        }
    }

    /// Apply [`mark_saved`](Self::mark_saved) and persist the sidecar at
    /// `path` when the status changed.
    pub fn record_save(&mut self, filename: &str, path: &Path) -> Result<bool> {
        if !self.mark_saved(filename) {
            return Ok(false);
        }
        self.save(path)?;
        Ok(true)
    }
}

/// Working mode; decides which images are visited and which actions apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkMode {
    Annotation,
    Approval,
    Correction,
    Reapproval,
}

impl WorkMode {
    pub const ALL: [WorkMode; 4] = [
        WorkMode::Annotation,
        WorkMode::Approval,
        WorkMode::Correction,
        WorkMode::Reapproval,
    ];

    /// Modes in which boxes may be edited and history is active.
    pub fn is_editing(self) -> bool {
        matches!(self, WorkMode::Annotation | WorkMode::Correction)
    }

    /// Modes in which the operator approves or rejects.
    pub fn is_review(self) -> bool {
        !self.is_editing()
    }

    pub fn name(self) -> &'static str {
        match self {
            WorkMode::Annotation => "annotation",
            WorkMode::Approval => "approval",
            WorkMode::Correction => "correction",
            WorkMode::Reapproval => "reapproval",
        }
    }

    /// Whether an image counts as finished for this mode's progress.
    pub fn is_done(self, state: Option<ApprovalState>, has_label: bool) -> bool {
        match self {
            WorkMode::Annotation => has_label,
            WorkMode::Correction => state == Some(ApprovalState::Fixed),
            WorkMode::Approval | WorkMode::Reapproval => matches!(
                state,
                Some(ApprovalState::Approved) | Some(ApprovalState::Rejected)
            ),
        }
    }

    /// Select the images this mode works on, keeping folder order.
    pub fn target_images<F>(
        self,
        all_images: &[String],
        status: &ApprovalStatus,
        has_label: F,
    ) -> Result<Vec<String>, WorkflowError>
    where
        F: Fn(&str) -> bool,
    {
        let targets: Vec<String> = all_images
            .iter()
            .filter(|name| match self {
                WorkMode::Annotation => true,
                WorkMode::Approval => {
                    has_label(name) && status.get(name) != Some(ApprovalState::Approved)
                }
                WorkMode::Correction => status.get(name) == Some(ApprovalState::Rejected),
                WorkMode::Reapproval => status.get(name) == Some(ApprovalState::Fixed),
            })
            .cloned()
            .collect();

        if targets.is_empty() && self != WorkMode::Annotation {
            return Err(WorkflowError::EmptyMode(self));
        }
        Ok(targets)
    }
}

impl fmt::Display for WorkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("no images to work on in {0} mode")]
    EmptyMode(WorkMode),
}

/// Folder-wide counters for the start screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    pub annotated: usize,
    pub approved: usize,
    pub rejected: usize,
    pub fixed: usize,
}

impl DashboardStats {
    pub fn collect<F>(all_images: &[String], status: &ApprovalStatus, has_label: F) -> Self
    where
        F: Fn(&str) -> bool,
    {
        let mut stats = Self {
            total: all_images.len(),
            ..Self::default()
        };
        for name in all_images {
            if has_label(name) {
                stats.annotated += 1;
            }
            match status.get(name) {
                Some(ApprovalState::Approved) => stats.approved += 1,
                Some(ApprovalState::Rejected) => stats.rejected += 1,
                Some(ApprovalState::Fixed) => stats.fixed += 1,
                None => {}
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Vec<String>, ApprovalStatus, impl Fn(&str) -> bool) {
        let images: Vec<String> = ["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut status = ApprovalStatus::new();
        status.set("c.jpg", ApprovalState::Approved);
        status.set("d.jpg", ApprovalState::Rejected);
        status.set("e.jpg", ApprovalState::Fixed);
        let has_label = |name: &str| name != "a.jpg";
        (images, status, has_label)
    }

    #[test]
    fn test_mode_filters() {
        let (images, status, has_label) = fixture();

        let annotation = WorkMode::Annotation
            .target_images(&images, &status, &has_label)
            .unwrap();
        assert_eq!(annotation.len(), 5);

        let approval = WorkMode::Approval
            .target_images(&images, &status, &has_label)
            .unwrap();
        assert_eq!(approval, vec!["b.jpg", "d.jpg", "e.jpg"]);

        let correction = WorkMode::Correction
            .target_images(&images, &status, &has_label)
            .unwrap();
        assert_eq!(correction, vec!["d.jpg"]);

        let reapproval = WorkMode::Reapproval
            .target_images(&images, &status, &has_label)
            .unwrap();
        assert_eq!(reapproval, vec!["e.jpg"]);
    }

    #[test]
    fn test_empty_filtered_mode_refuses() {
        let images = vec!["a.jpg".to_string()];
        let status = ApprovalStatus::new();
        let err = WorkMode::Correction
            .target_images(&images, &status, |_| true)
            .unwrap_err();
        assert_eq!(err, WorkflowError::EmptyMode(WorkMode::Correction));
        assert_eq!(err.to_string(), "no images to work on in correction mode");
    }

    #[test]
    fn test_progress_counting_per_mode() {
        use ApprovalState::*;
        assert!(WorkMode::Annotation.is_done(None, true));
        assert!(!WorkMode::Annotation.is_done(Some(Approved), false));
        assert!(WorkMode::Correction.is_done(Some(Fixed), true));
        assert!(!WorkMode::Correction.is_done(Some(Rejected), true));
        assert!(WorkMode::Reapproval.is_done(Some(Rejected), true));
        assert!(!WorkMode::Reapproval.is_done(Some(Fixed), true));
        assert!(WorkMode::Approval.is_done(Some(Approved), true));
    }

    #[test]
    fn test_mark_saved_only_transitions_rejected() {
        let (_, mut status, _) = fixture();
        assert!(status.mark_saved("d.jpg"));
        assert_eq!(status.get("d.jpg"), Some(ApprovalState::Fixed));

        assert!(!status.mark_saved("c.jpg"));
        assert_eq!(status.get("c.jpg"), Some(ApprovalState::Approved));
        assert!(!status.mark_saved("e.jpg"));
        assert!(!status.mark_saved("a.jpg"));
        assert_eq!(status.get("a.jpg"), None);
    }

    #[test]
    fn test_saving_rejected_image_persists_fixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".images_approval.json");
        let (_, mut status, _) = fixture();

        assert!(!status.record_save("c.jpg", &path).unwrap());
        assert!(!path.exists());

        assert!(status.record_save("d.jpg", &path).unwrap());
        let reloaded = ApprovalStatus::load(&path).unwrap();
        assert_eq!(reloaded.get("d.jpg"), Some(ApprovalState::Fixed));
        assert_eq!(reloaded.get("c.jpg"), Some(ApprovalState::Approved));
        assert_eq!(reloaded, status);
    }

    #[test]
    fn test_dashboard_counts() {
        let (images, status, has_label) = fixture();
        let stats = DashboardStats::collect(&images, &status, has_label);
        assert_eq!(
            stats,
            DashboardStats {
                total: 5,
                annotated: 4,
                approved: 1,
                rejected: 1,
                fixed: 1,
            }
        );
    }

    #[test]
    fn test_sidecar_roundtrip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".images_approval.json");
        assert!(ApprovalStatus::load(&path).unwrap().is_empty());

        let (_, status, _) = fixture();
        status.save(&path).unwrap();
        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains(r#""d.jpg": "rejected""#));
        assert_eq!(ApprovalStatus::load(&path).unwrap(), status);
    }
}
