// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Export of approved image/label pairs into a training-ready layout.

use crate::io::labels::label_path;
use crate::models::approval::{ApprovalState, ApprovalStatus};
use anyhow::{Context, Result};
use std::path::Path;

/// Copy every approved image and its label file to
/// `dest/images/` and `dest/labels/`.
///
/// Pairs with a missing image or label are skipped, as are pairs whose
/// copy fails. Returns the number of pairs exported.
pub fn export_approved(
    status: &ApprovalStatus,
    image_dir: &Path,
    labels_dir: &Path,
    dest: &Path,
) -> Result<usize> {
    let dest_images = dest.join("images");
    let dest_labels = dest.join("labels");
    std::fs::create_dir_all(&dest_images)
        .with_context(|| format!("Failed to create {}", dest_images.display()))?;
    std::fs::create_dir_all(&dest_labels)
        .with_context(|| format!("Failed to create {}", dest_labels.display()))?;

    let mut exported = 0;
    for (filename, state) in status.iter() {
        if state != ApprovalState::Approved {
            continue;
        }
        let src_image = image_dir.join(filename);
        let src_label = label_path(labels_dir, filename);
        if !src_image.is_file() || !src_label.is_file() {
            log::warn!("Skipping {}: image or label missing", filename);
            continue;
        }
        let Some(label_name) = src_label.file_name() else {
            continue;
        };
        let copied = std::fs::copy(&src_image, dest_images.join(filename))
            .and_then(|_| std::fs::copy(&src_label, dest_labels.join(label_name)));
        match copied {
            Ok(_) => exported += 1,
            Err(e) => log::error!("Failed to copy {}: {}", filename, e),
        }
    }
    log::info!("Exported {} approved pairs to {}", exported, dest.display());
    Ok(exported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_copies_only_complete_approved_pairs() {
        let root = tempfile::tempdir().unwrap();
        let images = root.path().join("images_src");
        let labels = root.path().join("labels");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::create_dir_all(&labels).unwrap();

        for name in ["a.jpg", "b.jpg", "c.jpg", "d.png"] {
            std::fs::write(images.join(name), name).unwrap();
        }
        for stem in ["a", "c", "d"] {
            std::fs::write(labels.join(format!("{stem}.txt")), stem).unwrap();
        }

        let mut status = ApprovalStatus::new();
        status.set("a.jpg", ApprovalState::Approved);
        status.set("b.jpg", ApprovalState::Approved); // no label
        status.set("c.jpg", ApprovalState::Rejected);
        status.set("d.png", ApprovalState::Approved);
        status.set("gone.jpg", ApprovalState::Approved); // no image

        let dest = root.path().join("out");
        let count = export_approved(&status, &images, &labels, &dest).unwrap();
        assert_eq!(count, 2);
        assert!(dest.join("images/a.jpg").is_file());
        assert!(dest.join("labels/a.txt").is_file());
        assert!(dest.join("images/d.png").is_file());
        assert_eq!(std::fs::read_to_string(dest.join("labels/d.txt")).unwrap(), "d");
        assert!(!dest.join("images/b.jpg").exists());
        assert!(!dest.join("images/c.jpg").exists());
    }
}
