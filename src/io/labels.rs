// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Normalized bounding-box label files.
//!
//! One line per box, `class x_center y_center width height`, with the
//! last four values divided by the image size and written with six
//! decimals. Lines are written in the store's sorted order; loading
//! numbers boxes `0..n` in line order, so ids do not survive a save and
//! reload.

use crate::models::annotation::{BoundingBox, BoxStore};
use crate::util::geometry::{denormalize_rect, normalize_rect};
use anyhow::{bail, Context, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Label file for an image: `<labels_dir>/<image stem>.txt`.
pub fn label_path(labels_dir: &Path, image_file: &str) -> PathBuf {
    let stem = Path::new(image_file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| image_file.to_string());
    labels_dir.join(format!("{stem}.txt"))
}

/// Render a store as label-file text.
pub fn format_labels(boxes: &BoxStore, width: u32, height: u32) -> String {
    let mut out = String::new();
    for (_, bbox) in boxes.sorted_view() {
        let [cx, cy, w, h] = normalize_rect(bbox.coords, width, height);
        let _ = writeln!(out, "{} {:.6} {:.6} {:.6} {:.6}", bbox.class_id, cx, cy, w, h);
    }
    out
}

/// Parse label-file text for an image of the given size.
///
/// Class ids must be below `class_count`.
pub fn parse_labels(
    text: &str,
    width: u32,
    height: u32,
    class_count: usize,
) -> Result<BoxStore> {
    let mut boxes = BoxStore::new();
    let mut next_id = 0;
    for (line_no, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != 5 {
            bail!("line {}: expected 5 fields, found {}", line_no + 1, fields.len());
        }
        let class_id: usize = fields[0]
            .parse()
            .with_context(|| format!("line {}: bad class id '{}'", line_no + 1, fields[0]))?;
        if class_id >= class_count {
            bail!(
                "line {}: class id {} out of range ({} classes)",
                line_no + 1,
                class_id,
                class_count
            );
        }
        let mut xywh = [0.0f64; 4];
        for (slot, field) in xywh.iter_mut().zip(&fields[1..]) {
            *slot = field
                .parse()
                .with_context(|| format!("line {}: bad number '{}'", line_no + 1, field))?;
        }
        boxes.insert(
            next_id,
            BoundingBox::new(denormalize_rect(xywh, width, height), class_id),
        );
        next_id += 1;
    }
    Ok(boxes)
}

/// Read a label file.
pub fn load_labels(path: &Path, width: u32, height: u32, class_count: usize) -> Result<BoxStore> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_labels(&text, width, height, class_count)
        .with_context(|| format!("Malformed {}", path.display()))
}

/// File size before and after a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeChange {
    pub old: u64,
    pub new: u64,
}

impl SizeChange {
    /// Apply the size difference to a running total.
    pub fn apply(&self, total: u64) -> u64 {
        total.saturating_sub(self.old).saturating_add(self.new)
    }
}

/// Write a label file and report how its size changed.
///
/// The previous file is replaced only once the new one is fully written.
pub fn save_labels(path: &Path, boxes: &BoxStore, width: u32, height: u32) -> Result<SizeChange> {
    let old = std::fs::metadata(path).map(|meta| meta.len()).unwrap_or(0);
    let text = format_labels(boxes, width, height);
    crate::io::write_replace(path, text.as_bytes())?;
    Ok(SizeChange {
        old,
        new: text.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::Rect;

    #[test]
    fn test_format_uses_sorted_order_and_six_decimals() {
        let mut boxes = BoxStore::new();
        boxes.add(Rect::new(100, 300, 200, 400), 1);
        boxes.add(Rect::new(0, 0, 100, 50), 0);

        let text = format_labels(&boxes, 400, 500);
        assert_eq!(
            text,
            "0 0.125000 0.050000 0.250000 0.100000\n1 0.375000 0.700000 0.250000 0.200000\n"
        );
    }

    #[test]
    fn test_roundtrip_within_one_pixel() {
        let (w, h) = (1280, 720);
        let mut boxes = BoxStore::new();
        boxes.add(Rect::new(13, 27, 511, 333), 0);
        boxes.add(Rect::new(640, 100, 1279, 719), 2);
        boxes.add(Rect::new(7, 400, 8, 401), 1);

        let back = parse_labels(&format_labels(&boxes, w, h), w, h, 3).unwrap();
        assert_eq!(back.len(), 3);
        let originals: Vec<_> = boxes.sorted_view().map(|(_, b)| *b).collect();
        for ((_, got), want) in back.iter().zip(originals) {
            let (g, o) = (got.coords, want.coords);
            assert!(g.x1 <= g.x2 && g.y1 <= g.y2);
            assert!((g.x1 - o.x1).abs() <= 1 && (g.x2 - o.x2).abs() <= 1);
            assert!((g.y1 - o.y1).abs() <= 1 && (g.y2 - o.y2).abs() <= 1);
            assert_eq!(got.class_id, want.class_id);
        }
    }

    #[test]
    fn test_load_assigns_ids_in_line_order() {
        let text = "0 0.5 0.9 0.1 0.1\n\n1 0.5 0.1 0.1 0.1\n";
        let boxes = parse_labels(text, 100, 100, 2).unwrap();
        let ids: Vec<_> = boxes.iter().map(|(id, b)| (id, b.class_id)).collect();
        assert_eq!(ids, vec![(0, 0), (1, 1)]);
        // Spatial order differs from id order.
        let sorted: Vec<_> = boxes.sorted_view().map(|(id, _)| id).collect();
        assert_eq!(sorted, vec![1, 0]);
    }

    #[test]
    fn test_malformed_lines_are_errors() {
        assert!(parse_labels("0 0.5 0.5 0.1\n", 10, 10, 1).is_err());
        assert!(parse_labels("x 0.5 0.5 0.1 0.1\n", 10, 10, 1).is_err());
        assert!(parse_labels("0 0.5 abc 0.1 0.1\n", 10, 10, 1).is_err());
    }

    #[test]
    fn test_unknown_class_id_is_rejected() {
        let text = "1 0.5 0.5 0.2 0.2\n7 0.5 0.5 0.2 0.2\n";
        let err = parse_labels(text, 100, 100, 2).unwrap_err();
        assert_eq!(err.to_string(), "line 2: class id 7 out of range (2 classes)");
        assert!(parse_labels("2 0.5 0.5 0.2 0.2\n", 100, 100, 2).is_err());
        assert_eq!(parse_labels("1 0.5 0.5 0.2 0.2\n", 100, 100, 2).unwrap().len(), 1);
    }

    #[test]
    fn test_save_reports_size_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = label_path(dir.path(), "img001.jpg");
        assert_eq!(path, dir.path().join("img001.txt"));

        let mut boxes = BoxStore::new();
        boxes.add(Rect::new(0, 0, 10, 10), 0);
        let first = save_labels(&path, &boxes, 100, 100).unwrap();
        assert_eq!(first, SizeChange { old: 0, new: 38 });

        boxes.add(Rect::new(20, 20, 30, 30), 1);
        let second = save_labels(&path, &boxes, 100, 100).unwrap();
        assert_eq!(second, SizeChange { old: 38, new: 76 });
        assert_eq!(second.apply(100), 138);

        let loaded = load_labels(&path, 100, 100, 2).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_save_leaves_no_temp_file_and_keeps_old_file_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.txt");
        let mut boxes = BoxStore::new();
        boxes.add(Rect::new(0, 0, 10, 10), 0);
        save_labels(&path, &boxes, 100, 100).unwrap();
        let good = std::fs::read_to_string(&path).unwrap();
        assert!(!dir.path().join("img.txt.tmp").exists());

        // A directory in the way of the temp file makes the write fail.
        std::fs::create_dir(dir.path().join("img.txt.tmp")).unwrap();
        boxes.add(Rect::new(20, 20, 30, 30), 1);
        assert!(save_labels(&path, &boxes, 100, 100).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), good);
    }
}
