// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the core data structures for representing
//! bounding boxes and the keyed collection they live in. Coordinates
//! stored here are always in image-pixel ("original") space.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a box within a [`BoxStore`].
pub type BoxId = u32;

/// A 2D point in integer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle given by two corners.
///
/// Serialized as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Rectangle spanned by two arbitrary corner points, normalized.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x, a.y, b.x, b.y).normalized()
    }

    /// Return a copy with `x1 <= x2` and `y1 <= y2`.
    pub fn normalized(self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    pub fn width(&self) -> i32 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> i32 {
        (self.y2 - self.y1).abs()
    }

    /// Center in floating point, since odd extents land between pixels.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.x1 + self.x2) as f64 / 2.0,
            (self.y1 + self.y2) as f64 / 2.0,
        )
    }

    pub fn translated(self, dx: i32, dy: i32) -> Self {
        Self {
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        }
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.x2, self.y2)
    }
}

impl From<[i32; 4]> for Rect {
    fn from(c: [i32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl From<Rect> for [i32; 4] {
    fn from(r: Rect) -> Self {
        [r.x1, r.y1, r.x2, r.y2]
    }
}

/// A labeled bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub coords: Rect,
    pub class_id: usize,
}

impl BoundingBox {
    /// Create a box, normalizing its corners.
    pub fn new(coords: Rect, class_id: usize) -> Self {
        Self {
            coords: coords.normalized(),
            class_id,
        }
    }
}

/// All boxes of the current image, keyed by id.
///
/// Holds only logical data; anything the canvas needs to draw lives in
/// the editor's render cache. Cloning produces an independent deep copy,
/// which is what history snapshots rely on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoxStore {
    boxes: BTreeMap<BoxId, BoundingBox>,
}

impl BoxStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next [`add`](Self::add) will assign.
    pub fn next_id(&self) -> BoxId {
        self.boxes.keys().next_back().map_or(0, |max| max + 1)
    }

    /// Add a box and return its fresh id.
    ///
    /// Callers that want the edit to be undoable must snapshot history
    /// before calling this.
    pub fn add(&mut self, coords: Rect, class_id: usize) -> BoxId {
        let id = self.next_id();
        self.boxes.insert(id, BoundingBox::new(coords, class_id));
        id
    }

    /// Insert a box under a caller-chosen id, replacing any previous entry.
    pub fn insert(&mut self, id: BoxId, bbox: BoundingBox) {
        self.boxes.insert(id, BoundingBox::new(bbox.coords, bbox.class_id));
    }

    /// Replace the coordinates of a box. Unknown ids are ignored.
    pub fn update_coords(&mut self, id: BoxId, coords: Rect) {
        if let Some(bbox) = self.boxes.get_mut(&id) {
            bbox.coords = coords.normalized();
        }
    }

    /// Replace the class of a box. Unknown ids are ignored.
    pub fn update_class(&mut self, id: BoxId, class_id: usize) {
        if let Some(bbox) = self.boxes.get_mut(&id) {
            bbox.class_id = class_id;
        }
    }

    pub fn remove(&mut self, id: BoxId) -> Option<BoundingBox> {
        self.boxes.remove(&id)
    }

    pub fn get(&self, id: BoxId) -> Option<&BoundingBox> {
        self.boxes.get(&id)
    }

    pub fn contains(&self, id: BoxId) -> bool {
        self.boxes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Boxes in id order, which is also the drawing (z) order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (BoxId, &BoundingBox)> {
        self.boxes.iter().map(|(id, bbox)| (*id, bbox))
    }

    /// Boxes ordered top-to-bottom, then left-to-right.
    ///
    /// This order defines both the line order of label files and the
    /// 1-based numbering shown to the operator.
    pub fn sorted_view(&self) -> impl Iterator<Item = (BoxId, &BoundingBox)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by_key(|(id, bbox)| (bbox.coords.y1, bbox.coords.x1, *id));
        entries.into_iter()
    }

    /// 1-based position of a box in [`sorted_view`](Self::sorted_view).
    pub fn display_index(&self, id: BoxId) -> Option<usize> {
        self.sorted_view()
            .position(|(candidate, _)| candidate == id)
            .map(|pos| pos + 1)
    }
}
