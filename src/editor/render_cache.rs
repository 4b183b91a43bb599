// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Display-space geometry of the boxes currently on the canvas.
//!
//! The cache is derived from the [`BoxStore`] and the current
//! [`CoordinateMapper`]. It is thrown away on every full redraw and never
//! serialized or recorded in history. While a box is dragged, its cache
//! entry runs ahead of the store; releasing the pointer writes it back.

use crate::models::annotation::{BoxId, BoxStore, Point, Rect};
use crate::util::geometry::CoordinateMapper;
use std::collections::BTreeMap;

/// Half the side length of a square resize handle.
pub const HANDLE_HALF_SIZE: i32 = 4;
/// Distance of the rotation handle above the top edge.
pub const ROTATE_HANDLE_OFFSET: i32 = 25;
/// Radius of the round rotation handle.
pub const ROTATE_HANDLE_RADIUS: i32 = 5;

/// One of the eight resize handles of the selected box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    TopLeft,
    TopMid,
    TopRight,
    MidLeft,
    MidRight,
    BottomLeft,
    BottomMid,
    BottomRight,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::TopLeft,
        Handle::TopMid,
        Handle::TopRight,
        Handle::MidLeft,
        Handle::MidRight,
        Handle::BottomLeft,
        Handle::BottomMid,
        Handle::BottomRight,
    ];

    fn moves_top(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::TopMid | Handle::TopRight)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Handle::BottomLeft | Handle::BottomMid | Handle::BottomRight)
    }

    fn moves_left(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::MidLeft | Handle::BottomLeft)
    }

    fn moves_right(self) -> bool {
        matches!(self, Handle::TopRight | Handle::MidRight | Handle::BottomRight)
    }

    /// Drag this handle of `rect` to `p`. The result is not normalized.
    pub fn drag(self, rect: Rect, p: Point) -> Rect {
        let mut out = rect;
        if self.moves_top() {
            out.y1 = p.y;
        }
        if self.moves_bottom() {
            out.y2 = p.y;
        }
        if self.moves_left() {
            out.x1 = p.x;
        }
        if self.moves_right() {
            out.x2 = p.x;
        }
        out
    }

    /// Anchor point of this handle on `rect`.
    fn anchor(self, rect: Rect) -> Point {
        let mid_x = (rect.x1 + rect.x2) / 2;
        let mid_y = (rect.y1 + rect.y2) / 2;
        match self {
            Handle::TopLeft => Point::new(rect.x1, rect.y1),
            Handle::TopMid => Point::new(mid_x, rect.y1),
            Handle::TopRight => Point::new(rect.x2, rect.y1),
            Handle::MidLeft => Point::new(rect.x1, mid_y),
            Handle::MidRight => Point::new(rect.x2, mid_y),
            Handle::BottomLeft => Point::new(rect.x1, rect.y2),
            Handle::BottomMid => Point::new(mid_x, rect.y2),
            Handle::BottomRight => Point::new(rect.x2, rect.y2),
        }
    }
}

/// Handle targets drawn around the selected box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleSet {
    pub resize: [(Handle, Rect); 8],
    pub rotate_center: Point,
}

impl HandleSet {
    pub fn around(rect: Rect) -> Self {
        let resize = Handle::ALL.map(|handle| {
            let a = handle.anchor(rect);
            (
                handle,
                Rect::new(
                    a.x - HANDLE_HALF_SIZE,
                    a.y - HANDLE_HALF_SIZE,
                    a.x + HANDLE_HALF_SIZE,
                    a.y + HANDLE_HALF_SIZE,
                ),
            )
        });
        Self {
            resize,
            rotate_center: Point::new((rect.x1 + rect.x2) / 2, rect.y1 - ROTATE_HANDLE_OFFSET),
        }
    }
}

/// Cached drawing data of one box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderEntry {
    /// Box in display coordinates.
    pub rect: Rect,
    /// 1-based position in sorted order.
    pub index: usize,
    pub class_id: usize,
    /// Present only for the selected box in editing modes.
    pub handles: Option<HandleSet>,
}

#[derive(Debug, Clone, Default)]
pub struct RenderCache {
    entries: BTreeMap<BoxId, RenderEntry>,
    selected: Option<BoxId>,
    show_handles: bool,
    valid: bool,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry; the next [`sync`](Self::sync) repopulates.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.valid = false;
    }

    /// Rebuild from scratch if invalidated.
    pub fn sync(&mut self, boxes: &BoxStore, mapper: &CoordinateMapper) {
        if !self.valid {
            self.rebuild(boxes, mapper);
        }
    }

    /// Full redraw: recompute every entry from the store.
    pub fn rebuild(&mut self, boxes: &BoxStore, mapper: &CoordinateMapper) {
        self.entries.clear();
        for (index, (id, bbox)) in boxes.sorted_view().enumerate() {
            let rect = mapper.rect_to_display(bbox.coords);
            self.entries.insert(
                id,
                RenderEntry {
                    rect,
                    index: index + 1,
                    class_id: bbox.class_id,
                    handles: None,
                },
            );
        }
        if self.selected.is_some_and(|id| !boxes.contains(id)) {
            self.selected = None;
        }
        self.refresh_handles();
        self.valid = true;
    }

    /// Whether handles are drawn for the selected box.
    pub fn set_show_handles(&mut self, show: bool) {
        self.show_handles = show;
        self.refresh_handles();
    }

    pub fn select(&mut self, id: Option<BoxId>) {
        self.selected = id;
        self.refresh_handles();
    }

    pub fn selected(&self) -> Option<BoxId> {
        self.selected
    }

    pub fn get(&self, id: BoxId) -> Option<&RenderEntry> {
        self.entries.get(&id)
    }

    pub fn rect(&self, id: BoxId) -> Option<Rect> {
        self.entries.get(&id).map(|entry| entry.rect)
    }

    /// Entries bottom-most first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (BoxId, &RenderEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    /// Replace the display rectangle of a box, moving its handles along.
    pub fn set_rect(&mut self, id: BoxId, rect: Rect) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.rect = rect;
            if entry.handles.is_some() {
                entry.handles = Some(HandleSet::around(rect));
            }
        }
    }

    pub fn translate(&mut self, id: BoxId, dx: i32, dy: i32) {
        if let Some(rect) = self.rect(id) {
            self.set_rect(id, rect.translated(dx, dy));
        }
    }

    fn refresh_handles(&mut self) {
        for (id, entry) in self.entries.iter_mut() {
            entry.handles = (self.show_handles && self.selected == Some(*id))
                .then(|| HandleSet::around(entry.rect));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (BoxStore, CoordinateMapper) {
        let mut boxes = BoxStore::new();
        boxes.add(Rect::new(100, 200, 300, 400), 0);
        boxes.add(Rect::new(0, 0, 50, 50), 1);
        let mapper = CoordinateMapper::with_display_size(1000, 1000, 500, 500).unwrap();
        (boxes, mapper)
    }

    #[test]
    fn test_rebuild_maps_to_display_and_numbers_in_sorted_order() {
        let (boxes, mapper) = fixture();
        let mut cache = RenderCache::new();
        cache.rebuild(&boxes, &mapper);

        let first = cache.get(0).unwrap();
        assert_eq!(first.rect, Rect::new(50, 100, 150, 200));
        assert_eq!(first.index, 2);
        assert_eq!(cache.get(1).unwrap().index, 1);
        assert!(first.handles.is_none());
    }

    #[test]
    fn test_handles_only_for_selected_when_shown() {
        let (boxes, mapper) = fixture();
        let mut cache = RenderCache::new();
        cache.rebuild(&boxes, &mapper);
        cache.select(Some(0));
        assert!(cache.get(0).unwrap().handles.is_none());

        cache.set_show_handles(true);
        let handles = cache.get(0).unwrap().handles.unwrap();
        assert_eq!(handles.rotate_center, Point::new(100, 75));
        assert_eq!(handles.resize[0], (Handle::TopLeft, Rect::new(46, 96, 54, 104)));
        assert!(cache.get(1).unwrap().handles.is_none());
    }

    #[test]
    fn test_translate_moves_handles() {
        let (boxes, mapper) = fixture();
        let mut cache = RenderCache::new();
        cache.set_show_handles(true);
        cache.select(Some(0));
        cache.rebuild(&boxes, &mapper);

        cache.translate(0, 10, -5);
        let entry = cache.get(0).unwrap();
        assert_eq!(entry.rect, Rect::new(60, 95, 160, 195));
        assert_eq!(entry.handles.unwrap().rotate_center, Point::new(110, 70));
    }

    #[test]
    fn test_invalidate_then_sync_repopulates() {
        let (boxes, mapper) = fixture();
        let mut cache = RenderCache::new();
        cache.rebuild(&boxes, &mapper);
        cache.invalidate();
        assert_eq!(cache.iter().count(), 0);
        assert!(!cache.valid);

        cache.sync(&boxes, &mapper);
        assert_eq!(cache.iter().count(), 2);
    }

    #[test]
    fn test_rebuild_drops_stale_selection() {
        let (mut boxes, mapper) = fixture();
        let mut cache = RenderCache::new();
        cache.select(Some(1));
        boxes.remove(1);
        cache.rebuild(&boxes, &mapper);
        assert_eq!(cache.selected(), None);
    }

    #[test]
    fn test_handle_drag_moves_named_edges() {
        let rect = Rect::new(10, 10, 50, 50);
        assert_eq!(Handle::TopLeft.drag(rect, Point::new(0, 5)), Rect::new(0, 5, 50, 50));
        assert_eq!(Handle::BottomMid.drag(rect, Point::new(99, 70)), Rect::new(10, 10, 50, 70));
        assert_eq!(Handle::MidRight.drag(rect, Point::new(80, 0)), Rect::new(10, 10, 80, 50));
    }
}
