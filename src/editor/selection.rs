// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Hit-testing of canvas points against drawn boxes and handles.

use super::render_cache::{Handle, RenderCache, ROTATE_HANDLE_RADIUS};
use crate::models::annotation::{BoxId, Point, Rect};

/// How close to an edge a point must be to grab the box.
pub const EDGE_TOLERANCE: i32 = 5;
/// Extra slack around the rotation handle.
const ROTATE_SLACK: i32 = 2;

/// What part of a box was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Rotate,
    Resize(Handle),
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub id: BoxId,
    pub target: HitTarget,
}

/// Find the topmost box part under `p` (display coordinates).
///
/// Boxes are tried topmost first. For each box the rotation handle wins
/// over resize handles, which win over the edges. Handles only exist on
/// the selected box, so in practice only that box can yield them.
pub fn hit_test(cache: &RenderCache, p: Point) -> Option<Hit> {
    cache.iter().rev().find_map(|(id, entry)| {
        let target = if let Some(handles) = entry.handles {
            let c = handles.rotate_center;
            let reach = ROTATE_HANDLE_RADIUS + ROTATE_SLACK;
            if (p.x - c.x).abs() <= reach && (p.y - c.y).abs() <= reach {
                Some(HitTarget::Rotate)
            } else {
                handles
                    .resize
                    .iter()
                    .find(|(_, square)| contains(*square, p))
                    .map(|(handle, _)| HitTarget::Resize(*handle))
            }
        } else {
            None
        };
        target
            .or_else(|| near_edge(entry.rect, p).then_some(HitTarget::Move))
            .map(|target| Hit { id, target })
    })
}

fn contains(r: Rect, p: Point) -> bool {
    r.x1 <= p.x && p.x <= r.x2 && r.y1 <= p.y && p.y <= r.y2
}

fn near_edge(r: Rect, p: Point) -> bool {
    let t = EDGE_TOLERANCE;
    let near_vertical = (p.x - r.x1).abs() < t || (p.x - r.x2).abs() < t;
    let near_horizontal = (p.y - r.y1).abs() < t || (p.y - r.y2).abs() < t;
    (near_vertical && r.y1 - t <= p.y && p.y <= r.y2 + t)
        || (near_horizontal && r.x1 - t <= p.x && p.x <= r.x2 + t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::BoxStore;
    use crate::util::geometry::CoordinateMapper;

    fn cache_for(rects: &[Rect], selected: Option<BoxId>) -> RenderCache {
        let mut boxes = BoxStore::new();
        for r in rects {
            boxes.add(*r, 0);
        }
        let mapper = CoordinateMapper::with_display_size(100, 100, 100, 100).unwrap();
        let mut cache = RenderCache::new();
        cache.set_show_handles(true);
        cache.select(selected);
        cache.rebuild(&boxes, &mapper);
        cache
    }

    #[test]
    fn test_edge_hit_is_move() {
        let cache = cache_for(&[Rect::new(10, 10, 50, 50)], None);
        let hit = hit_test(&cache, Point::new(12, 30)).unwrap();
        assert_eq!(hit, Hit { id: 0, target: HitTarget::Move });
        assert_eq!(hit_test(&cache, Point::new(30, 53)).unwrap().target, HitTarget::Move);
    }

    #[test]
    fn test_interior_and_far_points_miss() {
        let cache = cache_for(&[Rect::new(10, 10, 50, 50)], None);
        assert_eq!(hit_test(&cache, Point::new(30, 30)), None);
        assert_eq!(hit_test(&cache, Point::new(10, 70)), None);
        assert_eq!(hit_test(&cache, Point::new(15, 10)).map(|h| h.id), Some(0));
    }

    #[test]
    fn test_handles_ignored_on_unselected_box() {
        let cache = cache_for(&[Rect::new(10, 40, 50, 80)], None);
        // Where the rotation handle would be.
        assert_eq!(hit_test(&cache, Point::new(30, 15)), None);
    }

    #[test]
    fn test_rotation_handle_of_selected_box() {
        let cache = cache_for(&[Rect::new(10, 40, 50, 80)], Some(0));
        let hit = hit_test(&cache, Point::new(32, 16)).unwrap();
        assert_eq!(hit.target, HitTarget::Rotate);
    }

    #[test]
    fn test_resize_handle_beats_edge() {
        let cache = cache_for(&[Rect::new(10, 40, 50, 80)], Some(0));
        let hit = hit_test(&cache, Point::new(51, 81)).unwrap();
        assert_eq!(hit.target, HitTarget::Resize(Handle::BottomRight));
        let hit = hit_test(&cache, Point::new(30, 42)).unwrap();
        assert_eq!(hit.target, HitTarget::Resize(Handle::TopMid));
    }

    #[test]
    fn test_topmost_box_wins() {
        let cache = cache_for(&[Rect::new(10, 10, 50, 50), Rect::new(12, 20, 60, 60)], None);
        let hit = hit_test(&cache, Point::new(11, 30)).unwrap();
        assert_eq!(hit.id, 1);
    }

    #[test]
    fn test_upper_box_edge_beats_lower_selected_handle() {
        let cache = cache_for(&[Rect::new(10, 10, 50, 50), Rect::new(48, 0, 90, 90)], Some(0));
        let hit = hit_test(&cache, Point::new(50, 50)).unwrap();
        assert_eq!(hit, Hit { id: 1, target: HitTarget::Move });
    }
}
