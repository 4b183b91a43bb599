// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pointer-driven box editing.
//!
//! Turns press/drag/release events in display coordinates into box store
//! and history mutations. New boxes are drawn with two clicks; the second
//! click suspends the machine in [`PointerState::Processing`] until the
//! operator picks a class (or cancels).

use super::render_cache::{Handle, RenderCache};
use super::selection::{hit_test, Hit, HitTarget};
use crate::models::annotation::{BoxId, BoxStore, Point, Rect};
use crate::models::history::History;
use crate::util::geometry::CoordinateMapper;

/// Smallest width/height, in display pixels, a resize may produce.
pub const MIN_RESIZE_EXTENT: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerState {
    Idle,
    /// First corner placed; the provisional box follows the pointer.
    Drawing { start: Point, current: Point },
    Moving { last: Point },
    Resizing { handle: Handle },
    Rotating,
    /// Waiting for the class prompt to resolve.
    Processing { rect: Rect },
}

/// What a press did, for the caller to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    Ignored,
    DrawingStarted,
    /// The caller must ask for a class and report back through
    /// [`InteractionMachine::resolve_class`].
    ClassRequested(Rect),
    /// A zero-extent box was discarded.
    Discarded,
    Grabbed(Hit),
}

/// Everything a pointer event may touch.
pub struct EditContext<'a> {
    pub boxes: &'a mut BoxStore,
    pub history: &'a mut History,
    pub cache: &'a mut RenderCache,
    pub mapper: &'a CoordinateMapper,
}

#[derive(Debug, Clone)]
pub struct InteractionMachine {
    state: PointerState,
    selected: Option<BoxId>,
}

impl Default for InteractionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionMachine {
    pub fn new() -> Self {
        Self {
            state: PointerState::Idle,
            selected: None,
        }
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    pub fn selected(&self) -> Option<BoxId> {
        self.selected
    }

    pub fn is_idle(&self) -> bool {
        self.state == PointerState::Idle
    }

    /// Provisional rectangle while drawing or awaiting a class.
    pub fn provisional_rect(&self) -> Option<Rect> {
        match self.state {
            PointerState::Drawing { start, current } => Some(Rect::from_corners(start, current)),
            PointerState::Processing { rect } => Some(rect),
            _ => None,
        }
    }

    pub fn press(&mut self, ctx: &mut EditContext<'_>, p: Point) -> PressOutcome {
        match self.state {
            PointerState::Idle => self.press_idle(ctx, p),
            PointerState::Drawing { start, .. } => {
                let rect = Rect::from_corners(start, p);
                if rect.width() == 0 || rect.height() == 0 {
                    log::debug!("Discarding zero-extent box at {:?}", rect);
                    self.state = PointerState::Idle;
                    return PressOutcome::Discarded;
                }
                self.state = PointerState::Processing { rect };
                PressOutcome::ClassRequested(rect)
            }
            _ => PressOutcome::Ignored,
        }
    }

    fn press_idle(&mut self, ctx: &mut EditContext<'_>, p: Point) -> PressOutcome {
        let Some(hit) = hit_test(ctx.cache, p) else {
            self.set_selection(ctx.cache, None);
            self.state = PointerState::Drawing { start: p, current: p };
            return PressOutcome::DrawingStarted;
        };

        ctx.history.snapshot(ctx.boxes);
        self.set_selection(ctx.cache, Some(hit.id));
        self.state = match hit.target {
            HitTarget::Rotate => PointerState::Rotating,
            HitTarget::Resize(handle) => PointerState::Resizing { handle },
            HitTarget::Move => PointerState::Moving { last: p },
        };
        log::debug!("Grabbed box {} as {:?}", hit.id, hit.target);
        PressOutcome::Grabbed(hit)
    }

    /// Pointer moved to `p` (with or without a button held).
    pub fn drag(&mut self, ctx: &mut EditContext<'_>, p: Point) {
        let Some(id) = self.selected else {
            if let PointerState::Drawing { start, .. } = self.state {
                self.state = PointerState::Drawing { start, current: p };
            }
            return;
        };
        match self.state {
            PointerState::Drawing { start, .. } => {
                self.state = PointerState::Drawing { start, current: p };
            }
            PointerState::Moving { last } => {
                ctx.cache.translate(id, p.x - last.x, p.y - last.y);
                self.state = PointerState::Moving { last: p };
            }
            PointerState::Resizing { handle } => {
                let Some(rect) = ctx.cache.rect(id) else { return };
                let resized = handle.drag(rect, p);
                if resized.width() < MIN_RESIZE_EXTENT || resized.height() < MIN_RESIZE_EXTENT {
                    return;
                }
                ctx.cache.set_rect(id, resized.normalized());
            }
            PointerState::Rotating => {
                let Some(rect) = ctx.cache.rect(id) else { return };
                if let Some(rotated) = rotate_toward(rect, p) {
                    ctx.cache.set_rect(id, rotated);
                }
            }
            PointerState::Idle | PointerState::Processing { .. } => {}
        }
    }

    /// Button released: commit any drag back into image space.
    ///
    /// Returns true when a box was written.
    pub fn release(&mut self, ctx: &mut EditContext<'_>) -> bool {
        if !matches!(
            self.state,
            PointerState::Moving { .. } | PointerState::Resizing { .. } | PointerState::Rotating
        ) {
            return false;
        }
        self.state = PointerState::Idle;

        let Some(id) = self.selected else { return false };
        let Some(rect) = ctx.cache.rect(id) else { return false };
        ctx.boxes.update_coords(id, ctx.mapper.rect_to_original(rect));
        ctx.cache.rebuild(ctx.boxes, ctx.mapper);
        true
    }

    /// Deliver the class prompt's answer.
    ///
    /// A chosen class commits the pending box and returns its id; `None`
    /// or an out-of-range class discards it.
    pub fn resolve_class(
        &mut self,
        ctx: &mut EditContext<'_>,
        choice: Option<usize>,
        class_count: usize,
    ) -> Option<BoxId> {
        let PointerState::Processing { rect } = self.state else {
            return None;
        };
        self.state = PointerState::Idle;

        let class_id = choice.filter(|class_id| *class_id < class_count)?;
        ctx.history.snapshot(ctx.boxes);
        let id = ctx.boxes.add(ctx.mapper.rect_to_original(rect), class_id);
        ctx.cache.rebuild(ctx.boxes, ctx.mapper);
        Some(id)
    }

    /// Escape: drop any provisional box or uncommitted drag and deselect.
    pub fn cancel(&mut self, ctx: &mut EditContext<'_>) {
        self.state = PointerState::Idle;
        self.selected = None;
        ctx.cache.select(None);
        ctx.cache.rebuild(ctx.boxes, ctx.mapper);
    }

    /// Select a box directly, e.g. from the box list.
    pub fn select(&mut self, cache: &mut RenderCache, id: Option<BoxId>) {
        self.state = PointerState::Idle;
        self.set_selection(cache, id);
    }

    /// Forget the selection if its box is gone.
    pub fn revalidate(&mut self, boxes: &BoxStore, cache: &mut RenderCache) {
        if self.selected.is_some_and(|id| !boxes.contains(id)) {
            self.set_selection(cache, None);
        }
    }

    /// Reassign the class of the selected box.
    pub fn assign_class(
        &mut self,
        ctx: &mut EditContext<'_>,
        class_id: usize,
        class_count: usize,
    ) -> Option<BoxId> {
        let id = self.selected?;
        if class_id >= class_count || !ctx.boxes.contains(id) {
            return None;
        }
        ctx.history.snapshot(ctx.boxes);
        ctx.boxes.update_class(id, class_id);
        ctx.cache.rebuild(ctx.boxes, ctx.mapper);
        Some(id)
    }

    /// Delete the selected box and return to idle.
    pub fn delete_selected(&mut self, ctx: &mut EditContext<'_>) -> Option<BoxId> {
        let id = self.selected?;
        if !ctx.boxes.contains(id) {
            return None;
        }
        ctx.history.snapshot(ctx.boxes);
        ctx.boxes.remove(id);
        self.cancel(ctx);
        Some(id)
    }

    fn set_selection(&mut self, cache: &mut RenderCache, id: Option<BoxId>) {
        self.selected = id;
        cache.select(id);
    }
}

/// Swap width and height around the center when the pointer's dominant
/// direction from the center disagrees with the box orientation.
///
/// This is an orientation toggle, not a free rotation.
pub fn rotate_toward(rect: Rect, p: Point) -> Option<Rect> {
    let (cx, cy) = rect.center();
    let dx = p.x as f64 - cx;
    let dy = p.y as f64 - cy;
    let w = rect.width() as f64;
    let h = rect.height() as f64;

    let pointer_horizontal = dx.abs() > dy.abs();
    let box_horizontal = w > h;
    if pointer_horizontal == box_horizontal {
        return None;
    }
    let (new_w, new_h) = (h, w);
    Some(Rect::new(
        (cx - new_w / 2.0) as i32,
        (cy - new_h / 2.0) as i32,
        (cx + new_w / 2.0) as i32,
        (cy + new_h / 2.0) as i32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        boxes: BoxStore,
        history: History,
        cache: RenderCache,
        mapper: CoordinateMapper,
        machine: InteractionMachine,
    }

    impl Fixture {
        /// Image 200x200 shown at 100x100.
        fn new(rects: &[Rect]) -> Self {
            let mut boxes = BoxStore::new();
            for r in rects {
                boxes.add(*r, 0);
            }
            let mut history = History::new();
            history.reset(&boxes);
            let mapper = CoordinateMapper::with_display_size(200, 200, 100, 100).unwrap();
            let mut cache = RenderCache::new();
            cache.set_show_handles(true);
            cache.rebuild(&boxes, &mapper);
            Self {
                boxes,
                history,
                cache,
                mapper,
                machine: InteractionMachine::new(),
            }
        }

        fn ctx(&mut self) -> (&mut InteractionMachine, EditContext<'_>) {
            (
                &mut self.machine,
                EditContext {
                    boxes: &mut self.boxes,
                    history: &mut self.history,
                    cache: &mut self.cache,
                    mapper: &self.mapper,
                },
            )
        }

        fn press(&mut self, x: i32, y: i32) -> PressOutcome {
            let (m, mut ctx) = self.ctx();
            m.press(&mut ctx, Point::new(x, y))
        }

        fn drag(&mut self, x: i32, y: i32) {
            let (m, mut ctx) = self.ctx();
            m.drag(&mut ctx, Point::new(x, y))
        }

        fn release(&mut self) -> bool {
            let (m, mut ctx) = self.ctx();
            m.release(&mut ctx)
        }

        fn resolve(&mut self, choice: Option<usize>) -> Option<BoxId> {
            let (m, mut ctx) = self.ctx();
            m.resolve_class(&mut ctx, choice, 3)
        }

        fn cancel(&mut self) {
            let (m, mut ctx) = self.ctx();
            m.cancel(&mut ctx)
        }
    }

    #[test]
    fn test_two_click_draw_commits_after_class_choice() {
        let mut f = Fixture::new(&[]);
        assert_eq!(f.press(10, 10), PressOutcome::DrawingStarted);
        f.drag(30, 25);
        assert_eq!(f.machine.provisional_rect(), Some(Rect::new(10, 10, 30, 25)));

        let outcome = f.press(40, 5);
        assert_eq!(outcome, PressOutcome::ClassRequested(Rect::new(10, 5, 40, 10)));
        assert_eq!(f.machine.state(), PointerState::Processing { rect: Rect::new(10, 5, 40, 10) });
        // No snapshot until the class is confirmed.
        assert_eq!(f.history.undo_stack().len(), 1);
        // Clicks while the prompt is open do nothing.
        assert_eq!(f.press(60, 60), PressOutcome::Ignored);

        let id = f.resolve(Some(2)).unwrap();
        assert!(f.machine.is_idle());
        let bbox = f.boxes.get(id).unwrap();
        assert_eq!(bbox.coords, Rect::new(20, 10, 80, 20));
        assert_eq!(bbox.class_id, 2);
        assert_eq!(f.history.undo_stack().len(), 2);
        assert!(f.cache.get(id).is_some());
    }

    #[test]
    fn test_cancelled_prompt_leaves_store_untouched() {
        let mut f = Fixture::new(&[]);
        f.press(10, 10);
        f.press(40, 40);
        assert_eq!(f.resolve(None), None);
        assert!(f.boxes.is_empty());
        assert!(f.machine.is_idle());
        assert_eq!(f.history.undo_stack().len(), 1);
    }

    #[test]
    fn test_out_of_range_class_is_discarded() {
        let mut f = Fixture::new(&[]);
        f.press(10, 10);
        f.press(40, 40);
        assert_eq!(f.resolve(Some(3)), None);
        assert!(f.boxes.is_empty());
    }

    #[test]
    fn test_zero_extent_box_is_discarded() {
        let mut f = Fixture::new(&[]);
        f.press(10, 10);
        assert_eq!(f.press(10, 50), PressOutcome::Discarded);
        assert!(f.machine.is_idle());
        assert!(f.boxes.is_empty());
    }

    #[test]
    fn test_escape_discards_provisional_box() {
        let mut f = Fixture::new(&[]);
        f.press(10, 10);
        f.drag(50, 50);
        f.cancel();
        assert!(f.machine.is_idle());
        assert_eq!(f.machine.provisional_rect(), None);
        assert!(f.boxes.is_empty());
    }

    #[test]
    fn test_move_is_incremental_and_commits_on_release() {
        // Display box (10,10)-(50,50).
        let mut f = Fixture::new(&[Rect::new(20, 20, 100, 100)]);
        let outcome = f.press(10, 30);
        assert!(matches!(outcome, PressOutcome::Grabbed(Hit { id: 0, target: HitTarget::Move })));
        assert_eq!(f.history.undo_stack().len(), 2);

        f.drag(15, 30);
        f.drag(20, 35);
        assert_eq!(f.cache.rect(0), Some(Rect::new(20, 15, 60, 55)));
        // Store untouched until release.
        assert_eq!(f.boxes.get(0).unwrap().coords, Rect::new(20, 20, 100, 100));

        assert!(f.release());
        assert!(f.machine.is_idle());
        assert_eq!(f.boxes.get(0).unwrap().coords, Rect::new(40, 30, 120, 110));
    }

    #[test]
    fn test_resize_below_minimum_is_rejected() {
        let mut f = Fixture::new(&[Rect::new(20, 20, 100, 100)]);
        f.machine.select(&mut f.cache, Some(0));

        // Bottom-right handle sits at display (50,50).
        let outcome = f.press(50, 50);
        assert!(matches!(
            outcome,
            PressOutcome::Grabbed(Hit { target: HitTarget::Resize(Handle::BottomRight), .. })
        ));
        f.drag(70, 60);
        assert_eq!(f.cache.rect(0), Some(Rect::new(10, 10, 70, 60)));

        f.drag(13, 60);
        assert_eq!(f.cache.rect(0), Some(Rect::new(10, 10, 70, 60)));
        f.drag(70, 14);
        assert_eq!(f.cache.rect(0), Some(Rect::new(10, 10, 70, 60)));

        f.release();
        assert_eq!(f.boxes.get(0).unwrap().coords, Rect::new(20, 20, 140, 120));
    }

    #[test]
    fn test_resize_past_opposite_edge_normalizes() {
        let mut f = Fixture::new(&[Rect::new(20, 20, 100, 100)]);
        f.machine.select(&mut f.cache, Some(0));
        f.press(50, 50);
        f.drag(0, 30);
        assert_eq!(f.cache.rect(0), Some(Rect::new(0, 10, 10, 30)));
    }

    #[test]
    fn test_rotation_swaps_orientation_around_center() {
        // Display box (10,40)-(50,60): wide.
        let mut f = Fixture::new(&[Rect::new(20, 80, 100, 120)]);
        f.machine.select(&mut f.cache, Some(0));
        let outcome = f.press(30, 15);
        assert!(matches!(outcome, PressOutcome::Grabbed(Hit { target: HitTarget::Rotate, .. })));
        assert_eq!(f.machine.state(), PointerState::Rotating);

        // Still mostly vertical displacement from the center (30,50).
        f.drag(31, 10);
        assert_eq!(f.cache.rect(0), Some(Rect::new(20, 30, 40, 70)));

        // Pointer now mostly horizontal: tall box turns wide again.
        f.drag(90, 52);
        assert_eq!(f.cache.rect(0), Some(Rect::new(10, 40, 50, 60)));

        f.drag(30, 95);
        f.release();
        assert_eq!(f.boxes.get(0).unwrap().coords, Rect::new(40, 60, 80, 140));
    }

    #[test]
    fn test_rotate_toward_keeps_matching_orientation() {
        let wide = Rect::new(0, 0, 40, 10);
        assert_eq!(rotate_toward(wide, Point::new(100, 5)), None);
        assert_eq!(rotate_toward(wide, Point::new(20, 100)), Some(Rect::new(15, -15, 25, 25)));
    }

    #[test]
    fn test_press_on_empty_area_deselects() {
        let mut f = Fixture::new(&[Rect::new(20, 20, 100, 100)]);
        f.machine.select(&mut f.cache, Some(0));
        assert_eq!(f.press(90, 90), PressOutcome::DrawingStarted);
        assert_eq!(f.machine.selected(), None);
        assert!(f.cache.get(0).unwrap().handles.is_none());
    }

    #[test]
    fn test_cancel_mid_drag_restores_display_from_store() {
        let mut f = Fixture::new(&[Rect::new(20, 20, 100, 100)]);
        f.press(10, 30);
        f.drag(40, 30);
        f.cancel();
        assert_eq!(f.cache.rect(0), Some(Rect::new(10, 10, 50, 50)));
        assert_eq!(f.boxes.get(0).unwrap().coords, Rect::new(20, 20, 100, 100));
        assert_eq!(f.machine.selected(), None);
    }

    #[test]
    fn test_assign_class_and_delete_need_selection() {
        let mut f = Fixture::new(&[Rect::new(20, 20, 100, 100)]);
        {
            let (m, mut ctx) = f.ctx();
            assert_eq!(m.assign_class(&mut ctx, 1, 3), None);
            assert_eq!(m.delete_selected(&mut ctx), None);
        }
        f.machine.select(&mut f.cache, Some(0));
        {
            let (m, mut ctx) = f.ctx();
            assert_eq!(m.assign_class(&mut ctx, 5, 3), None);
            assert_eq!(m.assign_class(&mut ctx, 2, 3), Some(0));
        }
        assert_eq!(f.boxes.get(0).unwrap().class_id, 2);
        assert_eq!(f.history.undo_stack().len(), 2);

        {
            let (m, mut ctx) = f.ctx();
            assert_eq!(m.delete_selected(&mut ctx), Some(0));
        }
        assert!(f.boxes.is_empty());
        assert_eq!(f.machine.selected(), None);
        assert_eq!(f.history.undo_stack().len(), 3);
    }
}
