// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Interactive editing of the boxes on the current image.
//!
//! [`Editor`] owns the box store, its history, the display cache and the
//! pointer state machine for one image at a time, and gates every
//! mutation on the working mode.

pub mod machine;
pub mod render_cache;
pub mod selection;

use crate::models::annotation::{BoxId, BoxStore, Point, Rect};
use crate::models::approval::WorkMode;
use crate::models::history::History;
use crate::util::geometry::CoordinateMapper;
use machine::{EditContext, InteractionMachine, PointerState, PressOutcome};
use render_cache::RenderCache;

#[derive(Debug, Clone)]
pub struct Editor {
    mode: WorkMode,
    class_count: usize,
    boxes: BoxStore,
    history: History,
    cache: RenderCache,
    mapper: Option<CoordinateMapper>,
    machine: InteractionMachine,
}

impl Editor {
    pub fn new(mode: WorkMode, class_count: usize) -> Self {
        let mut cache = RenderCache::new();
        cache.set_show_handles(mode.is_editing());
        Self {
            mode,
            class_count,
            boxes: BoxStore::new(),
            history: History::new(),
            cache,
            mapper: None,
            machine: InteractionMachine::new(),
        }
    }

    pub fn mode(&self) -> WorkMode {
        self.mode
    }

    pub fn boxes(&self) -> &BoxStore {
        &self.boxes
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    pub fn mapper(&self) -> Option<&CoordinateMapper> {
        self.mapper.as_ref()
    }

    pub fn selected(&self) -> Option<BoxId> {
        self.machine.selected()
    }

    pub fn provisional_rect(&self) -> Option<Rect> {
        self.machine.provisional_rect()
    }

    /// True while the class prompt must be shown.
    pub fn awaiting_class(&self) -> bool {
        matches!(self.machine.state(), PointerState::Processing { .. })
    }

    /// Replace all boxes with a freshly loaded set; history restarts from it.
    pub fn load(&mut self, boxes: BoxStore) {
        let boxes = self.known_classes_only(boxes);
        self.history.reset(&boxes);
        self.replace_boxes(boxes);
    }

    /// Restore boxes together with saved history stacks.
    pub fn restore(&mut self, boxes: BoxStore, history: History) {
        let boxes = self.known_classes_only(boxes);
        self.history = history;
        if self.history.undo_stack().is_empty() {
            self.history.reset(&boxes);
        }
        self.replace_boxes(boxes);
    }

    /// Merge detector output into a store nobody has edited yet.
    ///
    /// Returns false (and changes nothing) once the operator has edited.
    pub fn bootstrap(&mut self, detections: impl IntoIterator<Item = (Rect, usize)>) -> bool {
        if self.history.can_undo() || !self.machine.is_idle() {
            return false;
        }
        let mut boxes = self.boxes.clone();
        for (rect, class_id) in detections {
            if class_id < self.class_count {
                boxes.add(rect, class_id);
            } else {
                log::warn!("Dropping detection with unknown class {}", class_id);
            }
        }
        self.load(boxes);
        true
    }

    fn known_classes_only(&self, mut boxes: BoxStore) -> BoxStore {
        let unknown: Vec<(BoxId, usize)> = boxes
            .iter()
            .filter(|(_, bbox)| bbox.class_id >= self.class_count)
            .map(|(id, bbox)| (id, bbox.class_id))
            .collect();
        for (id, class_id) in unknown {
            log::warn!("Dropping box {} with unknown class {}", id, class_id);
            boxes.remove(id);
        }
        boxes
    }

    fn replace_boxes(&mut self, boxes: BoxStore) {
        self.boxes = boxes;
        self.machine = InteractionMachine::new();
        self.cache.select(None);
        self.cache.invalidate();
        if let Some(mapper) = &self.mapper {
            self.cache.rebuild(&self.boxes, mapper);
        }
    }

    /// Fit the image into a new canvas size.
    ///
    /// Ignored (returns false) while a drag or prompt is in progress, so
    /// the caller should retry later.
    pub fn set_viewport(&mut self, mapper: Option<CoordinateMapper>) -> bool {
        if !self.machine.is_idle() {
            return false;
        }
        if self.mapper != mapper {
            self.mapper = mapper;
            self.cache.invalidate();
        }
        if let Some(mapper) = &self.mapper {
            self.cache.sync(&self.boxes, mapper);
        }
        true
    }

    fn with_context<R>(
        &mut self,
        f: impl FnOnce(&mut InteractionMachine, &mut EditContext<'_>) -> R,
    ) -> Option<R> {
        if !self.mode.is_editing() {
            return None;
        }
        let mapper = self.mapper.as_ref()?;
        let mut ctx = EditContext {
            boxes: &mut self.boxes,
            history: &mut self.history,
            cache: &mut self.cache,
            mapper,
        };
        Some(f(&mut self.machine, &mut ctx))
    }

    pub fn pointer_pressed(&mut self, p: Point) -> PressOutcome {
        self.with_context(|m, ctx| m.press(ctx, p))
            .unwrap_or(PressOutcome::Ignored)
    }

    pub fn pointer_moved(&mut self, p: Point) {
        self.with_context(|m, ctx| m.drag(ctx, p));
    }

    pub fn pointer_released(&mut self) -> bool {
        self.with_context(|m, ctx| m.release(ctx)).unwrap_or(false)
    }

    /// Deliver the class prompt's result.
    pub fn resolve_class(&mut self, choice: Option<usize>) -> Option<BoxId> {
        let class_count = self.class_count;
        self.with_context(|m, ctx| m.resolve_class(ctx, choice, class_count))
            .flatten()
    }

    pub fn cancel(&mut self) {
        if let Some(mapper) = &self.mapper {
            let mut ctx = EditContext {
                boxes: &mut self.boxes,
                history: &mut self.history,
                cache: &mut self.cache,
                mapper,
            };
            self.machine.cancel(&mut ctx);
        } else {
            self.machine = InteractionMachine::new();
            self.cache.select(None);
        }
    }

    /// Select a box from the list panel.
    pub fn select(&mut self, id: Option<BoxId>) {
        if self.awaiting_class() {
            return;
        }
        let id = id.filter(|id| self.boxes.contains(*id));
        self.machine.select(&mut self.cache, id);
    }

    /// Digit shortcut / context menu: reassign the selected box's class.
    pub fn assign_class(&mut self, class_id: usize) -> Option<BoxId> {
        let class_count = self.class_count;
        self.with_context(|m, ctx| m.assign_class(ctx, class_id, class_count))
            .flatten()
    }

    pub fn delete_selected(&mut self) -> Option<BoxId> {
        self.with_context(|m, ctx| m.delete_selected(ctx)).flatten()
    }

    pub fn undo(&mut self) -> bool {
        if !self.mode.is_editing() || !self.machine.is_idle() {
            return false;
        }
        match self.history.undo(&self.boxes) {
            Some(previous) => {
                self.apply_history(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if !self.mode.is_editing() || !self.machine.is_idle() {
            return false;
        }
        match self.history.redo(&self.boxes) {
            Some(next) => {
                self.apply_history(next);
                true
            }
            None => false,
        }
    }

    fn apply_history(&mut self, boxes: BoxStore) {
        self.boxes = boxes;
        self.machine.revalidate(&self.boxes, &mut self.cache);
        self.cache.invalidate();
        if let Some(mapper) = &self.mapper {
            self.cache.rebuild(&self.boxes, mapper);
        }
    }
}
