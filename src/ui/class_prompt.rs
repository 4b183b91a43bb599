// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Modal class chooser shown after a new box is drawn.

/// Outcome of one frame of the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResult {
    Pending,
    Confirmed(usize),
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct ClassPrompt {
    choice: usize,
    class_count: usize,
}

impl ClassPrompt {
    pub fn new(initial: usize, class_count: usize) -> Self {
        Self {
            choice: initial.min(class_count.saturating_sub(1)),
            class_count,
        }
    }

    pub fn choice(&self) -> usize {
        self.choice
    }

    /// Move the choice by `steps` entries, clamped to the list.
    pub fn step(&mut self, steps: i32) {
        let last = self.class_count.saturating_sub(1) as i64;
        self.choice = (self.choice as i64 + steps as i64).clamp(0, last) as usize;
    }

    pub fn show(&mut self, ctx: &egui::Context, class_names: &[String]) -> PromptResult {
        let mut result = PromptResult::Pending;
        let mut open = true;

        let (scroll, enter, escape) = ctx.input(|i| {
            (
                i.raw_scroll_delta.y,
                i.key_pressed(egui::Key::Enter),
                i.key_pressed(egui::Key::Escape),
            )
        });
        // Wheel up selects the previous class.
        if scroll > 0.0 {
            self.step(-1);
        } else if scroll < 0.0 {
            self.step(1);
        }

        egui::Window::new("Select class")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .open(&mut open)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().max_height(320.0).show(ui, |ui| {
                    for (class_id, name) in class_names.iter().enumerate() {
                        let text = format!("{}: {}", class_id, name);
                        ui.radio_value(&mut self.choice, class_id, text);
                    }
                });
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() {
                        result = PromptResult::Confirmed(self.choice);
                    }
                    if ui.button("Cancel").clicked() {
                        result = PromptResult::Cancelled;
                    }
                });
            });

        if result == PromptResult::Pending {
            if enter {
                result = PromptResult::Confirmed(self.choice);
            } else if escape || !open {
                result = PromptResult::Cancelled;
            }
        }
        result
    }
}
