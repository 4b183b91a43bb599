// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar for the working view.
//!
//! Navigation, saving and history buttons in editing modes; approve and
//! reject in review modes.

use crate::models::approval::{ApprovalState, WorkMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    Prev,
    Next,
    Save,
    Approve,
    Reject,
    Undo,
    Redo,
    Finish,
}

/// What the toolbar needs to know about the current image.
pub struct ToolbarState<'a> {
    pub mode: WorkMode,
    pub position: usize,
    pub total: usize,
    pub filename: &'a str,
    pub status: Option<ApprovalState>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub detecting: bool,
}

/// Display the toolbar.
pub fn show(ui: &mut egui::Ui, state: &ToolbarState<'_>) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label(egui::RichText::new(state.mode.name().to_uppercase()).strong());
        ui.separator();

        if ui.button("◀ Prev").on_hover_text("Left arrow").clicked() {
            action = ToolbarAction::Prev;
        }
        ui.label(format!("{} / {}", state.position + 1, state.total));
        if ui.button("Next ▶").on_hover_text("Right arrow").clicked() {
            action = ToolbarAction::Next;
        }

        ui.separator();

        if state.mode.is_editing() {
            if ui.button("💾 Save").on_hover_text("Ctrl+S, Enter saves and advances").clicked() {
                action = ToolbarAction::Save;
            }
            if ui.add_enabled(state.can_undo, egui::Button::new("⟲ Undo")).clicked() {
                action = ToolbarAction::Undo;
            }
            if ui.add_enabled(state.can_redo, egui::Button::new("⟳ Redo")).clicked() {
                action = ToolbarAction::Redo;
            }
        } else {
            if ui.button("✔ Approve").clicked() {
                action = ToolbarAction::Approve;
            }
            if ui.button("✖ Reject").clicked() {
                action = ToolbarAction::Reject;
            }
        }

        ui.separator();
        ui.label(state.filename);
        ui.label(
            egui::RichText::new(format!("[{}]", ApprovalState::label(state.status)))
                .italics()
                .weak(),
        );
        if state.detecting {
            ui.spinner();
            ui.label("detecting...");
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Finish").on_hover_text("Save the session and return").clicked() {
                action = ToolbarAction::Finish;
            }
        });
    });

    action
}
