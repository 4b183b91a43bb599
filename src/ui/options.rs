// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editing options window.

use crate::io::serialization::{EditorOptions, FONT_SIZE_RANGE, LINE_WIDTH_RANGE, LOG_LINES_RANGE};
use crate::models::progress::ProgressStyle;

/// Show the options window while `open` is set. Returns true on any change.
pub fn show(ctx: &egui::Context, open: &mut bool, options: &mut EditorOptions) -> bool {
    let before = options.clone();

    egui::Window::new("Options")
        .collapsible(false)
        .resizable(false)
        .open(open)
        .show(ctx, |ui| {
            egui::Grid::new("options_grid").num_columns(2).show(ui, |ui| {
                ui.label("Line width");
                ui.add(egui::Slider::new(&mut options.line_width, LINE_WIDTH_RANGE));
                ui.end_row();

                ui.label("Font size");
                ui.add(egui::Slider::new(&mut options.font_size, FONT_SIZE_RANGE));
                ui.end_row();

                ui.label("Log lines");
                ui.add(egui::Slider::new(&mut options.log_lines, LOG_LINES_RANGE));
                ui.end_row();

                ui.label("Target images");
                ui.add(egui::DragValue::new(&mut options.target_count).speed(1.0))
                    .on_hover_text("0 means the whole working set");
                ui.end_row();

                ui.label("Progress");
                ui.horizontal(|ui| {
                    ui.radio_value(&mut options.progress_style, ProgressStyle::Bar, "Bar");
                    ui.radio_value(&mut options.progress_style, ProgressStyle::Pie, "Pie");
                });
                ui.end_row();
            });
        });

    *options != before
}
