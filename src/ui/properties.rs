// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Side panel: box list, progress and the activity log.

use crate::editor::Editor;
use crate::io::activity::ActivityLog;
use crate::io::serialization::EditorOptions;
use crate::models::annotation::{BoundingBox, BoxId};
use crate::models::progress::{format_elapsed, Progress, ProgressStyle};
use crate::ui::canvas::class_color;
use std::time::Duration;

pub enum PropertiesAction {
    None,
    SelectBox(BoxId),
}

pub struct PropertiesView<'a> {
    pub editor: &'a Editor,
    pub class_names: &'a [String],
    pub progress: &'a Progress,
    pub elapsed: Duration,
    pub options: &'a EditorOptions,
    pub log: &'a ActivityLog,
    pub celebrating: bool,
}

/// One line of the box list.
pub fn box_entry(index: usize, class_name: &str, bbox: &BoundingBox) -> String {
    format!(
        "{}: {} ({}x{})",
        index,
        class_name,
        bbox.coords.width(),
        bbox.coords.height()
    )
}

/// Display the properties panel.
pub fn show(ui: &mut egui::Ui, view: PropertiesView<'_>) -> PropertiesAction {
    let mut action = PropertiesAction::None;
    let boxes = view.editor.boxes();

    ui.heading(format!("Boxes ({})", boxes.len()));
    ui.separator();

    egui::ScrollArea::vertical()
        .id_source("box_list")
        .max_height(ui.available_height() * 0.45)
        .show(ui, |ui| {
            if boxes.is_empty() {
                ui.label(egui::RichText::new("No boxes").weak());
            }
            for (index, (id, bbox)) in boxes.sorted_view().enumerate() {
                let name = view
                    .class_names
                    .get(bbox.class_id)
                    .map(String::as_str)
                    .unwrap_or("?");
                let text = egui::RichText::new(box_entry(index + 1, name, bbox))
                    .color(class_color(bbox.class_id));
                let selected = view.editor.selected() == Some(id);
                if ui.selectable_label(selected, text).clicked() {
                    action = PropertiesAction::SelectBox(id);
                }
            }
        });

    ui.separator();
    ui.heading("Progress");
    show_progress(ui, view.progress, view.options.progress_style);
    ui.label(format!("Elapsed: {}", format_elapsed(view.elapsed)));
    match view.progress.pace(view.elapsed) {
        Some(avg) => ui.label(format!("Pace: {:.1} sec/image", avg)),
        None => ui.label("Pace: -"),
    };

    if view.celebrating {
        let t = ui.input(|i| i.time);
        let hue = (t * 0.5).fract() as f32;
        let color: egui::Color32 = egui::ecolor::Hsva::new(hue, 0.8, 1.0, 1.0).into();
        ui.label(
            egui::RichText::new("🎉 Target reached! 🎉")
                .size(20.0)
                .strong()
                .color(color),
        );
    }

    ui.separator();
    ui.heading("Log");
    for line in view.log.tail(view.options.log_lines as usize) {
        ui.label(egui::RichText::new(line).monospace().size(11.0));
    }

    action
}

fn show_progress(ui: &mut egui::Ui, progress: &Progress, style: ProgressStyle) {
    let goal = if progress.target > 0 {
        progress.target
    } else {
        progress.total
    };
    let text = format!("{} / {}", progress.annotated, goal);
    match style {
        ProgressStyle::Bar => {
            ui.add(egui::ProgressBar::new(progress.ratio()).text(text));
        }
        ProgressStyle::Pie => {
            ui.horizontal(|ui| {
                draw_pie(ui, progress.ratio(), 24.0);
                ui.label(text);
            });
        }
    }
}

fn draw_pie(ui: &mut egui::Ui, ratio: f32, radius: f32) {
    let size = egui::vec2(radius * 2.0, radius * 2.0);
    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
    let painter = ui.painter();
    let center = rect.center();
    painter.circle_filled(center, radius, egui::Color32::from_gray(60));

    if ratio > 0.0 {
        // Clockwise from twelve o'clock, one thin triangle per step since
        // a sector past half a turn is not convex.
        let steps = ((ratio * 64.0).ceil() as usize).max(2);
        let rim = |step: usize| {
            let angle = std::f32::consts::TAU * ratio * step as f32 / steps as f32
                - std::f32::consts::FRAC_PI_2;
            center + radius * egui::vec2(angle.cos(), angle.sin())
        };
        for step in 0..steps {
            painter.add(egui::Shape::convex_polygon(
                vec![center, rim(step), rim(step + 1)],
                egui::Color32::from_rgb(60, 180, 75),
                egui::Stroke::NONE,
            ));
        }
    }
    painter.circle_stroke(center, radius, egui::Stroke::new(1.0, egui::Color32::GRAY));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::Rect;

    #[test]
    fn test_box_entry_format() {
        let bbox = BoundingBox::new(Rect::new(40, 10, 10, 30), 2);
        assert_eq!(box_entry(3, "car", &bbox), "3: car (30x20)");
    }
}
