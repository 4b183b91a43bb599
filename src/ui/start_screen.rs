// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Start screen: folder selection, dashboard and mode launch.

use crate::models::approval::{DashboardStats, WorkMode};
use crate::models::project::{ImageFolder, Project};
use crate::util::format::format_bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAction {
    None,
    PickProject,
    PickImages,
    StartMode(WorkMode),
    Export,
}

pub struct StartView<'a> {
    pub project: Option<&'a Project>,
    pub folder: Option<&'a ImageFolder>,
    pub stats: &'a DashboardStats,
    pub image_bytes: u64,
    pub label_bytes: u64,
    pub message: Option<&'a str>,
}

pub fn show(ui: &mut egui::Ui, view: StartView<'_>) -> StartAction {
    let mut action = StartAction::None;

    ui.vertical_centered(|ui| {
        ui.add_space(20.0);
        ui.heading(egui::RichText::new("labelbench").size(32.0));
        ui.label(
            egui::RichText::new("Bounding-box annotation and review")
                .color(egui::Color32::from_gray(150)),
        );
        ui.add_space(20.0);
    });

    egui::Grid::new("start_folders")
        .num_columns(3)
        .spacing([12.0, 8.0])
        .show(ui, |ui| {
            ui.label("Project folder:");
            match view.project {
                Some(project) => ui.label(project.dir.display().to_string()),
                None => ui.label(egui::RichText::new("not selected").weak()),
            };
            if ui.button("Choose...").clicked() {
                action = StartAction::PickProject;
            }
            ui.end_row();

            ui.label("Image folder:");
            match view.folder {
                Some(folder) => ui.label(folder.image_dir.display().to_string()),
                None => ui.label(egui::RichText::new("not selected").weak()),
            };
            if ui.button("Choose...").clicked() {
                action = StartAction::PickImages;
            }
            ui.end_row();
        });

    if let Some(project) = view.project {
        let names = project.class_names.join(", ");
        ui.label(format!("{} classes: {}", project.class_names.len(), names));
    }

    ui.separator();

    if view.folder.is_some() {
        let stats = view.stats;
        egui::Grid::new("dashboard").num_columns(2).striped(true).show(ui, |ui| {
            for (name, value) in [
                ("Images", stats.total.to_string()),
                ("Annotated", stats.annotated.to_string()),
                ("Approved", stats.approved.to_string()),
                ("Rejected", stats.rejected.to_string()),
                ("Fixed", stats.fixed.to_string()),
                ("Image data", format_bytes(view.image_bytes)),
                ("Label data", format_bytes(view.label_bytes)),
            ] {
                ui.label(name);
                ui.label(value);
                ui.end_row();
            }
        });
        ui.separator();
    }

    let ready = view.project.is_some() && view.folder.is_some();
    ui.horizontal(|ui| {
        for mode in WorkMode::ALL {
            let text = format!("Start {}", mode.name());
            if ui.add_enabled(ready, egui::Button::new(text)).clicked() {
                action = StartAction::StartMode(mode);
            }
        }
        ui.separator();
        if ui.add_enabled(ready, egui::Button::new("Export approved...")).clicked() {
            action = StartAction::Export;
        }
    });

    if let Some(message) = view.message {
        ui.add_space(10.0);
        ui.colored_label(egui::Color32::from_rgb(230, 120, 60), message);
    }

    action
}

/// Ask whether to resume a saved session. `Some(true)` resumes.
pub fn resume_prompt(
    ctx: &egui::Context,
    mode: WorkMode,
    index: usize,
    total: usize,
) -> Option<bool> {
    let mut answer = None;
    egui::Window::new("Resume session?")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(format!(
                "A saved session exists. Resume {} at image {} of {}?",
                mode.name(),
                index + 1,
                total
            ));
            ui.horizontal(|ui| {
                if ui.button("Resume").clicked() {
                    answer = Some(true);
                }
                if ui.button("Start fresh").clicked() {
                    answer = Some(false);
                }
            });
        });
    answer
}
