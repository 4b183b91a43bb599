// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for the current image and its boxes.
//!
//! The canvas only reads editor state and reports pointer events in
//! display coordinates; all mutation happens in the app.

use crate::editor::render_cache::{Handle, RenderEntry, ROTATE_HANDLE_RADIUS};
use crate::editor::selection::{hit_test, HitTarget};
use crate::editor::Editor;
use crate::io::serialization::EditorOptions;
use crate::models::annotation::{Point, Rect};
use egui::{Color32, Pos2, Stroke};

/// Pointer events produced by the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasAction {
    Pressed(Point),
    Moved(Point),
    Released,
    /// Secondary click: select whatever box is under the pointer.
    ContextSelect(Point),
    AssignClass(usize),
    DeleteSelected,
}

/// What the canvas did this frame.
pub struct CanvasOutput {
    pub actions: Vec<CanvasAction>,
    /// Space available for the image, for fitting.
    pub size: egui::Vec2,
}

/// Read-only inputs for one frame of the canvas.
pub struct CanvasView<'a> {
    pub editor: &'a Editor,
    pub texture: Option<&'a egui::TextureHandle>,
    pub class_names: &'a [String],
    pub options: &'a EditorOptions,
    /// False while a modal prompt owns the pointer.
    pub interactive: bool,
}

const PALETTE: [Color32; 20] = [
    Color32::from_rgb(230, 25, 75),
    Color32::from_rgb(60, 180, 75),
    Color32::from_rgb(255, 225, 25),
    Color32::from_rgb(0, 130, 200),
    Color32::from_rgb(245, 130, 48),
    Color32::from_rgb(145, 30, 180),
    Color32::from_rgb(70, 240, 240),
    Color32::from_rgb(240, 50, 230),
    Color32::from_rgb(210, 245, 60),
    Color32::from_rgb(250, 190, 212),
    Color32::from_rgb(0, 128, 128),
    Color32::from_rgb(220, 190, 255),
    Color32::from_rgb(170, 110, 40),
    Color32::from_rgb(255, 250, 200),
    Color32::from_rgb(128, 0, 0),
    Color32::from_rgb(170, 255, 195),
    Color32::from_rgb(128, 128, 0),
    Color32::from_rgb(255, 215, 180),
    Color32::from_rgb(0, 0, 128),
    Color32::from_rgb(128, 128, 128),
];

/// Stable color for a class id.
pub fn class_color(class_id: usize) -> Color32 {
    PALETTE[class_id % PALETTE.len()]
}

/// Display the canvas and collect pointer events.
pub fn show(ui: &mut egui::Ui, view: CanvasView<'_>) -> CanvasOutput {
    let mut actions = Vec::new();
    let (response, painter) =
        ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
    let canvas = response.rect;
    let size = canvas.size();
    painter.rect_filled(canvas, 0.0, Color32::from_gray(40));

    let (Some(texture), Some(mapper)) = (view.texture, view.editor.mapper()) else {
        painter.text(
            canvas.center(),
            egui::Align2::CENTER_CENTER,
            "No image",
            egui::FontId::proportional(16.0),
            Color32::from_gray(150),
        );
        return CanvasOutput { actions, size };
    };

    // Keep the image origin on whole pixels so display coordinates are exact.
    let (dw, dh) = mapper.display_size();
    let origin = egui::pos2(
        (canvas.center().x - dw as f32 / 2.0).round(),
        (canvas.center().y - dh as f32 / 2.0).round(),
    );
    let image_rect = egui::Rect::from_min_size(origin, egui::vec2(dw as f32, dh as f32));

    painter.image(
        texture.id(),
        image_rect,
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        Color32::WHITE,
    );

    let to_display = |pos: Pos2| {
        Point::new(
            ((pos.x - origin.x).round() as i32).clamp(0, dw as i32),
            ((pos.y - origin.y).round() as i32).clamp(0, dh as i32),
        )
    };
    let to_screen = |p: Point| origin + egui::vec2(p.x as f32, p.y as f32);
    let to_screen_rect = |r: Rect| {
        egui::Rect::from_min_max(to_screen(r.top_left()), to_screen(r.bottom_right()))
    };

    let cache = view.editor.cache();
    let line_width = view.options.line_width as f32;
    let font = egui::FontId::proportional(view.options.font_size as f32);

    for (id, entry) in cache.iter() {
        let selected = cache.selected() == Some(id);
        let style = BoxStyle {
            selected,
            line_width,
            font: &font,
        };
        draw_box(&painter, entry, to_screen_rect(entry.rect), style, view.class_names);
        if let Some(handles) = entry.handles {
            for (_, square) in handles.resize {
                let r = to_screen_rect(square);
                painter.rect_filled(r, 0.0, Color32::WHITE);
                painter.rect_stroke(r, 0.0, Stroke::new(1.0, Color32::BLACK));
            }
            let r = entry.rect;
            let top_mid = to_screen(Point::new((r.x1 + r.x2) / 2, r.y1));
            let knob = to_screen(handles.rotate_center);
            let radius = ROTATE_HANDLE_RADIUS as f32;
            painter.line_segment([top_mid, knob], Stroke::new(1.0, Color32::WHITE));
            painter.circle_filled(knob, radius, Color32::from_rgb(255, 200, 0));
            painter.circle_stroke(knob, radius, Stroke::new(1.0, Color32::BLACK));
        }
    }

    if let Some(rect) = view.editor.provisional_rect() {
        let r = to_screen_rect(rect);
        let corners = [
            r.left_top(),
            r.right_top(),
            r.right_bottom(),
            r.left_bottom(),
            r.left_top(),
        ];
        painter.extend(egui::Shape::dashed_line(
            &corners,
            Stroke::new(line_width, Color32::LIGHT_BLUE),
            6.0,
            4.0,
        ));
    }

    if !view.interactive {
        return CanvasOutput { actions, size };
    }

    let pointer = response.hover_pos().or_else(|| response.interact_pointer_pos());
    if let Some(pos) = pointer {
        let p = to_display(pos);
        let (pressed, moved) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.delta() != egui::Vec2::ZERO,
            )
        });

        if view.editor.mode().is_editing() && image_rect.contains(pos) {
            let crosshair = Stroke::new(1.0, Color32::from_white_alpha(90));
            painter.hline(image_rect.x_range(), pos.y, crosshair);
            painter.vline(pos.x, image_rect.y_range(), crosshair);
            ui.ctx().set_cursor_icon(cursor_for(hit_test(cache, p).map(|hit| hit.target)));
        }

        if moved {
            actions.push(CanvasAction::Moved(p));
        }
        if pressed && response.hovered() && image_rect.contains(pos) {
            actions.push(CanvasAction::Pressed(p));
        }
        if response.secondary_clicked() && image_rect.contains(pos) {
            actions.push(CanvasAction::ContextSelect(p));
        }
    }

    // A release can land outside the canvas; the editor ignores stray ones.
    if ui.input(|i| i.pointer.primary_released()) {
        actions.push(CanvasAction::Released);
    }

    if view.editor.mode().is_editing() {
        response.context_menu(|ui| {
            if view.editor.selected().is_none() {
                ui.label("No box selected");
                return;
            }
            ui.menu_button("Change class", |ui| {
                for (class_id, name) in view.class_names.iter().enumerate() {
                    if ui.button(format!("{}: {}", class_id, name)).clicked() {
                        actions.push(CanvasAction::AssignClass(class_id));
                        ui.close_menu();
                    }
                }
            });
            if ui.button("Delete box").clicked() {
                actions.push(CanvasAction::DeleteSelected);
                ui.close_menu();
            }
        });
    }

    CanvasOutput { actions, size }
}

struct BoxStyle<'a> {
    selected: bool,
    line_width: f32,
    font: &'a egui::FontId,
}

fn draw_box(
    painter: &egui::Painter,
    entry: &RenderEntry,
    screen: egui::Rect,
    style: BoxStyle<'_>,
    class_names: &[String],
) {
    let BoxStyle {
        selected,
        line_width,
        font,
    } = style;
    let color = class_color(entry.class_id);
    let width = if selected { line_width + 1.0 } else { line_width };
    painter.rect_stroke(screen, 0.0, Stroke::new(width, color));

    let name = class_names
        .get(entry.class_id)
        .map(String::as_str)
        .unwrap_or("?");
    let label = painter.layout_no_wrap(name.to_string(), font.clone(), Color32::BLACK);
    let label_pos = egui::pos2(screen.min.x, screen.min.y - label.size().y);
    painter.rect_filled(
        egui::Rect::from_min_size(label_pos, label.size()).expand(1.0),
        0.0,
        color,
    );
    painter.galley(label_pos, label, Color32::BLACK);

    let badge = painter.layout_no_wrap(entry.index.to_string(), font.clone(), Color32::WHITE);
    let badge_pos = screen.max - badge.size() - egui::vec2(2.0, 2.0);
    painter.rect_filled(
        egui::Rect::from_min_size(badge_pos, badge.size()).expand(1.0),
        2.0,
        Color32::from_black_alpha(160),
    );
    painter.galley(badge_pos, badge, Color32::WHITE);
}

fn cursor_for(target: Option<HitTarget>) -> egui::CursorIcon {
    match target {
        None => egui::CursorIcon::Crosshair,
        Some(HitTarget::Move) => egui::CursorIcon::Move,
        Some(HitTarget::Rotate) => egui::CursorIcon::Alias,
        Some(HitTarget::Resize(handle)) => match handle {
            Handle::TopLeft | Handle::BottomRight => egui::CursorIcon::ResizeNwSe,
            Handle::TopRight | Handle::BottomLeft => egui::CursorIcon::ResizeNeSw,
            Handle::TopMid | Handle::BottomMid => egui::CursorIcon::ResizeVertical,
            Handle::MidLeft | Handle::MidRight => egui::CursorIcon::ResizeHorizontal,
        },
    }
}
