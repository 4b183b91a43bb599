// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides coordinate transformations between image-pixel
//! ("original") coordinates, scaled display coordinates, and the
//! normalized center/size form used by label files.

use crate::models::annotation::{Point, Rect};

/// Maps points between image space and the scaled canvas.
///
/// The image is fitted into the canvas keeping its aspect ratio. No
/// clamping happens here; callers keep points inside the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateMapper {
    image_w: u32,
    image_h: u32,
    resized_w: u32,
    resized_h: u32,
}

impl CoordinateMapper {
    /// Fit an image into a canvas.
    ///
    /// Returns `None` when either size is degenerate, in which case
    /// nothing should be drawn.
    pub fn fit(canvas_w: f32, canvas_h: f32, image_w: u32, image_h: u32) -> Option<Self> {
        if image_w == 0 || image_h == 0 || canvas_w <= 0.0 || canvas_h <= 0.0 {
            return None;
        }
        let scale = (canvas_w as f64 / image_w as f64).min(canvas_h as f64 / image_h as f64);
        let resized_w = (image_w as f64 * scale).round() as u32;
        let resized_h = (image_h as f64 * scale).round() as u32;
        Self::with_display_size(image_w, image_h, resized_w, resized_h)
    }

    /// Build a mapper for an explicit display size.
    pub fn with_display_size(
        image_w: u32,
        image_h: u32,
        resized_w: u32,
        resized_h: u32,
    ) -> Option<Self> {
        if image_w == 0 || image_h == 0 || resized_w == 0 || resized_h == 0 {
            return None;
        }
        Some(Self {
            image_w,
            image_h,
            resized_w,
            resized_h,
        })
    }

    pub fn display_size(&self) -> (u32, u32) {
        (self.resized_w, self.resized_h)
    }

    /// Image space to display space.
    pub fn to_display(&self, p: Point) -> Point {
        Point::new(
            scale(p.x, self.resized_w, self.image_w),
            scale(p.y, self.resized_h, self.image_h),
        )
    }

    /// Display space to image space.
    pub fn to_original(&self, p: Point) -> Point {
        Point::new(
            scale(p.x, self.image_w, self.resized_w),
            scale(p.y, self.image_h, self.resized_h),
        )
    }

    pub fn rect_to_display(&self, r: Rect) -> Rect {
        Rect::from_corners(self.to_display(r.top_left()), self.to_display(r.bottom_right()))
    }

    pub fn rect_to_original(&self, r: Rect) -> Rect {
        Rect::from_corners(
            self.to_original(r.top_left()),
            self.to_original(r.bottom_right()),
        )
    }
}

fn scale(v: i32, num: u32, den: u32) -> i32 {
    (v as f64 * num as f64 / den as f64).round() as i32
}

/// Convert a pixel rectangle to normalized `[x_center, y_center, width, height]`.
pub fn normalize_rect(rect: Rect, width: u32, height: u32) -> [f64; 4] {
    let (cx, cy) = rect.center();
    let dw = 1.0 / width as f64;
    let dh = 1.0 / height as f64;
    [
        cx * dw,
        cy * dh,
        (rect.x2 - rect.x1) as f64 * dw,
        (rect.y2 - rect.y1) as f64 * dh,
    ]
}

/// Convert normalized center/size back to pixel corners, truncating.
pub fn denormalize_rect(xywh: [f64; 4], width: u32, height: u32) -> Rect {
    let cx = xywh[0] * width as f64;
    let cy = xywh[1] * height as f64;
    let w = xywh[2] * width as f64;
    let h = xywh[3] * height as f64;
    Rect::new(
        (cx - w / 2.0) as i32,
        (cy - h / 2.0) as i32,
        (cx + w / 2.0) as i32,
        (cy + h / 2.0) as i32,
    )
    .normalized()
}
