// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! labelbench - bounding-box annotation workstation
//!
//! A desktop application for drawing class-labeled boxes on folders of
//! images, reviewing them through an approve/reject/fix cycle, and
//! exporting the approved pairs.

mod app;
mod config;
mod detector;
mod editor;
mod io;
mod models;
mod ui;
mod util;

use app::LabelbenchApp;
use anyhow::Result;
use config::AppConfig;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = AppConfig::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("labelbench"),
        ..Default::default()
    };

    eframe::run_native(
        "labelbench",
        options,
        Box::new(|_cc| Ok(Box::new(LabelbenchApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
