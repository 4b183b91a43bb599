// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the labelbench application.

pub mod canvas;
pub mod class_prompt;
pub mod options;
pub mod properties;
pub mod start_screen;
pub mod toolbar;
