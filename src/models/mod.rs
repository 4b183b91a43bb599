// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model for the labelbench application.

pub mod annotation;
pub mod approval;
pub mod history;
pub mod progress;
pub mod project;
