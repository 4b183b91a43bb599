// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Small helpers shared across the application.

pub mod format;
pub mod geometry;
pub mod timer;
