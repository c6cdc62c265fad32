// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // config documents + processor registry
pub mod dashboard;  // observability HTTP surface
pub mod engine;     // tag router + linear pipeline
pub mod errors;     // error handling
pub mod line;       // tags and tagged lines
pub mod metrics;    // shared metrics/trace store
pub mod monitor;    // folder-based work queue
pub mod processors; // processor implementations
pub mod traits;     // unified abstractions
