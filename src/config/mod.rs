// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod registry;

pub use loader::{load_config, Config, Mode, NodeDescriptor, ProcessorDescriptor};
pub use registry::{build_engine, build_processor};
