// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod engine;
mod processor;

pub use config::ConfigError;
pub use engine::EngineError;
pub use processor::ProcessorError;
