// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod pipeline;
pub mod router;


pub use pipeline::Pipeline;
pub use router::StateRouter;

use crate::errors::EngineError;

/// Either engine shape the config can produce. One engine instance drives
/// exactly one file; processors are never shared between runs.
pub enum Engine {
    Pipeline(Pipeline),
    Router(StateRouter),
}

impl Engine {
    pub async fn run(
        &mut self,
        lines: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<String>, EngineError> {
        match self {
            Engine::Pipeline(pipeline) => pipeline.run(lines).await,
            Engine::Router(router) => router.run(lines).await,
        }
    }
}
