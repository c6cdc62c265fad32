// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Linear pipeline: stages composed in config order, each stage consuming
//! the full emission stream of the one before it. Stage state (counters,
//! join buffers) lives for exactly one run; every stage is flushed when its
//! input is exhausted, so fan-in processors get their end-of-stream
//! emission.

use crate::errors::EngineError;
use crate::line::{TaggedLine, START_TAG};
use crate::processors::ObservedProcessor;
use crate::traits::processor::Processor;

pub struct Pipeline {
    stages: Vec<ObservedProcessor>,
}

impl Pipeline {
    pub fn new(stages: Vec<ObservedProcessor>) -> Self {
        Self { stages }
    }

    pub fn add_stage(&mut self, stage: ObservedProcessor) -> &mut Self {
        self.stages.push(stage);
        self
    }

    /// Run every input line through all stages and return the terminal
    /// texts in order.
    pub async fn run(
        &mut self,
        lines: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<String>, EngineError> {
        let mut current: Vec<TaggedLine> = lines
            .into_iter()
            .map(|text| TaggedLine::new(START_TAG, text))
            .collect();

        for stage in &mut self.stages {
            let mut next = Vec::new();
            for line in current {
                next.extend(stage.feed(line).await?);
            }
            next.extend(stage.flush().await?);
            current = next;
        }

        Ok(current.into_iter().map(|line| line.text).collect())
    }
}
