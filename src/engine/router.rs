// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Tag-routed engine.
//!
//! Lines enter tagged `start` and are driven through the routing table
//! until every line has reached the absorbing `end` tag. Processing order
//! is a FIFO work deque: the emissions of an earlier line are appended
//! before a later line's, so output order is a deterministic interleaving
//! governed by fan-out, not necessarily input order.
//!
//! A visit counter keyed on `(tag, text)` guards against routing loops: a
//! line revisiting the same state with the same payload more than
//! [`MAX_VISITS`] times aborts the run.

use std::collections::{HashMap, VecDeque};

use crate::errors::{ConfigError, EngineError};
use crate::line::{Tag, TaggedLine, START_TAG};
use crate::processors::ObservedProcessor;
use crate::traits::processor::Processor;

/// Visits of one `(tag, text)` key tolerated before declaring a cycle.
pub const MAX_VISITS: u32 = 1000;

pub struct StateRouter {
    routes: HashMap<Tag, ObservedProcessor>,
    // registration order, for deterministic end-of-stream flushing
    order: Vec<Tag>,
}

impl StateRouter {
    /// Build a router from `(tag, processor)` registrations.
    ///
    /// Fails when no processor is registered for `start` or a tag is
    /// registered twice.
    pub fn new(
        registrations: impl IntoIterator<Item = (Tag, ObservedProcessor)>,
    ) -> Result<Self, ConfigError> {
        let mut routes = HashMap::new();
        let mut order = Vec::new();

        for (tag, processor) in registrations {
            if routes.contains_key(&tag) {
                return Err(ConfigError::DuplicateTag(tag));
            }
            order.push(tag.clone());
            routes.insert(tag, processor);
        }

        if !routes.contains_key(START_TAG) {
            return Err(ConfigError::MissingStartTag);
        }

        Ok(Self { routes, order })
    }

    /// Drive `lines` to quiescence and return the terminal texts.
    pub async fn run(
        &mut self,
        lines: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<String>, EngineError> {
        let mut queue: VecDeque<TaggedLine> = lines
            .into_iter()
            .map(|text| TaggedLine::new(START_TAG, text))
            .collect();
        let mut visits: HashMap<(Tag, String), u32> = HashMap::new();
        let mut outputs = Vec::new();

        loop {
            while let Some(line) = queue.pop_front() {
                if line.is_terminal() {
                    outputs.push(line.text);
                    continue;
                }

                let visit = visits
                    .entry((line.tag.clone(), line.text.clone()))
                    .or_insert(0);
                *visit += 1;
                if *visit > MAX_VISITS {
                    return Err(EngineError::CycleDetected(line.tag));
                }

                let processor = self
                    .routes
                    .get_mut(&line.tag)
                    .ok_or_else(|| EngineError::UnroutedTag(line.tag.clone()))?;
                for emitted in processor.feed(line).await? {
                    queue.push_back(emitted);
                }
            }

            // input exhausted; drain buffered state until nothing new appears
            for tag in &self.order {
                let Some(processor) = self.routes.get_mut(tag) else {
                    continue;
                };
                for emitted in processor.flush().await? {
                    queue.push_back(emitted);
                }
            }
            if queue.is_empty() {
                return Ok(outputs);
            }
        }
    }
}
