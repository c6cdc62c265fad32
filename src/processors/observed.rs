// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Telemetry wrapper around any processor.
//!
//! For every input the wrapper records `lines_in` and a `start` trace,
//! measures wall time, then records one `emit` per output, a `drop` when
//! nothing came out, or an `error` plus an error record when the inner
//! processor failed. Errors are re-raised to the caller.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::errors::ProcessorError;
use crate::line::TaggedLine;
use crate::metrics::{MetricsStore, TraceStatus};
use crate::traits::Processor;

pub struct ObservedProcessor {
    inner: Box<dyn Processor>,
    processor_id: String,
    metrics: Arc<MetricsStore>,
}

impl ObservedProcessor {
    /// Wrap `inner`, registering `processor_id` in the metrics store.
    pub fn new(
        inner: Box<dyn Processor>,
        processor_id: impl Into<String>,
        metrics: &Arc<MetricsStore>,
    ) -> Self {
        let processor_id = processor_id.into();
        metrics.register_processor(&processor_id, inner.type_name());
        Self {
            inner,
            processor_id,
            metrics: Arc::clone(metrics),
        }
    }

    pub fn processor_id(&self) -> &str {
        &self.processor_id
    }

    fn record_outcome(&self, result: &Result<Vec<TaggedLine>, ProcessorError>) {
        match result {
            Ok(outputs) => {
                for out in outputs {
                    self.metrics.record_lines_out(&self.processor_id);
                    self.metrics
                        .add_trace(out.line_id, &self.processor_id, TraceStatus::Emit, &out.text);
                }
            }
            Err(err) => {
                self.metrics.record_error(&self.processor_id, &err.message);
            }
        }
    }
}

#[async_trait]
impl Processor for ObservedProcessor {
    async fn feed(&mut self, line: TaggedLine) -> Result<Vec<TaggedLine>, ProcessorError> {
        let line_id = line.line_id;
        let snapshot = line.text.clone();
        self.metrics.record_lines_in(&self.processor_id);
        self.metrics
            .add_trace(line_id, &self.processor_id, TraceStatus::Start, &snapshot);

        let started = Instant::now();
        let result = self.inner.feed(line).await;
        self.metrics
            .add_processing_time(&self.processor_id, started.elapsed());

        self.record_outcome(&result);
        match &result {
            Ok(outputs) if outputs.is_empty() => {
                self.metrics
                    .add_trace(line_id, &self.processor_id, TraceStatus::Drop, &snapshot);
            }
            Err(_) => {
                self.metrics
                    .add_trace(line_id, &self.processor_id, TraceStatus::Error, &snapshot);
            }
            Ok(_) => {}
        }
        result
    }

    async fn flush(&mut self) -> Result<Vec<TaggedLine>, ProcessorError> {
        let started = Instant::now();
        let result = self.inner.flush().await;
        self.metrics
            .add_processing_time(&self.processor_id, started.elapsed());
        self.record_outcome(&result);
        result
    }

    fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }
}
