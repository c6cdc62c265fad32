// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stateful processors: counters, fan-in, fan-out, filters and the
//! in-pipeline tag router.

use async_trait::async_trait;

use crate::errors::ProcessorError;
use crate::line::{Tag, TaggedLine, END_TAG};
use crate::processors::ObservedProcessor;
use crate::traits::Processor;

/// Prepends a monotonically increasing counter to each line.
///
/// `format` supports the `{count}` and `{line}` placeholders.
pub struct LineCounter {
    format: String,
    count: u64,
}

impl LineCounter {
    pub const DEFAULT_FORMAT: &'static str = "[{count}] {line}";

    pub fn new(format: impl Into<String>, start_count: u64) -> Self {
        Self {
            format: format.into(),
            count: start_count,
        }
    }
}

impl Default for LineCounter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FORMAT, 1)
    }
}

#[async_trait]
impl Processor for LineCounter {
    async fn feed(&mut self, line: TaggedLine) -> Result<Vec<TaggedLine>, ProcessorError> {
        let rendered = self
            .format
            .replace("{count}", &self.count.to_string())
            .replace("{line}", &line.text);
        self.count += 1;
        Ok(vec![line.derive(END_TAG, rendered)])
    }

    fn type_name(&self) -> &'static str {
        "line_counter"
    }
}

/// Buffers `count` lines and emits them joined (fan-in). A partial buffer
/// left at end of stream is flushed as one final emission.
pub struct LineJoiner {
    delimiter: String,
    count: usize,
    buffer: Vec<String>,
}

impl LineJoiner {
    pub const DEFAULT_DELIMITER: &'static str = " | ";

    pub fn new(delimiter: impl Into<String>, count: usize) -> Self {
        Self {
            delimiter: delimiter.into(),
            count: count.max(1),
            buffer: Vec::new(),
        }
    }
}

impl Default for LineJoiner {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELIMITER, 2)
    }
}

#[async_trait]
impl Processor for LineJoiner {
    async fn feed(&mut self, line: TaggedLine) -> Result<Vec<TaggedLine>, ProcessorError> {
        self.buffer.push(line.text.clone());
        if self.buffer.len() < self.count {
            return Ok(Vec::new());
        }
        let joined = self.buffer.join(&self.delimiter);
        self.buffer.clear();
        Ok(vec![line.derive(END_TAG, joined)])
    }

    async fn flush(&mut self) -> Result<Vec<TaggedLine>, ProcessorError> {
        if self.buffer.is_empty() {
            return Ok(Vec::new());
        }
        let joined = self.buffer.join(&self.delimiter);
        self.buffer.clear();
        Ok(vec![TaggedLine::new(END_TAG, joined)])
    }

    fn type_name(&self) -> &'static str {
        "line_joiner"
    }
}

/// Splits each input on a delimiter and emits one line per non-empty part
/// (fan-out). Parts are trimmed; lines with nothing but delimiters emit
/// nothing and are dropped.
pub struct LineSplitter {
    delimiter: String,
}

impl LineSplitter {
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
        }
    }
}

impl Default for LineSplitter {
    fn default() -> Self {
        Self::new(",")
    }
}

#[async_trait]
impl Processor for LineSplitter {
    async fn feed(&mut self, line: TaggedLine) -> Result<Vec<TaggedLine>, ProcessorError> {
        Ok(line
            .text
            .split(&self.delimiter)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| line.derive(END_TAG, part))
            .collect())
    }

    fn type_name(&self) -> &'static str {
        "line_splitter"
    }
}

/// What a [`FilterProcessor`] tests each line against.
pub enum FilterCriterion {
    /// Substring containment on the raw line.
    Pattern(String),
    /// A registered named predicate.
    Predicate {
        name: String,
        f: fn(&str) -> bool,
    },
    MinLength(usize),
}

impl FilterCriterion {
    fn accepts(&self, text: &str) -> bool {
        match self {
            FilterCriterion::Pattern(pattern) => text.contains(pattern.as_str()),
            FilterCriterion::Predicate { f, .. } => f(text),
            FilterCriterion::MinLength(min) => text.len() >= *min,
        }
    }
}

/// Passes lines satisfying the criterion; drops the rest.
pub struct FilterProcessor {
    criterion: FilterCriterion,
}

impl FilterProcessor {
    pub fn new(criterion: FilterCriterion) -> Self {
        Self { criterion }
    }
}

#[async_trait]
impl Processor for FilterProcessor {
    async fn feed(&mut self, line: TaggedLine) -> Result<Vec<TaggedLine>, ProcessorError> {
        if self.criterion.accepts(&line.text) {
            let text = line.text.clone();
            return Ok(vec![line.derive(END_TAG, text)]);
        }
        Ok(Vec::new())
    }

    fn type_name(&self) -> &'static str {
        "filter"
    }
}

/// Splits the input, reads the tag selector from `tag_field` and forwards
/// the line to the matching sub-processor. No match, or too few fields,
/// passes the line through unchanged.
pub struct TagRouter {
    tag_field: usize,
    delimiter: String,
    routes: Vec<(Tag, ObservedProcessor)>,
}

impl TagRouter {
    pub fn new(tag_field: usize, delimiter: impl Into<String>) -> Self {
        Self {
            tag_field,
            delimiter: delimiter.into(),
            routes: Vec::new(),
        }
    }

    pub fn add_route(&mut self, tag: impl Into<Tag>, processor: ObservedProcessor) {
        self.routes.push((tag.into(), processor));
    }

    fn route_for(&mut self, tag: &str) -> Option<&mut ObservedProcessor> {
        self.routes
            .iter_mut()
            .find(|(t, _)| t == tag)
            .map(|(_, p)| p)
    }
}

impl Default for TagRouter {
    fn default() -> Self {
        Self::new(0, ",")
    }
}

#[async_trait]
impl Processor for TagRouter {
    async fn feed(&mut self, line: TaggedLine) -> Result<Vec<TaggedLine>, ProcessorError> {
        let selector = line
            .text
            .split(&self.delimiter)
            .nth(self.tag_field)
            .map(|field| field.trim().to_string());

        if let Some(tag) = selector {
            if let Some(processor) = self.route_for(&tag) {
                return processor.feed(line).await;
            }
        }
        Ok(vec![line])
    }

    async fn flush(&mut self) -> Result<Vec<TaggedLine>, ProcessorError> {
        let mut out = Vec::new();
        for (_, processor) in self.routes.iter_mut() {
            out.extend(processor.flush().await?);
        }
        Ok(out)
    }

    fn type_name(&self) -> &'static str {
        "tag_router"
    }
}
