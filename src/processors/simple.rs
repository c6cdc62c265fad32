// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Adapters that turn plain line functions into processors.

use async_trait::async_trait;

use crate::errors::ProcessorError;
use crate::line::{Tag, TaggedLine, END_TAG};
use crate::traits::Processor;

/// Wraps a `&str -> String` function as a terminal transform: each input
/// `(tag, text)` becomes `(end, f(text))`. An empty result drops the line.
pub struct SimpleFnProcessor {
    type_name: &'static str,
    f: Box<dyn FnMut(&str) -> String + Send>,
}

impl SimpleFnProcessor {
    pub fn new(type_name: &'static str, f: impl FnMut(&str) -> String + Send + 'static) -> Self {
        Self {
            type_name,
            f: Box::new(f),
        }
    }
}

#[async_trait]
impl Processor for SimpleFnProcessor {
    async fn feed(&mut self, line: TaggedLine) -> Result<Vec<TaggedLine>, ProcessorError> {
        let out = (self.f)(&line.text);
        if out.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![line.derive(END_TAG, out)])
    }

    fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Wraps a `&str -> Vec<String>` function: one emission per produced
/// string, all carrying the configured output tag.
pub struct FanOutFnProcessor {
    type_name: &'static str,
    out_tag: Tag,
    f: Box<dyn FnMut(&str) -> Vec<String> + Send>,
}

impl FanOutFnProcessor {
    pub fn new(
        type_name: &'static str,
        out_tag: impl Into<Tag>,
        f: impl FnMut(&str) -> Vec<String> + Send + 'static,
    ) -> Self {
        Self {
            type_name,
            out_tag: out_tag.into(),
            f: Box::new(f),
        }
    }
}

#[async_trait]
impl Processor for FanOutFnProcessor {
    async fn feed(&mut self, line: TaggedLine) -> Result<Vec<TaggedLine>, ProcessorError> {
        Ok((self.f)(&line.text)
            .into_iter()
            .map(|text| line.derive(self.out_tag.clone(), text))
            .collect())
    }

    fn type_name(&self) -> &'static str {
        self.type_name
    }
}

pub fn uppercase() -> SimpleFnProcessor {
    SimpleFnProcessor::new("uppercase", |line| line.to_uppercase())
}

pub fn lowercase() -> SimpleFnProcessor {
    SimpleFnProcessor::new("lowercase", |line| line.to_lowercase())
}
