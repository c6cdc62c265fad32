// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Processors meant for the tag-routed engine: the severity classifier
//! that fans lines out to category tags, and the terminal stages that
//! absorb them.

use async_trait::async_trait;

use crate::errors::ProcessorError;
use crate::line::{Tag, TaggedLine, END_TAG};
use crate::traits::Processor;

/// Classifies raw input lines by severity keyword.
///
/// `ERROR` lines route to `error` with their full trimmed text. `WARN`
/// lines route to `warn` with the `WARN:` marker stripped, so downstream
/// formatters see only the message. Everything else routes to `general`.
pub struct SeverityTagger;

#[async_trait]
impl Processor for SeverityTagger {
    async fn feed(&mut self, line: TaggedLine) -> Result<Vec<TaggedLine>, ProcessorError> {
        let text = line.text.trim();
        let out = if text.contains("ERROR") {
            line.derive("error", text)
        } else if text.contains("WARN") {
            let message = text.strip_prefix("WARN:").map(str::trim).unwrap_or(text);
            line.derive("warn", message)
        } else {
            line.derive("general", text)
        };
        Ok(vec![out])
    }

    fn type_name(&self) -> &'static str {
        "tag_lines"
    }
}

/// Passes lines whose tag matches, retagged to `end`; drops the rest.
pub struct OnlyTag {
    tag: Tag,
    type_name: &'static str,
}

impl OnlyTag {
    pub fn error() -> Self {
        Self {
            tag: "error".to_string(),
            type_name: "only_error",
        }
    }

    pub fn warn() -> Self {
        Self {
            tag: "warn".to_string(),
            type_name: "only_warn",
        }
    }
}

#[async_trait]
impl Processor for OnlyTag {
    async fn feed(&mut self, line: TaggedLine) -> Result<Vec<TaggedLine>, ProcessorError> {
        if line.tag == self.tag {
            let text = line.text.clone();
            return Ok(vec![line.derive(END_TAG, text)]);
        }
        Ok(Vec::new())
    }

    fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Rewrites the text as snake_case and terminates the flow.
pub struct SnakeCase;

#[async_trait]
impl Processor for SnakeCase {
    async fn feed(&mut self, line: TaggedLine) -> Result<Vec<TaggedLine>, ProcessorError> {
        let snaked = line
            .text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_lowercase();
        Ok(vec![line.derive(END_TAG, snaked)])
    }

    fn type_name(&self) -> &'static str {
        "snakecase"
    }
}

/// Absorbs lines unchanged.
pub struct Terminal;

#[async_trait]
impl Processor for Terminal {
    async fn feed(&mut self, line: TaggedLine) -> Result<Vec<TaggedLine>, ProcessorError> {
        let text = line.text.clone();
        Ok(vec![line.derive(END_TAG, text)])
    }

    fn type_name(&self) -> &'static str {
        "terminal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::START_TAG;

    async fn feed_one(p: &mut dyn Processor, text: &str) -> Vec<(String, String)> {
        p.feed(TaggedLine::new(START_TAG, text))
            .await
            .unwrap()
            .into_iter()
            .map(|l| (l.tag, l.text))
            .collect()
    }

    #[tokio::test]
    async fn severities_route_to_their_tags() {
        let mut tagger = SeverityTagger;
        assert_eq!(
            feed_one(&mut tagger, " ERROR: Disk failure").await,
            vec![("error".to_string(), "ERROR: Disk failure".to_string())]
        );
        assert_eq!(
            feed_one(&mut tagger, "WARN: low battery").await,
            vec![("warn".to_string(), "low battery".to_string())]
        );
        assert_eq!(
            feed_one(&mut tagger, "hello").await,
            vec![("general".to_string(), "hello".to_string())]
        );
    }

    #[tokio::test]
    async fn only_tag_drops_mismatches() {
        let mut only_error = OnlyTag::error();
        let kept = only_error
            .feed(TaggedLine::new("error", "ERROR: x"))
            .await
            .unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].tag, END_TAG);

        let dropped = only_error
            .feed(TaggedLine::new("warn", "WARN: y"))
            .await
            .unwrap();
        assert!(dropped.is_empty());
    }

    #[tokio::test]
    async fn snakecase_normalizes() {
        let mut snake = SnakeCase;
        assert_eq!(
            feed_one(&mut snake, "Low Battery Warning").await,
            vec![(END_TAG.to_string(), "low_battery_warning".to_string())]
        );
    }

    #[tokio::test]
    async fn terminal_absorbs_unchanged() {
        let mut terminal = Terminal;
        assert_eq!(
            feed_one(&mut terminal, "hello").await,
            vec![(END_TAG.to_string(), "hello".to_string())]
        );
    }
}
