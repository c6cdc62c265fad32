// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use uuid::Uuid;

/// Routing-state name. `start` and `end` are reserved.
pub type Tag = String;

/// Initial tag assigned to every ingested line.
pub const START_TAG: &str = "start";

/// Terminal tag; lines carrying it are absorbed out of the routing graph.
pub const END_TAG: &str = "end";

/// The unit of work flowing through the engine: a tag, a text payload, and
/// the line id assigned at ingestion.
///
/// The id stays stable across the whole traversal so that trace events for
/// one line chain into a single path. Emissions produced while processing a
/// line inherit its id via [`TaggedLine::derive`]; fresh lines (ingestion,
/// buffer flushes) get a new id via [`TaggedLine::new`].
#[derive(Debug, Clone)]
pub struct TaggedLine {
    pub tag: Tag,
    pub text: String,
    pub line_id: Uuid,
}

impl TaggedLine {
    /// Create a line with a freshly assigned id.
    pub fn new(tag: impl Into<Tag>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: text.into(),
            line_id: Uuid::new_v4(),
        }
    }

    /// Create a line that inherits this line's id.
    pub fn derive(&self, tag: impl Into<Tag>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: text.into(),
            line_id: self.line_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.tag == END_TAG
    }
}
