// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a config document or building processors
/// from it. All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("unsupported config format '{path}': expected .json, .yaml or .yml")]
    UnsupportedFormat { path: PathBuf },

    #[error("config must define either 'processors' or 'nodes'")]
    EmptyConfig,

    #[error("config defines both 'processors' and 'nodes'; pick one mode")]
    AmbiguousMode,

    #[error("unknown processor type: '{0}'")]
    UnknownProcessorType(String),

    #[error("unknown filter predicate: '{0}'")]
    UnknownPredicate(String),

    #[error("filter '{id}' needs one of 'pattern', 'predicate' or 'min_length'")]
    MissingFilterCriterion { id: String },

    #[error("option '{option}' of processor '{id}' is not a valid {expected}")]
    InvalidOption {
        id: String,
        option: String,
        expected: &'static str,
    },

    #[error("routing table has no processor for tag 'start'")]
    MissingStartTag,

    #[error("duplicate routing tag: '{0}'")]
    DuplicateTag(String),
}
