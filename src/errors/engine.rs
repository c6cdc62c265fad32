// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use super::ProcessorError;

/// Errors raised while driving lines through an engine run. These abort the
/// current file only; the monitor moves it to `failed/` and carries on.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no processor registered for tag '{0}'")]
    UnroutedTag(String),

    #[error("cycle detected on tag '{0}'")]
    CycleDetected(String),

    #[error(transparent)]
    Processor(#[from] ProcessorError),
}
