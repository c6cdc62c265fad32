// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod store;

pub use store::{
    ErrorRecord, FileQueueStats, LineTrace, MetricsStore, ProcessorMetrics, RecentFile,
    TraceStatus, TraceStep, MAX_ERRORS, MAX_RECENT_FILES, MAX_TRACES,
};
