// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Process-wide metrics, trace and file-queue registry.
//!
//! One `MetricsStore` is constructed in `main` and handed to every worker
//! and to the dashboard as an `Arc`. Each collection sits behind its own
//! mutex so processor counters, traces, errors and file stats never contend
//! with each other; no lock is ever held across I/O or an await point.
//! Readers get deep copies.
//!
//! Traces, errors and the recent-file list are bounded; overflow evicts the
//! oldest entry.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use uuid::Uuid;

/// Bound on retained line traces.
pub const MAX_TRACES: usize = 1000;
/// Bound on retained error records.
pub const MAX_ERRORS: usize = 100;
/// Bound on the recently-processed-files list.
pub const MAX_RECENT_FILES: usize = 10;

/// Per-processor counters. Counters are monotonic; `total_processing_time`
/// accumulates wall seconds.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessorMetrics {
    #[serde(rename = "type")]
    pub processor_type: String,
    pub lines_in: u64,
    pub lines_out: u64,
    pub total_processing_time: f64,
    pub error_count: u64,
    pub last_processed_at: Option<f64>,
}

impl ProcessorMetrics {
    fn new(processor_type: &str) -> Self {
        Self {
            processor_type: processor_type.to_string(),
            lines_in: 0,
            lines_out: 0,
            total_processing_time: 0.0,
            error_count: 0,
            last_processed_at: None,
        }
    }
}

/// Outcome of one processor step on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    Start,
    Emit,
    Drop,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceStep {
    pub processor_id: String,
    pub status: TraceStatus,
    pub timestamp: f64,
}

/// The ordered path of one line through the processors.
#[derive(Debug, Clone, Serialize)]
pub struct LineTrace {
    pub line_id: Uuid,
    pub original_line: String,
    pub start_time: f64,
    pub path: Vec<TraceStep>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub timestamp: f64,
    pub processor_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentFile {
    pub filename: String,
    pub timestamp: f64,
}

/// Snapshot of the folder queue as exposed on `/files`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileQueueStats {
    pub unprocessed_count: usize,
    pub in_flight_count: usize,
    pub processed_count: usize,
    pub current_file: Option<String>,
    pub recent_files: Vec<RecentFile>,
}

#[derive(Debug, Default)]
struct FileQueueState {
    unprocessed_count: usize,
    in_flight_count: usize,
    processed_count: usize,
    current_file: Option<String>,
    recent_files: VecDeque<RecentFile>,
}

/// Concurrency-safe registry of processor metrics, line traces, recent
/// errors and file-queue statistics.
pub struct MetricsStore {
    processors: Mutex<HashMap<String, ProcessorMetrics>>,
    traces: Mutex<VecDeque<LineTrace>>,
    errors: Mutex<VecDeque<ErrorRecord>>,
    files: Mutex<FileQueueState>,
    tracing_enabled: AtomicBool,
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

// A worker panicking while holding a lock must not wedge the dashboard;
// counters are plain integers, so the poisoned value is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MetricsStore {
    pub fn new() -> Self {
        Self {
            processors: Mutex::new(HashMap::new()),
            traces: Mutex::new(VecDeque::new()),
            errors: Mutex::new(VecDeque::new()),
            files: Mutex::new(FileQueueState::default()),
            tracing_enabled: AtomicBool::new(false),
        }
    }

    pub fn set_tracing_enabled(&self, enabled: bool) {
        self.tracing_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn tracing_enabled(&self) -> bool {
        self.tracing_enabled.load(Ordering::Relaxed)
    }

    /// Create the metrics slot for a processor. Re-registering an id keeps
    /// the existing counters.
    pub fn register_processor(&self, processor_id: &str, processor_type: &str) {
        lock(&self.processors)
            .entry(processor_id.to_string())
            .or_insert_with(|| ProcessorMetrics::new(processor_type));
    }

    pub fn record_lines_in(&self, processor_id: &str) {
        let mut processors = lock(&self.processors);
        if let Some(metrics) = processors.get_mut(processor_id) {
            metrics.lines_in += 1;
            metrics.last_processed_at = Some(now_secs());
        }
    }

    pub fn record_lines_out(&self, processor_id: &str) {
        let mut processors = lock(&self.processors);
        if let Some(metrics) = processors.get_mut(processor_id) {
            metrics.lines_out += 1;
            metrics.last_processed_at = Some(now_secs());
        }
    }

    pub fn add_processing_time(&self, processor_id: &str, elapsed: Duration) {
        let mut processors = lock(&self.processors);
        if let Some(metrics) = processors.get_mut(processor_id) {
            metrics.total_processing_time += elapsed.as_secs_f64();
        }
    }

    /// Record an error both on the processor's counter and in the bounded
    /// error log.
    pub fn record_error(&self, processor_id: &str, message: &str) {
        {
            let mut processors = lock(&self.processors);
            if let Some(metrics) = processors.get_mut(processor_id) {
                metrics.error_count += 1;
            }
        }

        let mut errors = lock(&self.errors);
        if errors.len() == MAX_ERRORS {
            errors.pop_front();
        }
        errors.push_back(ErrorRecord {
            timestamp: now_secs(),
            processor_id: processor_id.to_string(),
            message: message.to_string(),
        });
    }

    /// Append a step to the trace for `line_id`, opening a new trace entry
    /// if the line has not been seen yet. No-op while tracing is disabled.
    pub fn add_trace(&self, line_id: Uuid, processor_id: &str, status: TraceStatus, text: &str) {
        if !self.tracing_enabled() {
            return;
        }

        let mut traces = lock(&self.traces);
        let step = TraceStep {
            processor_id: processor_id.to_string(),
            status,
            timestamp: now_secs(),
        };

        if let Some(trace) = traces.iter_mut().find(|t| t.line_id == line_id) {
            trace.path.push(step);
            return;
        }

        if traces.len() == MAX_TRACES {
            traces.pop_front();
        }
        traces.push_back(LineTrace {
            line_id,
            original_line: text.to_string(),
            start_time: now_secs(),
            path: vec![step],
        });
    }

    pub fn processor_metrics(&self) -> HashMap<String, ProcessorMetrics> {
        lock(&self.processors).clone()
    }

    /// Up to `limit` traces, most recent first.
    pub fn traces(&self, limit: usize) -> Vec<LineTrace> {
        lock(&self.traces).iter().rev().take(limit).cloned().collect()
    }

    /// Up to `limit` error records, most recent first.
    pub fn errors(&self, limit: usize) -> Vec<ErrorRecord> {
        lock(&self.errors).iter().rev().take(limit).cloned().collect()
    }

    pub fn update_file_counts(&self, unprocessed: usize, in_flight: usize, processed: usize) {
        let mut files = lock(&self.files);
        files.unprocessed_count = unprocessed;
        files.in_flight_count = in_flight;
        files.processed_count = processed;
    }

    pub fn set_current_file(&self, filename: Option<&str>) {
        lock(&self.files).current_file = filename.map(str::to_string);
    }

    pub fn add_recent_file(&self, filename: &str) {
        let mut files = lock(&self.files);
        if files.recent_files.len() == MAX_RECENT_FILES {
            files.recent_files.pop_front();
        }
        files.recent_files.push_back(RecentFile {
            filename: filename.to_string(),
            timestamp: now_secs(),
        });
    }

    pub fn file_stats(&self) -> FileQueueStats {
        let files = lock(&self.files);
        FileQueueStats {
            unprocessed_count: files.unprocessed_count,
            in_flight_count: files.in_flight_count,
            processed_count: files.processed_count,
            current_file: files.current_file.clone(),
            recent_files: files.recent_files.iter().cloned().collect(),
        }
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_count() {
        let store = MetricsStore::new();
        store.register_processor("upper_1", "uppercase");

        store.record_lines_in("upper_1");
        store.record_lines_in("upper_1");
        store.record_lines_out("upper_1");
        store.add_processing_time("upper_1", Duration::from_millis(250));

        let metrics = store.processor_metrics();
        let m = &metrics["upper_1"];
        assert_eq!(m.processor_type, "uppercase");
        assert_eq!(m.lines_in, 2);
        assert_eq!(m.lines_out, 1);
        assert!(m.total_processing_time >= 0.25);
        assert!(m.last_processed_at.is_some());
    }

    #[test]
    fn reregistering_keeps_counters() {
        let store = MetricsStore::new();
        store.register_processor("p", "filter");
        store.record_lines_in("p");
        store.register_processor("p", "filter");

        assert_eq!(store.processor_metrics()["p"].lines_in, 1);
    }

    #[test]
    fn counters_ignore_unknown_processors() {
        let store = MetricsStore::new();
        store.record_lines_in("ghost");
        assert!(store.processor_metrics().is_empty());
    }

    #[test]
    fn traces_are_gated_by_the_flag() {
        let store = MetricsStore::new();
        let id = Uuid::new_v4();

        store.add_trace(id, "p", TraceStatus::Start, "hello");
        assert!(store.traces(10).is_empty());

        store.set_tracing_enabled(true);
        store.add_trace(id, "p", TraceStatus::Start, "hello");
        store.add_trace(id, "p", TraceStatus::Emit, "HELLO");

        let traces = store.traces(10);
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].original_line, "hello");
        assert_eq!(traces[0].path.len(), 2);
        assert_eq!(traces[0].path[1].status, TraceStatus::Emit);
    }

    #[test]
    fn traces_evict_oldest_beyond_the_bound() {
        let store = MetricsStore::new();
        store.set_tracing_enabled(true);

        let first = Uuid::new_v4();
        store.add_trace(first, "p", TraceStatus::Start, "first");
        for i in 0..MAX_TRACES {
            store.add_trace(Uuid::new_v4(), "p", TraceStatus::Start, &format!("line {i}"));
        }

        let traces = store.traces(MAX_TRACES + 10);
        assert_eq!(traces.len(), MAX_TRACES);
        assert!(traces.iter().all(|t| t.line_id != first));
        // most recent first
        assert_eq!(traces[0].original_line, format!("line {}", MAX_TRACES - 1));
    }

    #[test]
    fn errors_are_bounded() {
        let store = MetricsStore::new();
        store.register_processor("p", "filter");
        for i in 0..(MAX_ERRORS + 5) {
            store.record_error("p", &format!("boom {i}"));
        }

        let errors = store.errors(MAX_ERRORS * 2);
        assert_eq!(errors.len(), MAX_ERRORS);
        assert_eq!(errors[0].message, format!("boom {}", MAX_ERRORS + 4));
        assert_eq!(store.processor_metrics()["p"].error_count, (MAX_ERRORS + 5) as u64);
    }

    #[test]
    fn file_stats_round_trip() {
        let store = MetricsStore::new();
        store.update_file_counts(3, 1, 7);
        store.set_current_file(Some("input.txt"));
        for i in 0..(MAX_RECENT_FILES + 2) {
            store.add_recent_file(&format!("file_{i}.txt"));
        }
        store.set_current_file(None);

        let stats = store.file_stats();
        assert_eq!(stats.unprocessed_count, 3);
        assert_eq!(stats.in_flight_count, 1);
        assert_eq!(stats.processed_count, 7);
        assert_eq!(stats.current_file, None);
        assert_eq!(stats.recent_files.len(), MAX_RECENT_FILES);
        assert_eq!(stats.recent_files[0].filename, "file_2.txt");
    }
}
