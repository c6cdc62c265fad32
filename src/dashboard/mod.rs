// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Read-only observability surface.
//!
//! Serves the metrics store as JSON plus a static HTML dashboard that
//! polls the JSON endpoints. Every endpoint is side-effect free; CORS is
//! wide open because this is an operator surface bound to loopback by
//! default.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::metrics::{ErrorRecord, FileQueueStats, LineTrace, MetricsStore, ProcessorMetrics};

const DEFAULT_LIMIT: usize = 100;

pub struct Dashboard {
    host: String,
    port: u16,
    metrics: Arc<MetricsStore>,
}

impl Dashboard {
    pub fn new(host: impl Into<String>, port: u16, metrics: Arc<MetricsStore>) -> Self {
        Self {
            host: host.into(),
            port,
            metrics,
        }
    }

    /// Serve until `shutdown` fires.
    pub async fn serve(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding dashboard to {addr}"))?;
        tracing::info!(addr = %addr, "dashboard listening");

        axum::serve(listener, router(self.metrics))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .context("dashboard server")?;
        Ok(())
    }
}

pub fn router(metrics: Arc<MetricsStore>) -> Router {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/trace", get(get_traces))
        .route("/errors", get(get_errors))
        .route("/files", get(get_files))
        .route("/", get(get_index))
        .layer(CorsLayer::permissive())
        .with_state(metrics)
}

/// Body of `GET /stats`.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub processors: HashMap<String, ProcessorMetrics>,
    pub timestamp: f64,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

async fn get_stats(State(metrics): State<Arc<MetricsStore>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        processors: metrics.processor_metrics(),
        timestamp: now_secs(),
    })
}

async fn get_traces(
    State(metrics): State<Arc<MetricsStore>>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<LineTrace>> {
    Json(metrics.traces(query.limit.unwrap_or(DEFAULT_LIMIT)))
}

async fn get_errors(
    State(metrics): State<Arc<MetricsStore>>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<ErrorRecord>> {
    Json(metrics.errors(query.limit.unwrap_or(DEFAULT_LIMIT)))
}

async fn get_files(State(metrics): State<Arc<MetricsStore>>) -> Json<FileQueueStats> {
    Json(metrics.file_stats())
}

async fn get_index() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::TraceStatus;
    use uuid::Uuid;

    fn store_with_data() -> Arc<MetricsStore> {
        let store = Arc::new(MetricsStore::new());
        store.set_tracing_enabled(true);
        store.register_processor("upper_1", "uppercase");
        store.record_lines_in("upper_1");
        store.record_lines_out("upper_1");
        store.record_error("upper_1", "kaboom");
        store.add_trace(Uuid::new_v4(), "upper_1", TraceStatus::Start, "hello");
        store.update_file_counts(2, 1, 3);
        store.add_recent_file("done.txt");
        store
    }

    #[tokio::test]
    async fn stats_returns_registered_processors() {
        let store = store_with_data();
        let Json(body) = get_stats(State(store)).await;

        assert!(body.timestamp > 0.0);
        assert_eq!(body.processors["upper_1"].lines_in, 1);
        assert_eq!(body.processors["upper_1"].processor_type, "uppercase");
    }

    #[tokio::test]
    async fn stats_serializes_with_spec_field_names() {
        let store = store_with_data();
        let Json(body) = get_stats(State(store)).await;

        let json = serde_json::to_value(&body).unwrap();
        let entry = &json["processors"]["upper_1"];
        assert!(entry.get("type").is_some());
        assert!(entry.get("lines_in").is_some());
        assert!(entry.get("total_processing_time").is_some());
        assert!(entry.get("last_processed_at").is_some());
    }

    #[tokio::test]
    async fn trace_respects_the_limit() {
        let store = Arc::new(MetricsStore::new());
        store.set_tracing_enabled(true);
        for i in 0..5 {
            store.add_trace(Uuid::new_v4(), "p", TraceStatus::Start, &format!("l{i}"));
        }

        let Json(traces) = get_traces(State(store), Query(LimitQuery { limit: Some(2) })).await;
        assert_eq!(traces.len(), 2);
        // most recent first
        assert_eq!(traces[0].original_line, "l4");
    }

    #[tokio::test]
    async fn errors_default_limit_applies() {
        let store = store_with_data();
        let Json(errors) = get_errors(State(store), Query(LimitQuery { limit: None })).await;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "kaboom");
    }

    #[tokio::test]
    async fn files_reflects_the_queue() {
        let store = store_with_data();
        let Json(files) = get_files(State(store)).await;

        assert_eq!(files.unprocessed_count, 2);
        assert_eq!(files.in_flight_count, 1);
        assert_eq!(files.processed_count, 3);
        assert_eq!(files.recent_files[0].filename, "done.txt");
    }

    #[tokio::test]
    async fn index_is_html() {
        let Html(page) = get_index().await;
        assert!(page.contains("<!DOCTYPE html>"));
        assert!(page.contains("/stats"));
    }
}
