// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use lineflow::config::{self, Config, ProcessorDescriptor};
use lineflow::dashboard::Dashboard;
use lineflow::metrics::MetricsStore;
use lineflow::monitor::FolderMonitor;

#[derive(Debug, Parser)]
#[command(name = "lineflow", about = "Tag-routed stream processing over a folder queue")]
struct Cli {
    /// Watch this directory as a folder queue
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Process a single file and exit
    #[arg(long, conflicts_with = "base_dir")]
    file: Option<PathBuf>,

    /// Where single-file results go (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory for per-file processed output in watch mode
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Seconds between queue polls
    #[arg(long, default_value_t = 1.0)]
    poll_interval: f64,

    /// Pipeline document (.json, .yaml or .yml); a built-in sample
    /// pipeline is used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serve the observability dashboard
    #[arg(long)]
    dashboard: bool,

    #[arg(long, default_value = "127.0.0.1")]
    dashboard_host: String,

    #[arg(long, default_value_t = 8000)]
    dashboard_port: u16,

    /// Record per-line traces
    #[arg(long)]
    trace: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => {
            let cfg = config::load_config(path)?;
            tracing::info!(path = %path.display(), "configuration loaded");
            cfg
        }
        None => sample_config(),
    };

    let metrics = Arc::new(MetricsStore::new());
    metrics.set_tracing_enabled(cli.trace || cfg.tracing_enabled);

    // fail fast on bad processor definitions before any file is claimed;
    // the throwaway store keeps validation ids out of /stats
    config::build_engine(&cfg, &Arc::new(MetricsStore::new()))?;

    let cfg = Arc::new(cfg);

    if let Some(file) = &cli.file {
        return process_single_file(&cfg, &metrics, file, cli.output.as_deref()).await;
    }

    let Some(base_dir) = cli.base_dir.clone() else {
        anyhow::bail!("nothing to do: pass --base-dir to watch a queue or --file for one file");
    };

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received");
        signal_token.cancel();
    });

    // the dashboard outlives the monitor so operators can watch the drain
    let http_shutdown = CancellationToken::new();
    let dashboard_task = if cli.dashboard {
        let dashboard = Dashboard::new(
            cli.dashboard_host.clone(),
            cli.dashboard_port,
            Arc::clone(&metrics),
        );
        let token = http_shutdown.clone();
        Some(tokio::spawn(async move { dashboard.serve(token).await }))
    } else {
        None
    };

    let mut monitor = FolderMonitor::new(base_dir, Arc::clone(&cfg), Arc::clone(&metrics))
        .with_poll_interval(Duration::from_secs_f64(cli.poll_interval.max(0.05)));
    if let Some(output_dir) = cli.output_dir.clone() {
        monitor = monitor.with_output_dir(output_dir);
    }
    monitor.run(shutdown).await?;

    http_shutdown.cancel();
    if let Some(task) = dashboard_task {
        task.await.context("joining dashboard task")??;
    }

    Ok(())
}

async fn process_single_file(
    cfg: &Arc<Config>,
    metrics: &Arc<MetricsStore>,
    input: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut engine = config::build_engine(cfg, metrics)?;

    let content = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let lines: Vec<String> = content.lines().map(str::to_string).collect();
    let count = lines.len();

    let outputs = engine.run(lines).await?;
    tracing::info!(file = %input.display(), lines_in = count, lines_out = outputs.len(), "file processed");

    match output {
        Some(path) => {
            let body: String = outputs.iter().map(|line| format!("{line}\n")).collect();
            tokio::fs::write(path, body)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "results written");
        }
        None => {
            for line in &outputs {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// The sample pipeline used when no config document is given: number
/// every line, shout it, keep the important ones, split on pipes.
fn sample_config() -> Config {
    let mut counter = ProcessorDescriptor::bare("line_counter");
    counter.id = Some("counter".to_string());

    let mut upper = ProcessorDescriptor::bare("uppercase");
    upper.id = Some("uppercase".to_string());

    let mut filter = ProcessorDescriptor::bare("filter");
    filter.id = Some("important_filter".to_string());
    filter.options.insert(
        "predicate".to_string(),
        serde_yaml::Value::String("is_important".to_string()),
    );

    let mut splitter = ProcessorDescriptor::bare("line_splitter");
    splitter.id = Some("splitter".to_string());
    splitter.options.insert(
        "delimiter".to_string(),
        serde_yaml::Value::String("|".to_string()),
    );

    Config {
        processors: vec![counter, upper, filter, splitter],
        nodes: Vec::new(),
        tracing_enabled: false,
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("installing SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
