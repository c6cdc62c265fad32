// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Folder-based work queue.
//!
//! Files dropped into `unprocessed/` are claimed by atomic rename into
//! `underprocess/`, streamed through a fresh engine, and land in
//! `processed/` or `failed/`. Anything left in `underprocess/` at startup
//! was interrupted by a crash and is renamed back to `unprocessed/`, which
//! gives at-least-once delivery: consumers must tolerate a re-run.
//!
//! All four directories must live on one filesystem so the renames are
//! atomic.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::config::{build_engine, Config};
use crate::metrics::MetricsStore;

/// The queue directories under a base dir.
#[derive(Debug, Clone)]
pub struct QueueDirs {
    pub base: PathBuf,
    pub unprocessed: PathBuf,
    pub underprocess: PathBuf,
    pub processed: PathBuf,
    pub failed: PathBuf,
}

impl QueueDirs {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            unprocessed: base.join("unprocessed"),
            underprocess: base.join("underprocess"),
            processed: base.join("processed"),
            failed: base.join("failed"),
            base,
        }
    }

    pub fn ensure(&self) -> std::io::Result<()> {
        for dir in [
            &self.unprocessed,
            &self.underprocess,
            &self.processed,
            &self.failed,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Everything a worker task needs; cloned into each spawned task.
#[derive(Clone)]
struct WorkerContext {
    dirs: QueueDirs,
    output_dir: Option<PathBuf>,
    config: Arc<Config>,
    metrics: Arc<MetricsStore>,
}

pub struct FolderMonitor {
    dirs: QueueDirs,
    output_dir: Option<PathBuf>,
    poll_interval: Duration,
    config: Arc<Config>,
    metrics: Arc<MetricsStore>,
}

impl FolderMonitor {
    pub fn new(base_dir: impl Into<PathBuf>, config: Arc<Config>, metrics: Arc<MetricsStore>) -> Self {
        Self {
            dirs: QueueDirs::new(base_dir),
            output_dir: None,
            poll_interval: Duration::from_secs(1),
            config,
            metrics,
        }
    }

    /// Also write each file's terminal output to `output_dir` as
    /// `<stem>_processed.<ext>`.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn dirs(&self) -> &QueueDirs {
        &self.dirs
    }

    /// Poll until `shutdown` fires, then drain in-flight workers.
    pub async fn run(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        self.dirs.ensure().context("creating queue directories")?;
        if let Some(output_dir) = &self.output_dir {
            std::fs::create_dir_all(output_dir).context("creating output directory")?;
        }

        let recovered = self.recover();
        if recovered > 0 {
            tracing::info!(count = recovered, "recovered interrupted files");
        }

        let mut workers: JoinSet<()> = JoinSet::new();
        tracing::info!(dir = %self.dirs.unprocessed.display(), "watching for files");

        loop {
            self.refresh_counts();
            self.claim_pending(&mut workers);
            while workers.try_join_next().is_some() {}

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(self.poll_interval) => {}
            }
        }

        // no new claims past this point; let in-flight files finish
        while workers.join_next().await.is_some() {}
        self.refresh_counts();
        tracing::info!("folder monitor stopped");
        Ok(())
    }

    /// Move anything still in `underprocess/` back into `unprocessed/`.
    /// Failures are logged and skipped; the next poll will see whatever
    /// recovery managed to re-home.
    pub fn recover(&self) -> usize {
        let mut recovered = 0;
        for name in list_files(&self.dirs.underprocess) {
            let from = self.dirs.underprocess.join(&name);
            let to = self.dirs.unprocessed.join(&name);
            match std::fs::rename(&from, &to) {
                Ok(()) => {
                    tracing::info!(file = %name, "recovered interrupted file");
                    recovered += 1;
                }
                Err(err) => {
                    tracing::warn!(file = %name, error = %err, "could not recover file");
                }
            }
        }
        recovered
    }

    fn claim_pending(&self, workers: &mut JoinSet<()>) {
        let mut names = list_files(&self.dirs.unprocessed);
        names.sort();

        for name in names {
            let from = self.dirs.unprocessed.join(&name);
            let to = self.dirs.underprocess.join(&name);
            // a failed claim usually means the file vanished or another
            // instance won the rename; either way it is not ours
            if let Err(err) = std::fs::rename(&from, &to) {
                tracing::debug!(file = %name, error = %err, "claim failed, skipping");
                continue;
            }

            let ctx = WorkerContext {
                dirs: self.dirs.clone(),
                output_dir: self.output_dir.clone(),
                config: Arc::clone(&self.config),
                metrics: Arc::clone(&self.metrics),
            };
            workers.spawn(async move {
                process_claimed(ctx, name).await;
            });
        }
    }

    fn refresh_counts(&self) {
        self.metrics.update_file_counts(
            list_files(&self.dirs.unprocessed).len(),
            list_files(&self.dirs.underprocess).len(),
            list_files(&self.dirs.processed).len(),
        );
    }
}

/// Run one claimed file through a fresh engine and file it under
/// `processed/` or `failed/`.
async fn process_claimed(ctx: WorkerContext, file_name: String) {
    ctx.metrics.set_current_file(Some(&file_name));
    refresh_counts(&ctx);
    tracing::info!(file = %file_name, "processing file");

    let claimed = ctx.dirs.underprocess.join(&file_name);
    match run_file(&ctx, &claimed, &file_name).await {
        Ok(emitted) => {
            let done = ctx.dirs.processed.join(&file_name);
            match std::fs::rename(&claimed, &done) {
                Ok(()) => {
                    ctx.metrics.add_recent_file(&file_name);
                    tracing::info!(file = %file_name, lines = emitted, "file processed");
                }
                Err(err) => {
                    tracing::error!(file = %file_name, error = %err, "could not archive file");
                }
            }
        }
        Err(err) => {
            ctx.metrics
                .record_error("engine", &format!("{file_name}: {err}"));
            let dead = ctx.dirs.failed.join(&file_name);
            if let Err(rename_err) = std::fs::rename(&claimed, &dead) {
                tracing::error!(file = %file_name, error = %rename_err, "could not move file to failed");
            }
            tracing::warn!(file = %file_name, error = %err, "file failed");
        }
    }

    ctx.metrics.set_current_file(None);
    refresh_counts(&ctx);
}

async fn run_file(ctx: &WorkerContext, path: &Path, file_name: &str) -> anyhow::Result<usize> {
    let mut engine = build_engine(&ctx.config, &ctx.metrics)?;

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {file_name}"))?;
    let lines: Vec<String> = content.lines().map(str::to_string).collect();

    let outputs = engine.run(lines).await?;

    if let Some(output_dir) = &ctx.output_dir {
        let out_path = output_dir.join(output_name(file_name));
        let body: String = outputs.iter().map(|line| format!("{line}\n")).collect();
        tokio::fs::write(&out_path, body)
            .await
            .with_context(|| format!("writing {}", out_path.display()))?;
    }

    Ok(outputs.len())
}

fn refresh_counts(ctx: &WorkerContext) {
    ctx.metrics.update_file_counts(
        list_files(&ctx.dirs.unprocessed).len(),
        list_files(&ctx.dirs.underprocess).len(),
        list_files(&ctx.dirs.processed).len(),
    );
}

/// `input.log` becomes `input_processed.log`.
fn output_name(file_name: &str) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_processed.{ext}"),
        None => format!("{stem}_processed"),
    }
}

/// Names of the regular files directly under `dir`; empty when the
/// directory is missing or unreadable.
fn list_files(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect()
}
