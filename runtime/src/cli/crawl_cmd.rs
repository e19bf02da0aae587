// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! `cookiecrawler crawl <sitemap-url>`

use anyhow::{Context, Result};
use cookiecrawler::progress::{self, ProgressEventKind, ProgressReceiver};
use cookiecrawler::{
    load_sitemap, CrawlOrchestrator, CrawlReport, MetadataStore, NoMetadata, ReportSink,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::acquisition::sitemap::HttpSitemapSource;
use crate::cli::output::{create_progress_bar, format_elapsed};
use crate::config::{self, CrawlOverrides};
use crate::metadata::JsonMetadataStore;
use crate::renderer::chromium::ChromiumSession;
use crate::renderer::BrowserSettings;
use crate::report_file::JsonReportSink;

/// Sitemap requests are plain HTTP and get a shorter budget than pages.
const SITEMAP_TIMEOUT_MS: u64 = 30_000;

pub async fn run(sitemap_url: &str, overrides: CrawlOverrides, quiet: bool) -> Result<()> {
    let settings = config::resolve(&overrides)?;
    tracing::debug!(?settings, "configuration resolved");

    let metadata: Arc<dyn MetadataStore> = match &settings.metadata_path {
        Some(path) => Arc::new(JsonMetadataStore::load(path)?),
        None => {
            tracing::warn!("no metadata file found, findings will carry no translations");
            Arc::new(NoMetadata)
        }
    };

    // A broken sitemap fails before Chromium is started.
    let sitemap = HttpSitemapSource::new(SITEMAP_TIMEOUT_MS);
    let urls = load_sitemap(&sitemap, sitemap_url)
        .await
        .with_context(|| format!("crawl of {sitemap_url} failed"))?;

    let session = ChromiumSession::launch(BrowserSettings::from_config(&settings.crawl)).await?;
    let (tx, rx) = progress::channel();
    let orchestrator = CrawlOrchestrator::new(settings.crawl.clone(), Arc::new(session))
        .with_metadata(metadata)
        .with_progress(tx);

    let bar_task = if quiet {
        drop(rx);
        None
    } else {
        Some(tokio::spawn(drive_progress_bar(rx)))
    };

    let sink = JsonReportSink::new(&settings.results_dir);
    let result = orchestrator.crawl(sitemap_url, urls).await;

    // Dropping the orchestrator closes the progress channel.
    drop(orchestrator);
    if let Some(task) = bar_task {
        let _ = task.await;
    }

    let report = result.with_context(|| format!("crawl of {sitemap_url} failed"))?;
    sink.write(&report)?;
    if !quiet {
        print_summary(&report, &sink.path_for(sitemap_url));
    }
    Ok(())
}

async fn drive_progress_bar(mut rx: ProgressReceiver) {
    let pb = create_progress_bar();
    loop {
        match rx.recv().await {
            Ok(event) => match event.event {
                ProgressEventKind::SitemapLoaded { url_count } => pb.set_length(url_count as u64),
                ProgressEventKind::WaveStarted { wave, size, .. } => {
                    pb.set_message(format!("wave {wave} ({size} pages)"));
                }
                ProgressEventKind::PageVisited { .. } | ProgressEventKind::PageFailed { .. } => {
                    pb.inc(1);
                }
                ProgressEventKind::RetryScheduled { url_count } => {
                    pb.inc_length(url_count as u64);
                    pb.set_message(format!("retrying {url_count} pages"));
                }
                ProgressEventKind::WaveCompleted { .. } => {}
                ProgressEventKind::CrawlComplete { .. } => break,
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "progress bar lagged behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
    pb.finish_and_clear();
}

fn print_summary(report: &CrawlReport, path: &Path) {
    let summary = &report.summary;
    println!();
    println!("  Crawled {}", report.target);
    println!(
        "  Pages:    {} ok, {} failed ({} URLs, {} visits, {} waves)",
        summary.pages_succeeded,
        summary.failures.len(),
        summary.urls_total,
        summary.pages_attempted,
        summary.waves
    );
    println!(
        "  Findings: {} cookies, {} localStorage items",
        report.cookie_count(),
        report.local_storage_count()
    );
    println!("  Elapsed:  {}", format_elapsed(summary.elapsed_ms));
    println!("  Report:   {}", path.display());
    for failure in &summary.failures {
        println!("  [!!] {}: {}", failure.url, failure.error);
    }
}
