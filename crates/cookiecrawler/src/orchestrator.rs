// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Wave-by-wave crawl driver.
//!
//! URLs are taken off the queue in waves whose size is decided by the
//! [`ChunkScheduler`] from the load observed during the previous wave. All
//! visits of a wave run concurrently, each on its own task and in its own
//! browser context. The next wave starts only once every visit of the
//! current one has settled. Observations are merged on the control task
//! after the wave barrier, so the [`ResultStore`] never sees concurrent
//! writers.

use futures::future::join_all;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::CrawlConfig;
use crate::error::{CrawlError, CrawlResult, SessionError};
use crate::expiry::ExpiryCalculator;
use crate::progress::{self, ProgressEventKind, ProgressSender};
use crate::report::{CrawlReport, CrawlSummary, FailedPage};
use crate::sampler::LoadSampler;
use crate::scheduler::ChunkScheduler;
use crate::store::ResultStore;
use crate::traits::{MetadataStore, NoMetadata, PageSession, ReportSink, SitemapSource};
use crate::types::PageVisit;

/// Outcome of one visit, in wave order.
struct VisitResult {
    url: String,
    result: Result<PageVisit, SessionError>,
    elapsed_ms: u64,
}

/// Mutable state of one crawl run.
struct CrawlState {
    run_id: String,
    seq: u64,
    store: ResultStore,
    sampler: LoadSampler,
    chunk_size: usize,
    summary: CrawlSummary,
}

/// Drives a crawl from sitemap to report.
pub struct CrawlOrchestrator {
    config: CrawlConfig,
    scheduler: ChunkScheduler,
    session: Arc<dyn PageSession>,
    metadata: Arc<dyn MetadataStore>,
    progress: Option<ProgressSender>,
}

impl CrawlOrchestrator {
    pub fn new(config: CrawlConfig, session: Arc<dyn PageSession>) -> Self {
        Self {
            scheduler: ChunkScheduler::new(config.scheduler.clone()),
            config,
            session,
            metadata: Arc::new(NoMetadata),
            progress: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataStore>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Fetch the sitemap, crawl every URL and hand the report to `sink`.
    ///
    /// Sitemap failures abort before any page is visited.
    pub async fn run(
        &self,
        sitemap: &dyn SitemapSource,
        sitemap_url: &str,
        sink: &dyn ReportSink,
    ) -> CrawlResult<CrawlReport> {
        let urls = load_sitemap(sitemap, sitemap_url).await?;
        let report = self.crawl(sitemap_url, urls).await?;
        sink.write(&report)?;
        Ok(report)
    }

    /// Crawl a list of URLs and build the report for `target`.
    pub async fn crawl(&self, target: &str, urls: Vec<String>) -> CrawlResult<CrawlReport> {
        let started = Instant::now();
        let mut state = CrawlState {
            run_id: uuid::Uuid::new_v4().to_string(),
            seq: 0,
            store: ResultStore::new(ExpiryCalculator::new(
                self.config.languages.iter().copied(),
            )),
            sampler: LoadSampler::new(self.config.sampler_capacity),
            chunk_size: self.scheduler.initial_chunk_size(),
            summary: CrawlSummary {
                urls_total: urls.len(),
                ..CrawlSummary::default()
            },
        };
        self.emit(
            &mut state,
            ProgressEventKind::SitemapLoaded {
                url_count: urls.len(),
            },
        );

        let mut failures = self.run_pass(&mut state, urls).await?;

        if self.config.retry_failed && !failures.is_empty() {
            let retry: Vec<String> = failures.drain(..).map(|f| f.url).collect();
            info!(urls = retry.len(), "retrying failed pages");
            state.summary.retried = retry.len();
            self.emit(
                &mut state,
                ProgressEventKind::RetryScheduled {
                    url_count: retry.len(),
                },
            );
            failures = self.run_pass(&mut state, retry).await?;
        }

        state.summary.failures = failures;
        state.summary.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            waves = state.summary.waves,
            succeeded = state.summary.pages_succeeded,
            failed = state.summary.failures.len(),
            findings = state.store.len(),
            elapsed_ms = state.summary.elapsed_ms,
            "crawl complete"
        );
        let complete = ProgressEventKind::CrawlComplete {
            pages_succeeded: state.summary.pages_succeeded,
            pages_failed: state.summary.failures.len(),
            findings: state.store.len(),
            elapsed_ms: state.summary.elapsed_ms,
        };
        self.emit(&mut state, complete);

        Ok(CrawlReport::new(
            state.run_id,
            target,
            state.store.snapshot(),
            state.summary,
        ))
    }

    /// Work through `urls` wave by wave. Returns the URLs that failed.
    async fn run_pass(
        &self,
        state: &mut CrawlState,
        urls: Vec<String>,
    ) -> CrawlResult<Vec<FailedPage>> {
        let mut queue: VecDeque<String> = urls.into();
        let mut failures = Vec::new();

        while !queue.is_empty() {
            let average_load = state.sampler.average();
            state.chunk_size = self.scheduler.decide(state.chunk_size, &mut state.sampler);

            let take = state.chunk_size.min(queue.len());
            let wave: Vec<String> = queue.drain(..take).collect();
            state.summary.waves += 1;
            state.summary.chunk_sizes.push(wave.len());
            state.summary.pages_attempted += wave.len();
            let wave_no = state.summary.waves;
            let wave_started = Instant::now();

            info!(
                wave = wave_no,
                size = wave.len(),
                chunk_size = state.chunk_size,
                average_load = ?average_load,
                remaining = queue.len(),
                "dispatching wave"
            );
            self.emit(
                state,
                ProgressEventKind::WaveStarted {
                    wave: wave_no,
                    size: wave.len(),
                    average_load,
                    remaining: queue.len(),
                },
            );

            let results = self.dispatch_wave(wave).await;

            let (mut succeeded, mut failed) = (0, 0);
            for VisitResult {
                url,
                result,
                elapsed_ms,
            } in results
            {
                match result {
                    Ok(visit) => {
                        succeeded += 1;
                        let observations = visit.observations.len();
                        state.sampler.extend(visit.load_samples);
                        for observation in visit.observations {
                            state.store.merge(observation, self.metadata.as_ref())?;
                        }
                        debug!(url = %url, observations, elapsed_ms, "page visited");
                        self.emit(
                            state,
                            ProgressEventKind::PageVisited {
                                url,
                                observations,
                                elapsed_ms,
                            },
                        );
                    }
                    Err(e) => {
                        failed += 1;
                        warn!(url = %url, error = %e, "page visit failed");
                        self.emit(
                            state,
                            ProgressEventKind::PageFailed {
                                url: url.clone(),
                                error: e.to_string(),
                            },
                        );
                        failures.push(FailedPage {
                            url,
                            error: e.to_string(),
                        });
                    }
                }
            }
            state.summary.pages_succeeded += succeeded;

            let elapsed_ms = wave_started.elapsed().as_millis() as u64;
            info!(
                wave = wave_no,
                succeeded,
                failed,
                findings = state.store.len(),
                elapsed_ms,
                "wave finished"
            );
            let completed = ProgressEventKind::WaveCompleted {
                wave: wave_no,
                succeeded,
                failed,
                findings_total: state.store.len(),
                elapsed_ms,
            };
            self.emit(state, completed);
        }

        Ok(failures)
    }

    /// Run every visit of a wave on its own task and wait for all of them.
    ///
    /// A visit that panics or overruns `session_timeout` becomes a failed
    /// result; its siblings are left alone.
    async fn dispatch_wave(&self, wave: Vec<String>) -> Vec<VisitResult> {
        let timeout = self.config.session_timeout();
        let timeout_ms = self.config.session_timeout_ms;

        let handles: Vec<_> = wave
            .iter()
            .map(|url| {
                let session = Arc::clone(&self.session);
                let consent = self.config.consent_selector.clone();
                let url = url.clone();
                tokio::spawn(async move {
                    let started = Instant::now();
                    let result =
                        match tokio::time::timeout(timeout, session.visit(&url, consent.as_deref()))
                            .await
                        {
                            Ok(result) => result,
                            Err(_) => Err(SessionError::Timeout {
                                url: url.clone(),
                                timeout_ms,
                            }),
                        };
                    (result, started.elapsed().as_millis() as u64)
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(wave)
            .map(|(joined, url)| match joined {
                Ok((result, elapsed_ms)) => VisitResult {
                    url,
                    result,
                    elapsed_ms,
                },
                Err(e) => VisitResult {
                    result: Err(SessionError::Browser(format!("visit task aborted: {e}"))),
                    url,
                    elapsed_ms: 0,
                },
            })
            .collect()
    }

    fn emit(&self, state: &mut CrawlState, event: ProgressEventKind) {
        progress::emit(&self.progress, &state.run_id, &mut state.seq, event);
    }
}

/// Fetch the page URLs of `sitemap_url`. An empty sitemap is an error.
pub async fn load_sitemap(
    sitemap: &dyn SitemapSource,
    sitemap_url: &str,
) -> CrawlResult<Vec<String>> {
    let urls = sitemap.fetch_urls(sitemap_url).await?;
    if urls.is_empty() {
        return Err(CrawlError::EmptySitemap(sitemap_url.to_string()));
    }
    info!(sitemap = sitemap_url, urls = urls.len(), "sitemap loaded");
    Ok(urls)
}
