// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cookiecrawler: adaptive crawl scheduling and cookie/localStorage
//! aggregation.
//!
//! The engine visits every page of a sitemap in load-sized waves, each page
//! in a fresh browser context, and folds what the pages stored into one
//! deduplicated report. Browser driving, sitemap fetching, metadata lookup
//! and report persistence are supplied through the traits in [`traits`].

pub mod config;
pub mod error;
pub mod expiry;
pub mod key;
pub mod orchestrator;
pub mod progress;
pub mod report;
pub mod sampler;
pub mod scheduler;
pub mod store;
pub mod traits;
pub mod types;

pub use config::{CrawlConfig, SchedulerConfig};
pub use error::{CrawlError, CrawlResult, SessionError};
pub use expiry::{remaining_lifetime, render_human, ExpiryCalculator};
pub use key::{compute_key, ResultKey};
pub use orchestrator::{load_sitemap, CrawlOrchestrator};
pub use report::{CrawlReport, CrawlSummary, FailedPage, ReportEntry};
pub use sampler::LoadSampler;
pub use scheduler::ChunkScheduler;
pub use store::{MergeOutcome, ResultStore};
pub use traits::{MetadataStore, NoMetadata, PageSession, ReportSink, SitemapSource};
pub use types::*;
