// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Collaborator seams: everything the engine needs from the outside world.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::{CrawlError, SessionError};
use crate::report::CrawlReport;
use crate::types::{CookieDetail, PageVisit};

/// Supplies the list of page URLs to crawl.
#[async_trait]
pub trait SitemapSource: Send + Sync {
    /// Fetch every page URL listed by the sitemap. Failure aborts the crawl.
    async fn fetch_urls(&self, sitemap_url: &str) -> Result<Vec<String>, CrawlError>;
}

/// Visits one page in an isolated browsing context.
///
/// Implementations must not share cookie state between visits: each call
/// starts from an empty context and tears it down before returning.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigate to `url`, optionally dismiss the consent dialog matched by
    /// `consent_selector`, wait for the network to settle, and report what
    /// the page stored.
    async fn visit(
        &self,
        url: &str,
        consent_selector: Option<&str>,
    ) -> Result<PageVisit, SessionError>;
}

/// Looks up descriptive metadata for well-known cookie and storage names.
pub trait MetadataStore: Send + Sync {
    fn lookup(&self, name: &str) -> Option<CookieDetail>;
}

impl MetadataStore for HashMap<String, CookieDetail> {
    fn lookup(&self, name: &str) -> Option<CookieDetail> {
        self.get(name).cloned()
    }
}

/// A metadata store that knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl MetadataStore for NoMetadata {
    fn lookup(&self, _name: &str) -> Option<CookieDetail> {
        None
    }
}

/// Receives the final report.
pub trait ReportSink: Send + Sync {
    fn write(&self, report: &CrawlReport) -> Result<(), CrawlError>;
}
