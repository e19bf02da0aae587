// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the crawl engine.

/// Errors that end a crawl.
#[derive(thiserror::Error, Debug)]
pub enum CrawlError {
    #[error("Invalid sitemap URL: {0}")]
    InvalidSitemapUrl(String),

    #[error("Sitemap fetch failed for {url}: {reason}")]
    SitemapFetch { url: String, reason: String },

    #[error("Sitemap parse error: {0}")]
    SitemapParse(String),

    #[error("Sitemap contains no URLs: {0}")]
    EmptySitemap(String),

    /// A should-not-happen aggregation state. Indicates a bug, not bad input.
    #[error("Aggregation invariant violated: {0}")]
    Invariant(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CrawlError {
    /// Whether the crawl never got past setup.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Self::InvalidSitemapUrl(_)
                | Self::SitemapFetch { .. }
                | Self::SitemapParse(_)
                | Self::EmptySitemap(_)
                | Self::Config(_)
        )
    }
}

/// Errors confined to a single page visit. Never fatal to the crawl.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("consent dialog on {url}: {reason}")]
    Consent { url: String, reason: String },

    #[error("storage extraction on {url} failed: {reason}")]
    Extraction { url: String, reason: String },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("visit to {url} exceeded {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },
}

/// Convenience result type.
pub type CrawlResult<T> = Result<T, CrawlError>;
