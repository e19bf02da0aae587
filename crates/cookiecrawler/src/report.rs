// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! The persisted crawl report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::key::ResultKey;
use crate::types::{CookieDetail, Finding, FindingKind, Language, ReadableLifetime};

/// A URL whose visit failed for good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedPage {
    pub url: String,
    pub error: String,
}

/// Counters describing how a crawl went.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSummary {
    pub urls_total: usize,
    pub waves: u32,
    /// Size of every wave, in dispatch order.
    pub chunk_sizes: Vec<usize>,
    /// Visits dispatched, retries included.
    pub pages_attempted: usize,
    pub pages_succeeded: usize,
    pub failures: Vec<FailedPage>,
    pub retried: usize,
    pub elapsed_ms: u64,
}

/// One finding as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReportEntry {
    #[serde(rename = "cookie", rename_all = "camelCase")]
    Cookie {
        name: String,
        domain: String,
        path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        same_site: Option<String>,
        count: u64,
        /// Remaining milliseconds at observation time, `null` for session cookies.
        expires_timestamp: Option<i64>,
        expires_readable: ReadableLifetime,
        urls: Vec<String>,
        translations: Option<BTreeMap<Language, CookieDetail>>,
    },
    #[serde(rename = "localStorage", rename_all = "camelCase")]
    LocalStorage {
        name: String,
        origin: String,
        count: u64,
        urls: Vec<String>,
        translations: Option<BTreeMap<Language, CookieDetail>>,
    },
}

impl From<&Finding> for ReportEntry {
    fn from(finding: &Finding) -> Self {
        // The metadata catalog is written in English.
        let translations = finding
            .metadata
            .clone()
            .map(|detail| BTreeMap::from([(Language::En, detail)]));

        match finding.kind {
            FindingKind::Cookie => Self::Cookie {
                name: finding.name.clone(),
                domain: finding.scope.clone(),
                path: finding.path.clone(),
                same_site: finding.same_site.clone(),
                count: finding.occurrence_count,
                expires_timestamp: finding.remaining_lifetime.and_then(|l| l.as_millis()),
                expires_readable: finding.readable_lifetime.clone(),
                urls: finding.observed_urls.clone(),
                translations,
            },
            FindingKind::LocalStorageItem => Self::LocalStorage {
                name: finding.name.clone(),
                origin: finding.scope.clone(),
                count: finding.occurrence_count,
                urls: finding.observed_urls.clone(),
                translations,
            },
        }
    }
}

/// Everything a crawl produced, keyed by finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlReport {
    pub run_id: String,
    /// The sitemap URL that was crawled.
    pub target: String,
    pub generated_at: DateTime<Utc>,
    pub summary: CrawlSummary,
    pub findings: BTreeMap<ResultKey, ReportEntry>,
}

impl CrawlReport {
    pub fn new(
        run_id: impl Into<String>,
        target: impl Into<String>,
        findings: &BTreeMap<ResultKey, Finding>,
        summary: CrawlSummary,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            target: target.into(),
            generated_at: Utc::now(),
            summary,
            findings: findings
                .iter()
                .map(|(key, finding)| (key.clone(), ReportEntry::from(finding)))
                .collect(),
        }
    }

    pub fn cookie_count(&self) -> usize {
        self.findings
            .values()
            .filter(|e| matches!(e, ReportEntry::Cookie { .. }))
            .count()
    }

    pub fn local_storage_count(&self) -> usize {
        self.findings.len() - self.cookie_count()
    }
}
